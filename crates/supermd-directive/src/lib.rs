//! Directive compiler for SuperMD.
//!
//! Parses a CommonMark/GFM document into an AST, finds every Markdown
//! link whose URL begins with `$`, evaluates the expression that follows
//! against a typed directive object model, validates where in the tree
//! the directive sits, and attaches the result back onto the AST for a
//! downstream renderer to walk.
//!
//! ```
//! use comrak::{Arena, Options};
//! use supermd_directive::compile;
//!
//! let arena = Arena::new();
//! let root = comrak::parse_document(&arena, "# [Welcome]($heading.id('intro'))\n", &Options::default());
//! let doc = compile(root);
//! assert!(doc.is_ok());
//! ```

mod compiler;
mod diagnostic;
pub mod directive;
pub mod errors;
mod node;
pub mod path;
mod placement;
pub mod script;
mod value;

pub use compiler::{compile, compile_with_engine, CompiledDocument};
pub use diagnostic::{Diagnostic, NodeSpan, Severity};
pub use directive::{Content, Directive, Kind, Src};
pub use node::{DirectiveMap, Node, NodeKind};
pub use script::{ChainEvalEngine, ScriptEngine};
pub use value::Value;
