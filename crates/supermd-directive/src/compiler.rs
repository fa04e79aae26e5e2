//! Walks the AST, locates directive-link nodes, invokes the script
//! evaluator, installs directive objects on nodes, runs placement
//! validation, and reports diagnostics (`SPEC_FULL.md` §4.7, §5).

use std::rc::Rc;

use comrak::nodes::AstNode;
use tracing::debug;

use crate::diagnostic::Diagnostic;
use crate::directive::Content;
use crate::node::{DirectiveMap, Node, NodeKind, Preorder};
use crate::placement;
use crate::script::{ChainEvalEngine, ScriptEngine};
use crate::value::Value;

/// The annotated AST's companion report: every directive reached by the
/// compiler has either been attached to its node or recorded here as a
/// diagnostic. A document with no diagnostics compiled cleanly.
#[derive(Debug, Default)]
pub struct CompiledDocument {
    pub directives: DirectiveMap,
    pub diagnostics: Vec<Diagnostic>,
}

impl CompiledDocument {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Compiles `root` using the crate's default [`ChainEvalEngine`].
#[must_use]
pub fn compile<'a>(root: &'a AstNode<'a>) -> CompiledDocument {
    compile_with_engine(root, &ChainEvalEngine)
}

/// Compiles `root` against a caller-supplied [`ScriptEngine`].
pub fn compile_with_engine<'a, E: ScriptEngine>(
    root: &'a AstNode<'a>,
    engine: &E,
) -> CompiledDocument {
    let directives = DirectiveMap::new();
    let mut diagnostics = Vec::new();

    let entry = Node::new(root, &directives);
    // Collected up front: `unlink` (Katex) mutates the tree mid-walk, and
    // a live preorder iterator over a tree being detached from is unsound.
    let link_nodes: Vec<_> = Preorder::new(entry)
        .filter(|n| n.kind() == NodeKind::Link)
        .collect();

    for node in link_nodes {
        compile_link(node, engine, &mut diagnostics);
    }

    CompiledDocument {
        directives,
        diagnostics,
    }
}

fn compile_link<E: ScriptEngine>(node: Node, engine: &E, diagnostics: &mut Vec<Diagnostic>) {
    let Some(url) = node.link_url() else {
        return;
    };
    let Some(expr) = url.strip_prefix('$') else {
        return;
    };
    let span = node.span();
    let content = Rc::new(Content::new());
    let value = engine.eval(&content, expr);

    let handle = match value {
        Value::Directive(d) => d,
        Value::Err(message) => {
            diagnostics.push(Diagnostic::error(span, message));
            return;
        }
        other => {
            diagnostics.push(Diagnostic::error(
                span,
                format!("directive expression evaluated to a {}, not a directive", other.type_name()),
            ));
            return;
        }
    };

    if let Err(message) = placement::validate(node, &handle) {
        diagnostics.push(Diagnostic::error(span, message));
        return;
    }

    debug!(kind = handle.borrow().kind().name(), "compiled directive");
    node.attach_directive(handle);
}

#[cfg(test)]
mod tests {
    use super::*;
    use comrak::{Arena, Options};
    use pretty_assertions::assert_eq;

    fn compile_source(md: &str) -> CompiledDocument {
        let arena = Arena::new();
        let root = comrak::parse_document(&arena, md, &Options::default());
        compile(root)
    }

    #[test]
    fn heading_directive_compiles_cleanly() {
        let doc = compile_source("# [Welcome]($heading.id('intro'))\n");
        assert_eq!(doc.diagnostics, vec![]);
    }

    #[test]
    fn block_placeholder_under_quote_compiles_cleanly() {
        let doc = compile_source(">[]($block)\n>body\n");
        assert_eq!(doc.diagnostics, vec![]);
    }

    #[test]
    fn stray_text_before_block_directive_is_rejected() {
        let doc = compile_source(">body\n>\n>[]($block)\n");
        assert_eq!(doc.diagnostics.len(), 1);
        assert_eq!(
            doc.diagnostics[0].message,
            "block definitions directly under a quote block cannot embed any text"
        );
    }

    #[test]
    fn image_directive_sets_asset_and_alt() {
        let doc = compile_source(
            "[alt]($image.asset('pic.png').alt('a cat').linked(true))\n",
        );
        assert_eq!(doc.diagnostics, vec![]);
    }

    #[test]
    fn link_ref_synthesizes_self_page() {
        let doc = compile_source("[x]($link.ref('sec-a'))\n");
        assert_eq!(doc.diagnostics, vec![]);
    }

    #[test]
    fn katex_directive_unlinks_code_child() {
        let doc = compile_source("[`x+y`]($katex)\n");
        assert_eq!(doc.diagnostics, vec![]);
    }

    #[test]
    fn non_dollar_links_are_left_alone() {
        let doc = compile_source("[normal link](https://example.com)\n");
        assert_eq!(doc.diagnostics, vec![]);
    }
}
