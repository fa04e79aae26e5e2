//! Fixed-string error catalogue shared by builtin dispatch, path validation
//! and the placement validator.
//!
//! Every variant's `Display` impl is the literal diagnostic message. This
//! keeps the wording declared once instead of inlined at each call site,
//! and lets tests assert on a variant rather than a rendered string.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuiltinError {
    #[error("field already set")]
    FieldAlreadySet,

    #[error("duplicate key: '{0}'")]
    DuplicateKey(String),

    #[error("expected {0} {1} argument")]
    ArityOrType(usize, &'static str),

    #[error("expected a non-empty, even number of string arguments")]
    DataArity,

    #[error("builtin not found in '{0}'")]
    BuiltinNotFound(String),

    #[error("field access on directive")]
    FieldAccessOnDirective,

    #[error("field access on primitive value")]
    FieldAccessOnPrimitive,

    #[error("mandatory field '{0}' is unset")]
    MandatoryFieldUnset(&'static str),

    #[error("{0}")]
    Path(#[from] crate::path::PathError),

    #[error("URLs must specify a scheme, did you mean to use an asset builtin instead?")]
    UrlMissingScheme,

    #[error("{0}")]
    Placement(String),
}
