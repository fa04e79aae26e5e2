//! The outbound diagnostic record (`SPEC_FULL.md` §6).

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A byte-range-free source location, line/column based like `comrak`'s
/// own `Sourcepos`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NodeSpan {
    pub start_line: usize,
    pub start_column: usize,
    pub end_line: usize,
    pub end_column: usize,
}

impl From<comrak::nodes::Sourcepos> for NodeSpan {
    fn from(pos: comrak::nodes::Sourcepos) -> Self {
        Self {
            start_line: pos.start.line,
            start_column: pos.start.column,
            end_line: pos.end.line,
            end_column: pos.end.column,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Severity {
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Diagnostic {
    pub span: NodeSpan,
    pub severity: Severity,
    pub message: String,
}

impl Diagnostic {
    #[must_use]
    pub fn error(span: NodeSpan, message: impl Into<String>) -> Self {
        Self {
            span,
            severity: Severity::Error,
            message: message.into(),
        }
    }
}
