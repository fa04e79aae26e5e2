//! Shared path-shape validator reused by every asset/page-referencing
//! builtin. Kept as a pure function so the downstream HTML renderer can
//! apply the identical verdict to the same string.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("remove whitespace surrounding path")]
    SurroundingWhitespace,
    #[error("path is empty")]
    Empty,
    #[error("path must be relative")]
    Absolute,
    #[error("use '/' instead of '\\' in paths")]
    Backslash,
    #[error("'.' and '..' are not allowed in paths")]
    DotComponent,
    #[error("empty component in path")]
    EmptyComponent,
}

/// Returns the first violated rule, in evaluation order, or `None` if `p`
/// is an acceptable relative path.
pub fn path_validation_error(p: &str) -> Option<PathError> {
    if p.trim() != p {
        return Some(PathError::SurroundingWhitespace);
    }
    if p.is_empty() {
        return Some(PathError::Empty);
    }
    if p.starts_with('/') {
        return Some(PathError::Absolute);
    }
    if p.contains('\\') {
        return Some(PathError::Backslash);
    }
    let components: Vec<&str> = p.split('/').collect();
    if components
        .iter()
        .any(|c| *c == "." || *c == "..")
    {
        return Some(PathError::DotComponent);
    }
    // A single trailing empty component (trailing '/') is allowed; any
    // other empty component (including a leading one, already excluded by
    // the absolute-path check) is rejected.
    for (i, c) in components.iter().enumerate() {
        if c.is_empty() && i != components.len() - 1 {
            return Some(PathError::EmptyComponent);
        }
    }
    None
}

/// Idempotent: stripping an already-stripped path is a no-op.
#[must_use]
pub fn strip_trailing_slash(p: &str) -> &str {
    p.strip_suffix('/').unwrap_or(p)
}
