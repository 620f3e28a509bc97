//! Hard registration failures.
//!
//! Anything recoverable is a [`Diagnostic`](quill_diagnostic::Diagnostic)
//! and only drops the offending declaration. A `RegistrationError` means the
//! addon itself is broken: the whole batch is discarded and nothing is
//! published.

use quill_pattern::UnrankablePattern;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RegistrationError {
    /// An explicit priority below zero.
    #[error("priority must be non-negative, got {0}")]
    NegativePriority(i32),

    /// A pattern whose priority cannot be inferred.
    #[error("pattern `{pattern}` of `{element}` cannot be ranked: {source}")]
    InvalidPatternTree {
        element: &'static str,
        pattern: String,
        source: UnrankablePattern,
    },
}

/// Validate an explicit priority.
pub(crate) fn check_priority(priority: i32) -> Result<i32, RegistrationError> {
    if priority < 0 {
        return Err(RegistrationError::NegativePriority(priority));
    }
    Ok(priority)
}
