use thiserror::Error;

/// Structured rejection of user input.
///
/// Carries the offending field, the value that was rejected, and a short
/// machine-stable reason. Validation errors are never retryable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {field} {value:?}: {reason}")]
pub struct ValidationError {
    /// Which part of the input was rejected ("path", "param", "return type", ...).
    pub field: String,
    /// The rejected value, verbatim.
    pub value: String,
    /// Why it was rejected.
    pub reason: String,
}

impl ValidationError {
    pub fn new(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }
}
