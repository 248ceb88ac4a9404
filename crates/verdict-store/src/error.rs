use thiserror::Error;
use verdict_kv::KvError;
use verdict_rule::RuleError;
use verdict_types::ValidationError;

use crate::codec::WireError;

/// Errors produced by store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested path (or path/version pair) does not exist.
    #[error("ruleset not found")]
    NotFound,

    /// Evaluation-facing translation of [`StoreError::NotFound`].
    #[error("no ruleset found for this path")]
    RulesetNotFound,

    /// A listing continue token failed to decode.
    #[error("invalid continue token")]
    InvalidContinueToken,

    /// Rejected input: path or parameter syntax, reserved word, or signature
    /// mismatch. Never retryable.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A persisted record failed to decode.
    #[error("failed to decode {entity}")]
    Decode {
        entity: &'static str,
        #[source]
        source: WireError,
    },

    /// Evaluation failure surfaced by the ruleset itself.
    #[error(transparent)]
    Rule(#[from] RuleError),

    /// The operation was cancelled cooperatively.
    #[error("operation cancelled")]
    Cancelled,

    /// A backend failure, wrapped with the action that hit it. Retryable.
    #[error("{action}")]
    Kv {
        action: &'static str,
        #[source]
        source: KvError,
    },
}

impl StoreError {
    /// Wrap a KV failure with an action description, keeping cooperative
    /// cancellation distinguishable.
    pub(crate) fn from_kv(action: &'static str) -> impl FnOnce(KvError) -> StoreError {
        move |source| match source {
            KvError::Cancelled => StoreError::Cancelled,
            source => StoreError::Kv { action, source },
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kv_wrapping_preserves_cancellation() {
        let err = StoreError::from_kv("failed to fetch the entry")(KvError::Cancelled);
        assert!(matches!(err, StoreError::Cancelled));

        let err =
            StoreError::from_kv("failed to fetch the entry")(KvError::Transient("boom".into()));
        assert!(matches!(err, StoreError::Kv { .. }));
        assert_eq!(err.to_string(), "failed to fetch the entry");
    }

    #[test]
    fn validation_error_is_transparent() {
        let err: StoreError = ValidationError::new("path", "A", "invalid format").into();
        assert!(err.to_string().contains("invalid format"));
    }
}
