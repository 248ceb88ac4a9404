use thiserror::Error;
use verdict_store::StoreError;
use verdict_types::Type;

/// Errors produced by the typed facade.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The ruleset evaluated fine but yielded another type than the getter
    /// promised.
    #[error("type returned by ruleset doesn't match: expected {expected}, got {actual}")]
    TypeMismatch { expected: Type, actual: Type },

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type EngineResult<T> = Result<T, EngineError>;
