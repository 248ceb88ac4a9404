use thiserror::Error;

/// Errors produced by KV backends.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KvError {
    /// The operation was cancelled cooperatively.
    #[error("operation cancelled")]
    Cancelled,

    /// A retryable backend failure (network, timeout, lagging watch).
    #[error("transient store failure: {0}")]
    Transient(String),
}

pub type KvResult<T> = Result<T, KvError>;
