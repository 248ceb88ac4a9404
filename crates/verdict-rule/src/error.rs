use thiserror::Error;
use verdict_types::Type;

/// Errors produced while evaluating a ruleset.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuleError {
    /// No rule's predicate matched the given parameters.
    #[error("no rule matched the given parameters")]
    NoMatch,

    #[error("parameter {name:?} not found")]
    ParamNotFound { name: String },

    #[error("parameter {name:?} must be of type {expected}")]
    ParamTypeMismatch { name: String, expected: Type },

    #[error("operand of type {actual} where {expected} was expected")]
    OperandTypeMismatch { expected: Type, actual: Type },

    #[error("operator {op:?} requires at least {min} operands, got {got}")]
    NotEnoughOperands {
        op: &'static str,
        min: usize,
        got: usize,
    },
}

pub type RuleResult<T> = Result<T, RuleError>;
