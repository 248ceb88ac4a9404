//! Typed evaluation facade.
//!
//! [`Engine`] wraps anything that can evaluate rulesets — the store itself,
//! or a caching proxy — behind the [`Evaluator`] trait, and offers typed
//! getters that check the result type before handing the value back.

pub mod engine;
pub mod error;

pub use engine::{Engine, Evaluator};
pub use error::EngineError;
