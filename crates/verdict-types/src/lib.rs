//! Foundation types for the verdict ruleset store.
//!
//! This crate provides the small set of types shared by every other verdict
//! crate:
//!
//! - [`Type`] — the four value types a ruleset can produce or consume
//! - [`ValidationError`] — structured rejection of invalid input
//! - [`path`] — ruleset path validation
//! - [`param`] — parameter name validation and the reserved-word list

pub mod error;
pub mod param;
pub mod path;
pub mod value_type;

pub use error::ValidationError;
pub use param::{validate_param_name, RESERVED_WORDS};
pub use path::validate_path;
pub use value_type::Type;
