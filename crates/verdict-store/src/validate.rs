//! Input validation, applied before any KV mutation.

use verdict_rule::Ruleset;
use verdict_types::{validate_param_name, validate_path, ValidationError};

/// Validate a put request: path syntax, non-empty body, and the name of
/// every referenced parameter (format and reserved words).
pub fn validate_put(path: &str, ruleset: &Ruleset) -> Result<(), ValidationError> {
    validate_path(path)?;

    if ruleset.is_empty() {
        return Err(ValidationError::new("ruleset", path, "empty ruleset"));
    }

    for param in ruleset.params() {
        validate_param_name(&param.name)?;
    }

    Ok(())
}
