//! Parameter name validation.
//!
//! Parameter names follow the path grammar minus the `/` separator
//! (`^[a-z]+(?:[a-z0-9\-]?[a-z0-9])*$`) and must not collide with the words
//! the external API reserves for its own endpoints.

use crate::error::ValidationError;

/// Words that cannot be used as parameter names because the query surface
/// claims them.
pub const RESERVED_WORDS: &[&str] = &["version", "list", "eval", "watch", "revision"];

/// Validate a parameter name, including the reserved-word exclusion.
pub fn validate_param_name(name: &str) -> Result<(), ValidationError> {
    let invalid = || ValidationError::new("param", name, "invalid format");

    let bytes = name.as_bytes();
    let first = match bytes.first() {
        Some(b) => *b,
        None => return Err(invalid()),
    };
    if !first.is_ascii_lowercase() {
        return Err(invalid());
    }

    let mut prev_dash = false;
    for &c in bytes {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            prev_dash = false;
        } else if c == b'-' {
            if prev_dash {
                return Err(invalid());
            }
            prev_dash = true;
        } else {
            return Err(invalid());
        }
    }
    if prev_dash {
        return Err(invalid());
    }

    if RESERVED_WORDS.contains(&name) {
        return Err(ValidationError::new("param", name, "forbidden value"));
    }

    Ok(())
}
