//! Ruleset path validation.
//!
//! A valid path is lowercase ASCII, starts with a letter, ends with a letter
//! or digit, uses `-` and `/` as separators, and never doubles a separator.
//! This is the grammar `^[a-z]+(?:[a-z0-9\-\/]?[a-z0-9])*$`, checked with a
//! single pass rather than a regex engine.

use crate::error::ValidationError;

fn is_separator(c: u8) -> bool {
    c == b'-' || c == b'/'
}

fn is_lower_alnum(c: u8) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit()
}

/// Validate a ruleset path.
///
/// # Examples
///
/// ```
/// use verdict_types::validate_path;
///
/// assert!(validate_path("billing/discount").is_ok());
/// assert!(validate_path("a-b/c-d").is_ok());
/// assert!(validate_path("A!BAD").is_err());
/// assert!(validate_path("a//b").is_err());
/// ```
pub fn validate_path(path: &str) -> Result<(), ValidationError> {
    let invalid = || ValidationError::new("path", path, "invalid format");

    let bytes = path.as_bytes();
    let first = match bytes.first() {
        Some(b) => *b,
        None => return Err(invalid()),
    };
    if !first.is_ascii_lowercase() {
        return Err(invalid());
    }

    let mut prev_sep = false;
    for &c in bytes {
        if is_lower_alnum(c) {
            prev_sep = false;
        } else if is_separator(c) {
            if prev_sep {
                return Err(invalid());
            }
            prev_sep = true;
        } else {
            return Err(invalid());
        }
    }

    // A trailing separator means the final group was never closed.
    if prev_sep {
        return Err(invalid());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_paths() {
        for p in [
            "a",
            "ab",
            "a1",
            "a-b",
            "a/b",
            "billing/discount",
            "a-b/c-d",
            "a1/b2-c3",
            "abc/def/ghi",
        ] {
            assert!(validate_path(p).is_ok(), "{p:?} should be valid");
        }
    }

    #[test]
    fn invalid_paths() {
        for p in [
            "",
            "1a",
            "-a",
            "/a",
            "a-",
            "a/",
            "a//b",
            "a--b",
            "a-/b",
            "a/-b",
            "A",
            "A!BAD",
            "a b",
            "a_b",
            "a.b",
            "été",
        ] {
            assert!(validate_path(p).is_err(), "{p:?} should be invalid");
        }
    }

    #[test]
    fn error_shape() {
        let err = validate_path("A!BAD").unwrap_err();
        assert_eq!(err.field, "path");
        assert_eq!(err.value, "A!BAD");
        assert_eq!(err.reason, "invalid format");
    }
}
