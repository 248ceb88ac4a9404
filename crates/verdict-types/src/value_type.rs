use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The type of a value produced or consumed by a ruleset.
///
/// A ruleset's signature pins one return type and one type per parameter;
/// both are drawn from this set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Type {
    String,
    Bool,
    Int64,
    Float64,
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::String => "string",
            Self::Bool => "bool",
            Self::Int64 => "int64",
            Self::Float64 => "float64",
        };
        write!(f, "{s}")
    }
}

impl FromStr for Type {
    type Err = UnknownType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "string" => Ok(Self::String),
            "bool" => Ok(Self::Bool),
            "int64" => Ok(Self::Int64),
            "float64" => Ok(Self::Float64),
            other => Err(UnknownType(other.to_string())),
        }
    }
}

/// Error returned when parsing an unrecognised type name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown type {0:?}")]
pub struct UnknownType(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names() {
        assert_eq!(Type::String.to_string(), "string");
        assert_eq!(Type::Bool.to_string(), "bool");
        assert_eq!(Type::Int64.to_string(), "int64");
        assert_eq!(Type::Float64.to_string(), "float64");
    }

    #[test]
    fn parse_roundtrip() {
        for t in [Type::String, Type::Bool, Type::Int64, Type::Float64] {
            assert_eq!(t.to_string().parse::<Type>().unwrap(), t);
        }
    }

    #[test]
    fn parse_unknown() {
        assert!("int32".parse::<Type>().is_err());
        assert!("".parse::<Type>().is_err());
    }
}
