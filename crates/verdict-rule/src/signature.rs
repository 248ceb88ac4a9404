//! Ruleset signatures.
//!
//! A signature pins the contract of a path: the return type of the ruleset
//! and the type of every parameter it may reference. The first accepted
//! ruleset at a path establishes the signature; every later version must be
//! compatible with it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use verdict_types::{Type, ValidationError};

use crate::ruleset::Ruleset;

/// The immutable contract shared by all versions of a ruleset path.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub return_type: Type,
    pub param_types: BTreeMap<String, Type>,
}

impl Signature {
    /// Derive the signature of a ruleset.
    ///
    /// The return type is the static type of the last rule's result; the
    /// parameter set is the union of every parameter referenced by any rule.
    /// Referencing one parameter name with two different types is a
    /// derivation error.
    pub fn of(ruleset: &Ruleset) -> Result<Self, ValidationError> {
        let last = ruleset.rules.last().ok_or_else(|| {
            ValidationError::new("ruleset", "", "empty ruleset")
        })?;
        let return_type = last.result.static_type();

        let mut param_types = BTreeMap::new();
        for p in ruleset.params() {
            match param_types.insert(p.name.clone(), p.kind) {
                Some(existing) if existing != p.kind => {
                    return Err(ValidationError::new(
                        "param",
                        p.name,
                        format!("conflicting types: {existing} and {}", p.kind),
                    ));
                }
                _ => {}
            }
        }

        Ok(Self {
            return_type,
            param_types,
        })
    }

    /// Check that `incoming` is compatible with this stored signature.
    ///
    /// The return types must be identical, and every incoming parameter must
    /// exist here with the same type. Stored parameters the incoming ruleset
    /// no longer references are fine — newer versions may drop parameters.
    pub fn accepts(&self, incoming: &Signature) -> Result<(), ValidationError> {
        if self.return_type != incoming.return_type {
            return Err(ValidationError::new(
                "return type",
                incoming.return_type.to_string(),
                format!(
                    "signature mismatch: return type must be of type {}",
                    self.return_type
                ),
            ));
        }

        for (name, kind) in &incoming.param_types {
            match self.param_types.get(name) {
                None => {
                    return Err(ValidationError::new(
                        "param",
                        name,
                        "signature mismatch: unknown parameter",
                    ));
                }
                Some(stored) if stored != kind => {
                    return Err(ValidationError::new(
                        "param type",
                        kind.to_string(),
                        format!("signature mismatch: param must be of type {stored}"),
                    ));
                }
                Some(_) => {}
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Expr;
    use crate::ruleset::Rule;

    fn string_ruleset() -> Ruleset {
        Ruleset::new(vec![
            Rule::new(
                Expr::eq(vec![Expr::string_param("city"), Expr::string_value("paris")]),
                Expr::string_value("eu"),
            ),
            Rule::fallback(Expr::string_value("other")),
        ])
    }

    #[test]
    fn derive_return_type_from_last_rule() {
        let sig = Signature::of(&string_ruleset()).unwrap();
        assert_eq!(sig.return_type, Type::String);
        assert_eq!(sig.param_types.get("city"), Some(&Type::String));
    }

    #[test]
    fn derive_unions_params_across_rules() {
        let rs = Ruleset::new(vec![
            Rule::new(Expr::bool_param("vip"), Expr::int64_value(10)),
            Rule::new(
                Expr::eq(vec![Expr::int64_param("count"), Expr::int64_value(0)]),
                Expr::int64_value(0),
            ),
            Rule::fallback(Expr::int64_value(1)),
        ]);
        let sig = Signature::of(&rs).unwrap();
        assert_eq!(sig.return_type, Type::Int64);
        assert_eq!(sig.param_types.len(), 2);
        assert_eq!(sig.param_types.get("vip"), Some(&Type::Bool));
        assert_eq!(sig.param_types.get("count"), Some(&Type::Int64));
    }

    #[test]
    fn derive_rejects_conflicting_param_types() {
        let rs = Ruleset::new(vec![
            Rule::new(Expr::bool_param("flag"), Expr::string_value("a")),
            Rule::new(
                Expr::eq(vec![Expr::string_param("flag"), Expr::string_value("x")]),
                Expr::string_value("b"),
            ),
        ]);
        let err = Signature::of(&rs).unwrap_err();
        assert_eq!(err.field, "param");
        assert_eq!(err.value, "flag");
    }

    #[test]
    fn derive_rejects_empty_ruleset() {
        assert!(Signature::of(&Ruleset::new(vec![])).is_err());
    }

    #[test]
    fn accepts_identical() {
        let sig = Signature::of(&string_ruleset()).unwrap();
        assert!(sig.accepts(&sig.clone()).is_ok());
    }

    #[test]
    fn accepts_dropped_param() {
        let stored = Signature::of(&string_ruleset()).unwrap();
        let incoming = Signature {
            return_type: Type::String,
            param_types: BTreeMap::new(),
        };
        assert!(stored.accepts(&incoming).is_ok());
    }

    #[test]
    fn rejects_return_type_change() {
        let stored = Signature::of(&string_ruleset()).unwrap();
        let incoming = Signature {
            return_type: Type::Bool,
            param_types: BTreeMap::new(),
        };
        let err = stored.accepts(&incoming).unwrap_err();
        assert_eq!(err.field, "return type");
        assert_eq!(
            err.reason,
            "signature mismatch: return type must be of type string"
        );
    }

    #[test]
    fn rejects_unknown_param() {
        let stored = Signature::of(&string_ruleset()).unwrap();
        let mut params = BTreeMap::new();
        params.insert("country".to_string(), Type::String);
        let incoming = Signature {
            return_type: Type::String,
            param_types: params,
        };
        let err = stored.accepts(&incoming).unwrap_err();
        assert_eq!(err.field, "param");
        assert_eq!(err.reason, "signature mismatch: unknown parameter");
    }

    #[test]
    fn rejects_param_type_change() {
        let stored = Signature::of(&string_ruleset()).unwrap();
        let mut params = BTreeMap::new();
        params.insert("city".to_string(), Type::Int64);
        let incoming = Signature {
            return_type: Type::String,
            param_types: params,
        };
        let err = stored.accepts(&incoming).unwrap_err();
        assert_eq!(err.field, "param type");
        assert_eq!(err.reason, "signature mismatch: param must be of type string");
    }
}
