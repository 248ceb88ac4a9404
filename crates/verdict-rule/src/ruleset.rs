use serde::{Deserialize, Serialize};

use crate::error::{RuleError, RuleResult};
use crate::expr::{Expr, Param};
use crate::params::Params;
use crate::value::Value;

/// A guarded expression: when `predicate` evaluates to true, the rule fires
/// and `result` is evaluated to produce the ruleset's value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub predicate: Expr,
    pub result: Expr,
}

impl Rule {
    pub fn new(predicate: Expr, result: Expr) -> Self {
        Self { predicate, result }
    }

    /// A rule that always fires. Conventionally the last rule of a ruleset.
    pub fn fallback(result: Expr) -> Self {
        Self {
            predicate: Expr::bool_value(true),
            result,
        }
    }

    /// Evaluate the predicate; on a match, evaluate and return the result.
    pub fn eval(&self, params: &Params) -> RuleResult<Option<Value>> {
        let matched = self.predicate.eval(params)?;
        match matched {
            Value::Bool(true) => Ok(Some(self.result.eval(params)?)),
            Value::Bool(false) => Ok(None),
            other => Err(RuleError::OperandTypeMismatch {
                expected: verdict_types::Type::Bool,
                actual: other.type_of(),
            }),
        }
    }
}

/// An ordered list of rules evaluated first-match-wins.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ruleset {
    pub rules: Vec<Rule>,
}

impl Ruleset {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Evaluate against a parameter bag.
    ///
    /// Returns the result of the first matching rule, or
    /// [`RuleError::NoMatch`] when no predicate holds.
    pub fn eval(&self, params: &Params) -> RuleResult<Value> {
        for rule in &self.rules {
            if let Some(value) = rule.eval(params)? {
                return Ok(value);
            }
        }
        Err(RuleError::NoMatch)
    }

    /// Every parameter referenced by any rule, in order of first appearance.
    /// Duplicates (same name, same type) are collapsed.
    pub fn params(&self) -> Vec<Param> {
        let mut all = Vec::new();
        for rule in &self.rules {
            rule.predicate.collect_params(&mut all);
            rule.result.collect_params(&mut all);
        }
        let mut seen = Vec::new();
        let mut out: Vec<Param> = Vec::new();
        for p in all {
            if !seen.contains(&(p.name.clone(), p.kind)) {
                seen.push((p.name.clone(), p.kind));
                out.push(p);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn city_ruleset() -> Ruleset {
        Ruleset::new(vec![
            Rule::new(
                Expr::eq(vec![Expr::string_param("city"), Expr::string_value("paris")]),
                Expr::string_value("eu-west"),
            ),
            Rule::new(
                Expr::eq(vec![Expr::string_param("city"), Expr::string_value("tokyo")]),
                Expr::string_value("ap-east"),
            ),
            Rule::fallback(Expr::string_value("default")),
        ])
    }

    #[test]
    fn first_match_wins() {
        let rs = city_ruleset();
        let v = rs.eval(&Params::new().with("city", "paris")).unwrap();
        assert_eq!(v, Value::from("eu-west"));
        let v = rs.eval(&Params::new().with("city", "tokyo")).unwrap();
        assert_eq!(v, Value::from("ap-east"));
    }

    #[test]
    fn fallback_fires() {
        let rs = city_ruleset();
        let v = rs.eval(&Params::new().with("city", "oslo")).unwrap();
        assert_eq!(v, Value::from("default"));
    }

    #[test]
    fn no_match_without_fallback() {
        let rs = Ruleset::new(vec![Rule::new(
            Expr::bool_param("vip"),
            Expr::int64_value(10),
        )]);
        let err = rs.eval(&Params::new().with("vip", false)).unwrap_err();
        assert_eq!(err, RuleError::NoMatch);
    }

    #[test]
    fn eval_error_propagates() {
        let rs = city_ruleset();
        // Missing param.
        assert!(matches!(
            rs.eval(&Params::new()),
            Err(RuleError::ParamNotFound { .. })
        ));
    }

    #[test]
    fn non_boolean_predicate_is_an_error() {
        let rs = Ruleset::new(vec![Rule::new(
            Expr::string_value("oops"),
            Expr::int64_value(1),
        )]);
        assert!(matches!(
            rs.eval(&Params::new()),
            Err(RuleError::OperandTypeMismatch { .. })
        ));
    }

    #[test]
    fn params_deduplicated_in_order() {
        let rs = Ruleset::new(vec![
            Rule::new(
                Expr::and(vec![Expr::bool_param("vip"), Expr::bool_param("active")]),
                Expr::string_value("a"),
            ),
            Rule::new(Expr::bool_param("vip"), Expr::string_value("b")),
        ]);
        let names: Vec<_> = rs.params().iter().map(|p| p.name.clone()).collect();
        assert_eq!(names, ["vip", "active"]);
    }

    #[test]
    fn result_can_reference_params() {
        let rs = Ruleset::new(vec![Rule::fallback(Expr::string_param("city"))]);
        let v = rs.eval(&Params::new().with("city", "nice")).unwrap();
        assert_eq!(v, Value::from("nice"));
    }
}
