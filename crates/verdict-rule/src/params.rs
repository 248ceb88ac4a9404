use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use verdict_types::Type;

use crate::error::{RuleError, RuleResult};
use crate::value::Value;

/// The parameter bag a ruleset is evaluated against.
///
/// Keys are parameter names, values are typed literals. Lookups during
/// evaluation are checked against the type each rule declares for the
/// parameter.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Params(BTreeMap<String, Value>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insertion.
    ///
    /// ```
    /// use verdict_rule::Params;
    ///
    /// let params = Params::new().with("city", "paris").with("vip", true);
    /// assert_eq!(params.len(), 2);
    /// ```
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Look up `name` and require it to hold a value of type `expected`.
    pub fn get_typed(&self, name: &str, expected: Type) -> RuleResult<&Value> {
        let value = self.0.get(name).ok_or_else(|| RuleError::ParamNotFound {
            name: name.to_string(),
        })?;
        if value.type_of() != expected {
            return Err(RuleError::ParamTypeMismatch {
                name: name.to_string(),
                expected,
            });
        }
        Ok(value)
    }
}
