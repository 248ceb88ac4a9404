//! Typed boolean expressions.
//!
//! Expressions form a small tree language: literal values, typed parameter
//! references, and the five boolean operators `eq`, `in`, `not`, `and`,
//! `or`. Every expression has a static type — operators are always boolean,
//! literals and parameters carry their own type — which is what signature
//! derivation reads.

use serde::{Deserialize, Serialize};
use verdict_types::Type;

use crate::error::{RuleError, RuleResult};
use crate::params::Params;
use crate::value::Value;

/// A typed reference to a parameter in the evaluation bag.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub kind: Type,
}

impl Param {
    pub fn new(name: impl Into<String>, kind: Type) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// A rule expression.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "operands", rename_all = "lowercase")]
pub enum Expr {
    /// A literal value.
    Value(Value),
    /// A typed parameter reference.
    Param(Param),
    /// True when all operands are equal. Requires at least two operands of
    /// the same type.
    Eq(Vec<Expr>),
    /// True when the first operand equals any of the remaining ones.
    In(Vec<Expr>),
    /// Boolean negation.
    Not(Box<Expr>),
    /// True when every operand is true.
    And(Vec<Expr>),
    /// True when at least one operand is true.
    Or(Vec<Expr>),
}

impl Expr {
    // ---- Constructors ----

    pub fn string_value(s: impl Into<String>) -> Self {
        Self::Value(Value::String(s.into()))
    }

    pub fn bool_value(b: bool) -> Self {
        Self::Value(Value::Bool(b))
    }

    pub fn int64_value(i: i64) -> Self {
        Self::Value(Value::Int64(i))
    }

    pub fn float64_value(f: f64) -> Self {
        Self::Value(Value::Float64(f))
    }

    pub fn string_param(name: impl Into<String>) -> Self {
        Self::Param(Param::new(name, Type::String))
    }

    pub fn bool_param(name: impl Into<String>) -> Self {
        Self::Param(Param::new(name, Type::Bool))
    }

    pub fn int64_param(name: impl Into<String>) -> Self {
        Self::Param(Param::new(name, Type::Int64))
    }

    pub fn float64_param(name: impl Into<String>) -> Self {
        Self::Param(Param::new(name, Type::Float64))
    }

    pub fn eq(operands: Vec<Expr>) -> Self {
        Self::Eq(operands)
    }

    pub fn is_in(operands: Vec<Expr>) -> Self {
        Self::In(operands)
    }

    pub fn not(operand: Expr) -> Self {
        Self::Not(Box::new(operand))
    }

    pub fn and(operands: Vec<Expr>) -> Self {
        Self::And(operands)
    }

    pub fn or(operands: Vec<Expr>) -> Self {
        Self::Or(operands)
    }

    // ---- Typing ----

    /// The type this expression evaluates to, without evaluating it.
    pub fn static_type(&self) -> Type {
        match self {
            Self::Value(v) => v.type_of(),
            Self::Param(p) => p.kind,
            Self::Eq(_) | Self::In(_) | Self::Not(_) | Self::And(_) | Self::Or(_) => Type::Bool,
        }
    }

    /// Append every parameter referenced by this expression to `out`, in
    /// left-to-right order.
    pub fn collect_params(&self, out: &mut Vec<Param>) {
        match self {
            Self::Value(_) => {}
            Self::Param(p) => out.push(p.clone()),
            Self::Not(e) => e.collect_params(out),
            Self::Eq(ops) | Self::In(ops) | Self::And(ops) | Self::Or(ops) => {
                for op in ops {
                    op.collect_params(out);
                }
            }
        }
    }

    // ---- Evaluation ----

    /// Evaluate the expression against a parameter bag.
    pub fn eval(&self, params: &Params) -> RuleResult<Value> {
        match self {
            Self::Value(v) => Ok(v.clone()),
            Self::Param(p) => params.get_typed(&p.name, p.kind).cloned(),
            Self::Eq(ops) => {
                let values = eval_operands("eq", ops, params)?;
                let first = &values[0];
                for v in &values[1..] {
                    if v.type_of() != first.type_of() {
                        return Err(RuleError::OperandTypeMismatch {
                            expected: first.type_of(),
                            actual: v.type_of(),
                        });
                    }
                }
                Ok(Value::Bool(values[1..].iter().all(|v| v == first)))
            }
            Self::In(ops) => {
                let values = eval_operands("in", ops, params)?;
                let needle = &values[0];
                for v in &values[1..] {
                    if v.type_of() != needle.type_of() {
                        return Err(RuleError::OperandTypeMismatch {
                            expected: needle.type_of(),
                            actual: v.type_of(),
                        });
                    }
                }
                Ok(Value::Bool(values[1..].iter().any(|v| v == needle)))
            }
            Self::Not(e) => {
                let v = e.eval(params)?;
                let b = v.as_bool().ok_or(RuleError::OperandTypeMismatch {
                    expected: Type::Bool,
                    actual: v.type_of(),
                })?;
                Ok(Value::Bool(!b))
            }
            Self::And(ops) => {
                require_operands("and", ops)?;
                for op in ops {
                    if !eval_bool(op, params)? {
                        return Ok(Value::Bool(false));
                    }
                }
                Ok(Value::Bool(true))
            }
            Self::Or(ops) => {
                require_operands("or", ops)?;
                for op in ops {
                    if eval_bool(op, params)? {
                        return Ok(Value::Bool(true));
                    }
                }
                Ok(Value::Bool(false))
            }
        }
    }
}

fn require_operands(op: &'static str, ops: &[Expr]) -> RuleResult<()> {
    if ops.len() < 2 {
        return Err(RuleError::NotEnoughOperands {
            op,
            min: 2,
            got: ops.len(),
        });
    }
    Ok(())
}

fn eval_operands(op: &'static str, ops: &[Expr], params: &Params) -> RuleResult<Vec<Value>> {
    require_operands(op, ops)?;
    ops.iter().map(|e| e.eval(params)).collect()
}

fn eval_bool(e: &Expr, params: &Params) -> RuleResult<bool> {
    let v = e.eval(params)?;
    v.as_bool().ok_or(RuleError::OperandTypeMismatch {
        expected: Type::Bool,
        actual: v.type_of(),
    })
}
