//! The persisted record types.
//!
//! Three records are written to the KV store: [`EntryRecord`],
//! [`SignatureRecord`], and [`VersionsRecord`]. Ruleset bodies nest inside
//! entries as [`RulesetRecord`] trees. Every record keeps the raw bytes of
//! fields it does not recognise and re-emits them after its known fields, so
//! records written by newer writers survive a read-modify-write by this
//! version.

use verdict_rule::{Expr, Param, Rule, Ruleset, Signature, Value};
use verdict_types::Type;

use super::wire::{
    expect_wire, put_bool_field, put_bytes_field, put_double_field, put_int64_field,
    put_string_field, put_uint_field, Reader, WireError, WireResult, WIRE_FIXED64, WIRE_LEN,
    WIRE_VARINT,
};

fn type_code(t: Type) -> u64 {
    match t {
        Type::String => 1,
        Type::Bool => 2,
        Type::Int64 => 3,
        Type::Float64 => 4,
    }
}

fn type_from_code(code: u64, what: &'static str) -> WireResult<Type> {
    match code {
        1 => Ok(Type::String),
        2 => Ok(Type::Bool),
        3 => Ok(Type::Int64),
        4 => Ok(Type::Float64),
        code => Err(WireError::InvalidEnum { what, code }),
    }
}

// ---------------------------------------------------------------------------
// Values and parameters
// ---------------------------------------------------------------------------

/// The active member of a value record.
#[derive(Clone, Debug, PartialEq)]
pub enum ValueNode {
    String(String),
    Bool(bool),
    Int64(i64),
    Float64(f64),
}

/// Wire form of a literal value. Exactly one member is set.
#[derive(Clone, Debug, PartialEq)]
pub struct ValueRecord {
    pub node: ValueNode,
    pub unknown: Vec<u8>,
}

impl ValueRecord {
    pub fn from_domain(value: &Value) -> Self {
        let node = match value {
            Value::String(s) => ValueNode::String(s.clone()),
            Value::Bool(b) => ValueNode::Bool(*b),
            Value::Int64(i) => ValueNode::Int64(*i),
            Value::Float64(f) => ValueNode::Float64(*f),
        };
        Self {
            node,
            unknown: Vec::new(),
        }
    }

    pub fn to_domain(&self) -> Value {
        match &self.node {
            ValueNode::String(s) => Value::String(s.clone()),
            ValueNode::Bool(b) => Value::Bool(*b),
            ValueNode::Int64(i) => Value::Int64(*i),
            ValueNode::Float64(f) => Value::Float64(*f),
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        // The active member is always written, defaults included, so the
        // variant survives decoding.
        match &self.node {
            ValueNode::String(s) => put_string_field(&mut buf, 1, s),
            ValueNode::Bool(b) => put_bool_field(&mut buf, 2, *b),
            ValueNode::Int64(i) => put_int64_field(&mut buf, 3, *i),
            ValueNode::Float64(f) => put_double_field(&mut buf, 4, *f),
        }
        buf.extend_from_slice(&self.unknown);
        buf
    }

    pub fn decode(data: &[u8]) -> WireResult<Self> {
        let mut r = Reader::new(data);
        let mut node = None;
        let mut unknown = Vec::new();
        while !r.done() {
            let start = r.pos();
            let (field, wire) = r.read_tag()?;
            match field {
                1 => {
                    expect_wire(field, wire, WIRE_LEN)?;
                    node = Some(ValueNode::String(r.read_string("value")?));
                }
                2 => {
                    expect_wire(field, wire, WIRE_VARINT)?;
                    node = Some(ValueNode::Bool(r.read_varint()? != 0));
                }
                3 => {
                    expect_wire(field, wire, WIRE_VARINT)?;
                    node = Some(ValueNode::Int64(r.read_varint()? as i64));
                }
                4 => {
                    expect_wire(field, wire, WIRE_FIXED64)?;
                    node = Some(ValueNode::Float64(f64::from_le_bytes(r.read_fixed64()?)));
                }
                _ => {
                    r.skip(field, wire)?;
                    unknown.extend_from_slice(r.slice_from(start));
                }
            }
        }
        Ok(Self {
            node: node.ok_or(WireError::Malformed("value"))?,
            unknown,
        })
    }
}

/// Wire form of a typed parameter reference, also used for signature
/// parameter entries.
#[derive(Clone, Debug, PartialEq)]
pub struct ParamRecord {
    pub name: String,
    pub kind: Type,
    pub unknown: Vec<u8>,
}

impl ParamRecord {
    pub fn from_domain(param: &Param) -> Self {
        Self {
            name: param.name.clone(),
            kind: param.kind,
            unknown: Vec::new(),
        }
    }

    pub fn to_domain(&self) -> Param {
        Param::new(self.name.clone(), self.kind)
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        if !self.name.is_empty() {
            put_string_field(&mut buf, 1, &self.name);
        }
        put_uint_field(&mut buf, 2, type_code(self.kind));
        buf.extend_from_slice(&self.unknown);
        buf
    }

    pub fn decode(data: &[u8]) -> WireResult<Self> {
        let mut r = Reader::new(data);
        let mut name = String::new();
        let mut kind = None;
        let mut unknown = Vec::new();
        while !r.done() {
            let start = r.pos();
            let (field, wire) = r.read_tag()?;
            match field {
                1 => {
                    expect_wire(field, wire, WIRE_LEN)?;
                    name = r.read_string("param name")?;
                }
                2 => {
                    expect_wire(field, wire, WIRE_VARINT)?;
                    kind = Some(type_from_code(r.read_varint()?, "param type")?);
                }
                _ => {
                    r.skip(field, wire)?;
                    unknown.extend_from_slice(r.slice_from(start));
                }
            }
        }
        Ok(Self {
            name,
            kind: kind.ok_or(WireError::Malformed("param"))?,
            unknown,
        })
    }
}

// ---------------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------------

/// Operator discriminant of an [`OpRecord`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OpKind {
    Eq,
    In,
    Not,
    And,
    Or,
}

impl OpKind {
    fn code(self) -> u64 {
        match self {
            Self::Eq => 1,
            Self::In => 2,
            Self::Not => 3,
            Self::And => 4,
            Self::Or => 5,
        }
    }

    fn from_code(code: u64) -> WireResult<Self> {
        match code {
            1 => Ok(Self::Eq),
            2 => Ok(Self::In),
            3 => Ok(Self::Not),
            4 => Ok(Self::And),
            5 => Ok(Self::Or),
            code => Err(WireError::InvalidEnum {
                what: "operator",
                code,
            }),
        }
    }
}

/// Wire form of an operator application.
#[derive(Clone, Debug, PartialEq)]
pub struct OpRecord {
    pub kind: OpKind,
    pub operands: Vec<ExprRecord>,
    pub unknown: Vec<u8>,
}

impl OpRecord {
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        put_uint_field(&mut buf, 1, self.kind.code());
        for operand in &self.operands {
            put_bytes_field(&mut buf, 2, &operand.encode());
        }
        buf.extend_from_slice(&self.unknown);
        buf
    }

    pub fn decode(data: &[u8]) -> WireResult<Self> {
        let mut r = Reader::new(data);
        let mut kind = None;
        let mut operands = Vec::new();
        let mut unknown = Vec::new();
        while !r.done() {
            let start = r.pos();
            let (field, wire) = r.read_tag()?;
            match field {
                1 => {
                    expect_wire(field, wire, WIRE_VARINT)?;
                    kind = Some(OpKind::from_code(r.read_varint()?)?);
                }
                2 => {
                    expect_wire(field, wire, WIRE_LEN)?;
                    operands.push(ExprRecord::decode(r.read_len()?)?);
                }
                _ => {
                    r.skip(field, wire)?;
                    unknown.extend_from_slice(r.slice_from(start));
                }
            }
        }
        Ok(Self {
            kind: kind.ok_or(WireError::Malformed("operator"))?,
            operands,
            unknown,
        })
    }
}

/// The active member of an expression record.
#[derive(Clone, Debug, PartialEq)]
pub enum ExprNode {
    Value(ValueRecord),
    Param(ParamRecord),
    Op(OpRecord),
}

/// Wire form of an expression tree node. Exactly one member is set.
#[derive(Clone, Debug, PartialEq)]
pub struct ExprRecord {
    pub node: ExprNode,
    pub unknown: Vec<u8>,
}

impl ExprRecord {
    pub fn from_domain(expr: &Expr) -> Self {
        let node = match expr {
            Expr::Value(v) => ExprNode::Value(ValueRecord::from_domain(v)),
            Expr::Param(p) => ExprNode::Param(ParamRecord::from_domain(p)),
            Expr::Eq(ops) => Self::op_node(OpKind::Eq, ops),
            Expr::In(ops) => Self::op_node(OpKind::In, ops),
            Expr::Not(op) => Self::op_node(OpKind::Not, std::slice::from_ref(op.as_ref())),
            Expr::And(ops) => Self::op_node(OpKind::And, ops),
            Expr::Or(ops) => Self::op_node(OpKind::Or, ops),
        };
        Self {
            node,
            unknown: Vec::new(),
        }
    }

    fn op_node(kind: OpKind, ops: &[Expr]) -> ExprNode {
        ExprNode::Op(OpRecord {
            kind,
            operands: ops.iter().map(Self::from_domain).collect(),
            unknown: Vec::new(),
        })
    }

    pub fn to_domain(&self) -> WireResult<Expr> {
        match &self.node {
            ExprNode::Value(v) => Ok(Expr::Value(v.to_domain())),
            ExprNode::Param(p) => Ok(Expr::Param(p.to_domain())),
            ExprNode::Op(op) => {
                let operands: Vec<Expr> = op
                    .operands
                    .iter()
                    .map(ExprRecord::to_domain)
                    .collect::<WireResult<_>>()?;
                match op.kind {
                    OpKind::Eq => Ok(Expr::Eq(operands)),
                    OpKind::In => Ok(Expr::In(operands)),
                    OpKind::Not => {
                        let mut operands = operands;
                        if operands.len() != 1 {
                            return Err(WireError::Malformed("not operator"));
                        }
                        Ok(Expr::not(operands.remove(0)))
                    }
                    OpKind::And => Ok(Expr::And(operands)),
                    OpKind::Or => Ok(Expr::Or(operands)),
                }
            }
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        match &self.node {
            ExprNode::Value(v) => put_bytes_field(&mut buf, 1, &v.encode()),
            ExprNode::Param(p) => put_bytes_field(&mut buf, 2, &p.encode()),
            ExprNode::Op(op) => put_bytes_field(&mut buf, 3, &op.encode()),
        }
        buf.extend_from_slice(&self.unknown);
        buf
    }

    pub fn decode(data: &[u8]) -> WireResult<Self> {
        let mut r = Reader::new(data);
        let mut node = None;
        let mut unknown = Vec::new();
        while !r.done() {
            let start = r.pos();
            let (field, wire) = r.read_tag()?;
            match field {
                1 => {
                    expect_wire(field, wire, WIRE_LEN)?;
                    node = Some(ExprNode::Value(ValueRecord::decode(r.read_len()?)?));
                }
                2 => {
                    expect_wire(field, wire, WIRE_LEN)?;
                    node = Some(ExprNode::Param(ParamRecord::decode(r.read_len()?)?));
                }
                3 => {
                    expect_wire(field, wire, WIRE_LEN)?;
                    node = Some(ExprNode::Op(OpRecord::decode(r.read_len()?)?));
                }
                _ => {
                    r.skip(field, wire)?;
                    unknown.extend_from_slice(r.slice_from(start));
                }
            }
        }
        Ok(Self {
            node: node.ok_or(WireError::Malformed("expr"))?,
            unknown,
        })
    }
}

// ---------------------------------------------------------------------------
// Rules and rulesets
// ---------------------------------------------------------------------------

/// Wire form of one rule.
#[derive(Clone, Debug, PartialEq)]
pub struct RuleRecord {
    pub predicate: ExprRecord,
    pub result: ExprRecord,
    pub unknown: Vec<u8>,
}

impl RuleRecord {
    pub fn from_domain(rule: &Rule) -> Self {
        Self {
            predicate: ExprRecord::from_domain(&rule.predicate),
            result: ExprRecord::from_domain(&rule.result),
            unknown: Vec::new(),
        }
    }

    pub fn to_domain(&self) -> WireResult<Rule> {
        Ok(Rule::new(
            self.predicate.to_domain()?,
            self.result.to_domain()?,
        ))
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        put_bytes_field(&mut buf, 1, &self.predicate.encode());
        put_bytes_field(&mut buf, 2, &self.result.encode());
        buf.extend_from_slice(&self.unknown);
        buf
    }

    pub fn decode(data: &[u8]) -> WireResult<Self> {
        let mut r = Reader::new(data);
        let mut predicate = None;
        let mut result = None;
        let mut unknown = Vec::new();
        while !r.done() {
            let start = r.pos();
            let (field, wire) = r.read_tag()?;
            match field {
                1 => {
                    expect_wire(field, wire, WIRE_LEN)?;
                    predicate = Some(ExprRecord::decode(r.read_len()?)?);
                }
                2 => {
                    expect_wire(field, wire, WIRE_LEN)?;
                    result = Some(ExprRecord::decode(r.read_len()?)?);
                }
                _ => {
                    r.skip(field, wire)?;
                    unknown.extend_from_slice(r.slice_from(start));
                }
            }
        }
        Ok(Self {
            predicate: predicate.ok_or(WireError::Malformed("rule"))?,
            result: result.ok_or(WireError::Malformed("rule"))?,
            unknown,
        })
    }
}

/// Wire form of a ruleset body. Its encoding is the canonical byte string
/// the idempotence checksum is computed over.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RulesetRecord {
    pub rules: Vec<RuleRecord>,
    pub unknown: Vec<u8>,
}

impl RulesetRecord {
    pub fn from_domain(ruleset: &Ruleset) -> Self {
        Self {
            rules: ruleset.rules.iter().map(RuleRecord::from_domain).collect(),
            unknown: Vec::new(),
        }
    }

    pub fn to_domain(&self) -> WireResult<Ruleset> {
        let rules = self
            .rules
            .iter()
            .map(RuleRecord::to_domain)
            .collect::<WireResult<_>>()?;
        Ok(Ruleset::new(rules))
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        for rule in &self.rules {
            put_bytes_field(&mut buf, 1, &rule.encode());
        }
        buf.extend_from_slice(&self.unknown);
        buf
    }

    pub fn decode(data: &[u8]) -> WireResult<Self> {
        let mut r = Reader::new(data);
        let mut rules = Vec::new();
        let mut unknown = Vec::new();
        while !r.done() {
            let start = r.pos();
            let (field, wire) = r.read_tag()?;
            match field {
                1 => {
                    expect_wire(field, wire, WIRE_LEN)?;
                    rules.push(RuleRecord::decode(r.read_len()?)?);
                }
                _ => {
                    r.skip(field, wire)?;
                    unknown.extend_from_slice(r.slice_from(start));
                }
            }
        }
        Ok(Self { rules, unknown })
    }
}

// ---------------------------------------------------------------------------
// Top-level records
// ---------------------------------------------------------------------------

/// Wire form of a `(path, version, ruleset)` entry.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EntryRecord {
    pub path: String,
    pub version: String,
    pub ruleset: RulesetRecord,
    pub unknown: Vec<u8>,
}

impl EntryRecord {
    pub fn from_domain(path: &str, version: &str, ruleset: &Ruleset) -> Self {
        Self {
            path: path.to_string(),
            version: version.to_string(),
            ruleset: RulesetRecord::from_domain(ruleset),
            unknown: Vec::new(),
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        if !self.path.is_empty() {
            put_string_field(&mut buf, 1, &self.path);
        }
        if !self.version.is_empty() {
            put_string_field(&mut buf, 2, &self.version);
        }
        put_bytes_field(&mut buf, 3, &self.ruleset.encode());
        buf.extend_from_slice(&self.unknown);
        buf
    }

    pub fn decode(data: &[u8]) -> WireResult<Self> {
        let mut r = Reader::new(data);
        let mut out = Self::default();
        while !r.done() {
            let start = r.pos();
            let (field, wire) = r.read_tag()?;
            match field {
                1 => {
                    expect_wire(field, wire, WIRE_LEN)?;
                    out.path = r.read_string("entry path")?;
                }
                2 => {
                    expect_wire(field, wire, WIRE_LEN)?;
                    out.version = r.read_string("entry version")?;
                }
                3 => {
                    expect_wire(field, wire, WIRE_LEN)?;
                    out.ruleset = RulesetRecord::decode(r.read_len()?)?;
                }
                _ => {
                    r.skip(field, wire)?;
                    out.unknown.extend_from_slice(r.slice_from(start));
                }
            }
        }
        Ok(out)
    }
}

/// Wire form of a path's signature.
#[derive(Clone, Debug, PartialEq)]
pub struct SignatureRecord {
    pub return_type: Type,
    pub params: Vec<ParamRecord>,
    pub unknown: Vec<u8>,
}

impl SignatureRecord {
    pub fn from_domain(signature: &Signature) -> Self {
        // BTreeMap iteration keeps the parameter list sorted, which makes
        // the encoding canonical.
        let params = signature
            .param_types
            .iter()
            .map(|(name, kind)| ParamRecord {
                name: name.clone(),
                kind: *kind,
                unknown: Vec::new(),
            })
            .collect();
        Self {
            return_type: signature.return_type,
            params,
            unknown: Vec::new(),
        }
    }

    pub fn to_domain(&self) -> Signature {
        Signature {
            return_type: self.return_type,
            param_types: self
                .params
                .iter()
                .map(|p| (p.name.clone(), p.kind))
                .collect(),
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        put_uint_field(&mut buf, 1, type_code(self.return_type));
        for param in &self.params {
            put_bytes_field(&mut buf, 2, &param.encode());
        }
        buf.extend_from_slice(&self.unknown);
        buf
    }

    pub fn decode(data: &[u8]) -> WireResult<Self> {
        let mut r = Reader::new(data);
        let mut return_type = None;
        let mut params = Vec::new();
        let mut unknown = Vec::new();
        while !r.done() {
            let start = r.pos();
            let (field, wire) = r.read_tag()?;
            match field {
                1 => {
                    expect_wire(field, wire, WIRE_VARINT)?;
                    return_type = Some(type_from_code(r.read_varint()?, "return type")?);
                }
                2 => {
                    expect_wire(field, wire, WIRE_LEN)?;
                    params.push(ParamRecord::decode(r.read_len()?)?);
                }
                _ => {
                    r.skip(field, wire)?;
                    unknown.extend_from_slice(r.slice_from(start));
                }
            }
        }
        Ok(Self {
            return_type: return_type.ok_or(WireError::Malformed("signature"))?,
            params,
            unknown,
        })
    }
}

/// Wire form of a path's version list.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VersionsRecord {
    pub versions: Vec<String>,
    pub unknown: Vec<u8>,
}

impl VersionsRecord {
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        for version in &self.versions {
            put_string_field(&mut buf, 1, version);
        }
        buf.extend_from_slice(&self.unknown);
        buf
    }

    pub fn decode(data: &[u8]) -> WireResult<Self> {
        let mut r = Reader::new(data);
        let mut out = Self::default();
        while !r.done() {
            let start = r.pos();
            let (field, wire) = r.read_tag()?;
            match field {
                1 => {
                    expect_wire(field, wire, WIRE_LEN)?;
                    out.versions.push(r.read_string("version")?);
                }
                _ => {
                    r.skip(field, wire)?;
                    out.unknown.extend_from_slice(r.slice_from(start));
                }
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::wire::{put_uint_field as put_unknown_uint, put_bytes_field as put_unknown_bytes};
    use proptest::prelude::*;
    use verdict_rule::Rule;

    fn sample_ruleset() -> Ruleset {
        Ruleset::new(vec![
            Rule::new(
                Expr::and(vec![
                    Expr::eq(vec![Expr::string_param("city"), Expr::string_value("paris")]),
                    Expr::not(Expr::bool_param("blocked")),
                ]),
                Expr::string_value("eu-west"),
            ),
            Rule::new(
                Expr::is_in(vec![
                    Expr::string_param("city"),
                    Expr::string_value("tokyo"),
                    Expr::string_value("osaka"),
                ]),
                Expr::string_value("ap-east"),
            ),
            Rule::fallback(Expr::string_value("default")),
        ])
    }

    // -----------------------------------------------------------------------
    // Round-trips
    // -----------------------------------------------------------------------

    #[test]
    fn entry_roundtrip() {
        let rs = sample_ruleset();
        let record = EntryRecord::from_domain("billing/discount", "v1", &rs);
        let decoded = EntryRecord::decode(&record.encode()).unwrap();
        assert_eq!(decoded, record);
        assert_eq!(decoded.path, "billing/discount");
        assert_eq!(decoded.version, "v1");
        assert_eq!(decoded.ruleset.to_domain().unwrap(), rs);
    }

    #[test]
    fn value_variants_roundtrip() {
        for value in [
            Value::String("x".into()),
            Value::String(String::new()),
            Value::Bool(true),
            Value::Bool(false),
            Value::Int64(0),
            Value::Int64(-42),
            Value::Int64(i64::MAX),
            Value::Float64(0.0),
            Value::Float64(-2.5),
        ] {
            let record = ValueRecord::from_domain(&value);
            let decoded = ValueRecord::decode(&record.encode()).unwrap();
            assert_eq!(decoded.to_domain(), value, "{value:?}");
        }
    }

    #[test]
    fn signature_roundtrip_is_canonical() {
        let sig = Signature::of(&sample_ruleset()).unwrap();
        let record = SignatureRecord::from_domain(&sig);
        let bytes = record.encode();
        let decoded = SignatureRecord::decode(&bytes).unwrap();
        assert_eq!(decoded.to_domain(), sig);
        // Re-encoding a decoded record is stable.
        assert_eq!(decoded.encode(), bytes);
    }

    #[test]
    fn versions_roundtrip() {
        let record = VersionsRecord {
            versions: vec!["v1".into(), "v2".into(), "v3".into()],
            unknown: Vec::new(),
        };
        let decoded = VersionsRecord::decode(&record.encode()).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn empty_versions_decode() {
        let decoded = VersionsRecord::decode(&[]).unwrap();
        assert!(decoded.versions.is_empty());
    }

    // -----------------------------------------------------------------------
    // Unknown-field preservation
    // -----------------------------------------------------------------------

    #[test]
    fn entry_preserves_unknown_fields_byte_for_byte() {
        let mut bytes = EntryRecord::from_domain("a", "v1", &sample_ruleset()).encode();
        // A future writer appends field 15 (varint) and field 16 (bytes).
        put_unknown_uint(&mut bytes, 15, 7);
        put_unknown_bytes(&mut bytes, 16, b"future");

        let decoded = EntryRecord::decode(&bytes).unwrap();
        assert!(!decoded.unknown.is_empty());
        assert_eq!(decoded.encode(), bytes);
    }

    #[test]
    fn signature_preserves_unknown_fields_byte_for_byte() {
        let sig = Signature::of(&sample_ruleset()).unwrap();
        let mut bytes = SignatureRecord::from_domain(&sig).encode();
        put_unknown_uint(&mut bytes, 9, 123456);

        let decoded = SignatureRecord::decode(&bytes).unwrap();
        assert_eq!(decoded.encode(), bytes);
        // The known part still decodes to the same signature.
        assert_eq!(decoded.to_domain(), sig);
    }

    #[test]
    fn versions_preserve_unknown_fields_across_append() {
        let mut bytes = VersionsRecord {
            versions: vec!["v1".into()],
            unknown: Vec::new(),
        }
        .encode();
        put_unknown_uint(&mut bytes, 8, 99);

        // An older reader appends a version and rewrites the record, the way
        // the put transaction does.
        let mut record = VersionsRecord::decode(&bytes).unwrap();
        record.versions.push("v2".into());
        let rewritten = record.encode();

        let reread = VersionsRecord::decode(&rewritten).unwrap();
        assert_eq!(reread.versions, vec!["v1".to_string(), "v2".to_string()]);
        assert!(!reread.unknown.is_empty());
        // The unknown payload is still the exact bytes the future writer wrote.
        let mut expected_unknown = Vec::new();
        put_unknown_uint(&mut expected_unknown, 8, 99);
        assert_eq!(reread.unknown, expected_unknown);
    }

    #[test]
    fn nested_unknown_fields_survive() {
        let rs = Ruleset::new(vec![Rule::fallback(Expr::bool_value(true))]);
        let mut rule_bytes = RuleRecord::from_domain(&rs.rules[0]).encode();
        put_unknown_uint(&mut rule_bytes, 7, 1);

        let decoded = RuleRecord::decode(&rule_bytes).unwrap();
        assert_eq!(decoded.encode(), rule_bytes);
    }

    // -----------------------------------------------------------------------
    // Decode failures
    // -----------------------------------------------------------------------

    #[test]
    fn empty_expr_is_malformed() {
        assert_eq!(
            ExprRecord::decode(&[]).unwrap_err(),
            WireError::Malformed("expr")
        );
    }

    #[test]
    fn unknown_operator_code_rejected() {
        let mut buf = Vec::new();
        put_unknown_uint(&mut buf, 1, 42); // operator kind 42 does not exist
        assert_eq!(
            OpRecord::decode(&buf).unwrap_err(),
            WireError::InvalidEnum {
                what: "operator",
                code: 42
            }
        );
    }

    #[test]
    fn unknown_type_code_rejected() {
        let mut buf = Vec::new();
        put_unknown_uint(&mut buf, 1, 9);
        assert_eq!(
            SignatureRecord::decode(&buf).unwrap_err(),
            WireError::InvalidEnum {
                what: "return type",
                code: 9
            }
        );
    }

    #[test]
    fn not_operator_requires_one_operand() {
        let record = OpRecord {
            kind: OpKind::Not,
            operands: vec![],
            unknown: Vec::new(),
        };
        let expr = ExprRecord {
            node: ExprNode::Op(record),
            unknown: Vec::new(),
        };
        assert_eq!(
            expr.to_domain().unwrap_err(),
            WireError::Malformed("not operator")
        );
    }

    #[test]
    fn truncated_entry_rejected() {
        let bytes = EntryRecord::from_domain("a", "v1", &sample_ruleset()).encode();
        assert!(EntryRecord::decode(&bytes[..bytes.len() - 3]).is_err());
    }

    // -----------------------------------------------------------------------
    // Properties
    // -----------------------------------------------------------------------

    proptest! {
        #[test]
        fn versions_roundtrip_any_list(versions in proptest::collection::vec("[0-9A-Za-z]{1,27}", 0..16)) {
            let record = VersionsRecord { versions, unknown: Vec::new() };
            let decoded = VersionsRecord::decode(&record.encode()).unwrap();
            prop_assert_eq!(decoded, record);
        }

        #[test]
        fn int64_values_roundtrip(v in any::<i64>()) {
            let record = ValueRecord::from_domain(&Value::Int64(v));
            let decoded = ValueRecord::decode(&record.encode()).unwrap();
            prop_assert_eq!(decoded.to_domain(), Value::Int64(v));
        }
    }
}
