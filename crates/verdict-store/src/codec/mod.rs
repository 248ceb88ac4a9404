//! Persisted record codec.
//!
//! Values written to the KV store use a protobuf-compatible wire format:
//! varint tags, varint and fixed64 scalars, and length-delimited nesting.
//! The format is hand-rolled rather than generated because the store must
//! keep fields it does not recognise: a record written by a newer writer and
//! rewritten by an older reader round-trips byte-for-byte, unknown fields
//! included.
//!
//! - [`wire`] — low-level varint/tag/field primitives
//! - [`records`] — the persisted record types and their domain conversions

pub mod records;
pub mod wire;

pub use records::{
    EntryRecord, ExprNode, ExprRecord, OpKind, OpRecord, ParamRecord, RuleRecord, RulesetRecord,
    SignatureRecord, ValueNode, ValueRecord, VersionsRecord,
};
pub use wire::WireError;
