//! Versioned ruleset store over an ordered key-value backend.
//!
//! [`RulesetService`] persists rulesets under a configurable namespace in a
//! strongly-consistent KV store and exposes the full store contract:
//!
//! - [`put`](RulesetService::put) — atomic, idempotent insertion of a new
//!   version (signature gate, checksum gate, version mint, pointer swap)
//! - [`get`](RulesetService::get), [`latest`](RulesetService::latest),
//!   [`one_by_version`](RulesetService::one_by_version) — point lookups
//! - [`list`](RulesetService::list) — paginated listings in three modes
//! - [`watch`](RulesetService::watch) — long-poll prefix watch with a
//!   resumable revision cursor
//! - [`eval`](RulesetService::eval),
//!   [`eval_version`](RulesetService::eval_version) — fetch-and-evaluate
//!
//! The persisted layout and wire format live in [`keys`] and [`codec`]; both
//! are part of the on-disk contract.

pub mod codec;
pub mod config;
pub mod error;
pub mod keys;
pub mod types;
pub mod validate;

mod eval;
mod list;
mod put;
mod read;
mod service;
mod watch;


pub use config::{StoreConfig, MAX_LIST_LIMIT};
pub use error::{StoreError, StoreResult};
pub use keys::{Keyspace, VERSION_SEPARATOR};
pub use service::RulesetService;
pub use types::{
    EvalResult, ListOptions, PutOutcome, RulesetEntries, RulesetEntry, RulesetEvent,
    RulesetEventKind, RulesetEvents,
};
