//! Ordered, strongly-consistent key-value abstraction.
//!
//! This crate models the slice of an etcd-like store the ruleset service
//! needs: lexicographically ordered keys, a single global revision that
//! advances once per committed write transaction, consistent multi-range
//! reads, compare-and-swap commits, and resumable prefix watches.
//!
//! - [`Kv`] — the backend trait
//! - [`MemoryKv`] — in-memory backend for tests and embedding
//! - [`Stm`] — software-transactional-memory helper: tracks the revision of
//!   every key read, buffers writes, and commits them behind a compare on
//!   the whole read set

pub mod error;
pub mod memory;
pub mod stm;
pub mod traits;
pub mod types;

pub use error::{KvError, KvResult};
pub use memory::MemoryKv;
pub use stm::Stm;
pub use traits::Kv;
pub use types::{
    prefix_range_end, CommitRequest, CommitResponse, Compare, Event, EventKind, KeyValue, Order,
    PutRequest, RangeEnd, RangeRequest, RangeResponse, WatchBatch,
};
