use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::KvResult;
use crate::types::{CommitRequest, CommitResponse, RangeRequest, RangeResponse, WatchBatch};

/// An ordered, strongly-consistent key-value backend.
///
/// All implementations must satisfy these invariants:
/// - Keys are ordered lexicographically by raw bytes.
/// - A single global revision advances by exactly one per committed write
///   batch; every key written by one batch shares that revision.
/// - `multi_range` evaluates all requests against one snapshot — no torn
///   reads across the requests.
/// - `commit` is atomic: either every compare holds and every put applies,
///   or nothing is written.
/// - `watch` delivers committed batches in commit order, each exactly once
///   for a given start revision.
#[async_trait]
pub trait Kv: Send + Sync {
    /// Read a range of keys.
    async fn range(&self, req: RangeRequest) -> KvResult<RangeResponse>;

    /// Read several ranges at one consistent revision.
    async fn multi_range(&self, reqs: Vec<RangeRequest>) -> KvResult<Vec<RangeResponse>>;

    /// Atomically apply a guarded write batch.
    async fn commit(&self, req: CommitRequest) -> KvResult<CommitResponse>;

    /// Long-poll for the next committed batch containing at least one key
    /// under `prefix`.
    ///
    /// With `start_revision = Some(r)`, replays the earliest matching batch
    /// whose revision is `>= r` before blocking for live events; with
    /// `None`, only future commits are observed. Returns
    /// [`KvError::Cancelled`](crate::KvError::Cancelled) when `cancel` fires
    /// first.
    async fn watch(
        &self,
        prefix: &str,
        start_revision: Option<i64>,
        cancel: &CancellationToken,
    ) -> KvResult<WatchBatch>;
}
