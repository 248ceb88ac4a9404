//! Software-transactional-memory helper.
//!
//! [`Stm`] gives a transaction body the read-your-writes view it expects
//! while recording the mod-revision of every key it reads. [`Stm::commit`]
//! turns the read set into compares and the write buffer into puts, and
//! submits them as one guarded batch: if any read key changed since it was
//! read, the commit is rejected and the caller re-runs the body.

use std::collections::{BTreeMap, HashMap};

use crate::error::KvResult;
use crate::traits::Kv;
use crate::types::{CommitRequest, Compare, PutRequest, RangeRequest};

/// One optimistic transaction attempt over a [`Kv`] backend.
pub struct Stm<'a> {
    kv: &'a dyn Kv,
    /// Key -> mod_revision observed on first read (0 for absent keys).
    reads: HashMap<String, i64>,
    /// Cached values so repeated reads inside one attempt are stable.
    cache: HashMap<String, Option<Vec<u8>>>,
    /// Buffered writes, applied only on a successful commit.
    writes: BTreeMap<String, Vec<u8>>,
}

impl<'a> Stm<'a> {
    pub fn new(kv: &'a dyn Kv) -> Self {
        Self {
            kv,
            reads: HashMap::new(),
            cache: HashMap::new(),
            writes: BTreeMap::new(),
        }
    }

    /// Read a key. Buffered writes shadow the backend; the first backend
    /// read of each key records its revision for the commit guard.
    pub async fn get(&mut self, key: &str) -> KvResult<Option<Vec<u8>>> {
        if let Some(value) = self.writes.get(key) {
            return Ok(Some(value.clone()));
        }
        if let Some(value) = self.cache.get(key) {
            return Ok(value.clone());
        }

        let resp = self.kv.range(RangeRequest::single(key)).await?;
        let (value, revision) = match resp.kvs.into_iter().next() {
            Some(kv) => (Some(kv.value), kv.mod_revision),
            None => (None, 0),
        };
        self.reads.insert(key.to_string(), revision);
        self.cache.insert(key.to_string(), value.clone());
        Ok(value)
    }

    /// Buffer a write.
    pub fn put(&mut self, key: impl Into<String>, value: Vec<u8>) {
        self.writes.insert(key.into(), value);
    }

    pub fn has_writes(&self) -> bool {
        !self.writes.is_empty()
    }

    /// Attempt to commit the buffered writes.
    ///
    /// Returns `Some(revision)` on success and `None` when another writer
    /// invalidated the read set (the transaction must be retried).
    pub async fn commit(self) -> KvResult<Option<i64>> {
        let compares = self
            .reads
            .into_iter()
            .map(|(key, mod_revision)| Compare { key, mod_revision })
            .collect();
        let puts = self
            .writes
            .into_iter()
            .map(|(key, value)| PutRequest { key, value })
            .collect();

        let resp = self.kv.commit(CommitRequest { compares, puts }).await?;
        Ok(resp.succeeded.then_some(resp.revision))
    }
}
