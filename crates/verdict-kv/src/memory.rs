//! In-memory KV backend for tests and embedding.
//!
//! [`MemoryKv`] keeps all keys in a `BTreeMap` behind a `RwLock`, assigns
//! revisions from a single counter, and retains every committed batch in an
//! in-memory log so watches can resume from a past revision. Live watchers
//! are fanned out over a `tokio::sync::broadcast` channel.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::RwLock;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{KvError, KvResult};
use crate::traits::Kv;
use crate::types::{
    CommitRequest, CommitResponse, Event, EventKind, KeyValue, Order, RangeEnd, RangeRequest,
    RangeResponse, WatchBatch,
};

#[derive(Clone)]
struct Stored {
    value: Vec<u8>,
    create_revision: i64,
    mod_revision: i64,
}

struct Inner {
    map: BTreeMap<String, Stored>,
    revision: i64,
    /// Every committed batch, in commit order. Never compacted; acceptable
    /// for an in-memory backend whose lifetime is a test or a session.
    log: Vec<WatchBatch>,
}

/// An in-memory implementation of [`Kv`].
pub struct MemoryKv {
    inner: RwLock<Inner>,
    notify: broadcast::Sender<WatchBatch>,
}

impl MemoryKv {
    pub fn new() -> Self {
        let (notify, _) = broadcast::channel(1024);
        Self {
            inner: RwLock::new(Inner {
                map: BTreeMap::new(),
                revision: 0,
                log: Vec::new(),
            }),
            notify,
        }
    }

    /// Current store revision.
    pub fn revision(&self) -> i64 {
        self.inner.read().expect("lock poisoned").revision
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.inner.read().expect("lock poisoned").map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().expect("lock poisoned").map.is_empty()
    }

    /// Sorted dump of every key and value. Intended for asserting that a
    /// failed operation left the store untouched.
    pub fn dump(&self) -> Vec<(String, Vec<u8>)> {
        let inner = self.inner.read().expect("lock poisoned");
        inner
            .map
            .iter()
            .map(|(k, s)| (k.clone(), s.value.clone()))
            .collect()
    }

    fn eval_range(inner: &Inner, req: &RangeRequest) -> RangeResponse {
        let mut kvs: Vec<KeyValue> = match &req.end {
            RangeEnd::Single => inner
                .map
                .get(&req.start)
                .map(|s| to_kv(&req.start, s))
                .into_iter()
                .collect(),
            RangeEnd::Key(end) => inner
                .map
                .range::<str, _>((
                    Bound::Included(req.start.as_str()),
                    Bound::Excluded(end.as_str()),
                ))
                .map(|(k, s)| to_kv(k, s))
                .collect(),
            RangeEnd::Open => inner
                .map
                .range::<str, _>((Bound::Included(req.start.as_str()), Bound::Unbounded))
                .map(|(k, s)| to_kv(k, s))
                .collect(),
        };

        let count = kvs.len();
        if req.order == Order::Desc {
            kvs.reverse();
        }
        let more = req.limit > 0 && count > req.limit;
        if more {
            kvs.truncate(req.limit);
        }
        if req.keys_only {
            for kv in &mut kvs {
                kv.value.clear();
            }
        }

        RangeResponse {
            kvs,
            count,
            more,
            revision: inner.revision,
        }
    }
}

fn to_kv(key: &str, stored: &Stored) -> KeyValue {
    KeyValue {
        key: key.to_string(),
        value: stored.value.clone(),
        create_revision: stored.create_revision,
        mod_revision: stored.mod_revision,
    }
}

impl Default for MemoryKv {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Kv for MemoryKv {
    async fn range(&self, req: RangeRequest) -> KvResult<RangeResponse> {
        let inner = self.inner.read().expect("lock poisoned");
        Ok(Self::eval_range(&inner, &req))
    }

    async fn multi_range(&self, reqs: Vec<RangeRequest>) -> KvResult<Vec<RangeResponse>> {
        let inner = self.inner.read().expect("lock poisoned");
        Ok(reqs.iter().map(|req| Self::eval_range(&inner, req)).collect())
    }

    async fn commit(&self, req: CommitRequest) -> KvResult<CommitResponse> {
        let batch = {
            let mut inner = self.inner.write().expect("lock poisoned");

            for cmp in &req.compares {
                let current = inner
                    .map
                    .get(&cmp.key)
                    .map(|s| s.mod_revision)
                    .unwrap_or(0);
                if current != cmp.mod_revision {
                    return Ok(CommitResponse {
                        succeeded: false,
                        revision: inner.revision,
                    });
                }
            }

            if req.puts.is_empty() {
                return Ok(CommitResponse {
                    succeeded: true,
                    revision: inner.revision,
                });
            }

            inner.revision += 1;
            let revision = inner.revision;
            let mut events = Vec::with_capacity(req.puts.len());
            for put in req.puts {
                let create_revision = inner
                    .map
                    .get(&put.key)
                    .map(|s| s.create_revision)
                    .unwrap_or(revision);
                inner.map.insert(
                    put.key.clone(),
                    Stored {
                        value: put.value.clone(),
                        create_revision,
                        mod_revision: revision,
                    },
                );
                events.push(Event {
                    kind: EventKind::Put,
                    kv: KeyValue {
                        key: put.key,
                        value: put.value,
                        create_revision,
                        mod_revision: revision,
                    },
                });
            }

            let batch = WatchBatch { events, revision };
            inner.log.push(batch.clone());
            batch
        };

        let revision = batch.revision;
        // Send failure just means nobody is watching right now.
        let _ = self.notify.send(batch);

        Ok(CommitResponse {
            succeeded: true,
            revision,
        })
    }

    async fn watch(
        &self,
        prefix: &str,
        start_revision: Option<i64>,
        cancel: &CancellationToken,
    ) -> KvResult<WatchBatch> {
        // Subscribe before scanning the log so a commit landing in between
        // is seen on one side or the other, never lost.
        let mut rx = self.notify.subscribe();

        if let Some(from) = start_revision {
            let replay = {
                let inner = self.inner.read().expect("lock poisoned");
                inner.log.iter().find_map(|batch| {
                    if batch.revision < from {
                        return None;
                    }
                    filter_batch(batch, prefix)
                })
            };
            if let Some(batch) = replay {
                return Ok(batch);
            }
        }

        loop {
            tokio::select! {
                _ = cancel.cancelled() => return Err(KvError::Cancelled),
                res = rx.recv() => match res {
                    Ok(batch) => {
                        if let Some(batch) = filter_batch(&batch, prefix) {
                            return Ok(batch);
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!(skipped, prefix, "watch receiver lagged");
                        return Err(KvError::Transient(format!(
                            "watch lagged behind by {skipped} batches"
                        )));
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        return Err(KvError::Transient("watch channel closed".to_string()));
                    }
                },
            }
        }
    }
}

/// Restrict a batch to the keys under `prefix`; `None` when nothing matches.
fn filter_batch(batch: &WatchBatch, prefix: &str) -> Option<WatchBatch> {
    let events: Vec<Event> = batch
        .events
        .iter()
        .filter(|e| e.kv.key.starts_with(prefix))
        .cloned()
        .collect();
    if events.is_empty() {
        None
    } else {
        Some(WatchBatch {
            events,
            revision: batch.revision,
        })
    }
}
