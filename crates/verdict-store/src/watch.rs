//! Prefix watch with a resumable revision cursor.
//!
//! One call returns one committed batch — a long-poll contract. Continuous
//! streaming is the caller's loop: feed each returned revision back in and
//! call again. This keeps cursor management explicit and testable.

use tokio_util::sync::CancellationToken;
use tracing::debug;
use verdict_kv::{EventKind, KvError};

use crate::error::{StoreError, StoreResult};
use crate::service::RulesetService;
use crate::types::{RulesetEvent, RulesetEventKind, RulesetEvents};

impl RulesetService {
    /// Block until a batch of changes lands under `prefix`, then return it.
    ///
    /// When `revision` parses as a positive integer the watch starts right
    /// after it, replaying any batch committed since; otherwise it starts at
    /// "now". The returned revision comes from the batch header, so feeding
    /// it back (callers pass it verbatim) observes each later commit exactly
    /// once.
    ///
    /// Cancellation is not a failure: the result carries `timeout = true`,
    /// no events, and the caller's own revision, so an intentional stop is
    /// distinguishable from a transport error.
    pub async fn watch(
        &self,
        prefix: &str,
        revision: &str,
        cancel: &CancellationToken,
    ) -> StoreResult<RulesetEvents> {
        let mut start = revision
            .parse::<i64>()
            .ok()
            .filter(|r| *r > 0)
            .map(|r| r + 1);
        let watch_prefix = format!("{}{prefix}", self.keys.entries_root());

        loop {
            let batch = match self.kv.watch(&watch_prefix, start, cancel).await {
                Ok(batch) => batch,
                Err(KvError::Cancelled) => {
                    return Ok(RulesetEvents {
                        events: Vec::new(),
                        revision: revision.to_string(),
                        timeout: true,
                    });
                }
                Err(source) => {
                    return Err(StoreError::Kv {
                        action: "failed to watch prefix",
                        source,
                    });
                }
            };

            let mut events = Vec::with_capacity(batch.events.len());
            for event in &batch.events {
                match event.kind {
                    EventKind::Put => {}
                    other => {
                        debug!(kind = ?other, key = %event.kv.key, "watch: ignoring event kind");
                        continue;
                    }
                }

                // A single undecodable event poisons the whole batch; a
                // partial batch would silently skip committed changes.
                let entry = self.decode_entry(&event.kv.value)?;
                events.push(RulesetEvent {
                    kind: RulesetEventKind::Put,
                    path: entry.path,
                    version: entry.version,
                    ruleset: entry.ruleset,
                });
            }

            if events.is_empty() {
                // Every event in the batch was skipped; resume after it.
                start = Some(batch.revision + 1);
                continue;
            }

            return Ok(RulesetEvents {
                events,
                // The cursor comes from the batch header, not from any
                // individual event.
                revision: batch.revision.to_string(),
                timeout: false,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use verdict_kv::MemoryKv;
    use verdict_rule::{Expr, Rule, Ruleset};

    use super::*;
    use crate::config::StoreConfig;

    fn service() -> Arc<RulesetService> {
        Arc::new(RulesetService::new(
            Arc::new(MemoryKv::new()),
            StoreConfig::new("t"),
        ))
    }

    fn ruleset(result: &str) -> Ruleset {
        Ruleset::new(vec![Rule::fallback(Expr::string_value(result))])
    }

    #[tokio::test]
    async fn watch_observes_live_put() {
        let svc = service();
        let cancel = CancellationToken::new();

        let watcher = {
            let svc = Arc::clone(&svc);
            let cancel = cancel.clone();
            tokio::spawn(async move { svc.watch("", "0", &cancel).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        let (entry, _) = svc.put("x", &ruleset("v")).await.unwrap();

        let events = watcher.await.unwrap().unwrap();
        assert!(!events.timeout);
        assert_eq!(events.events.len(), 1);
        assert_eq!(events.events[0].kind, RulesetEventKind::Put);
        assert_eq!(events.events[0].path, "x");
        assert_eq!(events.events[0].version, entry.version);
        // The put commit advanced the revision past the pre-put state.
        assert!(events.revision.parse::<i64>().unwrap() > 0);
    }

    #[tokio::test]
    async fn watch_resumes_from_listing_revision() {
        let svc = service();
        let cancel = CancellationToken::new();

        svc.put("a", &ruleset("one")).await.unwrap();
        let page = svc
            .list("", &crate::types::ListOptions::default())
            .await
            .unwrap();

        // This put happens "after" the listing; resuming from the listing
        // revision must deliver it even though the watch starts later.
        let (entry, _) = svc.put("b", &ruleset("two")).await.unwrap();

        let events = svc.watch("", &page.revision, &cancel).await.unwrap();
        assert_eq!(events.events.len(), 1);
        assert_eq!(events.events[0].path, "b");
        assert_eq!(events.events[0].version, entry.version);
    }

    #[tokio::test]
    async fn watch_sees_each_put_exactly_once_across_calls() {
        let svc = service();
        let cancel = CancellationToken::new();

        svc.put("a", &ruleset("1")).await.unwrap();
        svc.put("b", &ruleset("2")).await.unwrap();
        svc.put("c", &ruleset("3")).await.unwrap();

        let mut cursor = "0".to_string();
        let mut seen = Vec::new();
        for _ in 0..3 {
            let events = svc.watch("", &cursor, &cancel).await.unwrap();
            for ev in &events.events {
                seen.push(ev.path.clone());
            }
            cursor = events.revision;
        }
        assert_eq!(seen, ["a", "b", "c"]);
    }

    #[tokio::test]
    async fn watch_prefix_scoping() {
        let svc = service();
        let cancel = CancellationToken::new();

        let watcher = {
            let svc = Arc::clone(&svc);
            let cancel = cancel.clone();
            tokio::spawn(async move { svc.watch("billing/", "", &cancel).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        svc.put("pricing/base", &ruleset("no")).await.unwrap();
        svc.put("billing/discount", &ruleset("yes")).await.unwrap();

        let events = watcher.await.unwrap().unwrap();
        assert_eq!(events.events.len(), 1);
        assert_eq!(events.events[0].path, "billing/discount");
    }

    #[tokio::test]
    async fn cancellation_sets_timeout() {
        let svc = service();
        let cancel = CancellationToken::new();

        let watcher = {
            let svc = Arc::clone(&svc);
            let cancel = cancel.clone();
            tokio::spawn(async move { svc.watch("", "7", &cancel).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        cancel.cancel();

        let events = watcher.await.unwrap().unwrap();
        assert!(events.timeout);
        assert!(events.events.is_empty());
        // The caller's cursor is handed back untouched.
        assert_eq!(events.revision, "7");
    }

    #[tokio::test]
    async fn non_numeric_revision_watches_from_now() {
        let svc = service();
        let cancel = CancellationToken::new();

        // This put precedes the watch; "now" semantics must not replay it.
        svc.put("old", &ruleset("past")).await.unwrap();

        let watcher = {
            let svc = Arc::clone(&svc);
            let cancel = cancel.clone();
            tokio::spawn(async move { svc.watch("", "not-a-number", &cancel).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        svc.put("new", &ruleset("present")).await.unwrap();

        let events = watcher.await.unwrap().unwrap();
        assert_eq!(events.events.len(), 1);
        assert_eq!(events.events[0].path, "new");
    }
}
