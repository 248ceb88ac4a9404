use std::sync::Arc;

use tracing::debug;
use verdict_kv::Kv;

use crate::codec::EntryRecord;
use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::keys::Keyspace;
use crate::types::RulesetEntry;

/// The ruleset store.
///
/// Holds a KV backend, a namespace, and a configuration; every piece of
/// state lives in the backend. All operations are safe to invoke
/// concurrently.
pub struct RulesetService {
    pub(crate) kv: Arc<dyn Kv>,
    pub(crate) keys: Keyspace,
    pub(crate) config: StoreConfig,
}

impl RulesetService {
    pub fn new(kv: Arc<dyn Kv>, config: StoreConfig) -> Self {
        let keys = Keyspace::new(config.namespace.clone());
        Self { kv, keys, config }
    }

    /// The keyspace this service owns. Exposed for tooling and tests.
    pub fn keyspace(&self) -> &Keyspace {
        &self.keys
    }

    /// Decode an entry value, logging the offending bytes on failure.
    pub(crate) fn decode_entry(&self, raw: &[u8]) -> StoreResult<RulesetEntry> {
        let record = EntryRecord::decode(raw).map_err(|source| {
            debug!(entry = %hex::encode(raw), "entry decoding failed");
            StoreError::Decode {
                entity: "entry",
                source,
            }
        })?;
        let ruleset = record.ruleset.to_domain().map_err(|source| {
            debug!(entry = %hex::encode(raw), "ruleset decoding failed");
            StoreError::Decode {
                entity: "entry",
                source,
            }
        })?;
        Ok(RulesetEntry {
            path: record.path,
            version: record.version,
            ruleset,
            signature: None,
            versions: Vec::new(),
        })
    }
}
