//! Point lookups.

use tracing::debug;
use verdict_kv::RangeRequest;

use crate::codec::{SignatureRecord, VersionsRecord};
use crate::error::{StoreError, StoreResult};
use crate::service::RulesetService;
use crate::types::RulesetEntry;

impl RulesetService {
    /// The latest entry at `path`, without signature or version list.
    ///
    /// A descending range over `entries/<path>!*` with a limit of one: the
    /// `!` separator sorts before `/`, so the last key under that prefix is
    /// always the newest version of `path` itself, never of a descendant.
    pub async fn latest(&self, path: &str) -> StoreResult<RulesetEntry> {
        if path.is_empty() {
            return Err(StoreError::NotFound);
        }

        let req = RangeRequest::prefix(self.keys.entry_versions_prefix(path))
            .descending()
            .with_limit(1);
        let resp = self
            .kv
            .range(req)
            .await
            .map_err(StoreError::from_kv("failed to fetch the entry"))?;

        match resp.kvs.first() {
            Some(kv) => self.decode_entry(&kv.value),
            None => Err(StoreError::NotFound),
        }
    }

    /// The entry at `(path, version)`, without signature or version list.
    pub async fn one_by_version(&self, path: &str, version: &str) -> StoreResult<RulesetEntry> {
        if path.is_empty() || version.is_empty() {
            return Err(StoreError::NotFound);
        }

        let resp = self
            .kv
            .range(RangeRequest::single(self.keys.entry(path, version)))
            .await
            .map_err(StoreError::from_kv("failed to fetch the entry"))?;

        match resp.kvs.first() {
            Some(kv) => self.decode_entry(&kv.value),
            None => Err(StoreError::NotFound),
        }
    }

    /// The entry at `path` (latest when `version` is empty), merged with its
    /// signature and full version list.
    ///
    /// The signature, version list, and entry are read in one consistent
    /// multi-range so a concurrent put cannot tear the three apart.
    pub async fn get(&self, path: &str, version: &str) -> StoreResult<RulesetEntry> {
        if path.is_empty() {
            return Err(StoreError::NotFound);
        }

        let entry_req = if version.is_empty() {
            RangeRequest::prefix(self.keys.entry_versions_prefix(path))
                .descending()
                .with_limit(1)
        } else {
            RangeRequest::single(self.keys.entry(path, version))
        };

        let reqs = vec![
            RangeRequest::single(self.keys.signatures(path)),
            RangeRequest::single(self.keys.versions(path)),
            entry_req,
        ];
        let mut resps = self
            .kv
            .multi_range(reqs)
            .await
            .map_err(StoreError::from_kv("failed to fetch ruleset"))?;
        let entry_resp = resps.pop().expect("three responses");
        let versions_resp = resps.pop().expect("three responses");
        let signature_resp = resps.pop().expect("three responses");

        let raw_signature = match signature_resp.kvs.first() {
            Some(kv) => &kv.value,
            None => {
                debug!(path, "cannot find ruleset signature");
                return Err(StoreError::NotFound);
            }
        };
        let signature = SignatureRecord::decode(raw_signature)
            .map_err(|source| {
                debug!(signature = %hex::encode(raw_signature), "signature decoding failed");
                StoreError::Decode {
                    entity: "signature",
                    source,
                }
            })?
            .to_domain();

        let raw_versions = match versions_resp.kvs.first() {
            Some(kv) => &kv.value,
            None => {
                debug!(path, "cannot find ruleset versions list");
                return Err(StoreError::NotFound);
            }
        };
        let versions = VersionsRecord::decode(raw_versions)
            .map_err(|source| StoreError::Decode {
                entity: "versions",
                source,
            })?
            .versions;

        let mut entry = match entry_resp.kvs.first() {
            Some(kv) => self.decode_entry(&kv.value)?,
            None => return Err(StoreError::NotFound),
        };
        entry.signature = Some(signature);
        entry.versions = versions;
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use verdict_kv::MemoryKv;
    use verdict_rule::{Expr, Rule, Ruleset};
    use verdict_types::Type;

    use super::*;
    use crate::config::StoreConfig;

    fn service() -> RulesetService {
        RulesetService::new(Arc::new(MemoryKv::new()), StoreConfig::new("t"))
    }

    fn ruleset(result: &str) -> Ruleset {
        Ruleset::new(vec![Rule::fallback(Expr::string_value(result))])
    }

    #[tokio::test]
    async fn latest_returns_newest_version() {
        let svc = service();
        svc.put("a", &ruleset("one")).await.unwrap();
        let (v2, _) = svc.put("a", &ruleset("two")).await.unwrap();

        let entry = svc.latest("a").await.unwrap();
        assert_eq!(entry.version, v2.version);
        assert_eq!(entry.ruleset, ruleset("two"));
        // Point reads stay lean.
        assert!(entry.signature.is_none());
        assert!(entry.versions.is_empty());
    }

    #[tokio::test]
    async fn latest_ignores_descendant_paths() {
        let svc = service();
        svc.put("a", &ruleset("parent")).await.unwrap();
        svc.put("a/b", &ruleset("child")).await.unwrap();

        let entry = svc.latest("a").await.unwrap();
        assert_eq!(entry.path, "a");
        assert_eq!(entry.ruleset, ruleset("parent"));
    }

    #[tokio::test]
    async fn latest_missing_path() {
        let svc = service();
        assert!(matches!(
            svc.latest("nope").await.unwrap_err(),
            StoreError::NotFound
        ));
        assert!(matches!(
            svc.latest("").await.unwrap_err(),
            StoreError::NotFound
        ));
    }

    #[tokio::test]
    async fn one_by_version_point_read() {
        let svc = service();
        let (v1, _) = svc.put("a", &ruleset("one")).await.unwrap();
        svc.put("a", &ruleset("two")).await.unwrap();

        let entry = svc.one_by_version("a", &v1.version).await.unwrap();
        assert_eq!(entry.ruleset, ruleset("one"));

        assert!(matches!(
            svc.one_by_version("a", "missing").await.unwrap_err(),
            StoreError::NotFound
        ));
    }

    #[tokio::test]
    async fn get_merges_signature_and_versions() {
        let svc = service();
        let (v1, _) = svc.put("a", &ruleset("one")).await.unwrap();
        let (v2, _) = svc.put("a", &ruleset("two")).await.unwrap();

        let entry = svc.get("a", "").await.unwrap();
        assert_eq!(entry.version, v2.version);
        assert_eq!(entry.versions, vec![v1.version.clone(), v2.version.clone()]);
        assert_eq!(entry.signature.unwrap().return_type, Type::String);

        let entry = svc.get("a", &v1.version).await.unwrap();
        assert_eq!(entry.version, v1.version);
        assert_eq!(entry.versions.len(), 2);
    }

    #[tokio::test]
    async fn get_missing_path() {
        let svc = service();
        assert!(matches!(
            svc.get("nope", "").await.unwrap_err(),
            StoreError::NotFound
        ));
    }

    #[tokio::test]
    async fn get_missing_version() {
        let svc = service();
        svc.put("a", &ruleset("one")).await.unwrap();
        assert!(matches!(
            svc.get("a", "no-such-version").await.unwrap_err(),
            StoreError::NotFound
        ));
    }
}
