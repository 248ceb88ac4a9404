//! Paginated listings.
//!
//! Three modes over a path prefix: paths only (cheap, keys-only scan of the
//! latest pointers), latest versions (pointer scan plus one batched read of
//! the pointed-at entries), and all versions (raw scan of the entries tree).
//! Pages are resumed with an opaque continue token: URL-safe base64 of the
//! last key's suffix plus a trailing `0x00`, which restarts the scan
//! immediately after that key.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use tracing::debug;
use verdict_kv::{RangeRequest, RangeResponse};
use verdict_rule::Ruleset;

use crate::error::{StoreError, StoreResult};
use crate::service::RulesetService;
use crate::types::{ListOptions, RulesetEntries, RulesetEntry};

fn encode_token(raw: String) -> String {
    URL_SAFE_NO_PAD.encode(raw.as_bytes())
}

fn decode_token(token: &str) -> StoreResult<String> {
    let bytes = URL_SAFE_NO_PAD
        .decode(token)
        .map_err(|_| StoreError::InvalidContinueToken)?;
    String::from_utf8(bytes).map_err(|_| StoreError::InvalidContinueToken)
}

impl RulesetService {
    /// List rulesets under `prefix`.
    ///
    /// An empty prefix lists the whole store (and an empty store is an empty
    /// result); a non-empty prefix that matches nothing is `NotFound`. The
    /// returned revision allows a subsequent watch to resume precisely.
    pub async fn list(&self, prefix: &str, opts: &ListOptions) -> StoreResult<RulesetEntries> {
        let limit = self.config.resolve_limit(opts.limit);
        if opts.paths_only {
            self.list_paths_only(prefix, opts, limit).await
        } else if opts.all_versions {
            self.list_all_versions(prefix, opts, limit).await
        } else {
            self.list_latest(prefix, opts, limit).await
        }
    }

    /// Build the page's range: full prefix range for the first page, resumed
    /// just past the token's key for later pages.
    fn page_range(
        &self,
        family_root: &str,
        prefix: &str,
        token: &Option<String>,
        limit: usize,
    ) -> StoreResult<RangeRequest> {
        let req = RangeRequest::prefix(format!("{family_root}{prefix}")).with_limit(limit);
        match token {
            Some(token) => {
                let resume = decode_token(token)?;
                Ok(req.starting_at(format!("{family_root}{resume}")))
            }
            None => Ok(req),
        }
    }

    fn empty_prefix_result(resp: &RangeResponse, prefix: &str) -> Option<StoreError> {
        // A non-empty prefix that yields nothing does not exist.
        if resp.kvs.is_empty() && !prefix.is_empty() {
            Some(StoreError::NotFound)
        } else {
            None
        }
    }

    async fn list_paths_only(
        &self,
        prefix: &str,
        opts: &ListOptions,
        limit: usize,
    ) -> StoreResult<RulesetEntries> {
        let req = self
            .page_range(&self.keys.latest_root(), prefix, &opts.continue_token, limit)?
            .keys_only();
        let resp = self
            .kv
            .range(req)
            .await
            .map_err(StoreError::from_kv("failed to fetch all entries"))?;
        if let Some(err) = Self::empty_prefix_result(&resp, prefix) {
            return Err(err);
        }

        let root = self.keys.latest_root();
        let entries: Vec<RulesetEntry> = resp
            .kvs
            .iter()
            .map(|kv| RulesetEntry {
                path: kv.key.strip_prefix(&root).unwrap_or(&kv.key).to_string(),
                version: String::new(),
                ruleset: Ruleset::new(Vec::new()),
                signature: None,
                versions: Vec::new(),
            })
            .collect();

        Ok(Self::page(entries, &resp, limit, |last| {
            format!("{}\0", last.path)
        }))
    }

    async fn list_latest(
        &self,
        prefix: &str,
        opts: &ListOptions,
        limit: usize,
    ) -> StoreResult<RulesetEntries> {
        let req = self.page_range(&self.keys.latest_root(), prefix, &opts.continue_token, limit)?;
        let resp = self
            .kv
            .range(req)
            .await
            .map_err(StoreError::from_kv("failed to fetch latest keys"))?;
        if let Some(err) = Self::empty_prefix_result(&resp, prefix) {
            return Err(err);
        }

        // Resolve the pointers with one batched read so the page is a
        // consistent snapshot of entries.
        let mut pointer_reqs = Vec::with_capacity(resp.kvs.len());
        for kv in &resp.kvs {
            let target = String::from_utf8(kv.value.clone()).map_err(|_| StoreError::Decode {
                entity: "latest pointer",
                source: crate::codec::WireError::InvalidUtf8 {
                    what: "latest pointer",
                },
            })?;
            pointer_reqs.push(RangeRequest::single(target));
        }
        let pointer_resps = self
            .kv
            .multi_range(pointer_reqs)
            .await
            .map_err(StoreError::from_kv("transaction failed to fetch all entries"))?;

        let mut entries = Vec::with_capacity(pointer_resps.len());
        for presp in &pointer_resps {
            // Entries are immutable, so a pointer target always exists.
            let kv = presp.kvs.first().ok_or(StoreError::NotFound)?;
            entries.push(self.decode_entry(&kv.value)?);
        }

        Ok(Self::page(entries, &resp, limit, |last| {
            format!("{}\0", last.path)
        }))
    }

    async fn list_all_versions(
        &self,
        prefix: &str,
        opts: &ListOptions,
        limit: usize,
    ) -> StoreResult<RulesetEntries> {
        let req =
            self.page_range(&self.keys.entries_root(), prefix, &opts.continue_token, limit)?;
        let resp = self
            .kv
            .range(req)
            .await
            .map_err(StoreError::from_kv("failed to fetch all entries"))?;
        if let Some(err) = Self::empty_prefix_result(&resp, prefix) {
            return Err(err);
        }

        let mut entries = Vec::with_capacity(resp.kvs.len());
        for kv in &resp.kvs {
            entries.push(self.decode_entry(&kv.value)?);
        }

        Ok(Self::page(entries, &resp, limit, |last| {
            format!(
                "{}{}{}\0",
                last.path,
                crate::keys::VERSION_SEPARATOR,
                last.version
            )
        }))
    }

    /// Assemble a page, minting a continue token when the range was cut
    /// short by the limit.
    fn page(
        entries: Vec<RulesetEntry>,
        resp: &RangeResponse,
        limit: usize,
        token_suffix: impl Fn(&RulesetEntry) -> String,
    ) -> RulesetEntries {
        let continue_token = if entries.len() < limit || !resp.more {
            None
        } else {
            entries.last().map(|last| {
                let token = encode_token(token_suffix(last));
                debug!(last_path = %last.path, "listing page truncated, continue token minted");
                token
            })
        };

        RulesetEntries {
            entries,
            revision: resp.revision.to_string(),
            continue_token,
        }
    }
}
