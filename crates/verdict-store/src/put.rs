//! The transactional writer.
//!
//! `put` inserts a new ruleset version atomically: checksum gate (idempotent
//! re-puts), signature gate (the first version establishes the contract,
//! later ones must satisfy it), version mint, version-list append, entry
//! write, latest-pointer swap. Everything runs inside one optimistic
//! transaction; a conflicting writer causes a bounded retry.

use md5::{Digest, Md5};
use svix_ksuid::{Ksuid, KsuidLike};
use tracing::debug;
use verdict_kv::{KvError, Stm};
use verdict_rule::{Ruleset, Signature};

use crate::codec::{EntryRecord, RulesetRecord, SignatureRecord, VersionsRecord};
use crate::error::{StoreError, StoreResult};
use crate::service::RulesetService;
use crate::types::{PutOutcome, RulesetEntry};
use crate::validate::validate_put;

/// Upper bound on optimistic transaction retries.
const MAX_TXN_ATTEMPTS: usize = 64;

const PUT_ACTION: &str = "failed to put ruleset";

enum Attempt {
    Unchanged(RulesetEntry),
    Write { entry: RulesetEntry, created: bool },
}

impl RulesetService {
    /// Store `ruleset` as a new version of `path`.
    ///
    /// Returns the written (or, for an identical body, the existing latest)
    /// entry together with what happened. The checksum is computed over the
    /// canonical binary encoding of the body, so transport-level formatting
    /// differences cannot mint spurious versions.
    pub async fn put(
        &self,
        path: &str,
        ruleset: &Ruleset,
    ) -> StoreResult<(RulesetEntry, PutOutcome)> {
        validate_put(path, ruleset)?;
        let signature = Signature::of(ruleset)?;
        let checksum = Md5::digest(RulesetRecord::from_domain(ruleset).encode()).to_vec();

        for attempt in 1..=MAX_TXN_ATTEMPTS {
            let mut stm = Stm::new(self.kv.as_ref());
            match self
                .try_put(&mut stm, path, ruleset, &signature, &checksum)
                .await?
            {
                // A checksum hit is a pure read; committing nothing keeps
                // the store revision where it was.
                Attempt::Unchanged(entry) => return Ok((entry, PutOutcome::Unchanged)),
                Attempt::Write { entry, created } => {
                    let committed = stm
                        .commit()
                        .await
                        .map_err(StoreError::from_kv(PUT_ACTION))?;
                    match committed {
                        Some(_) => {
                            let outcome = if created {
                                PutOutcome::Created
                            } else {
                                PutOutcome::Amended
                            };
                            return Ok((entry, outcome));
                        }
                        None => {
                            debug!(path, attempt, "put transaction conflicted, retrying");
                        }
                    }
                }
            }
        }

        Err(StoreError::Kv {
            action: PUT_ACTION,
            source: KvError::Transient("transaction conflict retries exhausted".to_string()),
        })
    }

    /// One transaction attempt. Reads go through the STM so the commit is
    /// guarded against every key this body observed.
    async fn try_put(
        &self,
        stm: &mut Stm<'_>,
        path: &str,
        ruleset: &Ruleset,
        signature: &Signature,
        checksum: &[u8],
    ) -> StoreResult<Attempt> {
        let stored_checksum = stm
            .get(&self.keys.checksums(path))
            .await
            .map_err(StoreError::from_kv(PUT_ACTION))?;

        if stored_checksum.as_deref() == Some(checksum) {
            return self.resolve_unchanged(stm, path, signature).await;
        }

        let raw_signature = stm
            .get(&self.keys.signatures(path))
            .await
            .map_err(StoreError::from_kv(PUT_ACTION))?;
        let created = raw_signature.is_none();
        match raw_signature {
            Some(raw) => {
                let stored = SignatureRecord::decode(&raw)
                    .map_err(|source| {
                        debug!(signature = %hex::encode(&raw), "signature decoding failed");
                        StoreError::Decode {
                            entity: "signature",
                            source,
                        }
                    })?
                    .to_domain();
                stored.accepts(signature)?;
            }
            None => {
                stm.put(
                    self.keys.signatures(path),
                    SignatureRecord::from_domain(signature).encode(),
                );
            }
        }

        stm.put(self.keys.checksums(path), checksum.to_vec());

        let version = Ksuid::new(None, None).to_string();

        let mut versions = match stm
            .get(&self.keys.versions(path))
            .await
            .map_err(StoreError::from_kv(PUT_ACTION))?
        {
            Some(raw) => VersionsRecord::decode(&raw).map_err(|source| {
                debug!(path, "versions decoding failed");
                StoreError::Decode {
                    entity: "versions",
                    source,
                }
            })?,
            None => VersionsRecord::default(),
        };
        versions.versions.push(version.clone());
        stm.put(self.keys.versions(path), versions.encode());

        let entry_key = self.keys.entry(path, &version);
        stm.put(
            entry_key.clone(),
            EntryRecord::from_domain(path, &version, ruleset).encode(),
        );
        stm.put(self.keys.latest(path), entry_key.into_bytes());

        Ok(Attempt::Write {
            entry: RulesetEntry {
                path: path.to_string(),
                version,
                ruleset: ruleset.clone(),
                signature: Some(signature.clone()),
                versions: versions.versions,
            },
            created,
        })
    }

    /// The stored body is identical: resolve the current latest entry
    /// through the pointer and return it untouched.
    async fn resolve_unchanged(
        &self,
        stm: &mut Stm<'_>,
        path: &str,
        signature: &Signature,
    ) -> StoreResult<Attempt> {
        let pointer = stm
            .get(&self.keys.latest(path))
            .await
            .map_err(StoreError::from_kv(PUT_ACTION))?
            .ok_or(StoreError::NotFound)?;
        let entry_key = String::from_utf8(pointer).map_err(|_| StoreError::Decode {
            entity: "latest pointer",
            source: crate::codec::WireError::InvalidUtf8 {
                what: "latest pointer",
            },
        })?;

        let raw = stm
            .get(&entry_key)
            .await
            .map_err(StoreError::from_kv(PUT_ACTION))?
            .ok_or(StoreError::NotFound)?;
        let mut entry = self.decode_entry(&raw)?;

        if let Some(raw) = stm
            .get(&self.keys.versions(path))
            .await
            .map_err(StoreError::from_kv(PUT_ACTION))?
        {
            entry.versions = VersionsRecord::decode(&raw)
                .map_err(|source| StoreError::Decode {
                    entity: "versions",
                    source,
                })?
                .versions;
        }
        entry.signature = Some(signature.clone());

        debug!(path, "ruleset didn't change, returning without creating a new version");
        Ok(Attempt::Unchanged(entry))
    }
}
