//! Persisted key layout.
//!
//! Under a namespace `N`, the store owns five key families:
//!
//! ```text
//! N/rulesets/entries/<path>!<version>   serialised entry
//! N/rulesets/latest/<path>              key of the latest entry
//! N/rulesets/versions/<path>            encoded version list
//! N/rulesets/checksums/<path>           16 raw MD5 bytes
//! N/rulesets/signatures/<path>          encoded signature
//! ```
//!
//! The separator between path and version is `!` (0x21). It sorts before `/`
//! (0x2F), so for any path `p` every `p!<version>` key sorts before every
//! descendant `p/<child>!<version>` key — the lexicographically last key
//! under the prefix `p!` is always the newest version of `p` itself.

/// Separator between path and version in entry keys.
pub const VERSION_SEPARATOR: char = '!';

/// Builds and parses the store's keys under one namespace.
#[derive(Clone, Debug)]
pub struct Keyspace {
    namespace: String,
}

impl Keyspace {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    /// Root of the entries family, trailing slash included.
    pub fn entries_root(&self) -> String {
        format!("{}/rulesets/entries/", self.namespace)
    }

    /// Key of the entry at `(path, version)`.
    pub fn entry(&self, path: &str, version: &str) -> String {
        format!("{}{path}{VERSION_SEPARATOR}{version}", self.entries_root())
    }

    /// Prefix covering every version of exactly `path` (descendants excluded
    /// by the separator ordering).
    pub fn entry_versions_prefix(&self, path: &str) -> String {
        format!("{}{path}{VERSION_SEPARATOR}", self.entries_root())
    }

    /// Root of the latest-pointer family, trailing slash included.
    pub fn latest_root(&self) -> String {
        format!("{}/rulesets/latest/", self.namespace)
    }

    pub fn latest(&self, path: &str) -> String {
        format!("{}{path}", self.latest_root())
    }

    pub fn versions(&self, path: &str) -> String {
        format!("{}/rulesets/versions/{path}", self.namespace)
    }

    pub fn checksums(&self, path: &str) -> String {
        format!("{}/rulesets/checksums/{path}", self.namespace)
    }

    pub fn signatures(&self, path: &str) -> String {
        format!("{}/rulesets/signatures/{path}", self.namespace)
    }

    /// Split an entries key back into `(path, version)`.
    ///
    /// Returns `None` for keys outside the entries family or without a
    /// separator. The *last* separator wins, which keeps the split correct
    /// even if a future version scheme embedded one.
    pub fn split_entry_key(&self, key: &str) -> Option<(String, String)> {
        let rest = key.strip_prefix(&self.entries_root())?;
        let idx = rest.rfind(VERSION_SEPARATOR)?;
        let (path, version) = rest.split_at(idx);
        Some((path.to_string(), version[1..].to_string()))
    }
}
