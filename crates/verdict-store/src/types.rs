//! Public shapes of the store contract.

use serde::{Deserialize, Serialize};
use verdict_rule::{Ruleset, Signature, Value};

/// A ruleset version as returned by the store.
///
/// `signature` and `versions` are populated by [`get`](crate::RulesetService::get)
/// and [`put`](crate::RulesetService::put); the cheaper point reads leave them
/// empty.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RulesetEntry {
    pub path: String,
    pub version: String,
    pub ruleset: Ruleset,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<Signature>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub versions: Vec<String>,
}

/// What a [`put`](crate::RulesetService::put) did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PutOutcome {
    /// First version at this path; the signature was established.
    Created,
    /// A new version was appended at an existing path.
    Amended,
    /// The body was identical to the latest stored version; nothing was
    /// written and no revision advanced.
    Unchanged,
}

/// Options for [`list`](crate::RulesetService::list).
#[derive(Clone, Debug, Default)]
pub struct ListOptions {
    /// Page size, 1..=100. Zero (or out of range) selects the configured
    /// default.
    pub limit: usize,
    /// Cursor from a previous page's `continue_token`.
    pub continue_token: Option<String>,
    /// Return only paths, one per ruleset.
    pub paths_only: bool,
    /// Return every version of every ruleset under the prefix. Pages follow
    /// raw key order, so one path's versions may straddle a page boundary
    /// and interleave with descendant paths.
    pub all_versions: bool,
}

/// One page of listing results.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RulesetEntries {
    pub entries: Vec<RulesetEntry>,
    /// Store revision at read time, as a decimal string. Feed it to
    /// [`watch`](crate::RulesetService::watch) to observe every change after
    /// this read.
    pub revision: String,
    /// Cursor for the next page; `None` on the last page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub continue_token: Option<String>,
}

/// Kind of a ruleset change event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RulesetEventKind {
    Put,
}

/// A single observed ruleset change.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RulesetEvent {
    pub kind: RulesetEventKind,
    pub path: String,
    pub version: String,
    pub ruleset: Ruleset,
}

/// One watch batch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RulesetEvents {
    pub events: Vec<RulesetEvent>,
    /// Revision cursor to resume from.
    pub revision: String,
    /// True when the watch ended by cancellation rather than delivery.
    pub timeout: bool,
}

/// Result of evaluating a ruleset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvalResult {
    pub value: Value,
    /// The version that produced the value.
    pub version: String,
}
