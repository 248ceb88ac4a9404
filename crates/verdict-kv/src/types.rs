//! Request and response shapes shared by all KV backends.

/// A stored key with its value and revision metadata.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyValue {
    pub key: String,
    pub value: Vec<u8>,
    /// Revision of the commit that created this key.
    pub create_revision: i64,
    /// Revision of the commit that last wrote this key.
    pub mod_revision: i64,
}

/// Upper bound of a range read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RangeEnd {
    /// Read exactly the start key.
    Single,
    /// Read every key from start to the given exclusive end key.
    Key(String),
    /// Read every key from start to the end of the keyspace.
    Open,
}

/// Traversal order of a range read.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Order {
    #[default]
    Asc,
    Desc,
}

/// A range read request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RangeRequest {
    pub start: String,
    pub end: RangeEnd,
    /// Maximum keys to return; 0 means unlimited.
    pub limit: usize,
    /// Return keys with empty values.
    pub keys_only: bool,
    pub order: Order,
}

impl RangeRequest {
    /// Point read of a single key.
    pub fn single(key: impl Into<String>) -> Self {
        Self {
            start: key.into(),
            end: RangeEnd::Single,
            limit: 0,
            keys_only: false,
            order: Order::Asc,
        }
    }

    /// Read every key starting with `prefix`.
    pub fn prefix(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        let end = match prefix_range_end(&prefix) {
            Some(end) => RangeEnd::Key(end),
            None => RangeEnd::Open,
        };
        Self {
            start: prefix,
            end,
            limit: 0,
            keys_only: false,
            order: Order::Asc,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn keys_only(mut self) -> Self {
        self.keys_only = true;
        self
    }

    pub fn descending(mut self) -> Self {
        self.order = Order::Desc;
        self
    }

    /// Move the lower bound while keeping the upper bound, used to resume a
    /// paginated scan after a continue token.
    pub fn starting_at(mut self, start: impl Into<String>) -> Self {
        self.start = start.into();
        self
    }
}

/// Result of a range read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RangeResponse {
    pub kvs: Vec<KeyValue>,
    /// Total number of keys matching the range, ignoring the limit.
    pub count: usize,
    /// True when the limit cut the result short.
    pub more: bool,
    /// Store revision at read time.
    pub revision: i64,
}

/// Revision guard: the commit applies only if `key` currently has
/// `mod_revision` (0 means the key must be absent).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Compare {
    pub key: String,
    pub mod_revision: i64,
}

/// A buffered write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PutRequest {
    pub key: String,
    pub value: Vec<u8>,
}

/// An atomic guarded write batch.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommitRequest {
    pub compares: Vec<Compare>,
    pub puts: Vec<PutRequest>,
}

/// Result of a commit attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitResponse {
    /// False when a compare failed; nothing was written.
    pub succeeded: bool,
    /// Store revision after the attempt. When `succeeded` and at least one
    /// put was applied, this is the revision assigned to the batch.
    pub revision: i64,
}

/// Kind of a committed change observed by a watch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventKind {
    Put,
    Delete,
}

/// A single committed change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Event {
    pub kind: EventKind,
    pub kv: KeyValue,
}

/// One committed batch of changes, as delivered to a watcher.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WatchBatch {
    pub events: Vec<Event>,
    /// Revision of the commit that produced this batch. Feeding it back as a
    /// watch start revision (plus one) resumes exactly after this batch.
    pub revision: i64,
}

/// Exclusive upper bound of the range covering every key starting with
/// `prefix`. `None` means the range extends to the end of the keyspace.
pub fn prefix_range_end(prefix: &str) -> Option<String> {
    let mut bytes = prefix.as_bytes().to_vec();
    while let Some(&last) = bytes.last() {
        if last < 0x7f {
            // Prefixes are ASCII key families, so the increment stays ASCII.
            *bytes.last_mut().unwrap() = last + 1;
            return Some(String::from_utf8(bytes).expect("ascii prefix"));
        }
        bytes.pop();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_end_increments_last_byte() {
        assert_eq!(prefix_range_end("a"), Some("b".to_string()));
        assert_eq!(prefix_range_end("ns/a"), Some("ns/b".to_string()));
        assert_eq!(prefix_range_end(""), None);
    }

    #[test]
    fn prefix_request_bounds() {
        let req = RangeRequest::prefix("app/");
        assert_eq!(req.start, "app/");
        assert_eq!(req.end, RangeEnd::Key("app0".to_string()));
    }

    #[test]
    fn builder_options() {
        let req = RangeRequest::prefix("k").with_limit(5).keys_only().descending();
        assert_eq!(req.limit, 5);
        assert!(req.keys_only);
        assert_eq!(req.order, Order::Desc);
    }
}
