/*
    entry.rs - The unit of replicated state

    An Entry is a timestamped, attributed scalar value. Conflicts between
    entries for the same key are resolved by taking the one with the latest
    timestamp; equal timestamps fall back to lexicographic replica id
    comparison, so any two replicas pick the identical winner.
*/

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Keys are plain strings
pub type Key = String;

/// A scalar value held under a key
///
/// Serializes untagged so the wire carries a bare JSON string or number,
/// matching the self-describing record format all peers speak.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// String scalar
    Text(String),
    /// Numeric scalar
    Number(f64),
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

/// One accepted write: value, wall-clock timestamp, and authoring replica
///
/// Replacement is atomic and total; an entry is never partially updated.
/// A cleared key is an entry with an absent value and a fresh timestamp,
/// so deletions replicate like any other write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// Current scalar, or None for a cleared key
    ///
    /// Defaults to None on decode: peers may omit the field entirely for
    /// cleared keys.
    #[serde(default)]
    pub value: Option<Value>,

    /// Milliseconds since epoch, assigned by the writer at mutation time
    pub timestamp: u64,

    /// Stable identifier of the replica that authored this value
    #[serde(rename = "replicaId")]
    pub replica_id: String,
}

impl Entry {
    /// Create an entry stamped with the current wall-clock time
    pub fn now(value: Option<Value>, replica_id: impl Into<String>) -> Self {
        Entry { value, timestamp: now_millis(), replica_id: replica_id.into() }
    }

    /// Create an entry with an explicit timestamp
    pub fn at(value: Option<Value>, timestamp: u64, replica_id: impl Into<String>) -> Self {
        Entry { value, timestamp, replica_id: replica_id.into() }
    }

    /// Composite last-writer-wins ordering: higher timestamp wins, equal
    /// timestamps resolve by lexicographic replica id comparison
    pub fn wins_over(&self, other: &Entry) -> bool {
        self.timestamp > other.timestamp
            || (self.timestamp == other.timestamp && self.replica_id > other.replica_id)
    }
}

/// Current wall-clock time in milliseconds since epoch
pub fn now_millis() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_millis() as u64
}
