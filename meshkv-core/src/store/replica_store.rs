/*
    replica_store.rs - The CRDT key-value map

    Owns the authoritative key -> Entry mapping and applies the merge rule.
    Local writes are always self-authoritative; remote entries go through
    exactly one merge path regardless of whether they arrive via the initial
    full-state sync or an incremental broadcast.

    The key set is monotonically non-shrinking: a delete is itself an entry
    with an absent value, which keeps merges commutative under any arrival
    order. Observers see only the value projection, never raw entries.
*/

use super::entry::{now_millis, Entry, Key, Value};
use std::collections::HashMap;
use tokio::sync::broadcast;
use tracing::debug;

/// Change notification delivered to subscribers on every accepted write
///
/// Carries the full current snapshot so observers never have to re-query
/// the store with potentially stale state.
#[derive(Debug, Clone)]
pub struct KvChange {
    /// The key that changed
    pub key: Key,
    /// The complete value-only view after the change
    pub snapshot: HashMap<Key, Option<Value>>,
}

/// The replicated key-value store for one replica
#[derive(Debug)]
pub struct ReplicaStore {
    /// This replica's stable identifier, fixed at construction
    replica_id: String,

    /// Authoritative state: one entry per key ever written
    entries: HashMap<Key, Entry>,

    /// Derived value-only projection, re-derived on every accepted write
    snapshot: HashMap<Key, Option<Value>>,

    /// Change notification fan-out
    changes: broadcast::Sender<KvChange>,
}

impl ReplicaStore {
    /// Create an empty store for the given replica id
    pub fn new(replica_id: impl Into<String>, event_capacity: usize) -> Self {
        let (changes, _rx) = broadcast::channel(event_capacity);
        ReplicaStore {
            replica_id: replica_id.into(),
            entries: HashMap::new(),
            snapshot: HashMap::new(),
            changes,
        }
    }

    /// This replica's identifier
    pub fn replica_id(&self) -> &str {
        &self.replica_id
    }

    /// Perform a local write
    ///
    /// Always succeeds: a local write is self-authoritative and overwrites
    /// whatever entry is held, stamping the current wall-clock time. Returns
    /// the new entry for the sync layer to broadcast.
    pub fn write(&mut self, key: Key, value: Option<Value>) -> Entry {
        let entry = Entry { value, timestamp: now_millis(), replica_id: self.replica_id.clone() };
        self.accept(key, entry.clone());
        entry
    }

    /// Merge a remote entry for a key, returning whether it was accepted
    ///
    /// Precedence: no local entry -> accept; newer timestamp -> accept;
    /// equal timestamp and lexicographically greater replica id -> accept;
    /// otherwise reject. Rejection is silent and expected: it is the normal
    /// outcome for most messages under gossip.
    pub fn merge(&mut self, key: Key, remote: Entry) -> bool {
        let resolution = match self.entries.get(&key) {
            None => "empty",
            Some(local) if remote.timestamp > local.timestamp => "newer",
            Some(local)
                if remote.timestamp == local.timestamp
                    && remote.replica_id > local.replica_id =>
            {
                "replica_id"
            }
            Some(_) => {
                debug!(%key, ts = remote.timestamp, from = %remote.replica_id,
                    "remote entry rejected");
                return false;
            }
        };

        debug!(%key, ts = remote.timestamp, from = %remote.replica_id,
            resolution, "remote entry accepted");
        self.accept(key, remote);
        true
    }

    /// Every held entry, for the full-state push to a newly joined peer
    pub fn snapshot_all(&self) -> Vec<(Key, Entry)> {
        self.entries.iter().map(|(k, e)| (k.clone(), e.clone())).collect()
    }

    /// The current value for a key, if one was ever written and not cleared
    pub fn get(&self, key: &str) -> Option<Value> {
        self.snapshot.get(key).cloned().flatten()
    }

    /// The complete value-only view
    pub fn snapshot(&self) -> HashMap<Key, Option<Value>> {
        self.snapshot.clone()
    }

    /// Number of keys ever written
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no key was ever written
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Subscribe to change notifications
    ///
    /// Each accepted write (local or remote) delivers one `KvChange` with
    /// the full current snapshot. Dropping the receiver unsubscribes.
    pub fn subscribe(&self) -> broadcast::Receiver<KvChange> {
        self.changes.subscribe()
    }

    /// Atomic total replacement of the entry for a key, snapshot update,
    /// and change notification. The single point every accepted write
    /// (local or merged) goes through.
    fn accept(&mut self, key: Key, entry: Entry) {
        self.snapshot.insert(key.clone(), entry.value.clone());
        self.entries.insert(key.clone(), entry);
        // No active receivers is fine
        let _ = self.changes.send(KvChange { key, snapshot: self.snapshot.clone() });
    }
}
