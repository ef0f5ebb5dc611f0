/*
    engine.rs - Replica facade

    Ties the store and the link registry together behind one mutex, so every
    mutation (local write, inbound merge, link add/remove) runs on a single
    serialized path even though the transport delivers its callbacks from
    wherever it likes. The merge rule is a check-then-act sequence and is
    not safe under concurrent mutation of the same key.

    The lock never spans I/O: channel sends are fire-and-forget and
    encoding happens in memory, so critical sections stay short.

    Control flow:
    - write()          -> store write -> broadcast one update to open links
    - link_opened()    -> register slot -> push every held entry -> mark open
    - handle_message() -> decode (discard on failure) -> store merge
    - link_closed()    -> drop the slot
*/

use crate::config::{ConfigError, ReplicaConfig};
use crate::links::{LinkKey, LinkSender, PeerLinkRegistry};
use crate::store::entry::Key;
use crate::store::{KvChange, ReplicaStore, Value};
use crate::sync::wire::{self, SyncMessage};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

struct Inner {
    store: ReplicaStore,
    registry: PeerLinkRegistry,
}

/// One participant in the replication mesh
pub struct Replica {
    replica_id: String,
    inner: Mutex<Inner>,
}

impl Replica {
    /// Create a replica from its configuration
    ///
    /// The configuration is validated here, at the point of consumption: a
    /// rejected config (empty replica id, zero event capacity) never reaches
    /// the store.
    pub fn new(config: ReplicaConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let replica_id = config.replica_id.clone();
        Ok(Replica {
            inner: Mutex::new(Inner {
                store: ReplicaStore::new(config.replica_id, config.event_capacity),
                registry: PeerLinkRegistry::new(),
            }),
            replica_id,
        })
    }

    /// This replica's stable identifier
    pub fn replica_id(&self) -> &str {
        &self.replica_id
    }

    /// Write a value locally and broadcast the update to every open link
    ///
    /// Never fails: a local write is always self-authoritative, and send
    /// failures are advisory.
    pub async fn write(&self, key: impl Into<Key>, value: impl Into<Value>) {
        self.write_entry(key.into(), Some(value.into())).await;
    }

    /// Clear a key: a delete is a write of an absent value, replicated like
    /// any other update
    pub async fn clear(&self, key: impl Into<Key>) {
        self.write_entry(key.into(), None).await;
    }

    async fn write_entry(&self, key: Key, value: Option<Value>) {
        let mut inner = self.inner.lock().await;
        let entry = inner.store.write(key.clone(), value);
        match wire::encode(&SyncMessage { key, entry }) {
            Ok(frame) => {
                inner.registry.broadcast(&frame);
            }
            Err(err) => warn!(%err, "failed to encode update"),
        }
    }

    /// Handle one inbound frame from a peer link
    ///
    /// Malformed frames are discarded: a transient peer fault, never fatal
    /// and never a state change. Accepted merges notify subscribers but are
    /// not re-broadcast.
    pub async fn handle_message(&self, link: &LinkKey, payload: &[u8]) {
        let msg = match wire::decode(payload) {
            Ok(msg) => msg,
            Err(err) => {
                debug!(link = %link, %err, "discarding inbound frame");
                return;
            }
        };

        let mut inner = self.inner.lock().await;
        inner.store.merge(msg.key, msg.entry);
    }

    /// Register a newly announced peer link and replay the full state to it
    ///
    /// Every held entry is pushed in arbitrary order; merge is commutative,
    /// so interleaving with concurrent writes or inbound messages cannot
    /// break convergence.
    pub async fn link_opened(&self, link: LinkKey, sender: Arc<dyn LinkSender>) {
        let mut inner = self.inner.lock().await;
        info!(link = %link, entries = inner.store.len(), "peer link opened, pushing state");
        inner.registry.add_link(link.clone(), sender.clone());

        for (key, entry) in inner.store.snapshot_all() {
            match wire::encode(&SyncMessage { key, entry }) {
                Ok(frame) => {
                    if let Err(err) = sender.send(&frame) {
                        warn!(link = %link, %err, "state push send failed");
                    }
                }
                Err(err) => warn!(link = %link, %err, "failed to encode state push"),
            }
        }

        inner.registry.mark_open(&link);
    }

    /// Drop a peer link after the transport reported failure or closure
    pub async fn link_closed(&self, link: &LinkKey) {
        let mut inner = self.inner.lock().await;
        if inner.registry.remove_link(link) {
            info!(link = %link, "peer link closed");
        }
    }

    /// Current value for a key
    pub async fn get(&self, key: &str) -> Option<Value> {
        self.inner.lock().await.store.get(key)
    }

    /// The complete value-only view
    pub async fn snapshot(&self) -> HashMap<Key, Option<Value>> {
        self.inner.lock().await.store.snapshot()
    }

    /// Subscribe to change notifications (local writes and accepted merges)
    pub async fn subscribe(&self) -> broadcast::Receiver<KvChange> {
        self.inner.lock().await.store.subscribe()
    }

    /// Number of currently registered peer links
    pub async fn link_count(&self) -> usize {
        self.inner.lock().await.registry.len()
    }
}
