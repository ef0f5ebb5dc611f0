/*
    registry.rs - Keyed map of live peer links

    One slot per logical connection instance, keyed by (group, peer, conn).
    A reconnecting peer arrives with a fresh conn id and therefore a fresh
    slot, so a stale dead entry is never confused with the new connection.

    Broadcast isolates per-link send failures: one failing channel never
    prevents delivery to the others, and never removes the link; only the
    transport's close/failure notification does that.
*/

use super::channel::LinkSender;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// Connection-scoped identity of a peer link
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinkKey {
    /// Mesh/group the peer belongs to
    pub group_id: String,
    /// Logical identity of the remote replica
    pub peer_id: String,
    /// Identity of this connection instance, fresh on every reconnect
    pub conn_id: String,
}

impl LinkKey {
    pub fn new(
        group_id: impl Into<String>,
        peer_id: impl Into<String>,
        conn_id: impl Into<String>,
    ) -> Self {
        LinkKey { group_id: group_id.into(), peer_id: peer_id.into(), conn_id: conn_id.into() }
    }
}

// Display is for log output only; the structured key is the identity
impl fmt::Display for LinkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group_id, self.peer_id, self.conn_id)
    }
}

/// Per-link lifecycle
///
/// Opening: announced, full-state push in progress.
/// Open: push complete, participates in regular broadcast.
/// The terminal closed state is removal from the registry, so it carries
/// no variant here; `state()` returns None for a removed link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Opening,
    Open,
}

struct PeerLink {
    state: LinkState,
    sender: Arc<dyn LinkSender>,
}

/// The set of currently registered peer links
#[derive(Default)]
pub struct PeerLinkRegistry {
    links: HashMap<LinkKey, PeerLink>,
}

impl PeerLinkRegistry {
    pub fn new() -> Self {
        PeerLinkRegistry { links: HashMap::new() }
    }

    /// Register a channel in the Opening state
    pub fn add_link(&mut self, key: LinkKey, sender: Arc<dyn LinkSender>) {
        self.links.insert(key, PeerLink { state: LinkState::Opening, sender });
    }

    /// Transition a link into Open once its full-state push completed
    ///
    /// Returns false if the link was removed in the meantime.
    pub fn mark_open(&mut self, key: &LinkKey) -> bool {
        match self.links.get_mut(key) {
            Some(link) => {
                link.state = LinkState::Open;
                true
            }
            None => false,
        }
    }

    /// Drop a link; subsequent broadcasts skip it
    ///
    /// Called on the transport's failure/close notification, never
    /// self-initiated.
    pub fn remove_link(&mut self, key: &LinkKey) -> bool {
        self.links.remove(key).is_some()
    }

    /// Send an encoded frame to every Open link
    ///
    /// Per-link failures are advisory: logged, isolated, and never a reason
    /// to remove the link. Returns the number of successful sends.
    pub fn broadcast(&self, payload: &[u8]) -> usize {
        let mut delivered = 0;
        for (key, link) in &self.links {
            if link.state != LinkState::Open {
                continue;
            }
            match link.sender.send(payload) {
                Ok(()) => delivered += 1,
                Err(err) => warn!(link = %key, %err, "broadcast send failed"),
            }
        }
        delivered
    }

    /// Number of registered links (any state)
    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// State of a registered link
    pub fn state(&self, key: &LinkKey) -> Option<LinkState> {
        self.links.get(key).map(|l| l.state)
    }
}
