/*
    meshkv-core - Leaderless, eventually-consistent key-value replication

    Each replica holds a local key-value map, mutates it locally, and gossips
    mutations to every directly connected peer. Concurrent writes to the same
    key resolve deterministically with a last-writer-wins rule (wall-clock
    timestamp, replica id as tiebreaker), so all replicas converge to the
    same state without coordination.

    Subsystems:
    - store: the authoritative CRDT map (key -> Entry) and its merge rule
    - links: the registry of live per-peer channels
    - sync: the wire protocol and the engine driving both

    Transport, session negotiation, and the UI layer are external
    collaborators. The engine only consumes link-open / link-closed
    notifications and per-link byte frames, and exposes a read/write
    key-value interface plus a change-notification stream.
*/

pub mod config;
pub mod links;
pub mod logging;
pub mod store;
pub mod sync;

// Re-export commonly used types
pub use config::{ConfigError, ReplicaConfig};
pub use links::{LinkKey, LinkSender, LinkState, MpscLink, PeerLinkRegistry, SendError};
pub use logging::{init_logging, LogLevel};
pub use store::{Entry, Key, KvChange, ReplicaStore, Value};
pub use sync::{Replica, SyncMessage, WireError, KV_CHANNEL_LABEL};
