/*
    store - The authoritative replicated state layer

    Handles:
    - The per-key unit of replication (Entry)
    - The CRDT map and its single merge path (ReplicaStore)
    - The value-only snapshot projection exposed to observers
    - Change notifications
*/

pub mod entry;
pub mod replica_store;

pub use entry::{Entry, Key, Value};
pub use replica_store::{KvChange, ReplicaStore};
