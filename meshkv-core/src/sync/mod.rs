/*
    sync - Replication protocol

    Two message flows over one schema: a full-state push when a peer link
    opens, and an incremental broadcast on every local mutation. Inbound
    frames are decoded and fed into the store's single merge path.
*/

pub mod engine;
pub mod wire;

pub use engine::Replica;
pub use wire::{SyncMessage, WireError, KV_CHANNEL_LABEL};
