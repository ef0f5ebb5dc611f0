/*
    config.rs - Replica configuration

    Small by design: the engine needs a stable replica identity and a
    buffer size for its change-notification channel. Transport settings
    live with the transport.
*/

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Errors raised by configuration validation
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Replica id must be non-empty; it participates in conflict resolution
    #[error("invalid replica id: {0}")]
    InvalidReplicaId(String),

    /// Event channel capacity must be non-zero
    #[error("invalid event capacity: {0}")]
    InvalidEventCapacity(usize),
}

/// Configuration for one replica
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplicaConfig {
    /// Stable identifier of this replica
    ///
    /// Used as the conflict-resolution tiebreaker, so it must be unique
    /// across the mesh.
    pub replica_id: String,

    /// Capacity of the change-notification broadcast channel
    pub event_capacity: usize,
}

impl Default for ReplicaConfig {
    fn default() -> Self {
        ReplicaConfig { replica_id: Uuid::new_v4().to_string(), event_capacity: 64 }
    }
}

impl ReplicaConfig {
    /// Create a configuration with the given replica id
    pub fn new(replica_id: impl Into<String>) -> Self {
        ReplicaConfig { replica_id: replica_id.into(), ..Default::default() }
    }

    /// Set the change-notification channel capacity
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.replica_id.is_empty() {
            return Err(ConfigError::InvalidReplicaId("must not be empty".to_string()));
        }
        if self.event_capacity == 0 {
            return Err(ConfigError::InvalidEventCapacity(self.event_capacity));
        }
        Ok(())
    }
}
