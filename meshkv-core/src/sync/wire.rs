/*
    wire.rs - Message encoding

    Every frame is one self-describing JSON record:

        {"key": "...", "entry": {"value": ..., "timestamp": ..., "replicaId": "..."}}

    Sync (full-state replay) and update (incremental) messages are
    structurally identical; the distinction is only in when and how many are
    sent. There is no versioning field; all peers speak the same schema,
    and anything that does not decode is discarded by the caller.
*/

use crate::store::entry::{Entry, Key};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Channel label multiplexing this protocol's traffic on a shared transport
///
/// Hosts must only feed the engine frames arriving under this label;
/// traffic on other labels belongs to someone else.
pub const KV_CHANNEL_LABEL: &str = "__crdt_kv";

/// Errors that can occur on the wire
///
/// A decode failure is a transient peer fault: the caller logs it and moves
/// on, it is never fatal to the local replica.
#[derive(Debug, Error)]
pub enum WireError {
    /// Frame is not a conformant sync record
    #[error("malformed sync frame: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// One replicated update: a key and the entry proposed for it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncMessage {
    pub key: Key,
    pub entry: Entry,
}

/// Encode a message into a wire frame
pub fn encode(msg: &SyncMessage) -> Result<Vec<u8>, WireError> {
    Ok(serde_json::to_vec(msg)?)
}

/// Decode a wire frame, rejecting anything missing required fields
pub fn decode(payload: &[u8]) -> Result<SyncMessage, WireError> {
    Ok(serde_json::from_slice(payload)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::entry::Value;

    #[test]
    fn test_roundtrip() {
        let msg = SyncMessage {
            key: "color".to_string(),
            entry: Entry::at(Some(Value::from("red")), 100, "r1"),
        };

        let bytes = encode(&msg).unwrap();
        assert_eq!(decode(&bytes).unwrap(), msg);
    }

    #[test]
    fn test_decode_original_record_shape() {
        let frame = br#"{"key":"n","entry":{"value":1,"timestamp":200,"replicaId":"r1"}}"#;
        let msg = decode(frame).unwrap();

        assert_eq!(msg.key, "n");
        assert_eq!(msg.entry.value, Some(Value::Number(1.0)));
        assert_eq!(msg.entry.timestamp, 200);
        assert_eq!(msg.entry.replica_id, "r1");
    }

    #[test]
    fn test_decode_rejects_missing_timestamp() {
        let frame = br#"{"key":"n","entry":{"value":1,"replicaId":"r1"}}"#;
        assert!(matches!(decode(frame), Err(WireError::Malformed(_))));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode(b"not json").is_err());
        assert!(decode(b"").is_err());
        assert!(decode(br#"{"unrelated":true}"#).is_err());
        assert!(decode(&[0xff, 0xfe, 0x00]).is_err());
    }

    #[test]
    fn test_channel_label() {
        assert_eq!(KV_CHANNEL_LABEL, "__crdt_kv");
    }
}
