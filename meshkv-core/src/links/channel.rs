/*
    channel.rs - Outbound channel abstraction

    The engine never talks to sockets directly; it hands encoded frames to
    a LinkSender supplied by the transport layer. Sends are fire-and-forget:
    a failure is advisory and never tears the link down by itself.
*/

use thiserror::Error;
use tokio::sync::mpsc;

/// A channel-level send failure
///
/// Advisory only: the transport's own close/failure notification is the
/// sole trigger for link removal.
#[derive(Debug, Error)]
#[error("link send failed: {0}")]
pub struct SendError(pub String);

/// Outbound half of a peer link
///
/// Implementations must not block: frames are queued or dropped, never
/// awaited. The engine calls `send` while holding its state lock.
pub trait LinkSender: Send + Sync {
    /// Queue one encoded frame for delivery to the peer
    fn send(&self, payload: &[u8]) -> Result<(), SendError>;
}

/// In-memory link over an unbounded tokio mpsc channel
///
/// The standard transport for tests and in-process meshes: the receiving
/// half is pumped into the remote replica's inbound message handler.
#[derive(Debug, Clone)]
pub struct MpscLink {
    tx: mpsc::UnboundedSender<Vec<u8>>,
}

impl MpscLink {
    /// Create a link and the receiver its frames arrive on
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Vec<u8>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (MpscLink { tx }, rx)
    }
}

impl LinkSender for MpscLink {
    fn send(&self, payload: &[u8]) -> Result<(), SendError> {
        self.tx
            .send(payload.to_vec())
            .map_err(|_| SendError("receiver dropped".to_string()))
    }
}
