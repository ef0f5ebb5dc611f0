/*
    links - Per-peer channel registry

    Tracks the set of currently open outbound channels, one per logical
    connection instance. Links are created when the transport announces a
    usable connection and destroyed when it reports failure or closure;
    nothing else creates or destroys them.
*/

pub mod channel;
pub mod registry;

pub use channel::{LinkSender, MpscLink, SendError};
pub use registry::{LinkKey, LinkState, PeerLinkRegistry};
