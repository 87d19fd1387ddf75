//! Peer transport.
//!
//! The sync engine talks to peers only through `PeerClient`, one instance per
//! configured peer address.

pub mod http;
pub mod loopback;

use crate::error::TransportError;
use async_trait::async_trait;

pub use http::{build_client, build_peers, HttpPeer, CLIPBOARD_PATH};
pub use loopback::LoopbackPeer;

/// The two clipboard RPCs a peer exposes.
#[async_trait]
pub trait PeerClient: Send + Sync {
    /// Peer address as configured (used in logs)
    fn address(&self) -> &str;

    /// Fetch the peer's current value
    async fn fetch(&self) -> Result<String, TransportError>;

    /// Replace the peer's value
    async fn push(&self, text: &str) -> Result<(), TransportError>;
}
