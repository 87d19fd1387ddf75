//! In-process peer.
//!
//! Calls another node's `ReplicatedValue` directly instead of going over
//! HTTP. Lets a whole cluster run inside one process, with peers that can be
//! taken offline.

use crate::error::TransportError;
use crate::state::ReplicatedValue;
use crate::transport::PeerClient;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

pub struct LoopbackPeer {
    address: String,
    node: Arc<ReplicatedValue>,
    online: AtomicBool,
    pushes: AtomicUsize,
    fetches: AtomicUsize,
}

impl LoopbackPeer {
    pub fn new(address: impl Into<String>, node: Arc<ReplicatedValue>) -> Self {
        Self {
            address: address.into(),
            node,
            online: AtomicBool::new(true),
            pushes: AtomicUsize::new(0),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    /// Pushes that reached the node
    pub fn pushes(&self) -> usize {
        self.pushes.load(Ordering::SeqCst)
    }

    /// Fetches that reached the node
    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn ensure_online(&self) -> Result<(), TransportError> {
        if self.online.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(TransportError::Unreachable {
                peer: self.address.clone(),
            })
        }
    }
}

#[async_trait]
impl PeerClient for LoopbackPeer {
    fn address(&self) -> &str {
        &self.address
    }

    async fn fetch(&self) -> Result<String, TransportError> {
        self.ensure_online()?;
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.node.read().await)
    }

    async fn push(&self, text: &str) -> Result<(), TransportError> {
        self.ensure_online()?;
        self.pushes.fetch_add(1, Ordering::SeqCst);
        // Same outcome an HTTP peer reports when its local store rejects the write
        self.node
            .write(text)
            .await
            .map_err(|_| TransportError::Status {
                peer: self.address.clone(),
                status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            })
    }
}
