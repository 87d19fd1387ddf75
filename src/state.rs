//! The replicated clipboard value.
//!
//! One `ReplicatedValue` per process, shared as `Arc<ReplicatedValue>` by the
//! HTTP handlers and the sync engine. Both fields live behind a single
//! `RwLock`; every mutation also mirrors into the local store while the
//! exclusive lock is held, so the store always ends up with the value that
//! won the lock last.

use crate::error::StoreError;
use crate::store::LocalStore;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Guarded clipboard contents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClipboardState {
    /// Authoritative current content
    pub value: String,
    /// Content last pushed to peers (or merged from one)
    pub last_propagated: String,
}

impl ClipboardState {
    /// Local changes not yet pushed to peers
    pub fn has_unpropagated_change(&self) -> bool {
        self.value != self.last_propagated
    }
}

/// Result of offering a peer's content to the local value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Merge {
    /// Peer content equals the local value
    Unchanged,
    /// Local value replaced with the peer content
    Applied,
}

pub struct ReplicatedValue {
    state: RwLock<ClipboardState>,
    store: Arc<dyn LocalStore>,
}

impl ReplicatedValue {
    /// Start from `initial`, treated as already propagated.
    pub fn new(store: Arc<dyn LocalStore>, initial: impl Into<String>) -> Self {
        let initial = initial.into();
        Self {
            state: RwLock::new(ClipboardState {
                value: initial.clone(),
                last_propagated: initial,
            }),
            store,
        }
    }

    /// Seed from the store's current content.
    pub async fn load(store: Arc<dyn LocalStore>) -> Result<Self, StoreError> {
        let initial = store.get().await?;
        debug!(bytes = initial.len(), "Loaded initial clipboard content");
        Ok(Self::new(store, initial))
    }

    /// Current value.
    pub async fn read(&self) -> String {
        self.state.read().await.value.clone()
    }

    /// `value` and `last_propagated` from one lock acquisition.
    pub async fn snapshot(&self) -> ClipboardState {
        self.state.read().await.clone()
    }

    /// Replace the value and mirror it into the store.
    ///
    /// The in-memory value is updated even when the store rejects the write;
    /// the store error is returned to the caller.
    pub async fn write(&self, text: impl Into<String>) -> Result<(), StoreError> {
        let text = text.into();
        let mut state = self.state.write().await;
        state.value = text;
        self.store.set(&state.value).await
    }

    /// Record `text` as pushed to peers.
    pub async fn mark_propagated(&self, text: impl Into<String>) {
        self.state.write().await.last_propagated = text.into();
    }

    /// Adopt a peer's content if it differs from the value current right now.
    ///
    /// On adoption `last_propagated` moves too, so the content is not pushed
    /// back out on the next cycle. Store failures are logged, not returned.
    pub async fn merge_remote(&self, remote: &str) -> Merge {
        let mut state = self.state.write().await;
        if state.value == remote {
            return Merge::Unchanged;
        }

        state.value = remote.to_string();
        state.last_propagated = remote.to_string();

        if let Err(e) = self.store.set(remote).await {
            warn!(error = %e, "Failed to mirror merged content into local clipboard");
        }

        Merge::Applied
    }
}

impl std::fmt::Debug for ReplicatedValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplicatedValue").finish_non_exhaustive()
    }
}
