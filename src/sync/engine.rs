//! Sync engine: the timer-driven push/pull loop.
//!
//! Each cycle:
//! 1. Push - if the value changed since it was last propagated, send it to
//!    every peer in config order, then mark it propagated whether or not the
//!    pushes succeeded.
//! 2. Pull - fetch every peer in config order and adopt any content that
//!    differs from the value current at that moment. A later peer therefore
//!    overrides an earlier one within the same cycle.
//!
//! Peers are called one at a time; a slow peer delays the rest of the cycle.

use crate::state::{Merge, ReplicatedValue};
use crate::transport::PeerClient;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Counters for one push/pull cycle.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CycleStats {
    /// No local change since last propagation, push phase skipped
    pub push_skipped: bool,

    /// Peers that accepted the push
    pub pushed: usize,

    /// Peers the push failed for
    pub push_failed: usize,

    /// Peers fetched successfully
    pub fetched: usize,

    /// Peers the fetch failed for
    pub fetch_failed: usize,

    /// Fetched values adopted locally
    pub merged: usize,
}

impl CycleStats {
    pub fn new() -> Self {
        Self::default()
    }
}

pub struct SyncEngine {
    state: Arc<ReplicatedValue>,
    peers: Vec<Arc<dyn PeerClient>>,
    interval: Duration,
}

impl SyncEngine {
    pub fn new(
        state: Arc<ReplicatedValue>,
        peers: Vec<Arc<dyn PeerClient>>,
        interval: Duration,
    ) -> Self {
        Self {
            state,
            peers,
            interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    /// Run cycles until `shutdown` fires or its sender is dropped.
    ///
    /// A cycle already in progress always completes.
    pub async fn run(&self, mut shutdown: broadcast::Receiver<()>) {
        info!(
            peers = self.peers.len(),
            interval_ms = self.interval.as_millis() as u64,
            "Sync engine started"
        );

        loop {
            let stats = self.run_once().await;
            debug!(?stats, "Sync cycle complete");

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = shutdown.recv() => {
                    info!("Sync engine shutting down");
                    break;
                }
            }
        }
    }

    /// One push phase followed by one pull phase.
    pub async fn run_once(&self) -> CycleStats {
        let mut stats = CycleStats::new();
        self.push_phase(&mut stats).await;
        self.pull_phase(&mut stats).await;
        stats
    }

    async fn push_phase(&self, stats: &mut CycleStats) {
        let snapshot = self.state.snapshot().await;
        if !snapshot.has_unpropagated_change() {
            debug!("No local change since last push, skipping push phase");
            stats.push_skipped = true;
            return;
        }

        debug!(
            bytes = snapshot.value.len(),
            peers = self.peers.len(),
            "Pushing local change"
        );

        for peer in &self.peers {
            match peer.push(&snapshot.value).await {
                Ok(()) => stats.pushed += 1,
                Err(e) => {
                    warn!(peer = peer.address(), error = %e, "Failed to push clipboard");
                    stats.push_failed += 1;
                }
            }
        }

        // Fire and forget: failed peers are not retried
        self.state.mark_propagated(snapshot.value).await;
    }

    async fn pull_phase(&self, stats: &mut CycleStats) {
        for peer in &self.peers {
            let remote = match peer.fetch().await {
                Ok(remote) => remote,
                Err(e) => {
                    warn!(peer = peer.address(), error = %e, "Failed to fetch clipboard");
                    stats.fetch_failed += 1;
                    continue;
                }
            };
            stats.fetched += 1;

            if self.state.merge_remote(&remote).await == Merge::Applied {
                info!(
                    peer = peer.address(),
                    bytes = remote.len(),
                    "Merged clipboard from peer"
                );
                stats.merged += 1;
            }
        }
    }
}
