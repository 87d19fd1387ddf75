//! Node wiring: replicated value, HTTP server and sync engine in one process.
//!
//! Startup is two steps so callers can learn the bound address before the
//! peers are known (tests binding `127.0.0.1:0`):
//!
//! ```text
//! Node::bind(config, store)  -> reads the clipboard, binds the listener
//! node.spawn(peers)          -> starts server + sync engine
//! handle.run_until(signal)   -> serves until `signal` or a server exit
//! handle.shutdown()          -> stops both
//! ```

use crate::config::Config;
use crate::error::{Result, SyncError};
use crate::server;
use crate::state::ReplicatedValue;
use crate::store::LocalStore;
use crate::sync::SyncEngine;
use crate::transport::{build_peers, PeerClient};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// A node that has loaded its initial state and bound its listener.
#[derive(Debug)]
pub struct Node {
    config: Config,
    state: Arc<ReplicatedValue>,
    listener: TcpListener,
}

impl Node {
    /// Read the initial clipboard and bind the listen address.
    ///
    /// Both failures are fatal for the process.
    pub async fn bind(config: Config, store: Arc<dyn LocalStore>) -> Result<Self> {
        config.validate()?;

        let state = Arc::new(ReplicatedValue::load(store).await?);

        let addr = config.listen_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| SyncError::Server(format!("Failed to bind {}: {}", addr, e)))?;

        Ok(Self {
            config,
            state,
            listener,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn state(&self) -> Arc<ReplicatedValue> {
        self.state.clone()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Start with HTTP peers built from the config.
    pub fn spawn_with_config_peers(self) -> Result<NodeHandle> {
        let peers = build_peers(&self.config)?;
        self.spawn(peers)
    }

    /// Start the HTTP server and the sync engine.
    pub fn spawn(self, peers: Vec<Arc<dyn PeerClient>>) -> Result<NodeHandle> {
        let addr = self.local_addr()?;
        let (shutdown_tx, _) = broadcast::channel::<()>(1);

        let engine = SyncEngine::new(self.state.clone(), peers, self.config.interval);
        info!(
            %addr,
            peers = engine.peer_count(),
            "Starting clipboard node"
        );

        let engine_rx = shutdown_tx.subscribe();
        let engine_task = tokio::spawn(async move { engine.run(engine_rx).await });

        let server_rx = shutdown_tx.subscribe();
        let server_task = tokio::spawn(server::serve(self.listener, self.state.clone(), server_rx));

        Ok(NodeHandle {
            addr,
            state: self.state,
            shutdown_tx,
            engine_task,
            server_task,
        })
    }
}

/// A running node.
pub struct NodeHandle {
    addr: SocketAddr,
    state: Arc<ReplicatedValue>,
    shutdown_tx: broadcast::Sender<()>,
    engine_task: JoinHandle<()>,
    server_task: JoinHandle<Result<()>>,
}

impl NodeHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Base URL peers use to reach this node
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn state(&self) -> Arc<ReplicatedValue> {
        self.state.clone()
    }

    /// Run until `signal` completes or the server task exits, then stop both.
    ///
    /// The sync engine never outlives the HTTP surface. A server that exits
    /// on its own is returned as the result, its error included.
    pub async fn run_until<F>(mut self, signal: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let server_exit = tokio::select! {
            _ = signal => None,
            joined = &mut self.server_task => Some(joined),
        };

        let Some(joined) = server_exit else {
            return self.shutdown().await;
        };

        let _ = self.shutdown_tx.send(());
        self.engine_task
            .await
            .map_err(|e| SyncError::Server(format!("Sync engine task failed: {}", e)))?;

        let result = joined
            .map_err(|e| SyncError::Server(format!("Server task failed: {}", e)))
            .and_then(|r| r);
        match &result {
            Ok(()) => info!("Clipboard server exited, stopping sync engine"),
            Err(e) => error!(error = %e, "Clipboard server failed, stopping sync engine"),
        }
        result
    }

    /// Signal shutdown and wait for the server and sync engine to stop.
    pub async fn shutdown(self) -> Result<()> {
        let _ = self.shutdown_tx.send(());

        self.engine_task
            .await
            .map_err(|e| SyncError::Server(format!("Sync engine task failed: {}", e)))?;

        self.server_task
            .await
            .map_err(|e| SyncError::Server(format!("Server task failed: {}", e)))?
    }
}
