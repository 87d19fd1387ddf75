//! clipsync - replicate one clipboard across a fixed set of peers.
//!
//! Every node serves `GET`/`POST /clipboard` and runs a sync engine that
//! pushes local changes to its peers and pulls theirs back, last writer in
//! peer order wins.

pub mod cli;
pub mod config;
pub mod error;
pub mod node;
pub mod server;
pub mod state;
pub mod store;
pub mod sync;
pub mod transport;

pub use config::Config;
pub use error::{Result, StoreError, SyncError, TransportError};
pub use node::{Node, NodeHandle};
pub use state::{ClipboardState, Merge, ReplicatedValue};
pub use sync::{CycleStats, SyncEngine};
