//! Background replication.
//!
//! One `SyncEngine` per node runs push-then-pull against every peer on a
//! fixed interval. Push is best effort; pull is what brings nodes back into
//! agreement.

pub mod engine;

pub use engine::{CycleStats, SyncEngine};
