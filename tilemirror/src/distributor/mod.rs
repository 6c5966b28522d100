//! Work distribution across a fixed pool of workers.
//!
//! This module provides:
//! - The worker pool with its task and result channels (`pool`)
//! - The per-tile work a worker performs (`processor`)
//! - Outcome records reported back to the coordinator (`outcome`)
//! - Progress accounting for the collection phase (`progress`)

mod outcome;
mod pool;
mod processor;
mod progress;

pub use outcome::{TileOutcome, WorkerId};
pub use pool::{PoolReport, WorkerPool};
pub use processor::{MirrorProcessor, TileProcessor};
pub use progress::{ProgressCallback, ProgressTracker};
