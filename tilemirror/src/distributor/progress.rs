//! Progress reporting for a pool run.

use std::time::{Duration, Instant};

use tracing::info;

/// Progress callback invoked by the coordinator after each collected tile.
///
/// # Arguments
///
/// * `completed` - Number of tiles reported so far
/// * `total` - Number of tiles in the run
pub type ProgressCallback = Box<dyn Fn(usize, usize) + Send + Sync>;

/// Counts collected outcomes against the expected total.
#[derive(Debug)]
pub struct ProgressTracker {
    completed: usize,
    total: usize,
    started: Instant,
}

impl ProgressTracker {
    pub fn new(total: usize) -> Self {
        Self {
            completed: 0,
            total,
            started: Instant::now(),
        }
    }

    /// Record one more completed tile and log it.
    pub fn record(&mut self) {
        self.completed += 1;
        info!(
            "Completed {} of {} ({:.1} %)",
            self.completed,
            self.total,
            self.percent()
        );
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn is_complete(&self) -> bool {
        self.completed >= self.total
    }

    /// Completion percentage; an empty run counts as complete.
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            (self.completed as f64 / self.total as f64) * 100.0
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}
