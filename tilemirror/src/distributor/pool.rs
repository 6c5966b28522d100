//! Fixed-size worker pool driven by a task channel and a result channel.
//!
//! ```text
//!               ┌──────────── task channel ────────────┐
//! coordinator ──┤ Tile(a) Tile(b) … Tile(n) Stop × W   ├──► worker 0..W
//!               └──────────────────────────────────────┘        │
//!                                                                │ TileOutcome
//! coordinator ◄──────────── result channel ◄─────────────────────┘
//! ```
//!
//! Every tile is enqueued exactly once, followed by one `Stop` per worker,
//! and the sender is dropped so a closed channel also stops a worker. The
//! coordinator collects exactly as many outcomes as tiles were enqueued, or
//! fewer if every worker has gone away; tiles never reported are returned
//! as unprocessed instead of blocking the run.

use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, error, warn};

use super::outcome::{TileOutcome, WorkerId};
use super::processor::TileProcessor;
use super::progress::{ProgressCallback, ProgressTracker};
use crate::tile::TileId;

/// Unit of work on the task channel.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Task {
    Tile(TileId),
    Stop,
}

/// Result of a pool run.
#[derive(Debug, Clone, Default)]
pub struct PoolReport {
    /// One outcome per processed tile, in completion order.
    pub outcomes: Vec<TileOutcome>,
    /// Input tiles for which no outcome arrived.
    pub unprocessed: Vec<TileId>,
    /// Wall time of the run.
    pub elapsed: Duration,
}

/// Pool of worker threads.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    workers: usize,
    throttle: Duration,
}

impl WorkerPool {
    /// Create a pool with `workers` threads (minimum 1) that pause for
    /// `throttle` after every tile.
    pub fn new(workers: usize, throttle: Duration) -> Self {
        Self {
            workers: workers.max(1),
            throttle,
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn throttle(&self) -> Duration {
        self.throttle
    }

    /// Process every tile once and collect the outcomes.
    pub fn run(
        &self,
        tiles: &[TileId],
        processor: Arc<dyn TileProcessor>,
        on_progress: Option<ProgressCallback>,
    ) -> PoolReport {
        let expected = tiles.len();
        let mut tracker = ProgressTracker::new(expected);

        let (task_tx, task_rx) = mpsc::channel::<Task>();
        for tile in tiles {
            // The receiver is alive until the workers are spawned and joined.
            let _ = task_tx.send(Task::Tile(tile.clone()));
        }
        for _ in 0..self.workers {
            let _ = task_tx.send(Task::Stop);
        }
        drop(task_tx);

        let task_rx = Arc::new(Mutex::new(task_rx));
        let (result_tx, result_rx) = mpsc::channel::<TileOutcome>();

        let handles: Vec<JoinHandle<()>> = (0..self.workers)
            .filter_map(|id| {
                self.spawn_worker(
                    id,
                    Arc::clone(&task_rx),
                    result_tx.clone(),
                    Arc::clone(&processor),
                )
            })
            .collect();
        drop(result_tx);

        debug!(workers = handles.len(), tiles = expected, "Worker pool started");

        let outcomes = collect(&result_rx, expected, &mut tracker, on_progress.as_ref());

        for handle in handles {
            if handle.join().is_err() {
                error!("Worker thread panicked");
            }
        }

        let unprocessed = unreported(tiles, &outcomes);
        if !unprocessed.is_empty() {
            error!(
                count = unprocessed.len(),
                "Workers stopped before reporting every tile"
            );
        }

        PoolReport {
            outcomes,
            unprocessed,
            elapsed: tracker.elapsed(),
        }
    }

    fn spawn_worker(
        &self,
        id: WorkerId,
        tasks: Arc<Mutex<Receiver<Task>>>,
        results: Sender<TileOutcome>,
        processor: Arc<dyn TileProcessor>,
    ) -> Option<JoinHandle<()>> {
        let throttle = self.throttle;
        thread::Builder::new()
            .name(format!("tile-worker-{}", id))
            .spawn(move || worker_loop(id, &tasks, &results, processor.as_ref(), throttle))
            .map_err(|e| error!(worker = id, "Failed to spawn worker: {}", e))
            .ok()
    }
}

/// Idle → fetch task → process → report → idle, until `Stop` or a closed
/// channel.
fn worker_loop(
    id: WorkerId,
    tasks: &Mutex<Receiver<Task>>,
    results: &Sender<TileOutcome>,
    processor: &dyn TileProcessor,
    throttle: Duration,
) {
    loop {
        // Lock only for the receive so other workers can pull while this
        // one is processing.
        let task = tasks.lock().recv();

        let tile = match task {
            Ok(Task::Tile(tile)) => tile,
            Ok(Task::Stop) => {
                debug!(worker = id, "Worker stopped");
                return;
            }
            Err(_) => {
                debug!(worker = id, "Task channel closed, worker stopped");
                return;
            }
        };

        let outcome = processor.process(&tile, id);
        if results.send(outcome).is_err() {
            warn!(worker = id, tile = %tile, "Result channel closed, worker stopped");
            return;
        }

        if !throttle.is_zero() {
            thread::sleep(throttle);
        }
    }
}

fn collect(
    results: &Receiver<TileOutcome>,
    expected: usize,
    tracker: &mut ProgressTracker,
    on_progress: Option<&ProgressCallback>,
) -> Vec<TileOutcome> {
    let mut outcomes = Vec::with_capacity(expected);
    while outcomes.len() < expected {
        match results.recv() {
            Ok(outcome) => {
                outcomes.push(outcome);
                tracker.record();
                if let Some(cb) = on_progress {
                    cb(tracker.completed(), tracker.total());
                }
            }
            // Every worker is gone.
            Err(_) => break,
        }
    }
    outcomes
}

/// Input tiles without an outcome, honouring duplicates in the input.
fn unreported(tiles: &[TileId], outcomes: &[TileOutcome]) -> Vec<TileId> {
    let mut reported: HashMap<&TileId, usize> = HashMap::new();
    for outcome in outcomes {
        *reported.entry(&outcome.tile).or_default() += 1;
    }
    tiles
        .iter()
        .filter(|tile| match reported.get_mut(tile) {
            Some(count) if *count > 0 => {
                *count -= 1;
                false
            }
            _ => true,
        })
        .cloned()
        .collect()
}
