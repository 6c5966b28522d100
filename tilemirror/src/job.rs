//! A single mirror run from configuration to manifest.
//!
//! [`MirrorJob`] validates the configuration, builds the remote client,
//! state probe and transfer executor, hands the tiles to a
//! [`WorkerPool`](crate::distributor::WorkerPool) and persists the
//! collected outcomes.
//!
//! # Example
//!
//! ```no_run
//! use tilemirror::config::MirrorConfig;
//! use tilemirror::job::MirrorJob;
//! use tilemirror::tile::{load_tiles, TileSource};
//!
//! let config = MirrorConfig::new("/data/mirror", "/data/out", "https://example.com/tiles/")
//!     .with_suffix(".laz")
//!     .with_workers(4);
//!
//! let tiles = load_tiles(&TileSource::Builtin);
//! let summary = MirrorJob::new(config).run(&tiles, None)?;
//! println!("downloaded {} tiles", summary.downloaded);
//! # Ok::<(), tilemirror::job::MirrorError>(())
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::{ConfigError, MirrorConfig};
use crate::distributor::{MirrorProcessor, PoolReport, ProgressCallback, WorkerPool};
use crate::manifest::{Manifest, ManifestError, ManifestPaths, ManifestWriter};
use crate::probe::StateProbe;
use crate::remote::{RemoteError, RemoteSource, ReqwestRemote};
use crate::tile::TileId;
use crate::transfer::Transfer;

/// Errors that end a run.
#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to create HTTP client: {0}")]
    Client(#[from] RemoteError),

    #[error("manifest error: {0}")]
    Manifest(#[from] ManifestError),
}

/// Result type for mirror runs.
pub type MirrorResult<T> = Result<T, MirrorError>;

/// Totals of a finished run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Number of tiles handed to the workers.
    pub tiles: usize,
    pub downloaded: usize,
    pub download_failures: usize,
    pub copied: usize,
    pub copy_failures: usize,
    /// Tiles processed without any transfer.
    pub skipped: usize,
    /// Tiles whose remote state could not be determined.
    pub probe_failures: usize,
    /// Tiles no worker reported on.
    pub unprocessed: Vec<TileId>,
    /// Files written, `None` for an empty run.
    pub manifest: Option<ManifestPaths>,
    /// Wall time of the whole run, manifest writing included.
    pub elapsed: Duration,
}

impl RunSummary {
    fn from_report(tiles: usize, report: &PoolReport) -> Self {
        let mut summary = Self {
            tiles,
            unprocessed: report.unprocessed.clone(),
            elapsed: report.elapsed,
            ..Self::default()
        };

        for outcome in &report.outcomes {
            if outcome.download_attempted {
                if outcome.download_succeeded {
                    summary.downloaded += 1;
                } else {
                    summary.download_failures += 1;
                }
            } else if outcome.copy_attempted {
                if outcome.copy_succeeded {
                    summary.copied += 1;
                } else {
                    summary.copy_failures += 1;
                }
            } else {
                summary.skipped += 1;
            }
            if outcome.remote_probe_failed {
                summary.probe_failures += 1;
            }
        }

        summary
    }

    /// Number of tiles that ended in a failed transfer or were never
    /// processed.
    pub fn failures(&self) -> usize {
        self.download_failures + self.copy_failures + self.unprocessed.len()
    }
}

/// One mirror run.
pub struct MirrorJob {
    config: MirrorConfig,
    remote: Option<Arc<dyn RemoteSource>>,
}

impl MirrorJob {
    /// Create a job that talks HTTP to the configured base URL.
    pub fn new(config: MirrorConfig) -> Self {
        Self {
            config,
            remote: None,
        }
    }

    /// Create a job that uses the given remote source instead of HTTP.
    pub fn with_remote(config: MirrorConfig, remote: Arc<dyn RemoteSource>) -> Self {
        Self {
            config,
            remote: Some(remote),
        }
    }

    pub fn config(&self) -> &MirrorConfig {
        &self.config
    }

    /// Reconcile every tile and write the manifest.
    ///
    /// Per-tile failures are recorded in the manifest and the summary.
    /// Only an invalid configuration, a client that cannot be built or a
    /// manifest that cannot be written fail the run.
    pub fn run(
        &self,
        tiles: &[TileId],
        on_progress: Option<ProgressCallback>,
    ) -> MirrorResult<RunSummary> {
        let started = Instant::now();
        self.config.validate()?;

        if tiles.is_empty() {
            info!("No tiles specified, nothing to do");
            return Ok(RunSummary::default());
        }

        let remote: Arc<dyn RemoteSource> = match &self.remote {
            Some(remote) => Arc::clone(remote),
            None => Arc::new(ReqwestRemote::new(self.config.timeout)?),
        };

        let layout = self.config.layout();
        let processor = MirrorProcessor::new(
            StateProbe::new(layout.clone(), Arc::clone(&remote)),
            Transfer::new(layout, remote),
            self.config.copy_local,
        );

        info!(
            tiles = tiles.len(),
            workers = self.config.workers,
            tag = %self.config.tag,
            in_place = processor.copy_policy().in_place,
            "Starting mirror run"
        );

        let pool = WorkerPool::new(self.config.workers, self.config.throttle);
        let report = pool.run(tiles, Arc::new(processor), on_progress);

        let manifest: Manifest = report.outcomes.iter().collect();
        let writer = ManifestWriter::new(
            &self.config.output_dir,
            &self.config.tag,
            &self.config.manifest_extension,
        );
        let paths = writer.write(&manifest, Utc::now())?;

        let mut summary = RunSummary::from_report(tiles.len(), &report);
        summary.manifest = Some(paths);
        summary.elapsed = started.elapsed();

        if summary.failures() > 0 {
            warn!(
                download_failures = summary.download_failures,
                copy_failures = summary.copy_failures,
                unprocessed = summary.unprocessed.len(),
                "Run finished with failures"
            );
        }
        info!("Time elapsed: {:.3} s", summary.elapsed.as_secs_f64());

        Ok(summary)
    }
}
