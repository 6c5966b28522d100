//! Per-tile work executed by a worker: probe, decide, transfer.

use tracing::{info, warn};

use super::outcome::{TileOutcome, WorkerId};
use crate::probe::StateProbe;
use crate::reconcile::{decide, Action, CopyPolicy, Diagnostic};
use crate::tile::TileId;
use crate::transfer::Transfer;

/// Work a pool applies to each tile.
///
/// Implementations must not panic on per-tile failures; every failure is
/// folded into the returned outcome.
pub trait TileProcessor: Send + Sync {
    fn process(&self, tile: &TileId, worker: WorkerId) -> TileOutcome;
}

/// Reconciles a tile against the mirror and transfers it when needed.
#[derive(Clone)]
pub struct MirrorProcessor {
    probe: StateProbe,
    transfer: Transfer,
    copy: CopyPolicy,
}

impl MirrorProcessor {
    pub fn new(probe: StateProbe, transfer: Transfer, copy_requested: bool) -> Self {
        let copy = CopyPolicy {
            requested: copy_requested,
            in_place: probe.layout().is_in_place(),
        };
        Self {
            probe,
            transfer,
            copy,
        }
    }

    pub fn copy_policy(&self) -> CopyPolicy {
        self.copy
    }
}

impl TileProcessor for MirrorProcessor {
    fn process(&self, tile: &TileId, worker: WorkerId) -> TileOutcome {
        let state = self.probe.probe(tile);
        let decision = decide(&state.local, &state.remote, self.copy);

        let mut outcome = TileOutcome::skipped(tile.clone(), worker);
        outcome.remote_probe_failed = state.remote_error.is_some();

        match decision.diagnostic {
            Some(Diagnostic::AmbiguousOrigin) => {
                warn!(tile = %tile, "Unclear origin of data: present locally but not remotely");
            }
            Some(Diagnostic::NotFound) => {
                info!(tile = %tile, "Neither local nor remote tile found");
            }
            Some(Diagnostic::UpToDate) => {
                info!(tile = %tile, "Tile exists and is up-to-date");
            }
            None => {}
        }

        match decision.action {
            Action::Download => {
                outcome.download_attempted = true;
                match self.transfer.download(tile) {
                    Ok(bytes) => {
                        info!(tile = %tile, worker, bytes, "Downloaded tile");
                        outcome.download_succeeded = true;
                    }
                    Err(e) => warn!(tile = %tile, worker, "Failure while downloading: {}", e),
                }
            }
            Action::Copy => {
                outcome.copy_attempted = true;
                match self.transfer.copy(tile) {
                    Ok(_) => outcome.copy_succeeded = true,
                    Err(e) => warn!(tile = %tile, worker, "{}", e),
                }
            }
            Action::CopyInPlace => {
                info!(tile = %tile, "Output is the local repository, no copy necessary");
                outcome.copy_attempted = true;
                outcome.copy_succeeded = true;
            }
            Action::Skip => {}
        }

        outcome
    }
}
