//! Per-tile outcome reported by workers.

use crate::tile::TileId;

/// Identifier of a worker within a pool, `0..workers`.
pub type WorkerId = usize;

/// What happened to one tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileOutcome {
    pub tile: TileId,
    pub worker: WorkerId,
    pub download_attempted: bool,
    pub download_succeeded: bool,
    pub copy_attempted: bool,
    pub copy_succeeded: bool,
    /// The remote could not be probed and was treated as absent.
    pub remote_probe_failed: bool,
}

impl TileOutcome {
    /// Outcome of a tile that needed no transfer.
    pub fn skipped(tile: TileId, worker: WorkerId) -> Self {
        Self {
            tile,
            worker,
            download_attempted: false,
            download_succeeded: false,
            copy_attempted: false,
            copy_succeeded: false,
            remote_probe_failed: false,
        }
    }
}
