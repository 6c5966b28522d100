//! Local and remote state probing for a single tile.

use std::fs;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::remote::{RemoteErrorKind, RemoteSource, RemoteState};
use crate::tile::{TileId, TileLayout};

/// What the local mirror holds for a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LocalState {
    pub exists: bool,
    pub size: Option<u64>,
    pub modified_at: Option<DateTime<Utc>>,
}

impl LocalState {
    pub fn absent() -> Self {
        Self::default()
    }

    pub fn present(size: u64, modified_at: DateTime<Utc>) -> Self {
        Self {
            exists: true,
            size: Some(size),
            modified_at: Some(modified_at),
        }
    }
}

/// Combined probe result for one tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileState {
    pub local: LocalState,
    pub remote: RemoteState,
    /// Set when the remote could not be asked; `remote` then reads as absent.
    pub remote_error: Option<RemoteErrorKind>,
}

/// Reports local and remote state of tiles.
#[derive(Clone)]
pub struct StateProbe {
    layout: TileLayout,
    remote: Arc<dyn RemoteSource>,
}

impl StateProbe {
    pub fn new(layout: TileLayout, remote: Arc<dyn RemoteSource>) -> Self {
        Self { layout, remote }
    }

    pub fn layout(&self) -> &TileLayout {
        &self.layout
    }

    /// Stat the tile in the local mirror. A missing file is not an error.
    pub fn local(&self, tile: &TileId) -> LocalState {
        let path = self.layout.local_path(tile);
        match fs::metadata(&path) {
            Ok(meta) if meta.is_file() => {
                let modified_at = meta.modified().ok().map(DateTime::<Utc>::from);
                LocalState {
                    exists: true,
                    size: Some(meta.len()),
                    modified_at,
                }
            }
            _ => LocalState::absent(),
        }
    }

    /// Ask the remote source about the tile.
    ///
    /// Failures are logged and reported as an absent remote, together with
    /// the error kind so callers can tell the two apart.
    pub fn remote(&self, tile: &TileId) -> (RemoteState, Option<RemoteErrorKind>) {
        let url = self.layout.url(tile);
        match self.remote.stat(&url) {
            Ok(state) => {
                debug!(tile = %tile, exists = state.exists, "Remote probed");
                (state, None)
            }
            Err(e) => {
                warn!(tile = %tile, kind = ?e.kind(), "Remote probe failed: {}", e);
                (RemoteState::absent(), Some(e.kind()))
            }
        }
    }

    pub fn probe(&self, tile: &TileId) -> TileState {
        let local = self.local(tile);
        let (remote, remote_error) = self.remote(tile);
        TileState {
            local,
            remote,
            remote_error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::tests::MockRemote;
    use chrono::TimeZone;
    use filetime::FileTime;

    fn probe_with(dir: &std::path::Path, remote: MockRemote) -> StateProbe {
        let layout = TileLayout::new(dir, dir, "http://x/", ".laz");
        StateProbe::new(layout, Arc::new(remote))
    }

    #[test]
    fn test_local_missing_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let probe = probe_with(dir.path(), MockRemote::default());
        assert_eq!(probe.local(&"AB1".into()), LocalState::absent());
    }

    #[test]
    fn test_local_reports_size_and_mtime() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ab1.laz");
        fs::write(&path, vec![0u8; 100]).unwrap();
        filetime::set_file_mtime(&path, FileTime::from_unix_time(1_600_000_000, 0)).unwrap();

        let probe = probe_with(dir.path(), MockRemote::default());
        let state = probe.local(&"AB1".into());

        assert!(state.exists);
        assert_eq!(state.size, Some(100));
        assert_eq!(
            state.modified_at,
            Some(Utc.timestamp_opt(1_600_000_000, 0).unwrap())
        );
    }

    #[test]
    fn test_local_directory_is_not_a_tile() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("ab1.laz")).unwrap();
        let probe = probe_with(dir.path(), MockRemote::default());
        assert!(!probe.local(&"AB1".into()).exists);
    }

    #[test]
    fn test_remote_present() {
        let dir = tempfile::tempdir().unwrap();
        let state = RemoteState::present(None, Some(5));
        let remote = MockRemote::default().with_file("http://x/ab1.laz", state, b"hello");
        let probe = probe_with(dir.path(), remote);

        let result = probe.probe(&"AB1".into());
        assert_eq!(result.remote, state);
        assert_eq!(result.remote_error, None);
    }

    #[test]
    fn test_remote_failure_downgrades_to_absent() {
        let dir = tempfile::tempdir().unwrap();
        let remote = MockRemote::default().with_failure("http://x/ab1.laz");
        let probe = probe_with(dir.path(), remote);

        let result = probe.probe(&"AB1".into());
        assert!(!result.remote.exists);
        assert_eq!(result.remote_error, Some(RemoteErrorKind::Transport));
    }
}
