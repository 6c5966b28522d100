//! Moving tiles into the output directory: HTTP download or local copy.
//!
//! Both operations are all-or-nothing. A download is written to a `.part`
//! file next to its destination and only renamed into place once the body
//! has been fully received.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use filetime::FileTime;
use thiserror::Error;
use tracing::debug;

use crate::remote::{RemoteError, RemoteSource};
use crate::tile::{TileId, TileLayout};

/// Result type for transfer operations.
pub type TransferResult<T> = Result<T, TransferError>;

/// Errors that can occur while moving a tile.
#[derive(Debug, Error)]
pub enum TransferError {
    /// The remote source failed to deliver the tile.
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// Failed to write the destination file.
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to copy a tile from the mirror.
    #[error("failed to copy file {} to {}: {source}", from.display(), to.display())]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Performs downloads and local copies for tiles.
#[derive(Clone)]
pub struct Transfer {
    layout: TileLayout,
    remote: Arc<dyn RemoteSource>,
}

impl Transfer {
    pub fn new(layout: TileLayout, remote: Arc<dyn RemoteSource>) -> Self {
        Self { layout, remote }
    }

    /// Download the tile into the output directory, returning its size.
    pub fn download(&self, tile: &TileId) -> TransferResult<u64> {
        let url = self.layout.url(tile);
        let dest = self.layout.output_path(tile);
        let part = part_path(&dest);

        let result = self.download_to(&url, &part).and_then(|bytes| {
            fs::rename(&part, &dest).map_err(|source| TransferError::Write {
                path: dest.clone(),
                source,
            })?;
            Ok(bytes)
        });

        if result.is_err() {
            fs::remove_file(&part).ok();
        } else {
            debug!(tile = %tile, path = %dest.display(), "Downloaded");
        }
        result
    }

    fn download_to(&self, url: &str, part: &Path) -> TransferResult<u64> {
        let file = File::create(part).map_err(|source| TransferError::Write {
            path: part.to_path_buf(),
            source,
        })?;
        let mut writer = BufWriter::new(file);
        let bytes = self.remote.fetch(url, &mut writer)?;
        writer.flush().map_err(|source| TransferError::Write {
            path: part.to_path_buf(),
            source,
        })?;
        Ok(bytes)
    }

    /// Copy the tile from the mirror to the output directory.
    ///
    /// The copy keeps the modification time of the mirrored file and, like a
    /// download, only appears under its final name once complete.
    pub fn copy(&self, tile: &TileId) -> TransferResult<u64> {
        let from = self.layout.local_path(tile);
        let to = self.layout.output_path(tile);
        let part = part_path(&to);

        let result = copy_to(&from, &part).and_then(|bytes| {
            fs::rename(&part, &to).map_err(|source| TransferError::Copy {
                from: from.clone(),
                to: to.clone(),
                source,
            })?;
            Ok(bytes)
        });

        if result.is_err() {
            fs::remove_file(&part).ok();
        } else {
            debug!(tile = %tile, path = %to.display(), "Copied from mirror");
        }
        result
    }
}

fn copy_to(from: &Path, part: &Path) -> TransferResult<u64> {
    let copy_err = |source| TransferError::Copy {
        from: from.to_path_buf(),
        to: part.to_path_buf(),
        source,
    };

    let bytes = fs::copy(from, part).map_err(copy_err)?;
    let meta = fs::metadata(from).map_err(copy_err)?;
    filetime::set_file_mtime(part, FileTime::from_last_modification_time(&meta))
        .map_err(copy_err)?;
    Ok(bytes)
}

fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_os_string();
    name.push(".part");
    PathBuf::from(name)
}
