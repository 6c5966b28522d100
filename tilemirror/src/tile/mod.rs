//! Tile identifiers and the naming convention shared by mirror, output
//! directory and remote source.
//!
//! A tile `37EN1` with suffix `.laz` is stored as `37en1.laz` directly under
//! the mirror root and the output directory, and is fetched from
//! `<base_url>37en1.laz`.

pub mod catalog;

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub use catalog::{load_tiles, read_tile_list, shard, CatalogError, TileSource};

/// Opaque identifier of a single tile.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TileId(String);

impl TileId {
    /// Create an identifier, stripping surrounding whitespace.
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(id.as_ref().trim().to_string())
    }

    /// The identifier as given in the catalogue.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Canonical file name: lower-cased identifier followed by the suffix.
    pub fn file_name(&self, suffix: &str) -> String {
        format!("{}{}", self.0.to_lowercase(), suffix)
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TileId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for TileId {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

/// Where a tile lives locally, where it goes, and where it comes from.
#[derive(Debug, Clone)]
pub struct TileLayout {
    local_root: PathBuf,
    output_dir: PathBuf,
    base_url: String,
    suffix: String,
}

impl TileLayout {
    pub fn new(
        local_root: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        base_url: impl Into<String>,
        suffix: impl Into<String>,
    ) -> Self {
        Self {
            local_root: local_root.into(),
            output_dir: output_dir.into(),
            base_url: base_url.into(),
            suffix: suffix.into(),
        }
    }

    pub fn local_root(&self) -> &Path {
        &self.local_root
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn file_name(&self, tile: &TileId) -> String {
        tile.file_name(&self.suffix)
    }

    /// Path of the tile inside the local mirror.
    pub fn local_path(&self, tile: &TileId) -> PathBuf {
        self.local_root.join(self.file_name(tile))
    }

    /// Path the tile is downloaded or copied to.
    pub fn output_path(&self, tile: &TileId) -> PathBuf {
        self.output_dir.join(self.file_name(tile))
    }

    /// Remote location: plain concatenation of base URL and file name.
    pub fn url(&self, tile: &TileId) -> String {
        format!("{}{}", self.base_url, self.file_name(tile))
    }

    /// Whether the mirror root and the output directory are the same place.
    ///
    /// Both paths are canonicalised when they exist so that `./data` and
    /// `data/` compare equal; otherwise they are compared as given.
    pub fn is_in_place(&self) -> bool {
        match (
            self.local_root.canonicalize(),
            self.output_dir.canonicalize(),
        ) {
            (Ok(local), Ok(output)) => local == output,
            _ => self.local_root == self.output_dir,
        }
    }
}
