//! Tile catalogues: the built-in sheet list and user supplied list files.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use super::TileId;

/// Built-in catalogue of TOP10NL map sheet codes.
const BUILTIN_CATALOG: &str = include_str!("../../resources/top10nl.txt");

/// Errors raised while reading a tile list.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The list file could not be opened or read.
    #[error("input file {} could not be read: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Where the tiles of a run come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TileSource {
    /// The catalogue shipped with the library.
    Builtin,
    /// A text file with one identifier per line.
    File(PathBuf),
}

/// Parse catalogue text into identifiers.
///
/// Trailing whitespace is stripped; blank lines and `#` comments are ignored.
pub fn parse_tile_list(text: &str) -> Vec<TileId> {
    text.lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty() && !line.trim_start().starts_with('#'))
        .map(TileId::new)
        .collect()
}

/// The built-in catalogue, in catalogue order.
pub fn builtin_tiles() -> Vec<TileId> {
    parse_tile_list(BUILTIN_CATALOG)
}

/// Read a tile list file.
pub fn read_tile_list(path: &Path) -> Result<Vec<TileId>, CatalogError> {
    let text = fs::read_to_string(path).map_err(|source| CatalogError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_tile_list(&text))
}

/// Resolve a tile source into a list.
///
/// An unreadable file yields an empty list, which callers treat as
/// "nothing to do" rather than a failure.
pub fn load_tiles(source: &TileSource) -> Vec<TileId> {
    match source {
        TileSource::Builtin => builtin_tiles(),
        TileSource::File(path) => match read_tile_list(path) {
            Ok(tiles) => {
                debug!(path = %path.display(), count = tiles.len(), "Loaded tile list");
                tiles
            }
            Err(e) => {
                warn!("{}", e);
                Vec::new()
            }
        },
    }
}

/// Select shard `index` of `count` from the list.
///
/// Every shard but the last holds `len / count` consecutive tiles; the last
/// one absorbs the remainder. The split only depends on the list and the
/// shard count, so independent machines running the same list divide the
/// work without talking to each other.
pub fn shard(tiles: &[TileId], index: usize, count: usize) -> Vec<TileId> {
    if count == 0 || index >= count {
        return Vec::new();
    }
    let chunk = tiles.len() / count;
    let start = index * chunk;
    let end = if index == count - 1 {
        tiles.len()
    } else {
        start + chunk
    };
    tiles[start..end].to_vec()
}
