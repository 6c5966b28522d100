//! Run manifest: the durable record of what a run did with every tile.
//!
//! The manifest is a JSON object keyed by tile identifier. Each value is
//! `[worker, download_attempted, download_succeeded, copy_attempted,
//! copy_succeeded]`:
//!
//! ```json
//! {
//!     "25GN2": [0, true, true, false, false],
//!     "37EN1": [1, false, false, true, true]
//! }
//! ```
//!
//! Every run writes two identical files into the output directory: a
//! snapshot named after the run tag and the time of writing, and a
//! `-latest` file that is overwritten by the next run with the same tag.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;
use thiserror::Error;
use tracing::info;

use crate::distributor::{TileOutcome, WorkerId};
use crate::tile::TileId;

/// File name prefix of every manifest.
const MANIFEST_PREFIX: &str = "downloadList";

/// Errors writing or reading a manifest. Writing failures end the run.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to serialize manifest: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("failed to write manifest {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read manifest {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse manifest {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Result type for manifest operations.
pub type ManifestResult<T> = Result<T, ManifestError>;

/// Outcome fields of one tile, serialised as a JSON array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry(
    pub WorkerId,
    pub bool,
    pub bool,
    pub bool,
    pub bool,
);

impl ManifestEntry {
    pub fn worker(&self) -> WorkerId {
        self.0
    }

    pub fn download_attempted(&self) -> bool {
        self.1
    }

    pub fn download_succeeded(&self) -> bool {
        self.2
    }

    pub fn copy_attempted(&self) -> bool {
        self.3
    }

    pub fn copy_succeeded(&self) -> bool {
        self.4
    }
}

impl From<&TileOutcome> for ManifestEntry {
    fn from(o: &TileOutcome) -> Self {
        Self(
            o.worker,
            o.download_attempted,
            o.download_succeeded,
            o.copy_attempted,
            o.copy_succeeded,
        )
    }
}

/// Outcome of every tile of a run, keyed and sorted by tile identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    entries: BTreeMap<TileId, ManifestEntry>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an outcome. A later outcome for the same tile replaces the
    /// earlier one.
    pub fn record(&mut self, outcome: &TileOutcome) {
        self.entries
            .insert(outcome.tile.clone(), ManifestEntry::from(outcome));
    }

    pub fn get(&self, tile: &TileId) -> Option<&ManifestEntry> {
        self.entries.get(tile)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TileId, &ManifestEntry)> {
        self.entries.iter()
    }

    /// Render as JSON indented by four spaces.
    pub fn to_json(&self) -> ManifestResult<Vec<u8>> {
        let mut out = Vec::new();
        let formatter = PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
        self.serialize(&mut serializer)
            .map_err(ManifestError::Serialize)?;
        Ok(out)
    }

    /// Load a manifest file written by [`ManifestWriter`].
    pub fn load(path: &Path) -> ManifestResult<Self> {
        let text = fs::read_to_string(path).map_err(|source| ManifestError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ManifestError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl<'a> FromIterator<&'a TileOutcome> for Manifest {
    fn from_iter<I: IntoIterator<Item = &'a TileOutcome>>(iter: I) -> Self {
        let mut manifest = Self::new();
        for outcome in iter {
            manifest.record(outcome);
        }
        manifest
    }
}

/// Paths of the two files written for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestPaths {
    pub snapshot: PathBuf,
    pub latest: PathBuf,
}

/// Persists manifests into an output directory.
#[derive(Debug, Clone)]
pub struct ManifestWriter {
    output_dir: PathBuf,
    tag: String,
    extension: String,
}

impl ManifestWriter {
    pub fn new(
        output_dir: impl Into<PathBuf>,
        tag: impl Into<String>,
        extension: impl Into<String>,
    ) -> Self {
        Self {
            output_dir: output_dir.into(),
            tag: tag.into(),
            extension: extension.into(),
        }
    }

    /// File names for a run written at `at`.
    ///
    /// The snapshot carries the Unix time with microseconds, e.g.
    /// `downloadList-nightly-1571234567.123456.js`.
    pub fn paths(&self, at: DateTime<Utc>) -> ManifestPaths {
        let stamp = format!("{}.{:06}", at.timestamp(), at.timestamp_subsec_micros());
        ManifestPaths {
            snapshot: self.output_dir.join(format!(
                "{}-{}-{}.{}",
                MANIFEST_PREFIX, self.tag, stamp, self.extension
            )),
            latest: self.output_dir.join(format!(
                "{}-{}-latest.{}",
                MANIFEST_PREFIX, self.tag, self.extension
            )),
        }
    }

    /// Write the snapshot and the latest file.
    pub fn write(&self, manifest: &Manifest, at: DateTime<Utc>) -> ManifestResult<ManifestPaths> {
        let json = manifest.to_json()?;
        let paths = self.paths(at);

        for path in [&paths.snapshot, &paths.latest] {
            fs::write(path, &json).map_err(|source| ManifestError::Write {
                path: path.clone(),
                source,
            })?;
        }

        info!(
            tiles = manifest.len(),
            path = %paths.snapshot.display(),
            "Manifest written"
        );
        Ok(paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn outcome(tile: &str, worker: WorkerId, download: (bool, bool), copy: (bool, bool)) -> TileOutcome {
        TileOutcome {
            tile: TileId::from(tile),
            worker,
            download_attempted: download.0,
            download_succeeded: download.1,
            copy_attempted: copy.0,
            copy_succeeded: copy.1,
            remote_probe_failed: false,
        }
    }

    fn sample() -> Manifest {
        [
            outcome("37EN1", 1, (false, false), (true, true)),
            outcome("25GN2", 0, (true, true), (false, false)),
            outcome("11HZ1", 2, (true, false), (false, false)),
        ]
        .iter()
        .collect()
    }

    #[test]
    fn test_entry_accessors() {
        let entry = ManifestEntry(3, true, false, true, true);
        assert_eq!(entry.worker(), 3);
        assert!(entry.download_attempted());
        assert!(!entry.download_succeeded());
        assert!(entry.copy_attempted());
        assert!(entry.copy_succeeded());
    }

    #[test]
    fn test_json_shape() {
        let json = String::from_utf8(sample().to_json().unwrap()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["25GN2"], serde_json::json!([0, true, true, false, false]));
        assert_eq!(value["37EN1"], serde_json::json!([1, false, false, true, true]));
        assert!(json.contains("\n    \"11HZ1\""));
    }

    #[test]
    fn test_keys_are_sorted() {
        let manifest = sample();
        let keys: Vec<&str> = manifest.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["11HZ1", "25GN2", "37EN1"]);
    }

    #[test]
    fn test_last_write_wins() {
        let mut manifest = Manifest::new();
        manifest.record(&outcome("A", 0, (true, false), (false, false)));
        manifest.record(&outcome("A", 1, (true, true), (false, false)));

        assert_eq!(manifest.len(), 1);
        assert_eq!(
            manifest.get(&"A".into()),
            Some(&ManifestEntry(1, true, true, false, false))
        );
    }

    #[test]
    fn test_paths() {
        let writer = ManifestWriter::new("/out", "nightly", "js");
        let at = Utc.timestamp_opt(1_571_234_567, 123_456_000).unwrap();
        let paths = writer.paths(at);

        assert_eq!(
            paths.snapshot,
            PathBuf::from("/out/downloadList-nightly-1571234567.123456.js")
        );
        assert_eq!(paths.latest, PathBuf::from("/out/downloadList-nightly-latest.js"));
    }

    #[test]
    fn test_write_then_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ManifestWriter::new(dir.path(), "42", "js");
        let manifest = sample();

        let paths = writer.write(&manifest, Utc::now()).unwrap();

        assert_eq!(Manifest::load(&paths.snapshot).unwrap(), manifest);
        assert_eq!(Manifest::load(&paths.latest).unwrap(), manifest);
    }

    #[test]
    fn test_latest_is_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ManifestWriter::new(dir.path(), "42", "js");

        writer
            .write(&sample(), Utc.timestamp_opt(1_000, 0).unwrap())
            .unwrap();
        let paths = writer
            .write(&Manifest::new(), Utc.timestamp_opt(2_000, 0).unwrap())
            .unwrap();

        assert!(Manifest::load(&paths.latest).unwrap().is_empty());
        let first = dir.path().join("downloadList-42-1000.000000.js");
        assert_eq!(Manifest::load(&first).unwrap(), sample());
    }

    #[test]
    fn test_write_into_missing_dir_is_error() {
        let writer = ManifestWriter::new("/nonexistent/output", "42", "js");
        let err = writer.write(&sample(), Utc::now()).unwrap_err();
        assert!(matches!(err, ManifestError::Write { .. }));
    }

    #[test]
    fn test_load_garbage_is_parse_error() {
        let file = tempfile::NamedTempFile::new().unwrap();
        fs::write(file.path(), "not json").unwrap();
        let err = Manifest::load(file.path()).unwrap_err();
        assert!(matches!(err, ManifestError::Parse { .. }));
    }
}
