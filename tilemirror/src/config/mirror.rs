//! Run configuration for a mirror job.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use super::error::{ConfigError, ConfigResult};
use crate::tile::TileLayout;

pub use crate::remote::DEFAULT_TIMEOUT_SECS;

/// Default pause after each tile, in milliseconds.
pub const DEFAULT_THROTTLE_MS: u64 = 1000;

/// Default manifest file extension.
pub const DEFAULT_MANIFEST_EXTENSION: &str = "js";

/// Configuration for a single mirror run.
#[derive(Debug, Clone)]
pub struct MirrorConfig {
    /// Directory holding previously retrieved tiles.
    pub local_dir: PathBuf,

    /// Download destination. May be the same directory as `local_dir`.
    pub output_dir: PathBuf,

    /// Common prefix of every tile URL.
    pub base_url: String,

    /// Common file suffix, e.g. `.laz`.
    pub suffix: Option<String>,

    /// Number of concurrent workers.
    pub workers: usize,

    /// Run identifier used in manifest file names.
    pub tag: String,

    /// Copy up-to-date tiles from the mirror to the output directory.
    pub copy_local: bool,

    /// HTTP request timeout.
    pub timeout: Duration,

    /// Pause taken by a worker after every tile.
    pub throttle: Duration,

    /// Extension of the manifest files.
    pub manifest_extension: String,
}

impl MirrorConfig {
    /// Create a configuration with default tuning.
    pub fn new(
        local_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            local_dir: local_dir.into(),
            output_dir: output_dir.into(),
            base_url: base_url.into(),
            suffix: None,
            workers: 1,
            tag: "0".to_string(),
            copy_local: false,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            throttle: Duration::from_millis(DEFAULT_THROTTLE_MS),
            manifest_extension: DEFAULT_MANIFEST_EXTENSION.to_string(),
        }
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = Some(suffix.into());
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    pub fn with_copy_local(mut self, copy_local: bool) -> Self {
        self.copy_local = copy_local;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_throttle(mut self, throttle: Duration) -> Self {
        self.throttle = throttle;
        self
    }

    pub fn with_manifest_extension(mut self, extension: impl Into<String>) -> Self {
        self.manifest_extension = extension.into();
        self
    }

    /// Check the configuration before any work starts.
    ///
    /// Creates the output directory when it does not exist yet.
    pub fn validate(&self) -> ConfigResult<()> {
        if !self.local_dir.is_dir() {
            return Err(ConfigError::LocalPathNotDirectory(self.local_dir.clone()));
        }
        if self.output_dir.is_file() {
            return Err(ConfigError::OutputPathIsFile(self.output_dir.clone()));
        }
        if self.suffix.as_deref().map_or(true, str::is_empty) {
            return Err(ConfigError::MissingSuffix);
        }
        if self.workers == 0 {
            return Err(ConfigError::InvalidWorkerCount(self.workers));
        }
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::InvalidBaseUrl);
        }

        fs::create_dir_all(&self.output_dir).map_err(|source| ConfigError::CreateOutputDir {
            path: self.output_dir.clone(),
            source,
        })?;

        Ok(())
    }

    /// File layout derived from this configuration.
    pub fn layout(&self) -> TileLayout {
        TileLayout::new(
            self.local_dir.clone(),
            self.output_dir.clone(),
            self.base_url.clone(),
            self.suffix.clone().unwrap_or_default(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config(local: &std::path::Path, output: &std::path::Path) -> MirrorConfig {
        MirrorConfig::new(local, output, "https://example.com/tiles/").with_suffix(".laz")
    }

    #[test]
    fn test_default_tuning() {
        let config = MirrorConfig::new("/a", "/b", "http://x/");
        assert_eq!(config.workers, 1);
        assert!(!config.copy_local);
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert_eq!(config.throttle, Duration::from_millis(DEFAULT_THROTTLE_MS));
        assert_eq!(config.manifest_extension, "js");
    }

    #[test]
    fn test_builder_pattern() {
        let config = MirrorConfig::new("/a", "/b", "http://x/")
            .with_suffix(".laz")
            .with_workers(8)
            .with_tag("nightly")
            .with_copy_local(true)
            .with_timeout(Duration::from_secs(60))
            .with_throttle(Duration::ZERO)
            .with_manifest_extension("json");

        assert_eq!(config.suffix.as_deref(), Some(".laz"));
        assert_eq!(config.workers, 8);
        assert_eq!(config.tag, "nightly");
        assert!(config.copy_local);
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.throttle, Duration::ZERO);
        assert_eq!(config.manifest_extension, "json");
    }

    #[test]
    fn test_validate_accepts_and_creates_output() {
        let local = tempfile::tempdir().unwrap();
        let root = tempfile::tempdir().unwrap();
        let output = root.path().join("fresh");

        valid_config(local.path(), &output).validate().unwrap();
        assert!(output.is_dir());
    }

    #[test]
    fn test_validate_rejects_missing_local_dir() {
        let output = tempfile::tempdir().unwrap();
        let err = valid_config(std::path::Path::new("/nonexistent/mirror"), output.path())
            .validate()
            .unwrap_err();
        assert!(matches!(err, ConfigError::LocalPathNotDirectory(_)));
    }

    #[test]
    fn test_validate_rejects_output_file() {
        let local = tempfile::tempdir().unwrap();
        let file = tempfile::NamedTempFile::new().unwrap();
        let err = valid_config(local.path(), file.path())
            .validate()
            .unwrap_err();
        assert!(matches!(err, ConfigError::OutputPathIsFile(_)));
    }

    #[test]
    fn test_validate_requires_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let err = MirrorConfig::new(dir.path(), dir.path(), "http://x/")
            .validate()
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingSuffix));
    }

    #[test]
    fn test_validate_rejects_zero_workers() {
        let dir = tempfile::tempdir().unwrap();
        let err = valid_config(dir.path(), dir.path())
            .with_workers(0)
            .validate()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidWorkerCount(0)));
    }

    #[test]
    fn test_validate_rejects_empty_base_url() {
        let dir = tempfile::tempdir().unwrap();
        let err = MirrorConfig::new(dir.path(), dir.path(), "  ")
            .with_suffix(".laz")
            .validate()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBaseUrl));
    }

    #[test]
    fn test_layout_uses_suffix() {
        let config = MirrorConfig::new("/a", "/b", "http://x/").with_suffix(".laz");
        let layout = config.layout();
        assert_eq!(layout.url(&"AB1".into()), "http://x/ab1.laz");
    }
}
