//! Configuration errors.
//!
//! Every variant is fatal and raised before any worker starts.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The local mirror path is not an existing directory.
    #[error("local repository {} is not a valid directory", .0.display())]
    LocalPathNotDirectory(PathBuf),

    /// A plain file already exists where the output directory should be.
    #[error("a file with the same name as output directory {} exists; please delete it", .0.display())]
    OutputPathIsFile(PathBuf),

    /// The output directory could not be created.
    #[error("failed to create output directory {}: {source}", path.display())]
    CreateOutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No filename suffix configured, so identifiers alone would have to
    /// serve as file names.
    #[error("no file suffix configured; tile identifiers alone cannot be used as file names")]
    MissingSuffix,

    /// Worker count must be at least one.
    #[error("worker count must be at least 1, got {0}")]
    InvalidWorkerCount(usize),

    /// Remote base location is empty.
    #[error("remote base url must not be empty")]
    InvalidBaseUrl,

    /// Failed to read the configuration file.
    #[error("failed to read config file {}: {reason}", path.display())]
    FileRead { path: PathBuf, reason: String },

    /// A configuration value could not be parsed.
    #[error("invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },
}
