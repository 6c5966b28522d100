//! CLI error type.

use std::fmt;

use tilemirror::config::ConfigError;
use tilemirror::job::MirrorError;
use tilemirror::logging::LoggingError;

/// Errors reported to the user before exiting with a failure status.
#[derive(Debug)]
pub enum CliError {
    /// Configuration file or command-line values are unusable.
    Config(String),
    /// Logging could not be set up.
    Logging(String),
    /// The mirror run failed.
    Run(MirrorError),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Logging(msg) => write!(f, "Logging error: {}", msg),
            CliError::Run(e) => write!(f, "Mirror run failed: {}", e),
        }
    }
}

impl std::error::Error for CliError {}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<LoggingError> for CliError {
    fn from(e: LoggingError) -> Self {
        CliError::Logging(e.to_string())
    }
}

impl From<MirrorError> for CliError {
    fn from(e: MirrorError) -> Self {
        CliError::Run(e)
    }
}
