//! Configuration: run settings, validation, and the optional INI file.

mod error;
mod file;
mod mirror;

pub use error::{ConfigError, ConfigResult};
pub use file::{parse_bool, ConfigFile, LoggingSettings, MirrorSettings};
pub use mirror::{
    MirrorConfig, DEFAULT_MANIFEST_EXTENSION, DEFAULT_THROTTLE_MS, DEFAULT_TIMEOUT_SECS,
};
