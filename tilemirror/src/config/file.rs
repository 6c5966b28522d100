//! INI configuration file.
//!
//! ```ini
//! [mirror]
//! base_url = https://geodata.example.nl/ahn3/C_
//! suffix = .LAZ
//! workers = 4
//! timeout = 300
//! throttle_ms = 1000
//! copy_local = false
//!
//! [logging]
//! level = info
//! file = /var/log/tilemirror.log
//! ```
//!
//! Every key is optional. Command-line values take precedence.

use std::path::{Path, PathBuf};

use ini::Ini;

use super::error::{ConfigError, ConfigResult};
use super::mirror::{DEFAULT_THROTTLE_MS, DEFAULT_TIMEOUT_SECS};

/// `[mirror]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct MirrorSettings {
    pub base_url: Option<String>,
    pub suffix: Option<String>,
    pub workers: usize,
    pub timeout_secs: u64,
    pub throttle_ms: u64,
    pub copy_local: bool,
}

impl Default for MirrorSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            suffix: None,
            workers: 1,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            throttle_ms: DEFAULT_THROTTLE_MS,
            copy_local: false,
        }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    pub level: String,
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

/// Parsed configuration file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigFile {
    pub mirror: MirrorSettings,
    pub logging: LoggingSettings,
}

impl ConfigFile {
    /// Default location: `~/.tilemirror/config.ini`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".tilemirror").join("config.ini"))
    }

    /// Load from the default location; a missing file yields defaults.
    pub fn load() -> ConfigResult<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load from an explicit path.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let ini = Ini::load_from_file(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_ini(&ini)
    }

    /// Parse from INI text.
    pub fn parse(text: &str) -> ConfigResult<Self> {
        let ini = Ini::load_from_str(text).map_err(|e| ConfigError::FileRead {
            path: PathBuf::from("<string>"),
            reason: e.to_string(),
        })?;
        Self::from_ini(&ini)
    }

    fn from_ini(ini: &Ini) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(section) = ini.section(Some("mirror")) {
            let m = &mut config.mirror;
            m.base_url = section.get("base_url").map(str::to_string);
            m.suffix = section.get("suffix").map(str::to_string);
            if let Some(v) = section.get("workers") {
                m.workers = parse_value("mirror.workers", v)?;
            }
            if let Some(v) = section.get("timeout") {
                m.timeout_secs = parse_value("mirror.timeout", v)?;
            }
            if let Some(v) = section.get("throttle_ms") {
                m.throttle_ms = parse_value("mirror.throttle_ms", v)?;
            }
            if let Some(v) = section.get("copy_local") {
                m.copy_local = parse_bool("mirror.copy_local", v)?;
            }
        }

        if let Some(section) = ini.section(Some("logging")) {
            if let Some(level) = section.get("level") {
                config.logging.level = level.to_string();
            }
            config.logging.file = section.get("file").map(PathBuf::from);
        }

        Ok(config)
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> ConfigResult<T> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

/// Accepts `true`/`false`, `yes`/`no`, `1`/`0` in any case.
pub fn parse_bool(key: &str, value: &str) -> ConfigResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}
