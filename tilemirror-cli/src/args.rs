//! Command-line arguments and their merge with the configuration file.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use clap::Parser;
use tilemirror::config::{parse_bool, ConfigFile, MirrorConfig};
use tilemirror::tile::TileSource;

use crate::error::CliError;

/// Upper bound (exclusive) of the random run tag.
const RANDOM_TAG_RANGE: u32 = 200_000;

/// Keep a local tile mirror in sync with an HTTP source.
///
/// Compares every tile of the catalogue (or of an input list) against the
/// local repository and the remote source, downloads what is missing or
/// newer, optionally copies up-to-date tiles to the output directory, and
/// records the outcome in `downloadList-<tag>-*.js` files.
#[derive(Debug, Parser)]
#[command(name = "tilemirror", version, about, long_about)]
pub struct Cli {
    /// Path of the local repository
    #[arg(short = 'l', long = "local-repository")]
    pub local_repository: PathBuf,

    /// Download destination; may be the local repository itself
    #[arg(short = 'o', long = "output-directory")]
    pub output_directory: PathBuf,

    /// Common base URL of the tiles
    #[arg(short = 'u', long = "base-url")]
    pub base_url: Option<String>,

    /// Common file suffix of the tiles, e.g. .LAZ
    #[arg(short = 's', long)]
    pub suffix: Option<String>,

    /// Number of workers
    #[arg(short = 'p', long)]
    pub workers: Option<usize>,

    /// File with one tile identifier per line instead of the built-in catalogue
    #[arg(short = 'i', long = "input-list")]
    pub input_list: Option<PathBuf>,

    /// Copy up-to-date tiles from the local repository to the output directory
    #[arg(
        short = 'c',
        long = "copy-local",
        num_args = 0..=1,
        default_missing_value = "true",
        value_parser = parse_flag
    )]
    pub copy_local: Option<bool>,

    /// Run identifier used in manifest names [default: random in 0..200000]
    #[arg(short = 't', long)]
    pub tag: Option<String>,

    /// Process only part of the tile list, as INDEX/COUNT (e.g. 0/4)
    #[arg(long)]
    pub shard: Option<Shard>,

    /// HTTP timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Pause after each tile, in milliseconds
    #[arg(long = "throttle-ms")]
    pub throttle_ms: Option<u64>,

    /// Configuration file [default: ~/.tilemirror/config.ini]
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Also write log output to this file
    #[arg(long = "log-file")]
    pub log_file: Option<PathBuf>,

    /// More log output (-v debug, -vv trace)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Load the configuration file named on the command line, or the
    /// default one.
    pub fn load_config_file(&self) -> Result<ConfigFile, CliError> {
        let file = match &self.config {
            Some(path) => ConfigFile::load_from(path)?,
            None => ConfigFile::load()?,
        };
        Ok(file)
    }

    /// Log level from `-v`, falling back to the configured level.
    pub fn log_level(&self, configured: &str) -> String {
        match self.verbose {
            0 => configured.to_string(),
            1 => "debug".to_string(),
            _ => "trace".to_string(),
        }
    }

    pub fn log_file(&self, file: &ConfigFile) -> Option<PathBuf> {
        self.log_file.clone().or_else(|| file.logging.file.clone())
    }

    pub fn tile_source(&self) -> TileSource {
        match &self.input_list {
            Some(path) => TileSource::File(path.clone()),
            None => TileSource::Builtin,
        }
    }

    /// Build the run configuration. Command-line values win over the file.
    pub fn mirror_config(&self, file: &ConfigFile) -> Result<MirrorConfig, CliError> {
        let settings = &file.mirror;

        let base_url = self
            .base_url
            .clone()
            .or_else(|| settings.base_url.clone())
            .ok_or_else(|| {
                CliError::Config(
                    "no base URL given. Use --base-url or set base_url in [mirror]".to_string(),
                )
            })?;

        let tag = self
            .tag
            .clone()
            .unwrap_or_else(|| rand::random_range(0..RANDOM_TAG_RANGE).to_string());

        let mut config = MirrorConfig::new(&self.local_repository, &self.output_directory, base_url)
            .with_workers(self.workers.unwrap_or(settings.workers))
            .with_tag(tag)
            .with_copy_local(self.copy_local.unwrap_or(settings.copy_local))
            .with_timeout(Duration::from_secs(
                self.timeout.unwrap_or(settings.timeout_secs),
            ))
            .with_throttle(Duration::from_millis(
                self.throttle_ms.unwrap_or(settings.throttle_ms),
            ));

        if let Some(suffix) = self.suffix.clone().or_else(|| settings.suffix.clone()) {
            config = config.with_suffix(suffix);
        }

        Ok(config)
    }
}

fn parse_flag(value: &str) -> Result<bool, String> {
    parse_bool("copy-local", value).map_err(|e| e.to_string())
}

/// Slice of the tile list handled by this machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shard {
    pub index: usize,
    pub count: usize,
}

impl FromStr for Shard {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (index, count) = s
            .split_once('/')
            .ok_or_else(|| format!("expected INDEX/COUNT, got '{}'", s))?;
        let index: usize = index
            .trim()
            .parse()
            .map_err(|_| format!("invalid shard index '{}'", index))?;
        let count: usize = count
            .trim()
            .parse()
            .map_err(|_| format!("invalid shard count '{}'", count))?;

        if count == 0 {
            return Err("shard count must be at least 1".to_string());
        }
        if index >= count {
            return Err(format!("shard index {} out of range for {} shards", index, count));
        }
        Ok(Self { index, count })
    }
}

impl fmt::Display for Shard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.index, self.count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["tilemirror", "-l", "/mirror", "-o", "/out"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_shard_parse() {
        assert_eq!("2/5".parse::<Shard>(), Ok(Shard { index: 2, count: 5 }));
        assert!("5/5".parse::<Shard>().is_err());
        assert!("0/0".parse::<Shard>().is_err());
        assert!("3".parse::<Shard>().is_err());
        assert!("a/b".parse::<Shard>().is_err());
    }

    #[test]
    fn test_required_paths() {
        assert!(Cli::try_parse_from(["tilemirror", "-l", "/mirror"]).is_err());
    }

    #[test]
    fn test_copy_local_forms() {
        assert_eq!(parse(&[]).copy_local, None);
        assert_eq!(parse(&["-c"]).copy_local, Some(true));
        assert_eq!(parse(&["-c", "False"]).copy_local, Some(false));
        assert_eq!(parse(&["--copy-local", "yes"]).copy_local, Some(true));
        assert!(Cli::try_parse_from(["tilemirror", "-l", "a", "-o", "b", "-c", "maybe"]).is_err());
    }

    #[test]
    fn test_verbosity() {
        assert_eq!(parse(&[]).log_level("warn"), "warn");
        assert_eq!(parse(&["-v"]).log_level("warn"), "debug");
        assert_eq!(parse(&["-vv"]).log_level("warn"), "trace");
    }

    #[test]
    fn test_flags_override_file() {
        let file = ConfigFile::parse(
            "[mirror]\nbase_url = http://file/\nsuffix = .laz\nworkers = 3\nthrottle_ms = 10\n",
        )
        .unwrap();
        let cli = parse(&["-u", "http://cli/", "-p", "8", "-t", "run1"]);

        let config = cli.mirror_config(&file).unwrap();

        assert_eq!(config.base_url, "http://cli/");
        assert_eq!(config.suffix.as_deref(), Some(".laz"));
        assert_eq!(config.workers, 8);
        assert_eq!(config.tag, "run1");
        assert_eq!(config.throttle, Duration::from_millis(10));
    }

    #[test]
    fn test_missing_base_url() {
        let err = parse(&[]).mirror_config(&ConfigFile::default()).unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
    }

    #[test]
    fn test_random_tag_in_range() {
        let config = parse(&["-u", "http://x/"])
            .mirror_config(&ConfigFile::default())
            .unwrap();
        let tag: u32 = config.tag.parse().unwrap();
        assert!(tag < RANDOM_TAG_RANGE);
    }

    #[test]
    fn test_tile_source() {
        assert_eq!(parse(&[]).tile_source(), TileSource::Builtin);
        assert_eq!(
            parse(&["-i", "list.txt"]).tile_source(),
            TileSource::File(PathBuf::from("list.txt"))
        );
    }
}
