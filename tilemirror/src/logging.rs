//! Tracing subscriber setup for binaries using the library.
//!
//! Log lines go to stderr and, when a log file is given, also to that file
//! through a non-blocking writer. The filter comes from `RUST_LOG` when set,
//! otherwise from the requested level applied to this crate.

use std::path::{Path, PathBuf};

use thiserror::Error;
use time::format_description::well_known::Rfc3339;
use time::UtcOffset;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{Builder as FileBuilder, Rotation};
use tracing_subscriber::fmt::time::OffsetTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

pub use tracing_subscriber::fmt::MakeWriter;

/// Errors setting up logging.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log file path: {}", .0.display())]
    InvalidLogFile(PathBuf),

    #[error("failed to open log file {}: {reason}", path.display())]
    LogFile { path: PathBuf, reason: String },

    #[error("failed to install log subscriber: {0}")]
    Init(String),
}

/// Keeps the file writer flushing. Hold it until the process exits.
#[must_use = "dropping the guard stops writing to the log file"]
pub struct LoggingGuard {
    _file: Option<WorkerGuard>,
}

/// Filter used when `RUST_LOG` is not set.
///
/// Dependencies are kept at `warn` so HTTP client chatter does not drown
/// the per-tile lines.
pub fn default_directive(level: &str) -> String {
    format!("warn,tilemirror={}", level)
}

/// Install the global subscriber, logging to stderr.
pub fn init(level: &str, log_file: Option<&Path>) -> Result<LoggingGuard, LoggingError> {
    init_with_console(level, log_file, std::io::stderr)
}

/// Install the global subscriber with a custom console writer.
///
/// Binaries drawing their own terminal output (progress bars) pass a writer
/// that coordinates with it.
pub fn init_with_console<W>(
    level: &str,
    log_file: Option<&Path>,
    console: W,
) -> Result<LoggingGuard, LoggingError>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(level)));

    // Determine the offset before any worker thread exists.
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    let timer = OffsetTime::new(offset, Rfc3339);

    let console_layer = fmt::layer()
        .with_writer(console)
        .with_timer(timer.clone())
        .with_target(false);

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let (writer, guard) = tracing_appender::non_blocking(open_log_file(path)?);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_timer(timer)
                .with_ansi(false)
                .with_thread_names(true);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| LoggingError::Init(e.to_string()))?;

    Ok(LoggingGuard { _file: guard })
}

fn open_log_file(path: &Path) -> Result<tracing_appender::rolling::RollingFileAppender, LoggingError> {
    let name = path
        .file_name()
        .ok_or_else(|| LoggingError::InvalidLogFile(path.to_path_buf()))?;
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    FileBuilder::new()
        .rotation(Rotation::NEVER)
        .filename_prefix(name.to_string_lossy())
        .build(dir)
        .map_err(|e| LoggingError::LogFile {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}
