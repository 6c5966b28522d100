//! Remote access errors.

use thiserror::Error;

/// Coarse classification of a [`RemoteError`], for logging and reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteErrorKind {
    Transport,
    Timeout,
    Status,
    Body,
}

/// Failure while talking to the remote source.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Connection or protocol failure.
    #[error("request to {url} failed: {reason}")]
    Transport { url: String, reason: String },

    /// The request did not complete in time.
    #[error("request to {url} timed out after {timeout_secs}s")]
    Timeout { url: String, timeout_secs: u64 },

    /// The server answered with an unexpected status.
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// The response body could not be read or stored.
    #[error("failed to transfer body of {url}: {reason}")]
    Body { url: String, reason: String },
}

impl RemoteError {
    pub fn kind(&self) -> RemoteErrorKind {
        match self {
            Self::Transport { .. } => RemoteErrorKind::Transport,
            Self::Timeout { .. } => RemoteErrorKind::Timeout,
            Self::Status { .. } => RemoteErrorKind::Status,
            Self::Body { .. } => RemoteErrorKind::Body,
        }
    }
}
