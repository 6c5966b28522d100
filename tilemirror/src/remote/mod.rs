//! Remote tile source abstraction.
//!
//! [`RemoteSource`] is the seam between the reconciliation engine and the
//! network. The production implementation is [`ReqwestRemote`]; tests plug
//! in in-memory sources.

mod error;
mod http;

use std::io::Write;

use chrono::{DateTime, Utc};

pub use error::{RemoteError, RemoteErrorKind};
pub use http::{ReqwestRemote, DEFAULT_TIMEOUT_SECS};

/// What the remote source reports about a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RemoteState {
    /// The remote resource exists.
    pub exists: bool,
    /// Parsed `Last-Modified` value, when the server sent one.
    pub modified_at: Option<DateTime<Utc>>,
    /// Parsed `Content-Length` value, when the server sent one.
    pub size: Option<u64>,
}

impl RemoteState {
    /// A resource the server says does not exist.
    pub fn absent() -> Self {
        Self::default()
    }

    /// An existing resource with the given metadata.
    pub fn present(modified_at: Option<DateTime<Utc>>, size: Option<u64>) -> Self {
        Self {
            exists: true,
            modified_at,
            size,
        }
    }
}

/// Access to the authoritative tile source.
///
/// Implementations must be usable from several worker threads at once.
pub trait RemoteSource: Send + Sync {
    /// Fetch metadata for `url` without transferring the body.
    ///
    /// A resource the server reports as missing is `Ok(RemoteState::absent())`;
    /// `Err` is reserved for failures that say nothing about existence.
    fn stat(&self, url: &str) -> Result<RemoteState, RemoteError>;

    /// Stream the body of `url` into `sink`, returning the bytes written.
    fn fetch(&self, url: &str, sink: &mut dyn Write) -> Result<u64, RemoteError>;
}
