//! HTTP remote source backed by a blocking reqwest client.

use std::io::{Read, Write};
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, CONTENT_LENGTH, LAST_MODIFIED};
use reqwest::StatusCode;
use tracing::debug;

use super::{RemoteError, RemoteSource, RemoteState};

/// Default timeout for HTTP requests in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300; // 5 minutes

/// Buffer size for streaming response bodies (64KB).
const BUFFER_SIZE: usize = 64 * 1024;

/// Remote source speaking plain HTTP(S).
#[derive(Debug, Clone)]
pub struct ReqwestRemote {
    client: Client,
    timeout: Duration,
}

impl ReqwestRemote {
    /// Create a client with the given request timeout.
    pub fn new(timeout: Duration) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("tilemirror/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RemoteError::Transport {
                url: String::new(),
                reason: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self { client, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn map_send_error(&self, url: &str, e: reqwest::Error) -> RemoteError {
        if e.is_timeout() {
            RemoteError::Timeout {
                url: url.to_string(),
                timeout_secs: self.timeout.as_secs(),
            }
        } else {
            RemoteError::Transport {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    }
}

impl RemoteSource for ReqwestRemote {
    fn stat(&self, url: &str) -> Result<RemoteState, RemoteError> {
        let response = self
            .client
            .head(url)
            .send()
            .map_err(|e| self.map_send_error(url, e))?;

        if !head_unsupported(response.status()) {
            return state_from_response(url, response.status(), response.headers());
        }

        // Only the headers are used; the body is dropped unread.
        debug!(url, status = response.status().as_u16(), "HEAD rejected, retrying with GET");
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| self.map_send_error(url, e))?;
        state_from_response(url, response.status(), response.headers())
    }

    fn fetch(&self, url: &str, sink: &mut dyn Write) -> Result<u64, RemoteError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| self.map_send_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        stream_body(url, response, sink)
    }
}

/// Server does not implement HEAD for this resource.
fn head_unsupported(status: StatusCode) -> bool {
    status == StatusCode::METHOD_NOT_ALLOWED || status == StatusCode::NOT_IMPLEMENTED
}

/// Interpret the status and headers of a metadata request.
fn state_from_response(
    url: &str,
    status: StatusCode,
    headers: &HeaderMap,
) -> Result<RemoteState, RemoteError> {
    if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
        return Ok(RemoteState::absent());
    }
    if !status.is_success() {
        return Err(RemoteError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let modified_at = headers
        .get(LAST_MODIFIED)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_http_date);

    let size = headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok());

    Ok(RemoteState::present(modified_at, size))
}

fn stream_body(url: &str, mut response: Response, sink: &mut dyn Write) -> Result<u64, RemoteError> {
    let mut buffer = vec![0u8; BUFFER_SIZE];
    let mut written = 0u64;

    loop {
        let bytes_read = response.read(&mut buffer).map_err(|e| RemoteError::Body {
            url: url.to_string(),
            reason: format!("read error: {}", e),
        })?;

        if bytes_read == 0 {
            break;
        }

        sink.write_all(&buffer[..bytes_read])
            .map_err(|e| RemoteError::Body {
                url: url.to_string(),
                reason: format!("write error: {}", e),
            })?;

        written += bytes_read as u64;
    }

    sink.flush().map_err(|e| RemoteError::Body {
        url: url.to_string(),
        reason: format!("write error: {}", e),
    })?;

    Ok(written)
}

/// Parse an HTTP-date (`Sun, 06 Nov 1994 08:49:37 GMT`).
pub(crate) fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
