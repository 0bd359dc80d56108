//! HTTP range-request source
//!
//! Reads a remote resource through `Range` requests. The resource length
//! comes from a single HEAD probe at construction; every `read` is its own
//! round trip, so callers should ask for reasonably sized windows.

use log::{debug, info};
use reqwest::blocking::Client;
use reqwest::header::{CONTENT_LENGTH, RANGE, USER_AGENT};
use reqwest::StatusCode;
use std::fmt;
use std::time::Duration;

use crate::fits::errors::{CutoutError, CutoutResult};
use crate::io::source::{closed_error, out_of_bounds, RandomAccessSource};

/// Transport settings for [`HttpRangeSource`]
#[derive(Debug, Clone)]
pub struct HttpOptions {
    /// Per-request timeout; `None` blocks indefinitely
    pub timeout: Option<Duration>,
    /// User-Agent header sent with every request
    pub user_agent: String,
}

impl Default for HttpOptions {
    fn default() -> Self {
        HttpOptions {
            timeout: Some(Duration::from_secs(30)),
            user_agent: format!("fitslice/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Source backed by HTTP byte-range requests
pub struct HttpRangeSource {
    client: Client,
    url: String,
    user_agent: String,
    /// Resource length from the HEAD probe
    length: u64,
    position: u64,
    closed: bool,
}

impl HttpRangeSource {
    /// Probe `url` and build a source over it
    ///
    /// Fails if the probe returns a non-success status or no usable
    /// Content-Length.
    pub fn open(url: &str, options: &HttpOptions) -> CutoutResult<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        let response = client
            .head(url)
            .header(USER_AGENT, options.user_agent.as_str())
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(http_error(url, status));
        }

        // content_length() reports the (empty) body of a HEAD response, so
        // read the header itself
        let length = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .ok_or_else(|| CutoutError::Http {
                url: url.to_string(),
                status: status.as_u16(),
                reason: "missing or invalid Content-Length in probe".to_string(),
            })?;

        info!("Opened HTTP source {} ({} bytes)", url, length);

        Ok(HttpRangeSource {
            client,
            url: url.to_string(),
            user_agent: options.user_agent.clone(),
            length,
            position: 0,
            closed: false,
        })
    }
}

impl fmt::Debug for HttpRangeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpRangeSource")
            .field("url", &self.url)
            .field("length", &self.length)
            .field("position", &self.position)
            .field("closed", &self.closed)
            .finish()
    }
}

fn http_error(url: &str, status: StatusCode) -> CutoutError {
    CutoutError::Http {
        url: url.to_string(),
        status: status.as_u16(),
        reason: status.canonical_reason().unwrap_or("unknown status").to_string(),
    }
}

impl RandomAccessSource for HttpRangeSource {
    fn seek(&mut self, position: u64) -> CutoutResult<()> {
        if position >= self.length {
            return Err(out_of_bounds(position, self.length).into());
        }
        self.position = position;
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> CutoutResult<usize> {
        if self.closed {
            return Err(closed_error(&self.url).into());
        }
        if buf.is_empty() || self.position >= self.length {
            return Ok(0);
        }

        let first = self.position;
        let last = (first + buf.len() as u64).min(self.length) - 1;
        debug!("GET {} bytes={}-{}", self.url, first, last);

        let response = self
            .client
            .get(&self.url)
            .header(USER_AGENT, self.user_agent.as_str())
            .header(RANGE, format!("bytes={}-{}", first, last))
            .send()?;

        let status = response.status();
        let whole_resource = first == 0 && last + 1 == self.length;
        let accepted = status == StatusCode::PARTIAL_CONTENT || (status == StatusCode::OK && whole_resource);
        if !accepted {
            return Err(http_error(&self.url, status));
        }

        let body = response.bytes()?;
        let n = body.len().min(buf.len());
        buf[..n].copy_from_slice(&body[..n]);
        self.position += n as u64;
        Ok(n)
    }

    fn length(&self) -> u64 {
        self.length
    }

    fn position(&self) -> u64 {
        self.position
    }

    fn close(&mut self) -> CutoutResult<()> {
        self.closed = true;
        Ok(())
    }

    fn description(&self) -> &str {
        &self.url
    }
}
