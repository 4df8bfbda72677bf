//! HTTP HEAD probing.
//!
//! Uses the curl crate (libcurl) to fetch the status and response headers of
//! a remote resource without its body. Unlike a download preflight, a non-2xx
//! status is a valid probe result here; only transport failures are errors.

mod parse;

pub use parse::ResponseHeaders;

use std::str;
use std::time::Duration;

/// Transport-level failure of a probe (no HTTP status was obtained).
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    /// Curl reported an error (timeout, connection, DNS, bad URL, ...).
    #[error("{0}")]
    Curl(#[from] curl::Error),
    /// The blocking probe task did not complete (panicked or was cancelled).
    #[error("probe task failed: {0}")]
    Task(String),
}

/// Status and headers of the final response (after redirects).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResponse {
    pub status: u16,
    pub headers: ResponseHeaders,
}

/// Issues a single header-only request. Implementations block the calling thread.
pub trait Prober: Send + Sync + 'static {
    fn head(&self, url: &str) -> Result<ProbeResponse, ProbeError>;
}

/// Timeouts and identification for curl probes.
#[derive(Debug, Clone)]
pub struct ProbeOptions {
    pub connect_timeout: Duration,
    pub timeout: Duration,
    pub user_agent: Option<String>,
}

impl Default for ProbeOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(15),
            timeout: Duration::from_secs(30),
            user_agent: None,
        }
    }
}

/// libcurl-backed prober. Follows redirects; one Easy handle per request.
#[derive(Debug, Clone, Default)]
pub struct CurlProber {
    opts: ProbeOptions,
}

impl CurlProber {
    pub fn new(opts: ProbeOptions) -> Self {
        Self { opts }
    }
}

impl Prober for CurlProber {
    fn head(&self, url: &str) -> Result<ProbeResponse, ProbeError> {
        let mut lines: Vec<String> = Vec::new();

        let mut easy = curl::easy::Easy::new();
        easy.url(url)?;
        easy.nobody(true)?; // HEAD request
        easy.follow_location(true)?;
        easy.max_redirections(10)?;
        easy.connect_timeout(self.opts.connect_timeout)?;
        easy.timeout(self.opts.timeout)?;
        if let Some(ua) = &self.opts.user_agent {
            easy.useragent(ua)?;
        }

        {
            let mut transfer = easy.transfer();
            transfer.header_function(|data| {
                if let Ok(s) = str::from_utf8(data) {
                    lines.push(s.trim_end().to_string());
                }
                true
            })?;
            transfer.perform()?;
        }

        let status = easy.response_code()? as u16;
        Ok(ProbeResponse {
            status,
            headers: parse::parse_headers(&lines),
        })
    }
}
