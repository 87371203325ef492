//! Remote Content Service
//!
//! Fetches guide content for `:play <url>`. The interpreter performs exactly
//! one fetch per directive and never retries; timeouts are enforced here, not
//! by the interpreter.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, trace};
use url::Url;

/// URL schemes that `:play` treats as remote content.
pub const REMOTE_SCHEMES: &[&str] = &["http", "https"];

/// Errors raised while fetching remote content.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The argument names a network scheme but is not a valid URL
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The HTTP client could not be built
    #[error("HTTP client error: {0}")]
    Client(String),

    /// Connection or transfer failure
    #[error("request to {url} failed: {reason}")]
    Request { url: String, reason: String },

    /// The server answered with a non-success status
    #[error("{url} responded with status {status}")]
    Status { url: String, status: u16 },

    /// No response within the configured timeout
    #[error("request to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },
}

/// Something that can fetch a document by URL.
#[async_trait]
pub trait RemoteContent: Send + Sync {
    /// Fetches the body of `url` as text.
    async fn fetch(&self, url: &Url) -> Result<String, FetchError>;
}

/// Interprets a `:play` argument as a remote location.
///
/// The argument is remote when it parses as an absolute URL whose scheme is
/// one of [`REMOTE_SCHEMES`]. Anything else is inline/local content and
/// yields `None`. An argument that names a network scheme before its first
/// `:` but does not parse yields `Some(Err(_))`.
///
/// # Example
///
/// ```
/// use framedeck::services::remote_url;
///
/// assert!(remote_url("movies").is_none());
/// assert!(remote_url("http://test.test").unwrap().is_ok());
/// assert!(remote_url("http:test.test").unwrap().is_ok());
/// assert!(remote_url("http://").unwrap().is_err());
/// ```
pub fn remote_url(argument: &str) -> Option<Result<Url, FetchError>> {
    match Url::parse(argument) {
        Ok(url) if is_remote_scheme(url.scheme()) => Some(Ok(url)),
        Ok(_) => None,
        Err(e) => {
            let (scheme, _) = argument.split_once(':')?;
            is_remote_scheme(scheme).then(|| {
                Err(FetchError::InvalidUrl {
                    url: argument.to_string(),
                    reason: e.to_string(),
                })
            })
        }
    }
}

fn is_remote_scheme(scheme: &str) -> bool {
    REMOTE_SCHEMES
        .iter()
        .any(|known| scheme.eq_ignore_ascii_case(known))
}

/// HTTP(S) implementation backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpRemote {
    client: Client,
    timeout: Duration,
}

impl HttpRemote {
    /// Creates a fetcher whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("framedeck/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self { client, timeout })
    }

    fn map_error(&self, url: &Url, error: reqwest::Error) -> FetchError {
        if error.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
                timeout: self.timeout,
            }
        } else {
            FetchError::Request {
                url: url.to_string(),
                reason: error.to_string(),
            }
        }
    }
}

#[async_trait]
impl RemoteContent for HttpRemote {
    async fn fetch(&self, url: &Url) -> Result<String, FetchError> {
        debug!(url = %url, "Fetching remote content");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| self.map_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| self.map_error(url, e))?;
        trace!(url = %url, bytes = body.len(), "Fetched remote content");
        Ok(body)
    }
}
