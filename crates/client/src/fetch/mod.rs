//! Network retrieval of spreadsheet payloads.
//!
//! ### Transport
//! - One GET per fetch, bounded by the configured timeout.
//! - Redirects are followed up to a limit; the body is capped at `max_bytes`.
//!
//! ### Status handling
//! - Non-2xx responses are not errors here. The origin may answer with an
//!   HTML login or error page, which the parser classifies by content type.
//!
//! ### Content type
//! - Derived from the declared media type; anything not HTML parses as CSV.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, header};
use sheetview_core::config::AppConfig;
use sheetview_core::{ContentType, Error, RawPayload};

/// Retrieval capability used by the pipeline.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Retrieve the resource at `url`.
    ///
    /// Fails with `Error::FetchFailed` on transport-level errors only.
    async fn fetch(&self, url: &str) -> Result<RawPayload, Error>;
}

/// Configuration for the HTTP fetcher.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "sheetview/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "sheetview/0.1".to_string(),
            max_bytes: 5 * 1024 * 1024,
            timeout: Duration::from_millis(20000),
            max_redirects: 5,
        }
    }
}

impl From<&AppConfig> for FetchConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            timeout: config.timeout(),
            max_redirects: config.max_redirects,
        }
    }
}

/// reqwest-backed [`Fetcher`].
pub struct HttpFetcher {
    http: Client,
    config: FetchConfig,
}

impl HttpFetcher {
    /// Create a new fetcher with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::FetchFailed(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, config })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    fn too_large(&self, len: usize) -> Error {
        Error::FetchFailed(format!("{len} bytes exceeds limit of {}", self.config.max_bytes))
    }
}

fn transport_error(url: &str, err: &reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::FetchFailed(format!("timed out fetching {url}"))
    } else {
        Error::FetchFailed(format!("network error fetching {url}: {err}"))
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<RawPayload, Error> {
        let start = Instant::now();

        let response = self
            .http
            .get(url)
            .header(header::ACCEPT, "text/csv,text/html;q=0.9,*/*;q=0.8")
            .send()
            .await
            .map_err(|e| transport_error(url, &e))?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(url, status = status.as_u16(), "non-success status passed through to the parser");
        }

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(self.too_large(len as usize));
        }

        let content_type = ContentType::from_media_type(
            response
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok()),
        );

        let body = response.bytes().await.map_err(|e| transport_error(url, &e))?;
        if body.len() > self.config.max_bytes {
            return Err(self.too_large(body.len()));
        }

        tracing::debug!(
            url,
            content_type = %content_type,
            bytes = body.len(),
            fetch_ms = start.elapsed().as_millis() as u64,
            "fetched payload"
        );

        Ok(RawPayload::new(content_type, body))
    }
}
