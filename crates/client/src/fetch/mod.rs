//! HTTP transport for the fetcher.
//!
//! ### URL Canonicalization
//! - Trim whitespace, ensure scheme (default: `https`)
//! - Lowercase host, remove fragments
//! - Preserve query string
//!
//! ### Safety Gates
//! - Per-request timeout (default: 20s)
//! - Max redirects: 5
//! - Max body bytes: 20MB (configurable)
//! - `api_key` query values are redacted from every logged URL and error

pub mod request;
pub mod url;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use std::time::{Duration, Instant};

pub use request::{FetchRequest, Method};
pub use url::{UrlError, canonicalize, redact};

use dotgraph_core::{AppConfig, Error};

/// Sends a single request and returns the response body.
///
/// Implementations map failures onto the shared error taxonomy so the
/// fetcher can tell transient failures from permanent ones.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, method: Method, url: &::url::Url) -> Result<Bytes, Error>;
}

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "dotgraph/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 20MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "dotgraph/0.1".to_string(),
            max_bytes: 20 * 1024 * 1024,
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
            ..Self::default()
        }
    }
}

/// reqwest-backed transport.
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
}

impl FetchClient {
    /// Create a new fetch client with the given configuration.
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
            .map_err(|e| Error::InvalidInput(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    fn too_large(&self, len: usize, url: &str) -> Error {
        Error::FetchTooLarge(format!("{} bytes exceeds {} for {}", len, self.config.max_bytes, url))
    }
}

fn transport_error(e: reqwest::Error, url: &str) -> Error {
    let timed_out = e.is_timeout();
    let e = e.without_url();
    if timed_out { Error::FetchTimeout(format!("{url}: {e}")) } else { Error::Network(format!("{url}: {e}")) }
}

fn to_reqwest(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Head => reqwest::Method::HEAD,
        Method::Post => reqwest::Method::POST,
    }
}

#[async_trait]
impl Transport for FetchClient {
    async fn send(&self, method: Method, url: &::url::Url) -> Result<Bytes, Error> {
        let start = Instant::now();
        let shown = redact(url);

        let response = self
            .http
            .request(to_reqwest(method), url.as_str())
            .header("Accept", "application/json,application/xml;q=0.9,*/*;q=0.8")
            .send()
            .await
            .map_err(|e| transport_error(e, &shown))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpStatus { status: status.as_u16(), url: shown });
        }

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(self.too_large(len as usize, &shown));
        }

        let bytes = response.bytes().await.map_err(|e| transport_error(e, &shown))?;

        if bytes.len() > self.config.max_bytes {
            return Err(self.too_large(bytes.len(), &shown));
        }

        tracing::debug!(
            url = %shown,
            status = status.as_u16(),
            fetch_ms = start.elapsed().as_millis() as u64,
            bytes = bytes.len(),
            "fetched"
        );

        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::default();
        assert_eq!(config.user_agent, "dotgraph/0.1");
        assert_eq!(config.max_bytes, 20 * 1024 * 1024);
        assert_eq!(config.timeout, Duration::from_millis(20000));
        assert_eq!(config.max_redirects, 5);
    }

    #[test]
    fn test_fetch_config_from_app_config() {
        let app = AppConfig { user_agent: "test/1".into(), timeout_ms: 1500, ..AppConfig::default() };
        let config = FetchConfig::from(&app);
        assert_eq!(config.user_agent, "test/1");
        assert_eq!(config.timeout, Duration::from_millis(1500));
    }

    #[tokio::test]
    async fn test_fetch_client_new() {
        let client = FetchClient::new(FetchConfig::default());
        assert!(client.is_ok());
    }
}
