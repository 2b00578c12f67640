//! HTTP fetcher implementation
//!
//! This module defines the [`Fetcher`] capability the crawl engine depends on,
//! and [`HttpFetcher`], its reqwest-backed implementation:
//! - Building HTTP clients with proper user agent strings
//! - GET requests with a per-request timeout
//! - Retry logic for transient failures
//! - Error classification

use crate::config::{FetcherConfig, UserAgentConfig};
use crate::TransportError;
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client};
use std::time::Duration;

/// Maximum redirect hops followed by the HTTP client
const MAX_REDIRECTS: usize = 10;

/// Raw result of a completed HTTP exchange
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// Final URL after redirects
    pub final_url: String,
    /// HTTP status code
    pub status: u16,
    /// Content-Type header value
    pub content_type: Option<String>,
    /// Response body, already decoded from any Content-Encoding
    pub body: Vec<u8>,
}

impl FetchResponse {
    /// Returns true for a 2xx status
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Fetch capability used by the crawl engine
///
/// Implementations own their retry policy. A non-2xx answer is a successful
/// fetch; only network-level failures are errors.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches `url`, giving each attempt at most `timeout`
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<FetchResponse, TransportError>;

    /// Upper bound on how long one [`Fetcher::fetch`] call may take, retries included
    fn max_duration(&self, timeout: Duration) -> Duration {
        timeout
    }
}

/// Runs one [`Fetcher::fetch`] under an outer deadline
///
/// The deadline is [`Fetcher::max_duration`] for `timeout`, so a fetcher that
/// ignores its timeout argument still cannot stall the crawl. Expiry is
/// reported as [`TransportError::Timeout`].
pub async fn fetch_with_deadline(
    fetcher: &dyn Fetcher,
    url: &str,
    timeout: Duration,
) -> Result<FetchResponse, TransportError> {
    match tokio::time::timeout(fetcher.max_duration(timeout), fetcher.fetch(url, timeout)).await {
        Ok(result) => result,
        Err(_) => {
            tracing::debug!("Deadline expired for {}", url);
            Err(TransportError::Timeout {
                url: url.to_string(),
            })
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use product_scout::config::UserAgentConfig;
/// use product_scout::crawler::build_http_client;
///
/// let config = UserAgentConfig {
///     crawler_name: "ProductScout".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent_string())
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// reqwest-backed [`Fetcher`] with retry on transient failures
///
/// # Retry Logic
///
/// | Condition | Action |
/// |-----------|--------|
/// | HTTP 2xx/3xx/4xx | Returned immediately |
/// | HTTP 5xx | Retry up to `max_retries` times |
/// | Timeout | Retry up to `max_retries` times |
/// | Connection refused | Retry up to `max_retries` times |
/// | Other request errors | Returned immediately |
///
/// The client (and its connection pool) is cheap to clone and is shared by
/// every fetch made through this fetcher.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    max_retries: u32,
    retry_delay: Duration,
}

impl HttpFetcher {
    /// Wraps an existing client
    pub fn new(client: Client, config: &FetcherConfig) -> Self {
        Self {
            client,
            max_retries: config.max_retries,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        }
    }

    /// Builds a client for the given user agent and wraps it
    pub fn from_config(
        user_agent: &UserAgentConfig,
        config: &FetcherConfig,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self::new(build_http_client(user_agent)?, config))
    }

    async fn fetch_once(&self, url: &str, timeout: Duration) -> Result<FetchResponse, TransportError> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify_error(url, e))?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());

        let body = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout {
                    url: url.to_string(),
                }
            } else {
                TransportError::Body {
                    url: url.to_string(),
                    message: e.to_string(),
                }
            }
        })?;

        Ok(FetchResponse {
            final_url,
            status,
            content_type,
            body: body.to_vec(),
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<FetchResponse, TransportError> {
        let mut attempt = 0;

        loop {
            let result = self.fetch_once(url, timeout).await;

            let retryable = match &result {
                Ok(response) => response.status >= 500,
                Err(e) => e.is_transient(),
            };

            if !retryable || attempt >= self.max_retries {
                return result;
            }

            attempt += 1;
            tracing::debug!(
                "Retrying {} (attempt {} of {})",
                url,
                attempt,
                self.max_retries
            );
            tokio::time::sleep(self.retry_delay).await;
        }
    }

    fn max_duration(&self, timeout: Duration) -> Duration {
        let attempts = self.max_retries + 1;
        timeout * attempts + self.retry_delay * self.max_retries
    }
}

/// Maps a reqwest error onto the transport taxonomy
fn classify_error(url: &str, e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout {
            url: url.to_string(),
        }
    } else if e.is_connect() {
        TransportError::Connect {
            url: url.to_string(),
            message: e.to_string(),
        }
    } else {
        TransportError::Request {
            url: url.to_string(),
            message: e.to_string(),
        }
    }
}
