use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_ENCODING, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::{Client, Proxy};
use thiserror::Error;

use crate::config::FetchConfig;
use crate::{Error, Result};

const MAX_FEED_BYTES: usize = 5 * 1024 * 1024;

// Some job boards reject non-browser clients, so requests rotate through these
static USER_AGENT_INDEX: AtomicUsize = AtomicUsize::new(0);
const USER_AGENTS: &[&str] = &[
    // Chrome on macOS
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    // Chrome on Windows
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    // Firefox on macOS
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:121.0) Gecko/20100101 Firefox/121.0",
    // Firefox on Windows
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
];

/// Get the next User-Agent in rotation
fn next_user_agent() -> &'static str {
    let index = USER_AGENT_INDEX.fetch_add(1, Ordering::Relaxed) % USER_AGENTS.len();
    USER_AGENTS[index]
}

/// Why a single feed could not be retrieved.
///
/// Every variant is recoverable at the pipeline level: the source is
/// skipped for this run and picked up again on the next scheduled one.
#[derive(Debug, Error)]
pub enum FetchError {
    /// DNS, connection, TLS or body read failure
    #[error("request failed: {0}")]
    Network(#[source] reqwest::Error),
    /// No complete response within the configured timeout
    #[error("request timed out")]
    Timeout,
    /// Server answered with a non-2xx status
    #[error("HTTP status {0}")]
    Status(u16),
    /// Body exceeded the feed size limit
    #[error("feed too large ({0} bytes)")]
    TooLarge(usize),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else {
            FetchError::Network(e)
        }
    }
}

/// HTTP client for job feeds; one GET per call, no retries
pub struct FeedFetcher {
    client: Client,
    timeout: Duration,
}

impl FeedFetcher {
    /// Create a new feed fetcher with configuration
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.request_timeout_secs);
        Self::with_timeout(timeout, config.proxy_url.as_deref())
    }

    pub fn with_timeout(timeout: Duration, proxy_url: Option<&str>) -> Result<Self> {
        let client = Self::build_client(timeout, proxy_url)?;
        Ok(Self { client, timeout })
    }

    /// Build HTTP client with optional proxy
    fn build_client(timeout: Duration, proxy_url: Option<&str>) -> Result<Client> {
        let mut builder = Client::builder()
            .timeout(timeout)
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(10));

        if let Some(proxy) = proxy_url {
            let proxy = Proxy::all(proxy)
                .map_err(|e| Error::Config(format!("Invalid proxy URL: {}", e)))?;
            builder = builder.proxy(proxy);
            tracing::info!("Using HTTP proxy for feed fetching");
        }

        builder.build().map_err(Error::Http)
    }

    /// Build browser-like headers for a request
    fn build_headers(user_agent: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "application/rss+xml,application/atom+xml,application/xml;q=0.9,text/xml;q=0.9,*/*;q=0.8"
            )
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static("en-US,en;q=0.9")
        );
        headers.insert(
            ACCEPT_ENCODING,
            HeaderValue::from_static("gzip, deflate, br")
        );
        if let Ok(ua) = HeaderValue::from_str(user_agent) {
            headers.insert(USER_AGENT, ua);
        }
        headers
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Fetch the raw body of a feed.
    ///
    /// The whole exchange, body included, is bounded by the fetcher's
    /// timeout; when it elapses only this request is dropped.
    pub async fn fetch(&self, url: &str) -> std::result::Result<Bytes, FetchError> {
        match tokio::time::timeout(self.timeout, self.get(url)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout),
        }
    }

    async fn get(&self, url: &str) -> std::result::Result<Bytes, FetchError> {
        let user_agent = next_user_agent();
        tracing::debug!("Fetching {} with User-Agent: {}", url, user_agent);

        let response = self.client
            .get(url)
            .headers(Self::build_headers(user_agent))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        if let Some(length) = response.content_length() {
            ensure_content_size(length as usize)?;
        }

        let body = response.bytes().await?;
        ensure_content_size(body.len())?;

        Ok(body)
    }
}

fn ensure_content_size(size: usize) -> std::result::Result<(), FetchError> {
    if size > MAX_FEED_BYTES {
        return Err(FetchError::TooLarge(size));
    }
    Ok(())
}
