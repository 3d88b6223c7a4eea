//! Retry-wrapped HTTP fetching.
//!
//! All network access goes through the [`DocumentFetcher`] trait so the sync
//! engine can be driven by a mock in tests. The real implementation wraps a
//! blocking reqwest client with bounded retries and exponential backoff.

use std::time::Duration;
use thiserror::Error;

/// Structured error types for fetch operations.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP {status} for {url}")]
    Status { status: u16, url: String },

    #[error("sitemap parse error: {0}")]
    SitemapParse(String),
}

/// Retry behavior for a single logical fetch.
///
/// `max_retries` is the total number of attempts. Between attempts the
/// fetcher sleeps `base_delay`, doubling after each failure, so the sleep
/// schedule for three attempts is `base, 2*base`.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

/// Run `op` up to `policy.max_retries` times with exponential backoff.
///
/// Returns the first success, or the last error once attempts are exhausted.
pub fn with_retry<T, E>(
    policy: &RetryPolicy,
    mut op: impl FnMut() -> Result<T, E>,
) -> Result<T, E> {
    let attempts = policy.max_retries.max(1);
    let mut delay = policy.base_delay;
    let mut attempt = 0;

    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(err) => {
                attempt += 1;
                if attempt >= attempts {
                    return Err(err);
                }
                std::thread::sleep(delay);
                delay *= 2;
            }
        }
    }
}

/// Trait for document fetchers.
///
/// Implementations handle one GET returning the response body as text.
/// Retry behavior is an implementation concern; callers see only the final
/// outcome.
pub trait DocumentFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// HTTP fetcher backed by a blocking reqwest client.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
    policy: RetryPolicy,
}

impl HttpFetcher {
    pub fn new(policy: RetryPolicy) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("docmirror/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("failed to build HTTP client");

        Self { client, policy }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(RetryPolicy::default())
    }
}

impl DocumentFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<String, FetchError> {
        with_retry(&self.policy, || {
            let resp = self
                .client
                .get(url)
                .send()
                .map_err(|e| FetchError::Network(e.to_string()))?;

            let status = resp.status();
            if !status.is_success() {
                return Err(FetchError::Status {
                    status: status.as_u16(),
                    url: url.to_string(),
                });
            }

            resp.text().map_err(|e| FetchError::Network(e.to_string()))
        })
    }
}
