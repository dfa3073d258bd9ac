//! Page fetching and retry policies.
//!
//! [`PageSource`] is the seam between the pipeline and the network. The
//! production implementation is [`HttpPageSource`]; tests substitute in-memory
//! sources.
//!
//! [`RetryPolicy`] retries transient failures (connection errors, timeouts,
//! HTTP 429 and 5xx) on a fixed delay schedule. Any other failure is returned
//! immediately.
//!
//! ## Examples
//!
//! ```rust,no_run
//! use catalog_lib::config::HarvestSettings;
//! use catalog_lib::fetch::{HttpPageSource, PageSource, RetryPolicy};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let source = HttpPageSource::new(&HarvestSettings::default())?;
//! let url = "https://www.iso.org/standard/66094.html";
//! let html = RetryPolicy::detail_default()
//!     .run(url, || source.fetch_page(url))
//!     .await?;
//! assert!(!html.is_empty());
//! # Ok(())
//! # }
//! ```

use crate::config::HarvestSettings;
use reqwest::Client as HttpClient;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument, warn};

/// Error types for page fetches.
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    /// URL could not be parsed
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Transient failures persisted through every attempt
    #[error("Gave up on {url} after {attempts} attempts: {source}")]
    Exhausted {
        url: String,
        attempts: usize,
        #[source]
        source: Box<FetchError>,
    },
}

impl FetchError {
    /// Whether retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect() || e.is_request() || e.is_body(),
            Self::Status { status, .. } => *status == 429 || (500..600).contains(status),
            Self::InvalidUrl { .. } | Self::Exhausted { .. } => false,
        }
    }
}

/// Something that can return the HTML body of a URL.
pub trait PageSource: Sync {
    fn fetch_page(&self, url: &str) -> impl Future<Output = Result<String, FetchError>> + Send;
}

/// [`PageSource`] backed by a `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpPageSource {
    client: HttpClient,
}

impl HttpPageSource {
    /// Builds a client with the timeout and user agent from `settings`.
    pub fn new(settings: &HarvestSettings) -> Result<Self, FetchError> {
        let client = HttpClient::builder()
            .timeout(settings.request_timeout)
            .user_agent(settings.user_agent.clone())
            .gzip(true)
            .build()?;
        Ok(Self { client })
    }

    /// Wraps an existing client.
    pub fn with_client(client: HttpClient) -> Self {
        Self { client }
    }
}

impl PageSource for HttpPageSource {
    #[instrument(name = "fetch_page", skip(self), fields(otel.kind = "client"))]
    async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .header(
                "Accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .send()
            .await?;

        let status = response.status();
        debug!(http.status_code = status.as_u16(), "Received HTTP response");
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response.text().await?)
    }
}

/// Fixed-schedule retry for transient fetch failures.
///
/// The first attempt runs immediately; each entry of `retry_delays` adds one
/// more attempt after sleeping for that delay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    retry_delays: Vec<Duration>,
}

impl RetryPolicy {
    pub fn new(retry_delays: Vec<Duration>) -> Self {
        Self { retry_delays }
    }

    /// A single attempt with no retries.
    pub fn none() -> Self {
        Self::new(vec![])
    }

    /// Detail pages: retry after 1 second, then after 10 seconds.
    pub fn detail_default() -> Self {
        Self::new(vec![Duration::from_secs(1), Duration::from_secs(10)])
    }

    /// Listing pages: three immediate retries.
    pub fn listing_default() -> Self {
        Self::new(vec![Duration::ZERO; 3])
    }

    /// Total number of attempts, including the first.
    pub fn attempts(&self) -> usize {
        self.retry_delays.len() + 1
    }

    /// Runs `op` until it succeeds, fails non-transiently, or retries run out.
    ///
    /// ## Errors
    ///
    /// Non-transient errors are returned as they are. Transient errors that
    /// survive every attempt are wrapped in [`FetchError::Exhausted`].
    pub async fn run<F, Fut, T>(&self, url: &str, op: F) -> Result<T, FetchError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let mut outcome = op().await;

        for (retry, delay) in self.retry_delays.iter().enumerate() {
            match outcome {
                Err(e) if e.is_transient() => {
                    warn!(
                        url,
                        attempt = retry + 1,
                        delay = ?delay,
                        error = %e,
                        "Transient fetch failure, retrying"
                    );
                    if !delay.is_zero() {
                        tokio::time::sleep(*delay).await;
                    }
                    outcome = op().await;
                }
                done => return done,
            }
        }

        match outcome {
            Err(e) if e.is_transient() => Err(FetchError::Exhausted {
                url: url.to_string(),
                attempts: self.attempts(),
                source: Box::new(e),
            }),
            done => done,
        }
    }
}
