//! Probe HTTP Client
//!
//! A type-safe HTTP client for the backend under test: authentication, the
//! asynchronous ad-banner job, the product catalog and recommendations.
//!
//! Both the load runner and the CLI go through this crate, so response shapes
//! are validated in one place. It also hosts the [`TaskPoller`] that follows a
//! banner job until it resolves.
//!
//! # Example
//!
//! ```no_run
//! use probe_client::{BackendClient, PollPolicy, TaskPoller};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = BackendClient::new("http://localhost:8083");
//!
//!     let credential = client.login("user1@test.com", "pw1").await?;
//!     let handle = client.submit_banner(&credential).await?;
//!
//!     let poller = TaskPoller::new(PollPolicy::default())?;
//!     let outcome = poller.poll_result(&client, &handle, &credential).await?;
//!
//!     println!("{} after {} attempt(s)", outcome.label(), outcome.attempts());
//!     Ok(())
//! }
//! ```

mod auth;
mod banners;
mod catalog;
pub mod error;
pub mod poller;

// Re-export commonly used types
pub use error::{ClientError, Result};
pub use poller::{PollError, PollPolicy, TaskPoller, TaskSource};
pub use probe_core::domain::credential::Credential;
pub use probe_core::domain::outcome::PollOutcome;
pub use probe_core::domain::task::{TaskHandle, TaskStatus};

use probe_core::dto::ApiEnvelope;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// HTTP client for the backend API
///
/// Methods are organized into groups:
/// - Authentication (login)
/// - Ad-banner jobs (submit, result, status)
/// - Catalog reads and recommendations
#[derive(Debug, Clone)]
pub struct BackendClient {
    /// Base URL of the backend (e.g., "http://localhost:8083")
    base_url: String,
    /// HTTP client instance
    client: Client,
}

/// Status, latency and body of a single measured request
#[derive(Debug, Clone)]
pub struct TimedResponse {
    pub status: StatusCode,
    /// From sending the request until the whole body was read
    pub duration: Duration,
    pub body: Vec<u8>,
}

impl TimedResponse {
    /// Parses the body as an [`ApiEnvelope`] and returns its `data`
    pub fn data<T: DeserializeOwned>(&self) -> Result<T> {
        decode_envelope(&self.body)
    }
}

impl BackendClient {
    /// Create a new backend client
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the backend (e.g., "http://localhost:8083")
    ///
    /// # Example
    /// ```
    /// use probe_client::BackendClient;
    ///
    /// let client = BackendClient::new("http://localhost:8083");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new backend client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    ///
    /// # Example
    /// ```
    /// use probe_client::BackendClient;
    /// use reqwest::Client;
    /// use std::time::Duration;
    ///
    /// let http_client = Client::builder()
    ///     .timeout(Duration::from_secs(10))
    ///     .build()
    ///     .unwrap();
    ///
    /// let client = BackendClient::with_client("http://localhost:8083", http_client);
    /// ```
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Get the base URL of the backend
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// URL of `path` followed by `segment` as one percent-encoded path segment
    ///
    /// Task ids are opaque, so `/`, `?` or `#` inside them must not change
    /// which resource is addressed.
    fn url_with_segment(&self, path: &str, segment: &str) -> Result<Url> {
        let mut url = Url::parse(&self.url(path))
            .map_err(|e| ClientError::InvalidRequest(format!("invalid base URL {}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidRequest(format!("base URL {} cannot carry a path", self.base_url)))?
            .pop_if_empty()
            .push(segment);
        Ok(url)
    }

    /// Issue a GET and measure it without interpreting the status
    ///
    /// Used by the load runner, which asserts on status and latency itself.
    /// Only a failure to get any response at all is an error.
    pub async fn timed_get(
        &self,
        path: &str,
        credential: Option<&Credential>,
    ) -> Result<TimedResponse> {
        let url = self.url(path);
        let mut request = self.client.get(&url);
        if let Some(credential) = credential {
            request = request.bearer_auth(credential.token());
        }

        let started = Instant::now();
        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?.to_vec();
        let duration = started.elapsed();

        debug!("GET {} -> {} in {:?}", url, status, duration);

        Ok(TimedResponse {
            status,
            duration,
            body,
        })
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and unwrap the envelope's `data`
    ///
    /// 404 maps to [`ClientError::NotFound`], any other non-2xx status to
    /// [`ClientError::ApiError`], and a body that is not an envelope of the
    /// expected shape to [`ClientError::Schema`].
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound(response.url().path().to_string()));
        }

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        let body = response.bytes().await?;
        decode_envelope(&body)
    }
}

fn decode_envelope<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    serde_json::from_slice::<ApiEnvelope<T>>(body)
        .map(|envelope| envelope.data)
        .map_err(|e| ClientError::Schema(format!("Failed to parse response envelope: {}", e)))
}
