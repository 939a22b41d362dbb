//! Backend traits and types

use crate::config::BackendSettings;
use crate::network::HttpClient;
use crate::results::{BackendError, BackendOutcome, ResultSet};
use async_trait::async_trait;
use std::time::Instant;
use tracing::{debug, warn};

/// HTTP request to be made by a backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineRequest {
    /// Fully built URL, query string included
    pub url: String,
    /// Request headers, sent in this order
    pub headers: Vec<(String, String)>,
}

impl EngineRequest {
    /// Create a GET request
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
        }
    }

    /// Add a header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }
}

/// HTTP response from a backend request
#[derive(Debug)]
pub struct EngineResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body as text
    pub text: String,
}

impl EngineResponse {
    /// Check if response is successful (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Why a backend call failed. Never leaves the adapter; see [`Backend::search`].
#[derive(Debug, thiserror::Error)]
pub enum BackendFailure {
    /// The request could not be built from the settings
    #[error("invalid request: {0}")]
    Request(String),

    /// Connection, DNS or protocol error
    #[error("transport error: {0}")]
    Transport(String),

    /// The configured timeout expired
    #[error("request timed out")]
    Timeout,

    /// Non-2xx reply
    #[error("HTTP error: {0}")]
    Status(u16),

    /// Unparseable body or a missing required field
    #[error("parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for BackendFailure {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            BackendFailure::Timeout
        } else if err.is_builder() {
            BackendFailure::Request(err.to_string())
        } else {
            BackendFailure::Transport(err.to_string())
        }
    }
}

/// An external search service
#[async_trait]
pub trait Backend: Send + Sync {
    /// Stable identifier, used as the key in the aggregate result
    fn name(&self) -> &str;

    /// Name used in error messages
    fn display_name(&self) -> &str {
        self.name()
    }

    /// Error code reported for any failure of this backend
    fn failure_code(&self) -> u16;

    /// Build the HTTP request for a query
    fn request(&self, settings: &BackendSettings, query: &str)
        -> Result<EngineRequest, BackendFailure>;

    /// Parse the HTTP response into a result set
    fn response(&self, response: EngineResponse) -> Result<ResultSet, BackendFailure>;

    /// The error value stored when this backend fails
    fn error(&self) -> BackendError {
        BackendError::new(
            self.failure_code(),
            format!("An error occured while parsing {} data", self.display_name()),
        )
    }

    /// Run one search: a single network call, no retries.
    ///
    /// Every failure is folded into [`BackendOutcome::Failure`].
    async fn search(
        &self,
        client: &HttpClient,
        settings: &BackendSettings,
        query: &str,
    ) -> BackendOutcome {
        let start = Instant::now();

        let result = match self.request(settings, query) {
            Ok(request) => match client.execute_with_timeout(request, settings.timeout()).await {
                Ok(response) => self.response(response),
                Err(e) => Err(e),
            },
            Err(e) => Err(e),
        };

        match result {
            Ok(results) => {
                debug!(
                    "Backend {} returned {} of {} records in {:?}",
                    self.name(),
                    results.len(),
                    results.total,
                    start.elapsed()
                );
                BackendOutcome::Success(results)
            }
            Err(e) => {
                warn!("Search failed for {}: {}", self.name(), e);
                BackendOutcome::Failure(self.error())
            }
        }
    }
}
