//! HTTP client for making requests to search backends

use crate::config::OutgoingSettings;
use crate::engines::{BackendFailure, EngineRequest, EngineResponse};
use anyhow::Result;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use reqwest::{Client, Response};
use std::time::Duration;
use tracing::debug;

/// HTTP client wrapper shared by every backend
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    max_timeout: Duration,
    user_agent: String,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Result<Self> {
        Self::with_settings(&OutgoingSettings::default())
    }

    /// Create a new HTTP client with custom settings
    pub fn with_settings(settings: &OutgoingSettings) -> Result<Self> {
        let max_timeout = Duration::try_from_secs_f64(settings.request_timeout).map_err(|e| {
            anyhow::anyhow!("invalid request_timeout {}: {}", settings.request_timeout, e)
        })?;

        let mut builder = Client::builder()
            .timeout(max_timeout)
            .pool_max_idle_per_host(settings.pool_maxsize)
            .gzip(true)
            .brotli(true);

        // SSL verification
        if !settings.verify_ssl {
            builder = builder.danger_accept_invalid_certs(true);
        }

        // Proxy settings
        if let Some(ref proxy_url) = settings.proxies.all {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
        } else {
            if let Some(ref http) = settings.proxies.http {
                builder = builder.proxy(reqwest::Proxy::http(http)?);
            }
            if let Some(ref https) = settings.proxies.https {
                builder = builder.proxy(reqwest::Proxy::https(https)?);
            }
        }

        let client = builder.build()?;

        Ok(Self {
            client,
            max_timeout,
            user_agent: settings.user_agent.clone(),
        })
    }

    /// Execute a backend request with a custom timeout
    pub async fn execute_with_timeout(
        &self,
        request: EngineRequest,
        timeout: Duration,
    ) -> Result<EngineResponse, BackendFailure> {
        let timeout = timeout.min(self.max_timeout);
        let headers = self.build_headers(&request)?;

        debug!("GET {} (timeout {:?})", request.url, timeout);

        let builder = self
            .client
            .get(&request.url)
            .timeout(timeout)
            .headers(headers);

        // reqwest applies the same timeout; this also covers body reads
        tokio::time::timeout(timeout, Self::send(builder))
            .await
            .map_err(|_| BackendFailure::Timeout)?
    }

    async fn send(builder: reqwest::RequestBuilder) -> Result<EngineResponse, BackendFailure> {
        let response = builder.send().await?;
        Self::parse_response(response).await
    }

    /// Merge the default headers with the request's own headers
    fn build_headers(&self, request: &EngineRequest) -> Result<HeaderMap, BackendFailure> {
        let mut headers = HeaderMap::new();

        let user_agent = HeaderValue::from_str(&self.user_agent)
            .map_err(|e| BackendFailure::Request(e.to_string()))?;
        headers.insert(USER_AGENT, user_agent);

        for (key, value) in &request.headers {
            let name = HeaderName::from_bytes(key.as_bytes())
                .map_err(|e| BackendFailure::Request(format!("header {}: {}", key, e)))?;
            // from_bytes accepts non-ASCII query text, from_str does not
            let value = HeaderValue::from_bytes(value.as_bytes())
                .map_err(|e| BackendFailure::Request(format!("header {}: {}", key, e)))?;
            headers.insert(name, value);
        }

        Ok(headers)
    }

    /// Parse response into EngineResponse
    async fn parse_response(response: Response) -> Result<EngineResponse, BackendFailure> {
        let status = response.status().as_u16();
        let text = response.text().await?;

        Ok(EngineResponse { status, text })
    }
}
