//! Transport seam: one POST to the API host, body and status back.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Client, ClientBuilder};
use tracing::{debug, instrument};

use super::constants::{API_BASE_URL, CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
use super::error::TransportError;

/// Raw answer of a single request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code, when the transport exposes one.
    pub status: Option<u16>,
    /// Response body decoded as UTF-8.
    pub body: String,
}

impl TransportResponse {
    /// Creates a response without a status code.
    pub fn body(body: impl Into<String>) -> Self {
        Self {
            status: None,
            body: body.into(),
        }
    }

    /// Creates a response with a status code.
    pub fn with_status(status: u16, body: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            body: body.into(),
        }
    }
}

/// Sends one request for an endpoint path (with query string) and returns the body.
///
/// Implementations must not retry; retrying belongs to
/// [`RetryingCaller`](super::RetryingCaller).
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends the request for `endpoint`, e.g. `/doc/42/`.
    async fn send(&self, endpoint: &str) -> Result<TransportResponse, TransportError>;
}

/// HTTPS transport to the fixed API host with a static token header.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    /// Creates a transport for the production API host with default timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidToken`] if the token is not a valid
    /// header value, or [`TransportError::Client`] if the client cannot be built.
    pub fn new(token: &str) -> Result<Self, TransportError> {
        Self::with_base_url(API_BASE_URL, token, CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS)
    }

    /// Creates a transport against an explicit base URL (used by tests).
    ///
    /// # Errors
    ///
    /// Same as [`HttpTransport::new`].
    pub fn with_base_url(
        base_url: &str,
        token: &str,
        connect_timeout_secs: u64,
        read_timeout_secs: u64,
    ) -> Result<Self, TransportError> {
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Token {token}"))
            .map_err(|_| TransportError::InvalidToken)?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = ClientBuilder::new()
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .timeout(Duration::from_secs(read_timeout_secs))
            .gzip(true)
            .build()
            .map_err(|source| TransportError::Client { source })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Returns the base URL requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(level = "debug", skip(self))]
    async fn send(&self, endpoint: &str) -> Result<TransportResponse, TransportError> {
        let url = format!("{}{endpoint}", self.base_url);
        let response = self
            .client
            .post(&url)
            .send()
            .await
            .map_err(|e| TransportError::network(endpoint, e))?;

        // Error statuses still carry the upstream's JSON or gateway page.
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::network(endpoint, e))?;

        debug!(status, bytes = body.len(), "response received");
        Ok(TransportResponse::with_status(status, body))
    }
}
