//! Error types for the API layer.
//!
//! Transport faults and gateway error pages never leave the retrying call
//! layer on their own; callers only see [`ApiError::Exhausted`] when no body
//! at all could be obtained. Everything else (application errors, malformed
//! JSON) is detected by the caller after a body came back.

use thiserror::Error;

/// Failure taxonomy shared by every unit of work (page, document, query).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The transport could not deliver a request or read its response.
    TransportFault,
    /// The upstream answered with a non-JSON gateway error page.
    UpstreamGatewayError,
    /// The parsed body carries an `errmsg` field.
    ApplicationError,
    /// The body is not valid JSON where JSON was expected.
    ParseError,
    /// A local write failed.
    PersistenceError,
    /// A worker was interrupted while blocked waiting for work.
    InterruptedWait,
}

impl FailureKind {
    /// Returns a stable label for log output.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TransportFault => "transport_fault",
            Self::UpstreamGatewayError => "upstream_gateway_error",
            Self::ApplicationError => "application_error",
            Self::ParseError => "parse_error",
            Self::PersistenceError => "persistence_error",
            Self::InterruptedWait => "interrupted_wait",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised by a [`Transport`](super::Transport) for a single request.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error calling {endpoint}: {source}")]
    Network {
        /// The endpoint that failed.
        endpoint: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout calling {endpoint}")]
    Timeout {
        /// The endpoint that timed out.
        endpoint: String,
    },

    /// The configured token cannot be sent as a header value.
    #[error("API token contains characters not allowed in an HTTP header")]
    InvalidToken,

    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {source}")]
    Client {
        /// The underlying builder error.
        #[source]
        source: reqwest::Error,
    },

    /// Any other transport failure, mostly produced by test transports.
    #[error("transport failure calling {endpoint}: {message}")]
    Other {
        /// The endpoint that failed.
        endpoint: String,
        /// Description of the failure.
        message: String,
    },
}

impl TransportError {
    /// Creates a network error from a reqwest error, mapping timeouts to [`Self::Timeout`].
    pub fn network(endpoint: impl Into<String>, source: reqwest::Error) -> Self {
        let endpoint = endpoint.into();
        if source.is_timeout() {
            Self::Timeout { endpoint }
        } else {
            Self::Network { endpoint, source }
        }
    }

    /// Creates a free-form transport failure.
    pub fn other(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Other {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }
}

/// Errors surfaced to callers of the API client.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Every attempt failed at the transport level; no body was received.
    #[error("no response from {endpoint} after {attempts} attempts: {source}")]
    Exhausted {
        /// The endpoint that was called.
        endpoint: String,
        /// Number of attempts made.
        attempts: u32,
        /// The last transport failure.
        #[source]
        source: TransportError,
    },

    /// The body could not be parsed as the expected JSON document.
    #[error("malformed response from {endpoint}: {source}")]
    Parse {
        /// The endpoint that was called.
        endpoint: String,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// Retries ran out and the last body was still a gateway error page.
    #[error("gateway error page from {endpoint}: {message}")]
    Gateway {
        /// The endpoint that was called.
        endpoint: String,
        /// First line of the error page.
        message: String,
    },

    /// The upstream reported an error in its `errmsg` field.
    #[error("API error from {endpoint}: {message}")]
    Rejected {
        /// The endpoint that was called.
        endpoint: String,
        /// The `errmsg` text.
        message: String,
    },
}

impl ApiError {
    /// Creates a parse error.
    pub fn parse(endpoint: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Parse {
            endpoint: endpoint.into(),
            source,
        }
    }

    /// Creates a gateway error from the page text.
    pub fn gateway(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Gateway {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// Creates an application-level rejection.
    pub fn rejected(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Rejected {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// Maps the error onto the shared failure taxonomy.
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Exhausted { .. } => FailureKind::TransportFault,
            Self::Gateway { .. } => FailureKind::UpstreamGatewayError,
            Self::Parse { .. } => FailureKind::ParseError,
            Self::Rejected { .. } => FailureKind::ApplicationError,
        }
    }
}
