//! Retrying call layer with linear backoff over an unreliable upstream.
//!
//! The upstream rarely signals failure through a reliable status code, so
//! every body is run through [`classify_body`]:
//! - [`BodyClass::Success`] - hand the body to the caller
//! - [`BodyClass::RetryableGatewayError`] - proxy error page (`error code:`) or 502/503/504
//! - [`BodyClass::Malformed`] - empty body
//!
//! Transport faults, gateway pages and empty bodies are retried up to
//! [`RetryPolicy::max_attempts`] times, sleeping `attempt * backoff_unit`
//! after each failed attempt. When attempts run out the last body is
//! returned as-is; callers inspect it for emptiness and `errmsg`.
//!
//! # Example
//!
//! ```
//! use ikfetch_core::api::{BodyClass, classify_body};
//!
//! assert_eq!(classify_body(Some(200), r#"{"docs": []}"#), BodyClass::Success);
//! assert_eq!(classify_body(None, "error code: 522"), BodyClass::RetryableGatewayError);
//! assert_eq!(classify_body(Some(200), ""), BodyClass::Malformed);
//! ```

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, instrument, warn};

use super::constants::{BACKOFF_UNIT, DEFAULT_MAX_ATTEMPTS, GATEWAY_ERROR_MARKER};
use super::error::{ApiError, TransportError};
use super::transport::Transport;

/// Classification of a raw response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyClass {
    /// A body worth handing to the caller (it may still carry `errmsg`).
    Success,
    /// A gateway error page or gateway status; retry.
    RetryableGatewayError,
    /// Nothing usable came back; retry.
    Malformed,
}

impl BodyClass {
    /// Returns true if the call should be attempted again.
    #[must_use]
    pub fn is_retryable(self) -> bool {
        !matches!(self, Self::Success)
    }
}

/// Classifies a response body (and status, when known) for retry decisions.
///
/// | Input | Class |
/// |-------|-------|
/// | empty or whitespace body | Malformed |
/// | body containing `error code:` | RetryableGatewayError |
/// | status 502, 503, 504 | RetryableGatewayError |
/// | anything else | Success |
#[must_use]
pub fn classify_body(status: Option<u16>, body: &str) -> BodyClass {
    if body.trim().is_empty() {
        return BodyClass::Malformed;
    }
    if body.contains(GATEWAY_ERROR_MARKER) {
        return BodyClass::RetryableGatewayError;
    }
    match status {
        Some(502..=504) => BodyClass::RetryableGatewayError,
        _ => BodyClass::Success,
    }
}

/// Retry configuration with fixed linear backoff.
///
/// # Default Values
///
/// - `max_attempts`: 3
/// - `backoff_unit`: 10 seconds
///
/// With defaults the delays are 10s, 20s and 30s, so a call blocks for at
/// most 60s of backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff_unit: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_unit: BACKOFF_UNIT,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy with custom settings (`max_attempts` is at least 1).
    #[must_use]
    pub fn new(max_attempts: u32, backoff_unit: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff_unit,
        }
    }

    /// Returns the maximum number of attempts per call.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns the backoff unit.
    #[must_use]
    pub fn backoff_unit(&self) -> Duration {
        self.backoff_unit
    }

    /// Delay slept after failed attempt `attempt` (1-indexed).
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.backoff_unit * attempt
    }
}

/// Wraps a [`Transport`] with bounded retry and failure classification.
#[derive(Clone)]
pub struct RetryingCaller {
    transport: Arc<dyn Transport>,
    policy: RetryPolicy,
}

impl std::fmt::Debug for RetryingCaller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryingCaller")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl RetryingCaller {
    /// Creates a caller over `transport`.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    /// Returns the configured retry policy.
    #[must_use]
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Calls `endpoint`, retrying transport faults and unusable bodies.
    ///
    /// # Returns
    ///
    /// The first successful body, or the last body received once attempts
    /// are exhausted (possibly empty or an error page).
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Exhausted`] only if every attempt failed at the
    /// transport level and no body was ever received.
    #[instrument(skip(self), fields(max_attempts = self.policy.max_attempts))]
    pub async fn call(&self, endpoint: &str) -> Result<String, ApiError> {
        let mut last_body: Option<String> = None;
        let mut last_error: Option<TransportError> = None;

        for attempt in 1..=self.policy.max_attempts {
            match self.transport.send(endpoint).await {
                Ok(response) => {
                    let class = classify_body(response.status, &response.body);
                    if !class.is_retryable() {
                        debug!(attempt, "call succeeded");
                        return Ok(response.body);
                    }
                    warn!(
                        endpoint,
                        attempt,
                        status = ?response.status,
                        class = ?class,
                        message = %excerpt(&response.body),
                        "Error in API call"
                    );
                    last_body = Some(response.body);
                }
                Err(error) => {
                    warn!(endpoint, attempt, error = %error, "Error in API call");
                    last_error = Some(error);
                }
            }

            let delay = self.policy.delay_for(attempt);
            debug!(attempt, delay_secs = delay.as_secs(), "backing off");
            tokio::time::sleep(delay).await;
        }

        match (last_body, last_error) {
            (Some(body), _) => Ok(body),
            (None, Some(source)) => Err(ApiError::Exhausted {
                endpoint: endpoint.to_string(),
                attempts: self.policy.max_attempts,
                source,
            }),
            (None, None) => Ok(String::new()),
        }
    }
}

/// First line of a body, bounded, for log and error messages.
pub(super) fn excerpt(body: &str) -> &str {
    let line = body.lines().next().unwrap_or("");
    match line.char_indices().nth(120) {
        Some((idx, _)) => &line[..idx],
        None => line,
    }
}
