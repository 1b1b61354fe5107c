//! Constants for the API layer (host, timeouts, retry backoff).

use std::time::Duration;

/// Base URL of the Indian Kanoon API. Every endpoint is POSTed here.
pub const API_BASE_URL: &str = "https://api.indiankanoon.org";

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default HTTP read timeout (5 minutes, original court copies can be large).
pub const READ_TIMEOUT_SECS: u64 = 300;

/// Attempts made per call before the last body is handed back as-is.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Linear backoff unit: the delay after failed attempt `n` is `n * unit`.
pub const BACKOFF_UNIT: Duration = Duration::from_secs(10);

/// Literal marker of the non-JSON gateway error pages served by the upstream proxy.
pub const GATEWAY_ERROR_MARKER: &str = "error code:";
