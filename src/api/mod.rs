//! Indian Kanoon API access: transport, retrying call layer and endpoints.
//!
//! # Features
//!
//! - [`Transport`] seam with an HTTPS implementation ([`HttpTransport`])
//! - Bounded retry with linear backoff ([`RetryingCaller`])
//! - Body classification for gateway error pages ([`classify_body`])
//! - Endpoint builders and typed response models
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use ikfetch_core::api::{ApiClient, DocLimits, HttpTransport, RetryPolicy, RetryingCaller};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = Arc::new(HttpTransport::new("my-token")?);
//! let caller = RetryingCaller::new(transport, RetryPolicy::default());
//! let client = ApiClient::new(caller, DocLimits::default());
//! let body = client.search("income tax", 0, 1).await?;
//! println!("{body}");
//! # Ok(())
//! # }
//! ```

mod client;
mod constants;
mod error;
pub mod responses;
mod retry;
mod transport;

pub use client::{
    ApiClient, DocLimits, doc_endpoint, doc_fragment_endpoint, orig_doc_endpoint, search_endpoint,
};
pub use constants::{API_BASE_URL, BACKOFF_UNIT, DEFAULT_MAX_ATTEMPTS};
pub use error::{ApiError, FailureKind, TransportError};
pub use responses::{DocumentDetail, DocumentSummary, OriginalDocument, SearchPage};
pub use retry::{BodyClass, RetryPolicy, RetryingCaller, classify_body};
pub use transport::{HttpTransport, Transport, TransportResponse};
