//! Endpoint client for the search, document, original and fragment APIs.

use tracing::instrument;
use url::form_urlencoded;

use super::error::ApiError;
use super::retry::RetryingCaller;
use crate::DocumentId;

/// Optional citation limits sent with document detail requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DocLimits {
    /// Maximum cited documents returned with the detail (0 = upstream default).
    pub max_cites: u32,
    /// Maximum citing documents returned with the detail (0 = upstream default).
    pub max_cited_by: u32,
}

/// Builds endpoint paths and sends them through a [`RetryingCaller`].
///
/// Every method returns the raw body; parsing and `errmsg` checks are left
/// to the caller so the raw text can be persisted verbatim.
#[derive(Debug, Clone)]
pub struct ApiClient {
    caller: RetryingCaller,
    limits: DocLimits,
}

impl ApiClient {
    /// Creates a client.
    #[must_use]
    pub fn new(caller: RetryingCaller, limits: DocLimits) -> Self {
        Self { caller, limits }
    }

    /// Returns the detail limits in use.
    #[must_use]
    pub fn limits(&self) -> DocLimits {
        self.limits
    }

    /// Fetches one search result window.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Exhausted`] if no body could be obtained.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str, page_num: u32, max_pages: u32) -> Result<String, ApiError> {
        self.caller
            .call(&search_endpoint(query, page_num, max_pages))
            .await
    }

    /// Fetches the detail of a document.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Exhausted`] if no body could be obtained.
    #[instrument(skip(self))]
    pub async fn fetch_doc(&self, doc_id: DocumentId) -> Result<String, ApiError> {
        self.caller.call(&doc_endpoint(doc_id, self.limits)).await
    }

    /// Fetches the original court copy of a document.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Exhausted`] if no body could be obtained.
    #[instrument(skip(self))]
    pub async fn fetch_orig_doc(&self, doc_id: DocumentId) -> Result<String, ApiError> {
        self.caller.call(&orig_doc_endpoint(doc_id)).await
    }

    /// Searches within a single document.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Exhausted`] if no body could be obtained.
    #[instrument(skip(self))]
    pub async fn fetch_doc_fragment(&self, doc_id: DocumentId, query: &str) -> Result<String, ApiError> {
        self.caller
            .call(&doc_fragment_endpoint(doc_id, query))
            .await
    }
}

fn encode(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// `/search/?formInput=<q>&pagenum=<n>&maxpages=<m>`
#[must_use]
pub fn search_endpoint(query: &str, page_num: u32, max_pages: u32) -> String {
    format!(
        "/search/?formInput={}&pagenum={page_num}&maxpages={max_pages}",
        encode(query)
    )
}

/// `/doc/<id>/` with `maxcites`/`maxcitedby` appended when positive.
#[must_use]
pub fn doc_endpoint(doc_id: DocumentId, limits: DocLimits) -> String {
    let mut params = Vec::new();
    if limits.max_cites > 0 {
        params.push(format!("maxcites={}", limits.max_cites));
    }
    if limits.max_cited_by > 0 {
        params.push(format!("maxcitedby={}", limits.max_cited_by));
    }

    if params.is_empty() {
        format!("/doc/{doc_id}/")
    } else {
        format!("/doc/{doc_id}/?{}", params.join("&"))
    }
}

/// `/origdoc/<id>/`
#[must_use]
pub fn orig_doc_endpoint(doc_id: DocumentId) -> String {
    format!("/origdoc/{doc_id}/")
}

/// `/docfragment/<id>/?formInput=<q>`
#[must_use]
pub fn doc_fragment_endpoint(doc_id: DocumentId, query: &str) -> String {
    format!("/docfragment/{doc_id}/?formInput={}", encode(query))
}
