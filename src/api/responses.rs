//! Response models for the search, document and original-document endpoints.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

use super::constants::GATEWAY_ERROR_MARKER;
use super::error::ApiError;
use super::retry::excerpt;
use crate::DocumentId;

/// Parses a JSON body, telling a leftover gateway page apart from other garbage.
fn parse_body<T: DeserializeOwned>(endpoint: &str, body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|source| {
        if body.contains(GATEWAY_ERROR_MARKER) {
            ApiError::gateway(endpoint, excerpt(body))
        } else {
            ApiError::parse(endpoint, source)
        }
    })
}

/// Turns an `errmsg` into [`ApiError::Rejected`].
fn reject_errmsg(endpoint: &str, errmsg: Option<&str>) -> Result<(), ApiError> {
    match errmsg {
        Some(message) => Err(ApiError::rejected(endpoint, message)),
        None => Ok(()),
    }
}

/// One page of search results.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchPage {
    /// Upstream error message, if the search was rejected.
    #[serde(default)]
    pub errmsg: Option<String>,
    /// Human-readable result count, e.g. `"1 - 10 of 23"`.
    #[serde(default)]
    pub found: Option<serde_json::Value>,
    /// Hits on this page, in ranking order.
    #[serde(default)]
    pub docs: Option<Vec<DocumentSummary>>,
}

impl SearchPage {
    /// Parses a search body.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Parse`] if the body is not a valid search page,
    /// or [`ApiError::Gateway`] if it is a gateway error page.
    pub fn parse(endpoint: &str, body: &str) -> Result<Self, ApiError> {
        parse_body(endpoint, body)
    }

    /// Result count as logged by the upstream, or an empty string.
    #[must_use]
    pub fn found_label(&self) -> String {
        match &self.found {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        }
    }
}

/// A single search hit.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DocumentSummary {
    /// Document id (`tid`).
    #[serde(rename = "tid", deserialize_with = "doc_id_from_number_or_string")]
    pub doc_id: DocumentId,
    /// Document title (may contain markup).
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    /// Publish date as sent by the upstream, e.g. `2019-03-15`.
    #[serde(rename = "publishdate", default, deserialize_with = "null_as_default")]
    pub publish_date: String,
    /// Issuing court or source.
    #[serde(rename = "docsource", default, deserialize_with = "null_as_default")]
    pub source: String,
}

/// Detail of a single document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentDetail {
    /// Upstream error message, if the fetch was rejected.
    #[serde(default)]
    pub errmsg: Option<String>,
    /// Document title.
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    /// Whether an original court copy can be fetched.
    #[serde(default, deserialize_with = "null_as_default")]
    pub courtcopy: bool,
    /// Document markup, containing `/doc/<id>/` links to cited documents.
    #[serde(rename = "doc", default)]
    pub content: Option<String>,
}

impl DocumentDetail {
    /// Parses a document detail body.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Parse`] if the body is not valid JSON,
    /// or [`ApiError::Gateway`] if it is a gateway error page.
    pub fn parse(endpoint: &str, body: &str) -> Result<Self, ApiError> {
        parse_body(endpoint, body)
    }

    /// Parses a detail and rejects it if it carries `errmsg`.
    ///
    /// # Errors
    ///
    /// Same as [`DocumentDetail::parse`], plus [`ApiError::Rejected`].
    pub fn parse_accepted(endpoint: &str, body: &str) -> Result<Self, ApiError> {
        let detail = Self::parse(endpoint, body)?;
        reject_errmsg(endpoint, detail.errmsg.as_deref())?;
        Ok(detail)
    }
}

/// Original court copy, base64 encoded.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OriginalDocument {
    /// Upstream error message, if the fetch was rejected.
    #[serde(default)]
    pub errmsg: Option<String>,
    /// Base64 payload.
    #[serde(default, deserialize_with = "null_as_default")]
    pub doc: String,
    /// MIME type of the decoded payload.
    #[serde(rename = "Content-Type", default)]
    pub content_type: Option<String>,
}

impl OriginalDocument {
    /// Parses an original-document body.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Parse`] if the body is not valid JSON,
    /// [`ApiError::Gateway`] for a gateway error page and
    /// [`ApiError::Rejected`] if it carries `errmsg`.
    pub fn parse_accepted(endpoint: &str, body: &str) -> Result<Self, ApiError> {
        let original: Self = parse_body(endpoint, body)?;
        reject_errmsg(endpoint, original.errmsg.as_deref())?;
        Ok(original)
    }
}

/// Reads an explicit `null` the same way as a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn doc_id_from_number_or_string<'de, D>(deserializer: D) -> Result<DocumentId, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(DocumentId),
        Text(String),
    }

    match RawId::deserialize(deserializer)? {
        RawId::Number(id) => Ok(id),
        RawId::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
    }
}
