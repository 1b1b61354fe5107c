//! Query normalization: recognized filters appended to raw query text.
//!
//! The upstream search syntax takes filters inline in the query text. The
//! clauses are appended in a fixed order (`fromdate:`, `todate:`,
//! `added:today`, `sortby:`); the order only affects readability.

use std::fmt;

use crate::DocumentId;

/// Immutable, fully built query text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Query(String);

impl Query {
    /// Wraps already-normalized query text without adding filters.
    pub fn raw(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Returns the query text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Filters appended to every query of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOptions {
    /// `fromdate:` value, passed through unvalidated (DD-MM-YYYY upstream).
    pub from_date: Option<String>,
    /// `todate:` value, passed through unvalidated.
    pub to_date: Option<String>,
    /// Restrict to documents added today.
    pub added_today: bool,
    /// `sortby:` value (`mostrecent` or `leastrecent`).
    pub sort_by: Option<String>,
}

impl QueryOptions {
    /// Appends the set, non-empty filters to `raw`.
    #[must_use]
    pub fn build(&self, raw: &str) -> Query {
        let mut text = raw.to_string();

        if let Some(from_date) = non_empty(self.from_date.as_deref()) {
            text.push_str(" fromdate: ");
            text.push_str(from_date);
        }
        if let Some(to_date) = non_empty(self.to_date.as_deref()) {
            text.push_str(" todate: ");
            text.push_str(to_date);
        }
        if self.added_today {
            text.push_str(" added:today");
        }
        if let Some(sort_by) = non_empty(self.sort_by.as_deref()) {
            text.push_str(" sortby: ");
            text.push_str(sort_by);
        }

        Query(text)
    }

    /// Builds a document-type query, e.g. `doctypes: supremecourt`.
    #[must_use]
    pub fn doctype(&self, doctype: &str) -> Query {
        self.build(&format!("doctypes: {doctype}"))
    }

    /// Builds a query for documents citing `doc_id`.
    #[must_use]
    pub fn cited_by(&self, doc_id: DocumentId) -> Query {
        self.build(&format!("citedby:{doc_id}"))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
