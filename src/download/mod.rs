//! Document downloads: detail JSON, original court copies and fragments.
//!
//! # Features
//!
//! - Idempotent: an existing `<id>.json` is never fetched again
//! - Raw response bodies are persisted verbatim
//! - Originals only when requested and flagged by `courtcopy`
//! - Tri-state [`DownloadOutcome`] instead of swallowed errors
//! - Shared atomic [`DownloadStats`] for aggregate reporting

mod document;
mod original;
mod outcome;

pub use document::DocumentDownloader;
pub use original::{UNKNOWN_EXTENSION, extension_for_content_type};
pub use outcome::{DownloadOutcome, DownloadStats, FailureReason};
