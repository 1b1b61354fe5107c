//! ikfetch Core Library
//!
//! This library resolves Indian Kanoon search queries and citation
//! relationships into deduplicated document ids, then fetches and stores the
//! document details and, optionally, the original court copies.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`api`] - Transport, retrying call layer, endpoint client and response models
//! - [`query`] - Query text normalization (date, sort and added-today filters)
//! - [`storage`] - On-disk layout for details, originals and `toc.csv`
//! - [`download`] - Idempotent per-document downloads
//! - [`search`] - Paginated search traversal with dedup
//! - [`pool`] - Bounded worker pool for query files
//! - [`citation`] - One-level citation graph expansion
//! - [`config`] - File configuration and resolved run settings
//! - [`context`] - Explicitly constructed run context wiring the above together

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod api;
pub mod citation;
pub mod config;
pub mod context;
pub mod download;
pub mod pool;
pub mod query;
pub mod search;
pub mod storage;

/// Globally unique Indian Kanoon document id, the dedup key throughout.
pub type DocumentId = i64;

// Re-export commonly used types
pub use api::{
    ApiClient, ApiError, BodyClass, DEFAULT_MAX_ATTEMPTS, DocLimits, FailureKind, HttpTransport,
    RetryPolicy, RetryingCaller, Transport, TransportError, TransportResponse, classify_body,
};
pub use citation::{CitationExpander, CitationFrontier, ExpansionReport, extract_doc_links};
pub use config::{ConfigError, FetchSettings, FileConfig, load_default_file_config};
pub use context::FetchContext;
pub use download::{
    DocumentDownloader, DownloadOutcome, DownloadStats, FailureReason, extension_for_content_type,
};
pub use pool::{DEFAULT_QUEUE_CAPACITY, PoolReport, WorkerPool};
pub use query::{Query, QueryOptions};
pub use search::{MAX_PAGES_PER_CALL, SearchOptions, SearchPaginator, SearchReport, StopReason};
pub use storage::{FileStorage, Storage, StorageError, TocRow, TocWriter};
