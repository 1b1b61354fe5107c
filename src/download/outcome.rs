//! Download outcomes and aggregate counters.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::api::{ApiError, FailureKind};
use crate::storage::StorageError;

/// Why a unit of work was abandoned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureReason {
    /// Taxonomy bucket.
    pub kind: FailureKind,
    /// Human-readable detail.
    pub message: String,
}

impl FailureReason {
    /// Creates a failure reason.
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl From<&ApiError> for FailureReason {
    fn from(error: &ApiError) -> Self {
        Self::new(error.kind(), error.to_string())
    }
}

impl From<&StorageError> for FailureReason {
    fn from(error: &StorageError) -> Self {
        Self::new(FailureKind::PersistenceError, error.to_string())
    }
}

/// Result of fetching and persisting one document (or its original).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// Fetched and written in this call.
    Downloaded,
    /// Already on disk; nothing was fetched.
    AlreadyPresent,
    /// Abandoned; nothing was written.
    Failed(FailureReason),
}

impl DownloadOutcome {
    /// Returns true for [`DownloadOutcome::Downloaded`].
    #[must_use]
    pub fn is_downloaded(&self) -> bool {
        matches!(self, Self::Downloaded)
    }

    /// Returns true for [`DownloadOutcome::Failed`].
    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Statistics across every download of a run.
///
/// Uses atomic counters so a single downloader can be shared by pool workers.
#[derive(Debug, Default)]
pub struct DownloadStats {
    downloaded: AtomicUsize,
    already_present: AtomicUsize,
    failed: AtomicUsize,
    originals: AtomicUsize,
}

impl DownloadStats {
    /// Creates a new stats tracker with zero counts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of details fetched and written.
    #[must_use]
    pub fn downloaded(&self) -> usize {
        self.downloaded.load(Ordering::SeqCst)
    }

    /// Number of details found on disk.
    #[must_use]
    pub fn already_present(&self) -> usize {
        self.already_present.load(Ordering::SeqCst)
    }

    /// Number of abandoned details.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::SeqCst)
    }

    /// Number of original court copies written.
    #[must_use]
    pub fn originals(&self) -> usize {
        self.originals.load(Ordering::SeqCst)
    }

    /// Total details handled (downloaded + already present + failed).
    #[must_use]
    pub fn total(&self) -> usize {
        self.downloaded() + self.already_present() + self.failed()
    }

    /// Counts a detail outcome.
    pub(crate) fn record(&self, outcome: &DownloadOutcome) {
        let counter = match outcome {
            DownloadOutcome::Downloaded => &self.downloaded,
            DownloadOutcome::AlreadyPresent => &self.already_present,
            DownloadOutcome::Failed(_) => &self.failed,
        };
        counter.fetch_add(1, Ordering::SeqCst);
    }

    /// Counts a written original.
    pub(crate) fn increment_originals(&self) {
        self.originals.fetch_add(1, Ordering::SeqCst);
    }
}
