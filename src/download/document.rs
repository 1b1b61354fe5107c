//! Idempotent per-document downloads.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use super::original::{decode_payload, extension_for_content_type};
use super::outcome::{DownloadOutcome, DownloadStats, FailureReason};
use crate::DocumentId;
use crate::api::{
    ApiClient, ApiError, DocumentDetail, FailureKind, OriginalDocument, doc_endpoint,
    orig_doc_endpoint,
};
use crate::storage::{Storage, detail_paths};

/// Fetches document details (and optionally originals) and persists them once.
///
/// A document whose detail file exists is never fetched again. The original
/// court copy is only fetched when requested, when the detail says one
/// exists (`courtcopy`), and when no `<id>_original.*` file is on disk yet.
pub struct DocumentDownloader {
    client: Arc<ApiClient>,
    storage: Arc<dyn Storage>,
    want_original: bool,
    stats: DownloadStats,
}

impl std::fmt::Debug for DocumentDownloader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentDownloader")
            .field("want_original", &self.want_original)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl DocumentDownloader {
    /// Creates a downloader.
    #[must_use]
    pub fn new(client: Arc<ApiClient>, storage: Arc<dyn Storage>, want_original: bool) -> Self {
        Self {
            client,
            storage,
            want_original,
            stats: DownloadStats::new(),
        }
    }

    /// Returns the counters accumulated by this downloader.
    #[must_use]
    pub fn stats(&self) -> &DownloadStats {
        &self.stats
    }

    /// Downloads `doc_id` into `target_dir`.
    ///
    /// The raw detail body is written verbatim to `<target_dir>/<id>.json`.
    /// Original failures are logged and counted but do not change the
    /// returned outcome, which describes the detail.
    #[instrument(skip(self), fields(target_dir = %target_dir.display()))]
    pub async fn download(&self, doc_id: DocumentId, target_dir: &Path) -> DownloadOutcome {
        let (detail_path, original_prefix) = detail_paths(target_dir, doc_id);

        let (outcome, courtcopy) = if self.storage.exists(&detail_path) {
            debug!(doc_id, "detail already present");
            let courtcopy = self.want_original && self.stored_courtcopy(&detail_path);
            (DownloadOutcome::AlreadyPresent, courtcopy)
        } else {
            match self.fetch_detail(doc_id, &detail_path).await {
                Ok(courtcopy) => (DownloadOutcome::Downloaded, courtcopy),
                Err(reason) => {
                    warn!(doc_id, reason = %reason, "Error in getting doc");
                    let outcome = DownloadOutcome::Failed(reason);
                    self.stats.record(&outcome);
                    return outcome;
                }
            }
        };
        self.stats.record(&outcome);

        if self.want_original && courtcopy && !self.storage.exists_original(&original_prefix) {
            match self.fetch_original(doc_id, &original_prefix).await {
                DownloadOutcome::Failed(reason) => {
                    warn!(doc_id, reason = %reason, "Error in getting original");
                }
                _ => info!(doc_id, "Saved original"),
            }
        }

        outcome
    }

    /// Fetches, parses and persists the detail; returns its `courtcopy` flag.
    async fn fetch_detail(&self, doc_id: DocumentId, detail_path: &Path) -> Result<bool, FailureReason> {
        let endpoint = doc_endpoint(doc_id, self.client.limits());
        let body = self
            .client
            .fetch_doc(doc_id)
            .await
            .map_err(|e| FailureReason::from(&e))?;
        let detail = DocumentDetail::parse_accepted(&endpoint, &body)
            .map_err(|e| FailureReason::from(&e))?;

        self.storage
            .save_json(&body, detail_path)
            .map_err(|e| FailureReason::from(&e))?;
        info!(doc_id, title = %detail.title, "Saved");
        Ok(detail.courtcopy)
    }

    /// Reads `courtcopy` back from a stored detail; unreadable details count as false.
    fn stored_courtcopy(&self, detail_path: &Path) -> bool {
        let parsed = self
            .storage
            .read_json(detail_path)
            .ok()
            .and_then(|body| serde_json::from_str::<DocumentDetail>(&body).ok());
        match parsed {
            Some(detail) => detail.courtcopy,
            None => {
                debug!(path = %detail_path.display(), "stored detail unreadable, skipping original");
                false
            }
        }
    }

    /// Fetches the original court copy and writes it to `<prefix>.<ext>`.
    #[instrument(skip(self), fields(prefix = %prefix.display()))]
    pub async fn fetch_original(&self, doc_id: DocumentId, prefix: &Path) -> DownloadOutcome {
        let endpoint = orig_doc_endpoint(doc_id);
        let body = match self.client.fetch_orig_doc(doc_id).await {
            Ok(body) => body,
            Err(e) => return DownloadOutcome::Failed(FailureReason::from(&e)),
        };
        let original = match OriginalDocument::parse_accepted(&endpoint, &body) {
            Ok(original) => original,
            Err(e) => {
                if matches!(e, ApiError::Parse { .. }) {
                    warn!(doc_id, error = %e, "Original is not a correct json");
                }
                return DownloadOutcome::Failed(FailureReason::from(&e));
            }
        };

        let bytes = match decode_payload(&original.doc) {
            Ok(bytes) => bytes,
            Err(e) => {
                return DownloadOutcome::Failed(FailureReason::new(
                    FailureKind::ParseError,
                    format!("invalid base64 payload: {e}"),
                ));
            }
        };

        let extension = extension_for_content_type(original.content_type.as_deref());
        let mut file_name = prefix.as_os_str().to_owned();
        file_name.push(".");
        file_name.push(extension);
        let path = std::path::PathBuf::from(file_name);

        match self.storage.save_original(&bytes, &path) {
            Ok(()) => {
                self.stats.increment_originals();
                debug!(doc_id, path = %path.display(), bytes = bytes.len(), "original written");
                DownloadOutcome::Downloaded
            }
            Err(e) => DownloadOutcome::Failed(FailureReason::from(&e)),
        }
    }

    /// Runs a fragment search inside `doc_id` and stores the raw body.
    #[instrument(skip(self))]
    pub async fn save_fragment(&self, doc_id: DocumentId, query: &str) -> DownloadOutcome {
        let body = match self.client.fetch_doc_fragment(doc_id, query).await {
            Ok(body) => body,
            Err(e) => return DownloadOutcome::Failed(FailureReason::from(&e)),
        };
        if body.trim().is_empty() {
            return DownloadOutcome::Failed(FailureReason::new(
                FailureKind::ParseError,
                "empty fragment response",
            ));
        }

        let path = self.storage.fragment_path(doc_id, query);
        match self.storage.save_json(&body, &path) {
            Ok(()) => {
                info!(doc_id, path = %path.display(), "Saved fragment");
                DownloadOutcome::Downloaded
            }
            Err(e) => DownloadOutcome::Failed(FailureReason::from(&e)),
        }
    }
}
