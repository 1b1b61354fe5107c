//! Paginated search traversal with dedup and idempotent downloads.
//!
//! A run walks result windows starting at page 0, advancing the page number
//! by `max_pages` (the pagination unit is the page-count parameter itself).
//! It stops only when a window carries `errmsg`, lacks `docs`, or returns an
//! empty `docs` array, unless an explicit `page_limit` is configured.
//!
//! Hits are processed strictly in returned order: each gets the next 1-based
//! position, an optional `toc.csv` row, an optional download, and its id is
//! added to the result set whether or not the download succeeded.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::DocumentId;
use crate::api::{ApiClient, DocumentSummary, SearchPage, search_endpoint};
use crate::download::{DocumentDownloader, FailureReason};
use crate::query::Query;
use crate::storage::{Storage, TocRow, TocWriter};

/// Upper bound accepted by the search endpoint for `maxpages`.
pub const MAX_PAGES_PER_CALL: u32 = 100;

/// Behavior switches for a search run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    /// Pages requested per call; also the page-number stride.
    pub max_pages: u32,
    /// Store hits under `<source>/<year>/<date>` instead of `<query>/<position>`.
    pub path_by_source: bool,
    /// Write `toc.csv` into the search directory.
    pub csv_output: bool,
    /// Only count hits: no directories, no table, no downloads.
    pub count_only: bool,
    /// Optional cap on the number of result windows fetched.
    pub page_limit: Option<u32>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            max_pages: 1,
            path_by_source: false,
            csv_output: true,
            count_only: false,
            page_limit: None,
        }
    }
}

impl SearchOptions {
    /// Returns a copy with `max_pages` clamped to `1..=MAX_PAGES_PER_CALL`.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.max_pages = self.max_pages.clamp(1, MAX_PAGES_PER_CALL);
        self
    }
}

/// Why a search run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// Missing or empty `docs`: no more results.
    Exhausted,
    /// The upstream answered with `errmsg`.
    Rejected(String),
    /// A window could not be fetched or parsed.
    Failed(FailureReason),
    /// The configured `page_limit` was reached.
    PageLimit,
}

/// Result of one search run.
#[derive(Debug, Clone)]
pub struct SearchReport {
    /// The query text that was run.
    pub query: String,
    /// Unique ids across all windows.
    pub doc_ids: HashSet<DocumentId>,
    /// Number of hits processed (last assigned position).
    pub positions: usize,
    /// Number of result windows that returned hits.
    pub pages: u32,
    /// Why the run ended.
    pub stop: StopReason,
}

impl SearchReport {
    fn new(query: &Query) -> Self {
        Self {
            query: query.as_str().to_string(),
            doc_ids: HashSet::new(),
            positions: 0,
            pages: 0,
            stop: StopReason::Exhausted,
        }
    }

    /// Number of unique documents found.
    #[must_use]
    pub fn unique_count(&self) -> usize {
        self.doc_ids.len()
    }
}

/// Drives repeated search calls and per-hit processing.
pub struct SearchPaginator {
    client: Arc<ApiClient>,
    downloader: Arc<DocumentDownloader>,
    storage: Arc<dyn Storage>,
    options: SearchOptions,
}

impl std::fmt::Debug for SearchPaginator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchPaginator")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// Where the hits of one run are written.
struct RunOutput {
    search_dir: Option<PathBuf>,
    toc: Option<TocWriter>,
}

impl SearchPaginator {
    /// Creates a paginator; `options.max_pages` is clamped to the accepted range.
    #[must_use]
    pub fn new(
        client: Arc<ApiClient>,
        downloader: Arc<DocumentDownloader>,
        storage: Arc<dyn Storage>,
        options: SearchOptions,
    ) -> Self {
        Self {
            client,
            downloader,
            storage,
            options: options.normalized(),
        }
    }

    /// Returns the effective options.
    #[must_use]
    pub fn options(&self) -> &SearchOptions {
        &self.options
    }

    /// Returns the downloader used for hits.
    #[must_use]
    pub fn downloader(&self) -> &Arc<DocumentDownloader> {
        &self.downloader
    }

    /// Runs `query` to completion and returns the unique ids found.
    ///
    /// Never fails as a whole: a window that cannot be fetched or parsed ends
    /// the run with the results gathered so far and a [`StopReason::Failed`].
    #[instrument(skip(self, query), fields(query = %query))]
    pub async fn run(&self, query: &Query) -> SearchReport {
        let mut report = SearchReport::new(query);
        let mut output = self.prepare_output(query);
        let max_pages = self.options.max_pages;
        let mut page_num: u32 = 0;

        loop {
            if let Some(limit) = self.options.page_limit
                && report.pages >= limit
            {
                info!(limit, "page limit reached");
                report.stop = StopReason::PageLimit;
                break;
            }

            let endpoint = search_endpoint(query.as_str(), page_num, max_pages);
            let page = match self.client.search(query.as_str(), page_num, max_pages).await {
                Ok(body) => SearchPage::parse(&endpoint, &body),
                Err(e) => Err(e),
            };
            let page = match page {
                Ok(page) => page,
                Err(e) => {
                    warn!(page_num, error = %e, "search window failed, keeping partial results");
                    report.stop = StopReason::Failed(FailureReason::from(&e));
                    break;
                }
            };

            if let Some(errmsg) = page.errmsg.clone() {
                warn!(page_num, errmsg = %errmsg, "search rejected");
                report.stop = StopReason::Rejected(errmsg);
                break;
            }
            let found = page.found_label();
            let docs = match page.docs {
                Some(docs) if !docs.is_empty() => docs,
                _ => {
                    debug!(page_num, "no more results");
                    report.stop = StopReason::Exhausted;
                    break;
                }
            };

            info!(num_results = docs.len(), page_num, found = %found, "search window");
            report.pages += 1;

            for doc in &docs {
                report.positions += 1;
                self.process_hit(doc, report.positions, &mut output).await;
                report.doc_ids.insert(doc.doc_id);
            }

            if let Some(toc) = output.toc.as_mut()
                && let Err(e) = toc.flush()
            {
                warn!(error = %e, "failed to flush toc.csv");
            }

            page_num = page_num.saturating_add(max_pages);
        }

        if self.options.count_only {
            info!("{} document(s) found for query: {}", report.unique_count(), query);
        }
        report
    }

    /// Creates the search directory and table when this run needs them.
    fn prepare_output(&self, query: &Query) -> RunOutput {
        let options = &self.options;
        let mut output = RunOutput {
            search_dir: None,
            toc: None,
        };
        if options.count_only || (options.path_by_source && !options.csv_output) {
            return output;
        }

        match self.storage.search_dir(query.as_str()) {
            Ok(dir) => output.search_dir = Some(dir),
            Err(e) => {
                warn!(error = %e, "cannot create search directory");
                return output;
            }
        }

        if options.csv_output
            && let Some(dir) = output.search_dir.as_deref()
        {
            match self.storage.toc_writer(dir) {
                Ok(writer) => output.toc = Some(writer),
                Err(e) => warn!(error = %e, "cannot create toc.csv, continuing without it"),
            }
        }
        output
    }

    async fn process_hit(&self, doc: &DocumentSummary, position: usize, output: &mut RunOutput) {
        if self.options.count_only {
            return;
        }

        if let Some(toc) = output.toc.as_mut() {
            let row = TocRow {
                position,
                doc_id: doc.doc_id,
                date: &doc.publish_date,
                court: &doc.source,
                title: &doc.title,
            };
            if let Err(e) = toc.write_row(&row) {
                warn!(doc_id = doc.doc_id, error = %e, "failed to write toc row");
            }
        }

        let target_dir = if self.options.path_by_source {
            self.storage.doc_dir_by_source(&doc.source, &doc.publish_date)
        } else {
            match output.search_dir.as_deref() {
                Some(dir) => self.storage.doc_dir_by_position(dir, position),
                None => return,
            }
        };

        match target_dir {
            Ok(dir) => {
                self.download_into(doc.doc_id, &dir).await;
            }
            Err(e) => warn!(doc_id = doc.doc_id, error = %e, "cannot create document directory"),
        }
    }

    async fn download_into(&self, doc_id: DocumentId, dir: &Path) {
        let outcome = self.downloader.download(doc_id, dir).await;
        debug!(doc_id, outcome = ?outcome, "hit processed");
    }
}
