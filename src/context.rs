//! Run context wiring the call layer, storage and traversal components.
//!
//! A [`FetchContext`] is built explicitly from [`FetchSettings`] and a
//! [`Transport`]; nothing is process-global, so independent contexts can
//! coexist (tests build one per scenario against a scripted transport).

use std::sync::Arc;

use tokio::sync::watch;

use crate::api::{ApiClient, RetryingCaller, Transport};
use crate::citation::CitationExpander;
use crate::config::FetchSettings;
use crate::download::DocumentDownloader;
use crate::pool::WorkerPool;
use crate::query::QueryOptions;
use crate::search::SearchPaginator;
use crate::storage::{FileStorage, Storage};

/// Shared components for one invocation.
#[derive(Debug, Clone)]
pub struct FetchContext {
    client: Arc<ApiClient>,
    storage: Arc<FileStorage>,
    downloader: Arc<DocumentDownloader>,
    paginator: Arc<SearchPaginator>,
    query_options: QueryOptions,
    workers: usize,
    follow_links: bool,
}

impl FetchContext {
    /// Builds every component from `settings` on top of `transport`.
    #[must_use]
    pub fn new(settings: &FetchSettings, transport: Arc<dyn Transport>) -> Self {
        let caller = RetryingCaller::new(transport, settings.retry);
        let client = Arc::new(ApiClient::new(caller, settings.limits));
        let storage = Arc::new(FileStorage::new(settings.data_dir.clone()));
        let shared_storage: Arc<dyn Storage> = storage.clone();
        let downloader = Arc::new(DocumentDownloader::new(
            Arc::clone(&client),
            Arc::clone(&shared_storage),
            settings.want_original,
        ));
        let paginator = Arc::new(SearchPaginator::new(
            Arc::clone(&client),
            Arc::clone(&downloader),
            shared_storage,
            settings.search,
        ));

        Self {
            client,
            storage,
            downloader,
            paginator,
            query_options: settings.query_options.clone(),
            workers: settings.workers,
            follow_links: settings.follow_links,
        }
    }

    #[must_use]
    pub fn client(&self) -> &Arc<ApiClient> {
        &self.client
    }

    #[must_use]
    pub fn storage(&self) -> &Arc<FileStorage> {
        &self.storage
    }

    #[must_use]
    pub fn downloader(&self) -> &Arc<DocumentDownloader> {
        &self.downloader
    }

    #[must_use]
    pub fn paginator(&self) -> &Arc<SearchPaginator> {
        &self.paginator
    }

    /// Filters applied to every query built in this context.
    #[must_use]
    pub fn query_options(&self) -> &QueryOptions {
        &self.query_options
    }

    /// Creates a worker pool sized by the settings, optionally interruptible.
    #[must_use]
    pub fn worker_pool(&self, shutdown: Option<watch::Receiver<bool>>) -> WorkerPool {
        let pool = WorkerPool::new(Arc::clone(&self.paginator), self.workers);
        match shutdown {
            Some(signal) => pool.with_shutdown(signal),
            None => pool,
        }
    }

    /// Creates a citation expander using this context's filters.
    #[must_use]
    pub fn citation_expander(&self) -> CitationExpander {
        CitationExpander::new(
            Arc::clone(&self.client),
            Arc::clone(&self.paginator),
            self.query_options.clone(),
            self.follow_links,
        )
    }
}
