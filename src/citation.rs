//! One-level citation graph expansion.
//!
//! Level 0 runs a `citedby:<seed>` search. Level 1, when enabled, reads the
//! seed's own detail, extracts the documents it links to and runs a
//! `citedby:` search for each linked id not yet in the frontier. Every seed
//! gets its own [`CitationFrontier`]; nothing is shared between seeds.

use std::collections::HashSet;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use scraper::{Html, Selector};
use tracing::{debug, info, instrument, warn};

use crate::DocumentId;
use crate::api::{ApiClient, DocumentDetail, doc_endpoint};
use crate::query::QueryOptions;
use crate::search::SearchPaginator;

/// Prefix an anchor's `href` must carry to count as a document link.
const DOC_LINK_PREFIX: &str = "/doc/";

#[allow(clippy::expect_used)]
static ANCHOR_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("anchor selector is valid"));

#[allow(clippy::expect_used)]
static DOC_LINK_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/doc/(\d+)/").expect("doc link regex is valid"));

/// Document ids already scheduled or visited during one expansion.
///
/// The set only grows: there is no way to remove an id once inserted.
#[derive(Debug, Clone, Default)]
pub struct CitationFrontier {
    visited: HashSet<DocumentId>,
}

impl CitationFrontier {
    /// Creates an empty frontier.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `doc_id` visited; returns `false` if it already was.
    pub fn insert(&mut self, doc_id: DocumentId) -> bool {
        self.visited.insert(doc_id)
    }

    #[must_use]
    pub fn contains(&self, doc_id: DocumentId) -> bool {
        self.visited.contains(&doc_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.visited.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.visited.is_empty()
    }

    /// Iterates over the visited ids in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = DocumentId> + '_ {
        self.visited.iter().copied()
    }
}

/// Extracts linked document ids from detail markup, de-duplicated in document order.
///
/// Only anchors whose `href` starts with `/doc/` are considered.
///
/// ```
/// use ikfetch_core::extract_doc_links;
///
/// let html = r#"<p><a href="/doc/12/">A</a> <a href="/search/?q=x">B</a> <a href="/doc/12/">C</a></p>"#;
/// assert_eq!(extract_doc_links(html), vec![12]);
/// ```
#[must_use]
pub fn extract_doc_links(html: &str) -> Vec<DocumentId> {
    let fragment = Html::parse_fragment(html);
    let mut seen = HashSet::new();
    fragment
        .select(&ANCHOR_SELECTOR)
        .filter_map(|anchor| anchor.value().attr("href"))
        .filter(|href| href.starts_with(DOC_LINK_PREFIX))
        .filter_map(|href| DOC_LINK_PATTERN.captures(href))
        .filter_map(|caps| caps.get(1).and_then(|m| m.as_str().parse().ok()))
        .filter(|doc_id| seen.insert(*doc_id))
        .collect()
}

/// Result of expanding one seed.
#[derive(Debug, Clone)]
pub struct ExpansionReport {
    /// The seed document.
    pub seed: DocumentId,
    /// Unique ids citing the seed (and, at level 1, its linked documents).
    pub doc_ids: HashSet<DocumentId>,
    /// Ids whose `citedby:` search was run, seed included.
    pub frontier: CitationFrontier,
    /// Number of `citedby:` searches issued.
    pub citedby_queries: usize,
}

/// Runs citedby searches around a seed document.
#[derive(Debug)]
pub struct CitationExpander {
    client: Arc<ApiClient>,
    paginator: Arc<SearchPaginator>,
    query_options: QueryOptions,
    follow_links: bool,
}

impl CitationExpander {
    /// Creates an expander; `follow_links` enables the extra level.
    #[must_use]
    pub fn new(
        client: Arc<ApiClient>,
        paginator: Arc<SearchPaginator>,
        query_options: QueryOptions,
        follow_links: bool,
    ) -> Self {
        Self {
            client,
            paginator,
            query_options,
            follow_links,
        }
    }

    /// Returns whether the extra level is followed.
    #[must_use]
    pub fn follow_links(&self) -> bool {
        self.follow_links
    }

    /// Expands `seed` by one level with a fresh frontier.
    ///
    /// A failure while reading the seed's own detail ends the expansion with
    /// the level-0 results.
    #[instrument(skip(self))]
    pub async fn expand_one_level(&self, seed: DocumentId) -> ExpansionReport {
        let mut frontier = CitationFrontier::new();
        frontier.insert(seed);

        let mut report = ExpansionReport {
            seed,
            doc_ids: self.cited_by(seed).await,
            frontier: CitationFrontier::new(),
            citedby_queries: 1,
        };

        if self.follow_links {
            for linked in self.linked_documents(seed).await {
                if !frontier.insert(linked) {
                    debug!(linked, "already visited, skipping");
                    continue;
                }
                info!(seed, linked, "Processing citedby for linked document");
                report.doc_ids.extend(self.cited_by(linked).await);
                report.citedby_queries += 1;
            }
        }

        report.frontier = frontier;
        report
    }

    async fn cited_by(&self, doc_id: DocumentId) -> HashSet<DocumentId> {
        let query = self.query_options.cited_by(doc_id);
        self.paginator.run(&query).await.doc_ids
    }

    /// Reads the seed detail and returns the documents its content links to.
    async fn linked_documents(&self, seed: DocumentId) -> Vec<DocumentId> {
        let endpoint = doc_endpoint(seed, self.client.limits());
        let body = match self.client.fetch_doc(seed).await {
            Ok(body) => body,
            Err(e) => {
                warn!(seed, error = %e, "cannot fetch seed document, skipping extra level");
                return Vec::new();
            }
        };
        let detail = match DocumentDetail::parse_accepted(&endpoint, &body) {
            Ok(detail) => detail,
            Err(e) => {
                warn!(seed, kind = %e.kind(), error = %e, "seed document unusable, skipping extra level");
                return Vec::new();
            }
        };

        let links = detail
            .content
            .as_deref()
            .map(extract_doc_links)
            .unwrap_or_default();
        debug!(seed, links = links.len(), "extracted document links");
        links
    }
}
