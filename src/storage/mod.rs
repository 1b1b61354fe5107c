//! Storage collaborator: existence checks and save operations.
//!
//! Layout under the data directory:
//!
//! ```text
//! <dir>/<docid>.json              raw document detail
//! <dir>/<docid>_original.<ext>    decoded original court copy
//! <search dir>/toc.csv            position,docid,date,court,title
//! ```
//!
//! where `<dir>` is either `<data>/<source>/<year>/<YYYY-MM-DD>` (path by
//! source) or `<data>/<query>/<position>` (path by result position).

mod error;
mod file;
mod toc;

use std::path::{Path, PathBuf};

pub use error::StorageError;
pub use file::FileStorage;
pub use toc::{TOC_FILE_NAME, TOC_HEADER, TocRow, TocWriter};

use crate::DocumentId;

/// Persistence operations consumed by downloads and searches.
///
/// Implementations are shared across worker tasks.
pub trait Storage: Send + Sync {
    /// Returns true if `path` exists.
    fn exists(&self, path: &Path) -> bool;

    /// Returns true if any file in the prefix's directory starts with the
    /// prefix file name (the original's extension is unknown ahead of time).
    fn exists_original(&self, prefix: &Path) -> bool;

    /// Reads a stored JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the file cannot be read.
    fn read_json(&self, path: &Path) -> Result<String, StorageError>;

    /// Persists a raw response body verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the write fails.
    fn save_json(&self, body: &str, path: &Path) -> Result<(), StorageError>;

    /// Persists decoded original bytes.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the write fails.
    fn save_original(&self, bytes: &[u8], path: &Path) -> Result<(), StorageError>;

    /// Directory for one search query (created).
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the directory cannot be created.
    fn search_dir(&self, query: &str) -> Result<PathBuf, StorageError>;

    /// Directory `<source>/<year>/<YYYY-MM-DD>` for a hit (created).
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidDate`] for an unreadable publish date,
    /// or [`StorageError::Io`] if the directory cannot be created.
    fn doc_dir_by_source(&self, source: &str, publish_date: &str) -> Result<PathBuf, StorageError>;

    /// Directory `<search dir>/<position>` for a hit (created).
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the directory cannot be created.
    fn doc_dir_by_position(&self, search_dir: &Path, position: usize) -> Result<PathBuf, StorageError>;

    /// Path of a persisted fragment search result.
    fn fragment_path(&self, doc_id: DocumentId, query: &str) -> PathBuf;

    /// Opens (truncating) the `toc.csv` of a search directory and writes the header.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the file cannot be created.
    fn toc_writer(&self, search_dir: &Path) -> Result<TocWriter, StorageError>;
}

/// Returns `(<dir>/<id>.json, <dir>/<id>_original)`.
#[must_use]
pub fn detail_paths(dir: &Path, doc_id: DocumentId) -> (PathBuf, PathBuf) {
    (
        dir.join(format!("{doc_id}.json")),
        dir.join(format!("{doc_id}_original")),
    )
}
