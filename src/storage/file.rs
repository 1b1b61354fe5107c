//! File-system backed [`Storage`] rooted at the data directory.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::{Storage, StorageError, TOC_FILE_NAME, TocWriter};
use crate::DocumentId;

#[allow(clippy::expect_used)]
static DIGIT_GROUPS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("digit group regex is valid"));

/// Stores documents as files under a data directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    data_dir: PathBuf,
}

impl FileStorage {
    /// Creates a storage rooted at `data_dir`. The directory is not created here.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Returns the data directory.
    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

fn ensure_dir(path: &Path) -> Result<(), StorageError> {
    if !path.is_dir() {
        fs::create_dir_all(path).map_err(|e| StorageError::io(path, e))?;
        debug!(path = %path.display(), "created directory");
    }
    Ok(())
}

/// Reads year, month and day from the first three digit groups of a date.
fn date_parts(publish_date: &str) -> Result<(u32, u32, u32), StorageError> {
    let groups: Vec<u32> = DIGIT_GROUPS
        .find_iter(publish_date)
        .take(3)
        .filter_map(|m| m.as_str().parse().ok())
        .collect();

    match groups.as_slice() {
        [year, month, day] if (1..=12).contains(month) && (1..=31).contains(day) => {
            Ok((*year, *month, *day))
        }
        _ => Err(StorageError::invalid_date(publish_date)),
    }
}

/// Maps query text onto a single path component inside the data directory.
fn query_dir_name(query: &str) -> String {
    match query {
        "" | "." | ".." => "_".to_string(),
        _ => query.replace(['/', '\\'], "_"),
    }
}

impl Storage for FileStorage {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn exists_original(&self, prefix: &Path) -> bool {
        let (Some(dir), Some(stem)) = (prefix.parent(), prefix.file_name()) else {
            return false;
        };
        let stem = stem.to_string_lossy();
        let Ok(entries) = fs::read_dir(dir) else {
            return false;
        };
        entries
            .filter_map(Result::ok)
            .any(|entry| entry.file_name().to_string_lossy().starts_with(stem.as_ref()))
    }

    fn read_json(&self, path: &Path) -> Result<String, StorageError> {
        fs::read_to_string(path).map_err(|e| StorageError::io(path, e))
    }

    fn save_json(&self, body: &str, path: &Path) -> Result<(), StorageError> {
        fs::write(path, body).map_err(|e| StorageError::io(path, e))
    }

    fn save_original(&self, bytes: &[u8], path: &Path) -> Result<(), StorageError> {
        fs::write(path, bytes).map_err(|e| StorageError::io(path, e))
    }

    fn search_dir(&self, query: &str) -> Result<PathBuf, StorageError> {
        let dir = self.data_dir.join(query_dir_name(query));
        ensure_dir(&dir)?;
        Ok(dir)
    }

    fn doc_dir_by_source(&self, source: &str, publish_date: &str) -> Result<PathBuf, StorageError> {
        let (year, month, day) = date_parts(publish_date)?;
        let dir = self
            .data_dir
            .join(query_dir_name(source))
            .join(year.to_string())
            .join(format!("{year:04}-{month:02}-{day:02}"));
        ensure_dir(&dir)?;
        Ok(dir)
    }

    fn doc_dir_by_position(&self, search_dir: &Path, position: usize) -> Result<PathBuf, StorageError> {
        let dir = search_dir.join(position.to_string());
        ensure_dir(&dir)?;
        Ok(dir)
    }

    fn fragment_path(&self, doc_id: DocumentId, query: &str) -> PathBuf {
        self.data_dir
            .join(format!("{doc_id} q: {}.json", query_dir_name(query)))
    }

    fn toc_writer(&self, search_dir: &Path) -> Result<TocWriter, StorageError> {
        ensure_dir(search_dir)?;
        TocWriter::create(&search_dir.join(TOC_FILE_NAME))
    }
}
