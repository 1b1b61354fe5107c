//! `toc.csv` writer: one row per search hit in result order.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::StorageError;
use crate::DocumentId;

/// File name of the table of contents inside a search directory.
pub const TOC_FILE_NAME: &str = "toc.csv";

/// Header row of the table of contents.
pub const TOC_HEADER: [&str; 5] = ["position", "docid", "date", "court", "title"];

/// One table-of-contents row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocRow<'a> {
    /// 1-based global position across all pages.
    pub position: usize,
    /// Document id.
    pub doc_id: DocumentId,
    /// Publish date as sent by the upstream.
    pub date: &'a str,
    /// Court or source.
    pub court: &'a str,
    /// Title.
    pub title: &'a str,
}

/// Buffered CSV writer for `toc.csv`.
#[derive(Debug)]
pub struct TocWriter {
    path: PathBuf,
    inner: BufWriter<File>,
}

impl TocWriter {
    /// Creates (truncating) `path` and writes the header row.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the file cannot be created or written.
    pub fn create(path: &Path) -> Result<Self, StorageError> {
        let file = File::create(path).map_err(|e| StorageError::io(path, e))?;
        let mut writer = Self {
            path: path.to_path_buf(),
            inner: BufWriter::new(file),
        };
        writer.write_record(&TOC_HEADER)?;
        Ok(writer)
    }

    /// Returns the path of the table.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one row.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the write fails.
    pub fn write_row(&mut self, row: &TocRow<'_>) -> Result<(), StorageError> {
        let position = row.position.to_string();
        let doc_id = row.doc_id.to_string();
        self.write_record(&[position.as_str(), doc_id.as_str(), row.date, row.court, row.title])
    }

    /// Flushes buffered rows to disk.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the flush fails.
    pub fn flush(&mut self) -> Result<(), StorageError> {
        self.inner
            .flush()
            .map_err(|e| StorageError::io(&self.path, e))
    }

    fn write_record(&mut self, fields: &[&str]) -> Result<(), StorageError> {
        let line = fields
            .iter()
            .map(|field| escape_field(field))
            .collect::<Vec<_>>()
            .join(",");
        writeln!(self.inner, "{line}").map_err(|e| StorageError::io(&self.path, e))
    }
}

impl Drop for TocWriter {
    fn drop(&mut self) {
        let _ = self.inner.flush();
    }
}

/// Quotes a field when it contains a delimiter, quote or line break.
fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
