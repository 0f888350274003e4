//! JSON export
//!
//! Exports are a pretty-printed JSON array of books, written to
//! `book-library-<YYYY-MM-DD>.json`. The same document can be imported
//! again without loss.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use thiserror::Error;
use tracing::info;

use crate::models::Book;
use crate::storage::StorageError;

/// Errors that can occur while exporting
#[derive(Debug, Error)]
pub enum ExportError {
    /// Nothing to export; callers usually show this as a warning
    #[error("No books to export")]
    Empty,

    #[error("Failed to serialize books: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Encode the collection as a pretty-printed JSON array
pub fn export_all(books: &[Book]) -> Result<String, ExportError> {
    if books.is_empty() {
        return Err(ExportError::Empty);
    }
    Ok(serde_json::to_string_pretty(books)?)
}

/// File name for an export made on `date`
pub fn export_file_name(date: NaiveDate) -> String {
    format!("book-library-{}.json", date.format("%Y-%m-%d"))
}

/// Write an export of `books` into `dir` and return the file path
pub fn write_export(books: &[Book], dir: &Path, date: NaiveDate) -> Result<PathBuf, ExportError> {
    let document = export_all(books)?;
    let path = dir.join(export_file_name(date));

    atomic_write(&path, document.as_bytes())?;
    info!(count = books.len(), ?path, "exported books");

    Ok(path)
}

/// Write data to a file atomically
///
/// 1. Write to a temporary file in the same directory
/// 2. Sync the file to disk
/// 3. Rename the temp file to the target path
fn atomic_write(path: &Path, data: &[u8]) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| StorageError::CreateDirectory {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let temp_path = path.with_extension("json.tmp");

    let mut file =
        File::create(&temp_path).map_err(|e| StorageError::from_io(e, temp_path.clone()))?;
    file.write_all(data)
        .map_err(|e| StorageError::from_io(e, temp_path.clone()))?;
    file.sync_all()
        .map_err(|e| StorageError::from_io(e, temp_path.clone()))?;

    fs::rename(&temp_path, path).map_err(|source| StorageError::AtomicWriteFailed {
        from: temp_path.clone(),
        to: path.to_path_buf(),
        source,
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::{import_merge, MergePolicy};
    use crate::models::{BookId, IdGenerator, Status};
    use tempfile::TempDir;

    fn sample_books() -> Vec<Book> {
        vec![
            Book {
                id: BookId(1_700_000_000_000),
                name: "Dune".to_string(),
                review: "Spice must flow".to_string(),
                rating: 5,
                bookmark_page: Some(412),
                bookmark_line: Some(3),
                status: Status::Completed,
            },
            Book {
                id: BookId(1_700_000_000_001),
                name: "Hyperion".to_string(),
                review: String::new(),
                rating: 0,
                bookmark_page: None,
                bookmark_line: None,
                status: Status::YetToStart,
            },
        ]
    }

    #[test]
    fn test_empty_export_is_rejected() {
        assert!(matches!(export_all(&[]), Err(ExportError::Empty)));
    }

    #[test]
    fn test_export_is_pretty_json_array() {
        let json = export_all(&sample_books()).unwrap();
        assert!(json.starts_with("[\n  {"));
        assert!(json.contains("\"bookmarkPage\": 412"));
        assert!(json.contains("\"bookmarkLine\": null"));
        assert!(json.contains("\"status\": \"yet-to-start\""));
    }

    #[test]
    fn test_export_round_trips_through_import() {
        let books = sample_books();
        let json = export_all(&books).unwrap();

        let result = import_merge(&[], &json, MergePolicy::Skip, &mut IdGenerator::new()).unwrap();
        assert_eq!(result.books, books);
        assert_eq!(result.added, 2);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_export_file_name() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(export_file_name(date), "book-library-2024-03-09.json");
    }

    #[test]
    fn test_write_export_creates_file() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("exports");
        let date = NaiveDate::from_ymd_opt(2025, 1, 31).unwrap();

        let path = write_export(&sample_books(), &dir, date).unwrap();
        assert_eq!(path, dir.join("book-library-2025-01-31.json"));

        let content = fs::read_to_string(&path).unwrap();
        let parsed: Vec<Book> = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed, sample_books());
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_write_export_of_nothing_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 1, 31).unwrap();

        let err = write_export(&[], temp_dir.path(), date).unwrap_err();
        assert!(matches!(err, ExportError::Empty));
        assert!(fs::read_dir(temp_dir.path()).unwrap().next().is_none());
    }
}
