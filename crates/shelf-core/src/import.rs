//! JSON import and merge
//!
//! Importing happens in two steps so a front end can ask the user how to
//! resolve name collisions before anything changes:
//!
//! 1. [`parse_import`] validates every element of the incoming array and
//!    assigns ids to records that lack one
//! 2. [`ParsedImport::merge`] combines the valid records with the current
//!    collection under a [`MergePolicy`]
//!
//! A collision is an incoming record whose name matches (ignoring case) the
//! name of a record already in the collection. Incoming records are only
//! compared against the current collection, never against each other.

use std::collections::HashSet;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::models::{normalize, Book, BookId, IdGenerator, ValidationError};

/// How to resolve incoming records whose name already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePolicy {
    /// Overwrite the existing record, keeping its id
    Replace,
    /// Drop the incoming record
    Skip,
}

/// An element of the imported array that was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordError {
    pub index: usize,
    pub reason: ValidationError,
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Book at index {}: {}", self.index, self.reason)
    }
}

/// Errors that abort an import without changing anything
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Failed to parse JSON file: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("Invalid JSON format: expected array of books, found {found}")]
    Format { found: &'static str },

    #[error("No valid books found in the file ({} rejected)", .errors.len())]
    NoValidRecords { errors: Vec<RecordError> },

    #[error("Please select a valid JSON file: '{path}' does not end in .json")]
    NotJson { path: PathBuf },

    #[error("Failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Valid records from an import file plus the elements that were rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedImport {
    pub books: Vec<Book>,
    pub errors: Vec<RecordError>,
}

/// Outcome of merging an import into the collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeResult {
    /// The full collection after the merge
    pub books: Vec<Book>,
    /// Incoming records appended as new books
    pub added: usize,
    /// Existing books overwritten by incoming records
    pub replaced: usize,
    /// Colliding incoming records that were dropped
    pub skipped: usize,
    /// Elements rejected during validation
    pub errors: Vec<RecordError>,
}

/// Read an import file, refusing anything that is not a `.json` file
pub fn read_import_file(path: &Path) -> Result<String, ImportError> {
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if !is_json {
        return Err(ImportError::NotJson {
            path: path.to_path_buf(),
        });
    }

    std::fs::read_to_string(path).map_err(|source| ImportError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse and validate the text of an import file
///
/// Records without a usable id get `base + index`, where `base` is one
/// block reserved from `ids`, so ids within one batch never collide.
pub fn parse_import(raw: &str, ids: &mut IdGenerator) -> Result<ParsedImport, ImportError> {
    let value: Value = serde_json::from_str(raw).map_err(ImportError::Parse)?;
    let items = value.as_array().ok_or(ImportError::Format {
        found: json_type_name(&value),
    })?;

    let base = ids.reserve(items.len());
    let mut books = Vec::new();
    let mut errors = Vec::new();

    for (index, item) in items.iter().enumerate() {
        match normalize(item) {
            Ok(draft) => {
                let id = incoming_id(item)
                    .unwrap_or_else(|| BookId(base.get().saturating_add(index as i64)));
                ids.observe(id);
                books.push(draft.into_book(id));
            }
            Err(reason) => errors.push(RecordError { index, reason }),
        }
    }

    debug!(
        valid = books.len(),
        rejected = errors.len(),
        "parsed import payload"
    );

    if books.is_empty() {
        return Err(ImportError::NoValidRecords { errors });
    }

    Ok(ParsedImport { books, errors })
}

impl ParsedImport {
    /// Number of incoming records whose name is already in `current`
    pub fn conflicts(&self, current: &[Book]) -> usize {
        let existing = name_keys(current);
        self.books
            .iter()
            .filter(|book| existing.contains(&book.name_key()))
            .count()
    }

    /// Merge into `current` under `policy`
    ///
    /// The result is deduplicated by id, keeping the first occurrence, so an
    /// incoming record can never displace a different record with its id.
    pub fn merge(self, current: &[Book], policy: MergePolicy) -> MergeResult {
        let existing = name_keys(current);
        let mut merged = current.to_vec();
        let mut replaced = 0;
        let mut skipped = 0;

        for mut book in self.books {
            let key = book.name_key();
            if !existing.contains(&key) {
                merged.push(book);
                continue;
            }

            match policy {
                MergePolicy::Replace => {
                    if let Some(slot) = merged[..current.len()]
                        .iter_mut()
                        .find(|b| b.name_key() == key)
                    {
                        book.id = slot.id;
                        *slot = book;
                        replaced += 1;
                    }
                }
                MergePolicy::Skip => skipped += 1,
            }
        }

        let mut seen = HashSet::new();
        merged.retain(|book| seen.insert(book.id));

        MergeResult {
            added: merged.len().saturating_sub(current.len()),
            books: merged,
            replaced,
            skipped,
            errors: self.errors,
        }
    }
}

/// Parse `raw` and merge it into `current` in one step
pub fn import_merge(
    current: &[Book],
    raw: &str,
    policy: MergePolicy,
    ids: &mut IdGenerator,
) -> Result<MergeResult, ImportError> {
    Ok(parse_import(raw, ids)?.merge(current, policy))
}

fn name_keys(books: &[Book]) -> HashSet<String> {
    books.iter().map(Book::name_key).collect()
}

/// Keep an incoming id only when it is a positive integer
fn incoming_id(item: &Value) -> Option<BookId> {
    item.get("id")
        .and_then(Value::as_i64)
        .filter(|id| *id > 0)
        .map(BookId)
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
