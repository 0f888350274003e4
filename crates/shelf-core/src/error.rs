//! Library error type
//!
//! Every error a [`Library`](crate::Library) operation can return. None of
//! them is fatal: the in-memory collection is always left consistent with
//! the store, possibly by reverting the failed change.

use thiserror::Error;

use crate::export::ExportError;
use crate::import::ImportError;
use crate::models::{BookId, ValidationError};
use crate::storage::StorageError;

#[derive(Debug, Error)]
pub enum LibraryError {
    /// Input was rejected; nothing changed
    #[error("Invalid book: {0}")]
    Validation(#[from] ValidationError),

    /// The import file could not be used; nothing changed
    #[error(transparent)]
    Import(#[from] ImportError),

    #[error(transparent)]
    Export(#[from] ExportError),

    /// Loading or persisting failed; the collection was reloaded from the store
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Book not found: {0}")]
    NotFound(BookId),
}

impl LibraryError {
    /// Whether this is the "nothing to export" warning rather than a failure
    pub fn is_empty_export(&self) -> bool {
        matches!(self, LibraryError::Export(ExportError::Empty))
    }
}

/// Result type for library operations
pub type LibraryResult<T> = Result<T, LibraryError>;
