//! Storage layer
//!
//! The book collection is persisted through the [`BookStore`] trait, which
//! only knows how to load everything and replace everything. Every mutation
//! is expressed as "recompute the full set, then `replace_all`".
//!
//! ## Implementations
//!
//! - [`SqliteBookStore`]: the on-disk store used by the application
//! - [`MemoryStore`]: a volatile store with failure injection

use std::future::Future;

use crate::models::Book;

pub mod error;
pub mod memory;
pub mod schema;
pub mod sqlite;

pub use error::{StorageError, StorageResult};
pub use memory::MemoryStore;
pub use schema::{init_schema, needs_init, SCHEMA_VERSION};
pub use sqlite::SqliteBookStore;

/// Persistence boundary for the book collection
pub trait BookStore: Send + Sync {
    /// Load every persisted book, in the order it was last written
    ///
    /// Initializes the underlying storage on first use. Fails with
    /// [`StorageError::Unavailable`] when the storage cannot be opened.
    fn load_all(&self) -> impl Future<Output = StorageResult<Vec<Book>>> + Send;

    /// Clear the collection and insert every given book
    ///
    /// Either all books are stored or an error is returned; a partial
    /// write is never reported as success.
    fn replace_all(&self, books: &[Book]) -> impl Future<Output = StorageResult<()>> + Send;
}
