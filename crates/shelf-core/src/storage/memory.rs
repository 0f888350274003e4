//! In-memory book store
//!
//! Holds the collection in a `Vec` and can be told to fail loads or writes,
//! which lets callers exercise their recovery paths.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::models::{Book, BookId};
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::BookStore;

/// Volatile `BookStore`
#[derive(Debug, Default)]
pub struct MemoryStore {
    books: Mutex<Vec<Book>>,
    fail_loads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds `books`
    pub fn with_books(books: Vec<Book>) -> Self {
        Self {
            books: Mutex::new(books),
            ..Self::default()
        }
    }

    /// Make subsequent loads fail with `StorageError::Unavailable`
    pub fn fail_loads(&self, fail: bool) {
        self.fail_loads.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent writes fail without touching the stored books
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Copy of the stored books
    pub fn snapshot(&self) -> Vec<Book> {
        self.books
            .lock()
            .map(|books| books.clone())
            .unwrap_or_default()
    }
}

impl BookStore for MemoryStore {
    async fn load_all(&self) -> StorageResult<Vec<Book>> {
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable {
                path: "memory".into(),
                details: "load failure injected".to_string(),
            });
        }

        let books = self
            .books
            .lock()
            .map_err(|_| StorageError::Task("memory store lock poisoned".to_string()))?;
        Ok(books.clone())
    }

    async fn replace_all(&self, books: &[Book]) -> StorageResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            let (id, name) = books
                .first()
                .map(|b| (b.id, b.name.clone()))
                .unwrap_or((BookId(0), String::new()));
            return Err(StorageError::Write {
                id,
                name,
                details: "write failure injected".to_string(),
            });
        }

        // Same all-or-nothing contract as the SQLite store
        let mut seen = std::collections::HashSet::new();
        if let Some(dup) = books.iter().find(|b| !seen.insert(b.id)) {
            return Err(StorageError::Write {
                id: dup.id,
                name: dup.name.clone(),
                details: "duplicate id".to_string(),
            });
        }

        let mut stored = self
            .books
            .lock()
            .map_err(|_| StorageError::Task("memory store lock poisoned".to_string()))?;
        *stored = books.to_vec();
        Ok(())
    }
}
