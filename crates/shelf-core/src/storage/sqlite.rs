//! SQLite book store
//!
//! Persists the book collection in a single SQLite table.
//!
//! ## Behaviour
//!
//! - The database is opened lazily on first use, creating the file, its
//!   parent directory and the schema when they do not exist yet
//! - `replace_all` clears and re-inserts every book inside one transaction,
//!   so a failed insert leaves the previous collection untouched
//! - Blocking `rusqlite` calls run on tokio's blocking pool

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use rusqlite::{params, Connection, Row};
use tracing::debug;

use crate::config::Config;
use crate::models::{Book, BookId, Status, MAX_RATING};
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::schema::{init_schema, needs_init};
use crate::storage::BookStore;

/// SQLite-backed `BookStore`
#[derive(Clone)]
pub struct SqliteBookStore {
    /// `None` until the first operation opens the database
    conn: Arc<Mutex<Option<Connection>>>,
    /// `None` for in-memory databases
    path: Option<PathBuf>,
}

impl SqliteBookStore {
    /// Create a store for the database configured in `config`
    ///
    /// Nothing is opened until the first load or write.
    pub fn new(config: &Config) -> Self {
        Self::at_path(config.sqlite_path())
    }

    /// Create a store for a database file at `path`
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self {
            conn: Arc::new(Mutex::new(None)),
            path: Some(path.into()),
        }
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(Some(conn))),
            path: None,
        })
    }

    /// Path of the database file, if it lives on disk
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Number of stored books
    pub async fn count(&self) -> StorageResult<i64> {
        self.with_conn(|conn| {
            conn.query_row("SELECT COUNT(*) FROM books", [], |row| row.get(0))
                .map_err(Into::into)
        })
        .await
    }

    /// Run `f` against the connection on the blocking pool
    async fn with_conn<T, F>(&self, f: F) -> StorageResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> StorageResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|_| StorageError::Task("connection lock poisoned".to_string()))?;

            if guard.is_none() {
                let path = path.ok_or_else(|| StorageError::Task("no database path".to_string()))?;
                *guard = Some(connect(&path)?);
            }

            match guard.as_mut() {
                Some(conn) => f(conn),
                None => Err(StorageError::Task("database not open".to_string())),
            }
        })
        .await
        .map_err(|e| StorageError::Task(e.to_string()))?
    }
}

impl BookStore for SqliteBookStore {
    async fn load_all(&self) -> StorageResult<Vec<Book>> {
        let books = self.with_conn(|conn| select_books(conn)).await?;
        debug!(count = books.len(), "loaded books from sqlite");
        Ok(books)
    }

    async fn replace_all(&self, books: &[Book]) -> StorageResult<()> {
        let books = books.to_vec();
        let count = books.len();
        self.with_conn(move |conn| replace_books(conn, &books)).await?;
        debug!(count, "replaced books in sqlite");
        Ok(())
    }
}

/// Open the database file, creating directory and schema as needed
fn connect(path: &Path) -> StorageResult<Connection> {
    let unavailable = |details: String| StorageError::Unavailable {
        path: path.to_path_buf(),
        details,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| unavailable(e.to_string()))?;
        }
    }

    let conn = Connection::open(path).map_err(|e| unavailable(e.to_string()))?;

    if needs_init(&conn) {
        init_schema(&conn).map_err(|e| unavailable(format!("schema init failed: {}", e)))?;
    }

    debug!(?path, "opened book database");
    Ok(conn)
}

// ==================== Row mapping ====================

struct BookRow {
    id: i64,
    name: String,
    review: String,
    rating: i64,
    bookmark_page: Option<i64>,
    bookmark_line: Option<i64>,
    status: String,
}

impl BookRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            review: row.get(2)?,
            rating: row.get(3)?,
            bookmark_page: row.get(4)?,
            bookmark_line: row.get(5)?,
            status: row.get(6)?,
        })
    }

    fn into_book(self) -> StorageResult<Book> {
        let id = self.id;
        let invalid = |details: String| StorageError::InvalidRow { id, details };

        let rating = u8::try_from(self.rating)
            .ok()
            .filter(|r| *r <= MAX_RATING)
            .ok_or_else(|| invalid(format!("rating {} out of range", self.rating)))?;
        let status: Status = self.status.parse().map_err(|e| invalid(format!("{}", e)))?;
        let bookmark = |value: Option<i64>| value.and_then(|v| u32::try_from(v).ok());

        Ok(Book {
            id: BookId(id),
            name: self.name,
            review: self.review,
            rating,
            bookmark_page: bookmark(self.bookmark_page),
            bookmark_line: bookmark(self.bookmark_line),
            status,
        })
    }
}

fn select_books(conn: &Connection) -> StorageResult<Vec<Book>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT id, name, review, rating, bookmark_page, bookmark_line, status
        FROM books
        ORDER BY position, id
        "#,
    )?;

    let rows = stmt
        .query_map([], BookRow::from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter().map(BookRow::into_book).collect()
}

/// Clear the table and insert every book, all in one transaction
fn replace_books(conn: &mut Connection, books: &[Book]) -> StorageResult<()> {
    let tx = conn.transaction()?;

    tx.execute("DELETE FROM books", [])
        .map_err(|e| StorageError::Clear(e.to_string()))?;

    {
        let mut stmt = tx.prepare(
            r#"
            INSERT INTO books (id, position, name, review, rating, bookmark_page, bookmark_line, status)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )?;

        for (position, book) in books.iter().enumerate() {
            stmt.execute(params![
                book.id.get(),
                position as i64,
                book.name,
                book.review,
                book.rating,
                book.bookmark_page,
                book.bookmark_line,
                book.status.as_str(),
            ])
            .map_err(|e| StorageError::Write {
                id: book.id,
                name: book.name.clone(),
                details: e.to_string(),
            })?;
        }
    }

    // Dropping `tx` without commit rolls back, so errors above leave the old rows
    tx.commit()?;
    Ok(())
}
