//! Application state
//!
//! The [`Library`] owns the authoritative in-memory collection and is the
//! only way to change it. Every mutation follows the same pattern:
//!
//! 1. Take the state lock (mutations run one at a time, in call order)
//! 2. Compute the new collection in memory
//! 3. Persist it with `BookStore::replace_all`
//! 4. On a storage error, reload from the store so memory matches what was
//!    actually persisted, then report the failure
//!
//! ## Usage
//!
//! ```ignore
//! let library = Library::open(SqliteBookStore::new(&config), ui).await;
//!
//! let book = library.add(&json!({"name": "Dune", "rating": 5})).await?;
//! library.remove(book.id).await?;
//! ```

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{LibraryError, LibraryResult};
use crate::export::{export_all, write_export};
use crate::import::{parse_import, MergePolicy, ParsedImport, RecordError};
use crate::models::{normalize, Book, BookId, IdGenerator};
use crate::storage::BookStore;
use crate::ui::{Severity, Ui};
use crate::view::{cards, BookCard};

/// Prompt shown before a book is deleted
pub const DELETE_PROMPT: &str = "Are you sure you want to delete this book?";

struct State {
    books: Vec<Book>,
    ids: IdGenerator,
}

/// Summary of a completed import
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOutcome {
    pub policy: MergePolicy,
    pub added: usize,
    pub replaced: usize,
    pub skipped: usize,
    pub errors: Vec<RecordError>,
}

impl ImportOutcome {
    /// Human-readable one-line summary
    pub fn summary(&self) -> String {
        if self.replaced == 0 && self.skipped == 0 && self.errors.is_empty() {
            return format!("Successfully imported {} book(s)", self.added);
        }

        let mut message = format!("Imported {} book(s)", self.added + self.replaced);
        if self.replaced > 0 {
            message.push_str(&format!(", replaced {} existing", self.replaced));
        }
        if self.skipped > 0 {
            message.push_str(&format!(", skipped {} existing", self.skipped));
        }
        if !self.errors.is_empty() {
            message.push_str(&format!(", {} error(s)", self.errors.len()));
        }
        message
    }
}

/// The book collection and its persistence
pub struct Library<S, U> {
    store: S,
    ui: U,
    state: Mutex<State>,
}

impl<S: BookStore, U: Ui> Library<S, U> {
    /// Load the collection from `store`
    ///
    /// If the store cannot be read, the user is notified once and the
    /// library starts empty so the front end stays usable.
    pub async fn open(store: S, ui: U) -> Self {
        let books = match store.load_all().await {
            Ok(books) => books,
            Err(e) => {
                warn!(error = %e, "failed to load books, starting with an empty library");
                ui.notify("Failed to load books from database", Severity::Error);
                Vec::new()
            }
        };

        debug!(count = books.len(), "library opened");
        let ids = IdGenerator::seeded(&books);

        Self {
            store,
            ui,
            state: Mutex::new(State { books, ids }),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn ui(&self) -> &U {
        &self.ui
    }

    // ==================== Queries ====================

    /// Copy of the current collection
    pub async fn books(&self) -> Vec<Book> {
        self.state.lock().await.books.clone()
    }

    /// Look up a book by id
    pub async fn get(&self, id: BookId) -> Option<Book> {
        self.state
            .lock()
            .await
            .books
            .iter()
            .find(|b| b.id == id)
            .cloned()
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.books.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Card view models for the whole collection
    pub async fn cards(&self) -> Vec<BookCard> {
        cards(&self.state.lock().await.books)
    }

    // ==================== Mutations ====================

    /// Validate `raw`, give it a fresh id and append it
    pub async fn add(&self, raw: &Value) -> LibraryResult<Book> {
        let draft = normalize(raw).map_err(|e| self.rejected(e.into()))?;

        let mut state = self.state.lock().await;
        let book = draft.into_book(state.ids.next());
        let snapshot = state.books.clone();
        state.books.push(book.clone());
        self.persist(&mut state, snapshot).await?;

        info!(id = %book.id, "added book");
        self.ui
            .notify(&format!("Added \"{}\"", book.name), Severity::Success);
        Ok(book)
    }

    /// Replace the fields of the book with `id`, keeping its id and position
    pub async fn update(&self, id: BookId, raw: &Value) -> LibraryResult<Book> {
        let draft = normalize(raw).map_err(|e| self.rejected(e.into()))?;

        let mut state = self.state.lock().await;
        let Some(pos) = state.books.iter().position(|b| b.id == id) else {
            return Err(self.not_found(id));
        };

        let book = draft.into_book(id);
        let snapshot = state.books.clone();
        state.books[pos] = book.clone();
        self.persist(&mut state, snapshot).await?;

        info!(%id, "updated book");
        self.ui
            .notify(&format!("Updated \"{}\"", book.name), Severity::Success);
        Ok(book)
    }

    /// Delete the book with `id` after the user confirms
    ///
    /// The prompt runs before the state lock is taken, so other operations
    /// are not held up while the user answers. Returns `Ok(false)` when the
    /// user declines.
    pub async fn remove(&self, id: BookId) -> LibraryResult<bool> {
        if self.get(id).await.is_none() {
            return Err(self.not_found(id));
        }

        if !self.ui.confirm(DELETE_PROMPT) {
            debug!(%id, "delete cancelled");
            self.ui.notify("Delete cancelled", Severity::Info);
            return Ok(false);
        }

        let mut state = self.state.lock().await;
        // Another operation may have removed it while the prompt was open
        let Some(pos) = state.books.iter().position(|b| b.id == id) else {
            return Err(self.not_found(id));
        };

        let snapshot = state.books.clone();
        let removed = state.books.remove(pos);
        self.persist(&mut state, snapshot).await?;

        info!(%id, "deleted book");
        self.ui
            .notify(&format!("Deleted \"{}\"", removed.name), Severity::Success);
        Ok(true)
    }

    /// Import a JSON document, asking the user how to resolve collisions
    ///
    /// When incoming names collide with existing books the user is asked
    /// whether to replace them; declining keeps the existing books. The
    /// question is asked while the state lock is held, so the collisions
    /// the user answers for are the ones that get merged.
    pub async fn import(&self, raw: &str) -> LibraryResult<ImportOutcome> {
        let mut state = self.state.lock().await;
        let parsed = self.parse(raw, &mut state)?;

        let conflicts = parsed.conflicts(&state.books);
        let policy = if conflicts > 0
            && self.ui.confirm(&format!(
                "{} book(s) already exist by name. Do you want to replace them?",
                conflicts
            )) {
            MergePolicy::Replace
        } else {
            MergePolicy::Skip
        };

        self.apply_import(&mut state, parsed, policy).await
    }

    /// Import a JSON document with a fixed collision policy
    pub async fn import_with_policy(
        &self,
        raw: &str,
        policy: MergePolicy,
    ) -> LibraryResult<ImportOutcome> {
        let mut state = self.state.lock().await;
        let parsed = self.parse(raw, &mut state)?;
        self.apply_import(&mut state, parsed, policy).await
    }

    /// Replace the in-memory collection with what the store holds
    pub async fn reload(&self) -> LibraryResult<()> {
        let mut state = self.state.lock().await;
        match self.store.load_all().await {
            Ok(books) => {
                adopt(&mut state, books);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "reload failed");
                self.ui
                    .notify("Failed to load books from database", Severity::Error);
                Err(e.into())
            }
        }
    }

    // ==================== Export ====================

    /// Encode the collection as pretty-printed JSON
    pub async fn export(&self) -> LibraryResult<String> {
        let books = self.books().await;
        export_all(&books).map_err(|e| self.export_failed(e.into()))
    }

    /// Write an export file for `date` into `dir`
    pub async fn export_to(&self, dir: &Path, date: NaiveDate) -> LibraryResult<PathBuf> {
        let books = self.books().await;
        let path = write_export(&books, dir, date).map_err(|e| self.export_failed(e.into()))?;

        self.ui.notify(
            &format!("Exported {} book(s) successfully", books.len()),
            Severity::Success,
        );
        Ok(path)
    }

    // ==================== Private helpers ====================

    fn parse(&self, raw: &str, state: &mut State) -> LibraryResult<ParsedImport> {
        parse_import(raw, &mut state.ids).map_err(|e| {
            warn!(error = %e, "import rejected");
            self.ui.notify(&e.to_string(), Severity::Error);
            LibraryError::from(e)
        })
    }

    async fn apply_import(
        &self,
        state: &mut State,
        parsed: ParsedImport,
        policy: MergePolicy,
    ) -> LibraryResult<ImportOutcome> {
        let result = parsed.merge(&state.books, policy);
        let snapshot = std::mem::replace(&mut state.books, result.books);
        self.persist(state, snapshot).await?;

        let outcome = ImportOutcome {
            policy,
            added: result.added,
            replaced: result.replaced,
            skipped: result.skipped,
            errors: result.errors,
        };

        for error in &outcome.errors {
            warn!("import: {}", error);
        }
        info!(
            added = outcome.added,
            replaced = outcome.replaced,
            skipped = outcome.skipped,
            rejected = outcome.errors.len(),
            "import finished"
        );

        let severity = if outcome.errors.is_empty() {
            Severity::Success
        } else {
            Severity::Warning
        };
        self.ui.notify(&outcome.summary(), severity);
        Ok(outcome)
    }

    /// Persist the collection, reloading from the store if that fails
    ///
    /// `snapshot` is the collection before the mutation; it is restored only
    /// if the reload fails as well.
    async fn persist(&self, state: &mut State, snapshot: Vec<Book>) -> LibraryResult<()> {
        let err = match self.store.replace_all(&state.books).await {
            Ok(()) => return Ok(()),
            Err(e) => e,
        };

        warn!(
            error = %err,
            recoverable = err.is_recoverable(),
            "failed to persist books, reloading from store"
        );
        match self.store.load_all().await {
            Ok(books) => adopt(state, books),
            Err(reload_err) => {
                warn!(error = %reload_err, "reload after failed write also failed");
                state.books = snapshot;
            }
        }

        self.ui
            .notify(&format!("Failed to save books: {}", err), Severity::Error);
        Err(err.into())
    }

    fn rejected(&self, err: LibraryError) -> LibraryError {
        self.ui.notify(&err.to_string(), Severity::Error);
        err
    }

    fn not_found(&self, id: BookId) -> LibraryError {
        let err = LibraryError::NotFound(id);
        self.ui.notify(&err.to_string(), Severity::Warning);
        err
    }

    fn export_failed(&self, err: LibraryError) -> LibraryError {
        if err.is_empty_export() {
            self.ui.notify("No books to export", Severity::Warning);
        } else {
            warn!(error = %err, "export failed");
            self.ui
                .notify(&format!("Failed to export books: {}", err), Severity::Error);
        }
        err
    }
}

fn adopt(state: &mut State, books: Vec<Book>) {
    for book in &books {
        state.ids.observe(book.id);
    }
    state.books = books;
}
