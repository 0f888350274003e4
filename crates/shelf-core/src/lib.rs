//! Shelf Core Library
//!
//! This crate provides the core functionality for Shelf, a single-user
//! personal book tracker: a list of books with a review, a 0-5 star rating,
//! an optional page/line bookmark and a reading status.
//!
//! # Architecture
//!
//! - **Library**: authoritative in-memory collection, mutated one operation
//!   at a time and persisted after every change
//! - **BookStore**: persistence seam, SQLite on disk or in-memory for tests
//!
//! # Quick Start
//!
//! ```text
//! let config = Config::load()?;
//! let library = Library::open(SqliteBookStore::new(&config), ui).await;
//!
//! // Add a book
//! let book = library.add(&json!({"name": "Dune", "rating": 5})).await?;
//!
//! // Back up and restore
//! let json = library.export().await?;
//! library.import_with_policy(&json, MergePolicy::Skip).await?;
//! ```
//!
//! # Modules
//!
//! - `library`: Application state (main entry point)
//! - `models`: Book record, status and input normalization
//! - `import`: JSON import and collision merge
//! - `export`: JSON export
//! - `storage`: SQLite and in-memory stores
//! - `view`: Card view models for front ends
//! - `ui`: Notification and confirmation seam
//! - `config`: Application configuration

pub mod config;
pub mod error;
pub mod export;
pub mod import;
pub mod library;
pub mod models;
pub mod storage;
pub mod ui;
pub mod view;

pub use config::Config;
pub use error::{LibraryError, LibraryResult};
pub use export::{export_all, export_file_name, write_export, ExportError};
pub use import::{
    import_merge, parse_import, read_import_file, ImportError, MergePolicy, MergeResult,
    ParsedImport, RecordError,
};
pub use library::{ImportOutcome, Library, DELETE_PROMPT};
pub use models::{normalize, Book, BookDraft, BookId, IdGenerator, Status, ValidationError};
pub use storage::{BookStore, MemoryStore, SqliteBookStore, StorageError, StorageResult};
pub use ui::{Severity, Ui};
pub use view::{card, cards, BookCard};
