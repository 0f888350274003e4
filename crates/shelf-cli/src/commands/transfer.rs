//! Import and export command handlers

use std::path::Path;

use anyhow::Result;
use chrono::Local;

use shelf_core::{
    read_import_file, BookStore, ImportOutcome, Library, LibraryError, MergePolicy, Severity, Ui,
};

use crate::output::Output;
use crate::OnConflict;

/// Write every book to `book-library-<date>.json` in `dir`
pub async fn export<S: BookStore, U: Ui>(
    library: &Library<S, U>,
    dir: &Path,
    output: &Output,
) -> Result<()> {
    let path = library.export_to(dir, Local::now().date_naive()).await?;

    if output.is_json() {
        output.json(&serde_json::json!({
            "path": path,
            "count": library.len().await,
        }));
    } else if output.is_quiet() {
        println!("{}", path.display());
    } else {
        println!("  {}", path.display());
    }
    Ok(())
}

/// Import books from a JSON export
pub async fn import<S: BookStore, U: Ui>(
    library: &Library<S, U>,
    file: &Path,
    on_conflict: OnConflict,
    output: &Output,
) -> Result<()> {
    let raw = match read_import_file(file) {
        Ok(raw) => raw,
        Err(e) => {
            library.ui().notify(&e.to_string(), Severity::Error);
            return Err(LibraryError::from(e).into());
        }
    };

    let outcome = match on_conflict {
        OnConflict::Ask => library.import(&raw).await?,
        OnConflict::Replace => library.import_with_policy(&raw, MergePolicy::Replace).await?,
        OnConflict::Skip => library.import_with_policy(&raw, MergePolicy::Skip).await?,
    };

    print_outcome(&outcome, output);
    Ok(())
}

fn print_outcome(outcome: &ImportOutcome, output: &Output) {
    if output.is_json() {
        let errors: Vec<String> = outcome.errors.iter().map(|e| e.to_string()).collect();
        output.json(&serde_json::json!({
            "policy": policy_name(outcome.policy),
            "added": outcome.added,
            "replaced": outcome.replaced,
            "skipped": outcome.skipped,
            "errors": errors,
        }));
    } else if !output.is_quiet() {
        for error in &outcome.errors {
            eprintln!("  {}", error);
        }
    }
}

fn policy_name(policy: MergePolicy) -> &'static str {
    match policy {
        MergePolicy::Replace => "replace",
        MergePolicy::Skip => "skip",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputFormat;
    use crate::terminal::TerminalUi;
    use shelf_core::{Book, BookId, MemoryStore, Status};
    use tempfile::TempDir;

    fn book(id: i64, name: &str) -> Book {
        Book {
            id: BookId(id),
            name: name.to_string(),
            review: String::new(),
            rating: 0,
            bookmark_page: None,
            bookmark_line: None,
            status: Status::YetToStart,
        }
    }

    async fn library_with(books: Vec<Book>) -> Library<MemoryStore, TerminalUi> {
        let ui = TerminalUi::new(OutputFormat::Quiet, false);
        Library::open(MemoryStore::with_books(books), ui).await
    }

    #[tokio::test]
    async fn test_export_then_import_into_empty_library() {
        let temp_dir = TempDir::new().unwrap();
        let output = Output::new(OutputFormat::Quiet);
        let source = library_with(vec![book(1, "Dune"), book(2, "Emma")]).await;

        export(&source, temp_dir.path(), &output).await.unwrap();
        let file = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .next()
            .unwrap()
            .unwrap()
            .path();

        let target = library_with(vec![]).await;
        import(&target, &file, OnConflict::Ask, &output)
            .await
            .unwrap();
        assert_eq!(target.books().await, source.books().await);
    }

    #[tokio::test]
    async fn test_ask_without_terminal_keeps_existing() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("books.json");
        std::fs::write(&file, r#"[{"name":"dune","rating":5}]"#).unwrap();

        let library = library_with(vec![book(1, "Dune")]).await;
        let output = Output::new(OutputFormat::Quiet);
        import(&library, &file, OnConflict::Ask, &output)
            .await
            .unwrap();

        assert_eq!(library.books().await, vec![book(1, "Dune")]);
    }

    #[tokio::test]
    async fn test_replace_policy_overwrites() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("books.json");
        std::fs::write(&file, r#"[{"name":"Dune","rating":5}]"#).unwrap();

        let library = library_with(vec![book(1, "Dune")]).await;
        let output = Output::new(OutputFormat::Quiet);
        import(&library, &file, OnConflict::Replace, &output)
            .await
            .unwrap();

        let books = library.books().await;
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].id, BookId(1));
        assert_eq!(books[0].rating, 5);
    }

    #[tokio::test]
    async fn test_non_json_file_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("books.csv");
        std::fs::write(&file, "name\nDune\n").unwrap();

        let library = library_with(vec![]).await;
        let output = Output::new(OutputFormat::Quiet);
        let err = import(&library, &file, OnConflict::Skip, &output)
            .await
            .unwrap_err();
        assert!(err.downcast_ref::<LibraryError>().is_some());
        assert!(library.is_empty().await);
    }

    #[tokio::test]
    async fn test_export_empty_library_fails() {
        let temp_dir = TempDir::new().unwrap();
        let library = library_with(vec![]).await;
        let output = Output::new(OutputFormat::Quiet);

        let err = export(&library, temp_dir.path(), &output)
            .await
            .unwrap_err();
        let err = err.downcast_ref::<LibraryError>().unwrap();
        assert!(err.is_empty_export());
    }
}
