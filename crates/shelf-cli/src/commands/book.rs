//! Book command handlers

use anyhow::{bail, Context, Result};
use serde_json::{json, Map, Value};

use shelf_core::{card, BookId, BookStore, Library, Status, Ui};

use crate::output::Output;

/// Book fields given on the command line
///
/// Fields left as `None` are not sent, so `edit` keeps their current value.
#[derive(Debug, Default)]
pub struct Fields {
    pub name: Option<String>,
    pub review: Option<String>,
    pub rating: Option<i64>,
    pub page: Option<i64>,
    pub line: Option<i64>,
    pub status: Option<Status>,
}

impl Fields {
    /// Overlay the given fields onto a raw book object
    fn apply(self, raw: &mut Map<String, Value>) {
        if let Some(name) = self.name {
            raw.insert("name".into(), json!(name));
        }
        if let Some(review) = self.review {
            raw.insert("review".into(), json!(review));
        }
        if let Some(rating) = self.rating {
            raw.insert("rating".into(), json!(rating));
        }
        if let Some(page) = self.page {
            raw.insert("bookmarkPage".into(), json!(page));
        }
        if let Some(line) = self.line {
            raw.insert("bookmarkLine".into(), json!(line));
        }
        if let Some(status) = self.status {
            raw.insert("status".into(), json!(status.as_str()));
        }
    }

    fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.review.is_none()
            && self.rating.is_none()
            && self.page.is_none()
            && self.line.is_none()
            && self.status.is_none()
    }
}

/// Add a new book
pub async fn add<S: BookStore, U: Ui>(
    library: &Library<S, U>,
    fields: Fields,
    output: &Output,
) -> Result<()> {
    let mut raw = Map::new();
    fields.apply(&mut raw);

    let book = library.add(&Value::Object(raw)).await?;

    if output.is_json() || output.is_quiet() {
        output.print_book(&card(&book));
    }
    Ok(())
}

/// List all books, optionally filtered by status
pub async fn list<S: BookStore, U: Ui>(
    library: &Library<S, U>,
    status: Option<Status>,
    output: &Output,
) -> Result<()> {
    let mut cards = library.cards().await;
    if let Some(status) = status {
        cards.retain(|c| c.status == status);
    }
    output.print_books(&cards);
    Ok(())
}

/// Show one book
pub async fn show<S: BookStore, U: Ui>(
    library: &Library<S, U>,
    id: &str,
    output: &Output,
) -> Result<()> {
    let id = parse_book_id(id)?;
    let book = library
        .get(id)
        .await
        .ok_or_else(|| anyhow::anyhow!("Book not found: {}", id))?;

    output.print_book(&card(&book));
    Ok(())
}

/// Change some fields of a book, keeping the rest
pub async fn edit<S: BookStore, U: Ui>(
    library: &Library<S, U>,
    id: &str,
    fields: Fields,
    output: &Output,
) -> Result<()> {
    let id = parse_book_id(id)?;
    if fields.is_empty() {
        bail!("Nothing to change. Pass at least one of --name, --review, --rating, --page, --line, --status.");
    }

    let Some(current) = library.get(id).await else {
        bail!("Book not found: {}", id);
    };

    let mut raw = match serde_json::to_value(&current).context("Failed to encode book")? {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    fields.apply(&mut raw);

    let book = library.update(id, &Value::Object(raw)).await?;

    if output.is_json() || output.is_quiet() {
        output.print_book(&card(&book));
    }
    Ok(())
}

/// Delete a book (asks for confirmation unless --yes)
pub async fn delete<S: BookStore, U: Ui>(
    library: &Library<S, U>,
    id: &str,
    output: &Output,
) -> Result<()> {
    let id = parse_book_id(id)?;

    if let Some(book) = library.get(id).await {
        if !output.is_json() && !output.is_quiet() {
            println!("Delete book: {} - {}", book.id, book.name);
        }
    }

    if !library.remove(id).await? {
        output.json(&json!({"status": "cancelled"}));
    } else if output.is_json() {
        output.success(&format!("Deleted book: {}", id));
    }

    Ok(())
}

fn parse_book_id(id: &str) -> Result<BookId> {
    id.parse::<BookId>()
        .with_context(|| format!("Invalid book ID '{}': expected a number", id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputFormat;
    use crate::terminal::TerminalUi;
    use shelf_core::MemoryStore;

    async fn quiet_library() -> (Library<MemoryStore, TerminalUi>, Output) {
        let ui = TerminalUi::new(OutputFormat::Quiet, true);
        let library = Library::open(MemoryStore::new(), ui).await;
        (library, Output::new(OutputFormat::Quiet))
    }

    #[test]
    fn test_fields_apply_uses_record_keys() {
        let fields = Fields {
            name: Some("Dune".to_string()),
            page: Some(12),
            status: Some(Status::Completed),
            ..Fields::default()
        };

        let mut raw = Map::new();
        fields.apply(&mut raw);
        assert_eq!(
            Value::Object(raw),
            json!({"name": "Dune", "bookmarkPage": 12, "status": "completed"})
        );
    }

    #[test]
    fn test_parse_book_id() {
        assert_eq!(parse_book_id("1700000000000").unwrap(), BookId(1_700_000_000_000));
        assert!(parse_book_id("abc").is_err());
    }

    #[tokio::test]
    async fn test_add_then_edit_keeps_other_fields() {
        let (library, output) = quiet_library().await;

        let fields = Fields {
            name: Some("Dune".to_string()),
            review: Some("Spice".to_string()),
            rating: Some(4),
            ..Fields::default()
        };
        add(&library, fields, &output).await.unwrap();
        let id = library.books().await[0].id;

        let fields = Fields {
            page: Some(100),
            ..Fields::default()
        };
        edit(&library, &id.to_string(), fields, &output)
            .await
            .unwrap();

        let book = library.get(id).await.unwrap();
        assert_eq!(book.review, "Spice");
        assert_eq!(book.rating, 4);
        assert_eq!(book.bookmark_page, Some(100));
    }

    #[tokio::test]
    async fn test_edit_page_zero_clears_bookmark() {
        let (library, output) = quiet_library().await;
        let fields = Fields {
            name: Some("Emma".to_string()),
            page: Some(5),
            ..Fields::default()
        };
        add(&library, fields, &output).await.unwrap();
        let id = library.books().await[0].id;

        let fields = Fields {
            page: Some(0),
            ..Fields::default()
        };
        edit(&library, &id.to_string(), fields, &output)
            .await
            .unwrap();
        assert_eq!(library.get(id).await.unwrap().bookmark_page, None);
    }

    #[tokio::test]
    async fn test_edit_without_fields_fails() {
        let (library, output) = quiet_library().await;
        assert!(edit(&library, "1", Fields::default(), &output).await.is_err());
    }

    #[tokio::test]
    async fn test_delete_with_assumed_yes() {
        let (library, output) = quiet_library().await;
        let fields = Fields {
            name: Some("Gone".to_string()),
            ..Fields::default()
        };
        add(&library, fields, &output).await.unwrap();
        let id = library.books().await[0].id;

        delete(&library, &id.to_string(), &output).await.unwrap();
        assert!(library.is_empty().await);
    }

    #[tokio::test]
    async fn test_delete_missing_is_library_error() {
        let (library, output) = quiet_library().await;
        let err = delete(&library, "42", &output).await.unwrap_err();
        assert!(err.downcast_ref::<shelf_core::LibraryError>().is_some());
    }
}
