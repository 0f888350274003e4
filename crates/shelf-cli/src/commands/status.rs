//! Status command handler

use anyhow::Result;

use shelf_core::{Book, Config, Library, SqliteBookStore, Status, Ui};

use crate::output::{Output, OutputFormat};

/// Number of books per status, in display order
fn counts_by_status(books: &[Book]) -> Vec<(Status, usize)> {
    Status::ALL
        .into_iter()
        .map(|status| (status, books.iter().filter(|b| b.status == status).count()))
        .collect()
}

/// Human-readable byte size
fn human_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

/// Show status information
pub async fn show<U: Ui>(
    library: &Library<SqliteBookStore, U>,
    config: &Config,
    output: &Output,
) -> Result<()> {
    let books = library.books().await;
    let counts = counts_by_status(&books);
    let db_path = config.sqlite_path();
    let db_size = std::fs::metadata(&db_path).map(|m| m.len()).ok();
    // Rows actually persisted; `None` when the database cannot be read
    let stored = library.store().count().await.ok();

    match output.format {
        OutputFormat::Json => {
            let by_status: serde_json::Map<_, _> = counts
                .iter()
                .map(|(status, n)| (status.as_str().to_string(), serde_json::json!(n)))
                .collect();
            output.json(&serde_json::json!({
                "data_dir": config.data_dir,
                "database": db_path,
                "database_exists": db_size.is_some(),
                "database_size": db_size,
                "stored_rows": stored,
                "books": books.len(),
                "by_status": by_status,
                "bookmarked": books.iter().filter(|b| b.has_bookmark()).count()
            }));
        }
        OutputFormat::Quiet => {
            println!("{}", books.len());
        }
        OutputFormat::Human => {
            println!("Shelf Status");
            println!("============");
            println!();
            println!("Storage:");
            println!("  Location: {}", config.data_dir.display());
            println!("  Database: {}", db_path.display());
            println!(
                "  Size:     {}",
                db_size.map(human_size).unwrap_or_else(|| "(not created)".to_string())
            );
            println!(
                "  Stored:   {}",
                stored
                    .map(|n| format!("{} book(s)", n))
                    .unwrap_or_else(|| "(unavailable)".to_string())
            );
            println!();
            println!("Books: {}", books.len());
            for (status, n) in &counts {
                println!("  {:<13} {}", format!("{}:", status.label()), n);
            }
            println!(
                "  {:<13} {}",
                "Bookmarked:",
                books.iter().filter(|b| b.has_bookmark()).count()
            );
        }
    }

    Ok(())
}
