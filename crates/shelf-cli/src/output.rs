//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use serde::Serialize;

use shelf_core::view::star_string;
use shelf_core::BookCard;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Check if output is in quiet mode
    pub fn is_quiet(&self) -> bool {
        matches!(self.format, OutputFormat::Quiet)
    }

    pub fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }

    /// Print a single book
    pub fn print_book(&self, card: &BookCard) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:       {}", card.id);
                println!("Title:    {}", card.title);
                println!("Status:   {}", card.status_label);
                println!("Rating:   {} ({}/5)", star_string(card.rating), card.rating);
                if let Some(ref bookmark) = card.bookmark {
                    println!("Bookmark: {}", bookmark);
                }
                if let Some(ref review) = card.review {
                    println!();
                    println!("── Review ──");
                    println!("{}", review);
                }
            }
            OutputFormat::Json => print_json(card),
            OutputFormat::Quiet => {
                println!("{}", card.id);
            }
        }
    }

    /// Print a list of books
    pub fn print_books(&self, cards: &[BookCard]) {
        match self.format {
            OutputFormat::Human => {
                if cards.is_empty() {
                    println!("No books found.");
                    return;
                }
                for card in cards {
                    let bookmark = card
                        .bookmark
                        .as_ref()
                        .map(|b| format!(" | {}", b))
                        .unwrap_or_default();
                    println!(
                        "{} | {} | {:<12} | {}{}",
                        card.id,
                        star_string(card.rating),
                        card.status_label,
                        truncate(&card.title, 40),
                        bookmark
                    );
                }
                println!("\n{} book(s)", cards.len());
            }
            OutputFormat::Json => print_json(&cards),
            OutputFormat::Quiet => {
                for card in cards {
                    println!("{}", card.id);
                }
            }
        }
    }

    /// Print any serializable value in JSON mode
    pub fn json<T: Serialize + ?Sized>(&self, value: &T) {
        if self.is_json() {
            print_json(value);
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("✗ Failed to encode output: {}", e),
    }
}

/// Truncate a string to max characters, adding "..." if truncated
fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
