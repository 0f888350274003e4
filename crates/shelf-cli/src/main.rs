//! Shelf CLI
//!
//! Command-line interface for Shelf - a personal book tracker.

use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use shelf_core::{Config, Library, LibraryError, SqliteBookStore, Status};

mod commands;
mod output;
mod terminal;

use output::{Output, OutputFormat};
use terminal::TerminalUi;

#[derive(Parser)]
#[command(name = "shelf")]
#[command(about = "Shelf - Track the books you read")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to an alternative config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a book
    #[command(alias = "create")]
    Add {
        /// Book title
        name: String,
        /// Short review
        #[arg(short, long)]
        review: Option<String>,
        /// Rating from 0 to 5 (values outside are clamped)
        #[arg(short = 'R', long, allow_negative_numbers = true)]
        rating: Option<i64>,
        /// Bookmarked page
        #[arg(short, long)]
        page: Option<i64>,
        /// Bookmarked line
        #[arg(short, long)]
        line: Option<i64>,
        /// yet-to-start, ongoing, completed or dropped
        #[arg(short, long, value_parser = parse_status)]
        status: Option<Status>,
    },
    /// List all books
    #[command(alias = "ls")]
    List {
        /// Only show books with this status
        #[arg(short, long, value_parser = parse_status)]
        status: Option<Status>,
    },
    /// Show book details
    Show {
        /// Book ID
        id: String,
    },
    /// Change fields of a book
    Edit {
        /// Book ID
        id: String,
        /// New title
        #[arg(short, long)]
        name: Option<String>,
        /// New review
        #[arg(short, long)]
        review: Option<String>,
        /// New rating
        #[arg(short = 'R', long, allow_negative_numbers = true)]
        rating: Option<i64>,
        /// New bookmarked page (0 clears it)
        #[arg(short, long)]
        page: Option<i64>,
        /// New bookmarked line (0 clears it)
        #[arg(short, long)]
        line: Option<i64>,
        /// New status
        #[arg(short, long, value_parser = parse_status)]
        status: Option<Status>,
    },
    /// Delete a book
    #[command(alias = "rm")]
    Delete {
        /// Book ID
        id: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Export all books to a JSON file
    Export {
        /// Directory to write the export into
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },
    /// Import books from a JSON file
    Import {
        /// Path to a .json export
        file: PathBuf,
        /// What to do with books whose name already exists
        #[arg(long, value_enum, default_value_t = OnConflict::Ask)]
        on_conflict: OnConflict,
    },
    /// Show status (storage location, counts)
    Status,
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, log_file, export_dir)
        key: String,
        /// Configuration value
        value: String,
    },
}

/// How `import` resolves name collisions
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OnConflict {
    /// Ask before replacing existing books
    Ask,
    /// Replace existing books
    Replace,
    /// Keep existing books
    Skip,
}

fn parse_status(s: &str) -> Result<Status, String> {
    s.parse::<Status>().map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let format = OutputFormat::from_flags(cli.json, cli.quiet);
    let output = Output::new(format);
    let config_path = cli.config.as_ref();

    // Config commands don't need the store
    if let Commands::Config { command } = &cli.command {
        return handle_config_command(command.clone(), config_path, &output);
    }

    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;
    init_logging(&config);

    let assume_yes = matches!(cli.command, Commands::Delete { yes: true, .. });
    let ui = TerminalUi::new(format, assume_yes);
    let library = Library::open(SqliteBookStore::new(&config), ui).await;

    let result = match cli.command {
        Commands::Add {
            name,
            review,
            rating,
            page,
            line,
            status,
        } => {
            let fields = commands::book::Fields {
                name: Some(name),
                review,
                rating,
                page,
                line,
                status,
            };
            commands::book::add(&library, fields, &output).await
        }
        Commands::List { status } => commands::book::list(&library, status, &output).await,
        Commands::Show { id } => commands::book::show(&library, &id, &output).await,
        Commands::Edit {
            id,
            name,
            review,
            rating,
            page,
            line,
            status,
        } => {
            let fields = commands::book::Fields {
                name,
                review,
                rating,
                page,
                line,
                status,
            };
            commands::book::edit(&library, &id, fields, &output).await
        }
        Commands::Delete { id, .. } => commands::book::delete(&library, &id, &output).await,
        Commands::Export { dir } => {
            let dir = dir.unwrap_or_else(|| config.export_path());
            commands::transfer::export(&library, &dir, &output).await
        }
        Commands::Import { file, on_conflict } => {
            commands::transfer::import(&library, &file, on_conflict, &output).await
        }
        Commands::Status => commands::status::show(&library, &config, &output).await,
        Commands::Config { .. } => unreachable!(), // Handled above
    };

    match result {
        Ok(()) => Ok(()),
        // Library errors have already been shown through the terminal UI
        Err(e) if e.downcast_ref::<LibraryError>().is_some() => {
            info!("command failed: {:#}", e);
            if let Some(LibraryError::Storage(storage)) = e.downcast_ref::<LibraryError>() {
                if let Some(hint) = storage.recovery_suggestion() {
                    eprintln!("  {}", hint);
                }
            }
            std::process::exit(1);
        }
        Err(e) => Err(e),
    }
}

fn handle_config_command(
    command: Option<ConfigCommands>,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::show(config_path, output),
        Some(ConfigCommands::Set { key, value }) => {
            commands::config::set(key, value, config_path, output)
        }
    }
}

/// Initialize file logging
///
/// Only initializes if the SHELF_LOG environment variable is set.
/// Logs to config.log_file or {data_dir}/debug.log.
fn init_logging(config: &Config) {
    let Ok(log_level) = std::env::var("SHELF_LOG") else {
        return;
    };

    let log_path = config.log_path();
    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let log_file = match File::create(&log_path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: Could not create log file {:?}: {}", log_path, e);
            return;
        }
    };

    let env_filter = EnvFilter::new(format!(
        "shelf_core={},shelf_cli={}",
        log_level, log_level
    ));

    // Ignore the error if a subscriber is already installed
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(log_file)
        .try_init();

    info!("logging initialized to {:?}", log_path);
}
