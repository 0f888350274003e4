//! Terminal implementation of the library's UI seam

use std::io::{self, Write};

use anyhow::Result;

use shelf_core::{Severity, Ui};

use crate::output::OutputFormat;

/// Shows notifications on the terminal and asks questions on stdin
#[derive(Debug, Clone, Copy)]
pub struct TerminalUi {
    format: OutputFormat,
    assume_yes: bool,
}

impl TerminalUi {
    pub fn new(format: OutputFormat, assume_yes: bool) -> Self {
        Self { format, assume_yes }
    }
}

impl Ui for TerminalUi {
    fn notify(&self, message: &str, severity: Severity) {
        match (severity, self.format) {
            (Severity::Warning, _) => eprintln!("⚠ {}", message),
            (Severity::Error, _) => eprintln!("✗ {}", message),
            // Structured modes print the command's result instead
            (_, OutputFormat::Json | OutputFormat::Quiet) => {}
            (Severity::Success, OutputFormat::Human) => println!("✓ {}", message),
            (Severity::Info, OutputFormat::Human) => println!("{}", message),
        }
    }

    fn confirm(&self, message: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        if self.format != OutputFormat::Human {
            return false;
        }
        confirm(message).unwrap_or(false)
    }
}

/// Prompt for confirmation
///
/// Returns true if user confirms, false otherwise.
/// In non-interactive mode (no TTY), returns false.
pub fn confirm(prompt: &str) -> Result<bool> {
    if !atty::is(atty::Stream::Stdin) {
        return Ok(false);
    }

    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    Ok(is_yes(&input))
}

fn is_yes(input: &str) -> bool {
    let input = input.trim().to_lowercase();
    input == "y" || input == "yes"
}
