//! Config command handlers

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use shelf_core::Config;

use crate::output::{Output, OutputFormat};

fn display_optional(path: Option<&Path>) -> String {
    path.map(|p| p.display().to_string())
        .unwrap_or_else(|| "(not set)".to_string())
}

/// Show current configuration
pub fn show(config_path: Option<&PathBuf>, output: &Output) -> Result<()> {
    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    match output.format {
        OutputFormat::Json => {
            output.json(&serde_json::json!({
                "data_dir": config.data_dir,
                "log_file": config.log_file,
                "export_dir": config.export_dir,
                "database": config.sqlite_path()
            }));
        }
        OutputFormat::Quiet => {
            println!("{}", config.data_dir.display());
        }
        OutputFormat::Human => {
            let effective_path = config_path
                .cloned()
                .unwrap_or_else(Config::config_file_path);
            println!("Configuration:");
            println!("  data_dir:   {}", config.data_dir.display());
            println!("  log_file:   {}", display_optional(config.log_file.as_deref()));
            println!("  export_dir: {}", display_optional(config.export_dir.as_deref()));
            println!();
            println!("Config file: {}", effective_path.display());
        }
    }

    Ok(())
}

/// Set a configuration value
pub fn set(
    key: String,
    value: String,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    let save_path = config_path
        .cloned()
        .unwrap_or_else(Config::config_file_path);
    set_at(&save_path, &key, &value)?;

    output.success(&format!("Set {} = {}", key, value));

    Ok(())
}

fn set_at(path: &Path, key: &str, value: &str) -> Result<()> {
    let mut config = Config::load_from_path(path).context("Failed to load configuration")?;
    config.set(key, value)?;
    config
        .save_to_path(path)
        .context("Failed to save configuration")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_set_writes_config_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");

        set_at(&path, "export_dir", "/tmp/exports").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("export_dir = \"/tmp/exports\""));
    }

    #[test]
    fn test_set_unknown_key_fails() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");

        let err = set_at(&path, "sync_url", "ws://x").unwrap_err();
        assert!(err.to_string().contains("Unknown config key"));
        assert!(!path.exists());
    }

    #[test]
    fn test_display_optional() {
        assert_eq!(display_optional(None), "(not set)");
        assert_eq!(display_optional(Some(Path::new("/a/b"))), "/a/b");
    }
}
