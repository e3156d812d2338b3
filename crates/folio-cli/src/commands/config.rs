//! Config command handlers

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use folio_core::Config;

use crate::output::{Output, OutputFormat};

/// Show current configuration
pub fn show(config_path: Option<&PathBuf>, output: &Output) -> Result<()> {
    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "data_dir": config.data_dir,
                    "database_name": config.database_name,
                    "store_name": config.store_name,
                    "autosave_delay_ms": config.autosave_delay_ms,
                    "idle_timeout_ms": config.idle_timeout_ms,
                    "title_delay_ms": config.title_delay_ms,
                    "default_color": config.default_color,
                    "log_file": config.log_file
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", config.data_dir.display());
        }
        OutputFormat::Human => {
            let effective_path = config_path
                .cloned()
                .unwrap_or_else(Config::config_file_path);
            println!("Configuration:");
            println!("  data_dir:          {}", config.data_dir.display());
            println!("  database_name:     {}", config.database_name);
            println!("  store_name:        {}", config.store_name);
            println!("  autosave_delay_ms: {}", config.autosave_delay_ms);
            println!("  idle_timeout_ms:   {}", config.idle_timeout_ms);
            println!("  title_delay_ms:    {}", config.title_delay_ms);
            println!("  default_color:     {}", config.default_color);
            println!(
                "  log_file:          {}",
                config
                    .log_file
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(not set)".to_string())
            );
            println!();
            println!("Database:    {}", config.database_path().display());
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
    let mut config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    apply(&mut config, &key, &value)?;

    // Save to the CLI-specified path or default
    let save_path = config_path
        .cloned()
        .unwrap_or_else(Config::config_file_path);
    config
        .save_to_path(&save_path)
        .context("Failed to save configuration")?;

    output.success(&format!("Set {} = {}", key, value));

    Ok(())
}

/// Set one key on `config`
fn apply(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        "data_dir" => config.data_dir = value.into(),
        "database_name" => config.database_name = non_empty(key, value)?,
        "store_name" => config.store_name = non_empty(key, value)?,
        "autosave_delay_ms" => config.autosave_delay_ms = millis(key, value)?,
        "idle_timeout_ms" => config.idle_timeout_ms = millis(key, value)?,
        "title_delay_ms" => config.title_delay_ms = millis(key, value)?,
        "default_color" => config.default_color = non_empty(key, value)?,
        "log_file" => {
            config.log_file = if value.is_empty() || value == "none" {
                None
            } else {
                Some(value.into())
            };
        }
        _ => {
            bail!(
                "Unknown configuration key: '{}'\n\
                 Valid keys: data_dir, database_name, store_name, autosave_delay_ms, \
                 idle_timeout_ms, title_delay_ms, default_color, log_file",
                key
            );
        }
    }
    Ok(())
}

fn non_empty(key: &str, value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        bail!("{} cannot be empty", key);
    }
    Ok(value.to_string())
}

fn millis(key: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse()
        .with_context(|| format!("Invalid value for {}. Use a number of milliseconds.", key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_known_keys() {
        let mut config = Config::default();

        apply(&mut config, "autosave_delay_ms", "750").unwrap();
        apply(&mut config, "default_color", "#ef4444").unwrap();
        apply(&mut config, "log_file", "/tmp/folio.log").unwrap();

        assert_eq!(config.autosave_delay_ms, 750);
        assert_eq!(config.default_color, "#ef4444");
        assert_eq!(config.log_file, Some(PathBuf::from("/tmp/folio.log")));

        apply(&mut config, "log_file", "none").unwrap();
        assert!(config.log_file.is_none());
    }

    #[test]
    fn test_apply_rejects_bad_values() {
        let mut config = Config::default();
        assert!(apply(&mut config, "idle_timeout_ms", "soon").is_err());
        assert!(apply(&mut config, "store_name", "  ").is_err());
        assert!(apply(&mut config, "sync_url", "x").is_err());
        assert_eq!(config.store_name, "workspaces");
    }
}
