//! Configuration management command
//!
//! Provides CLI interface to view and edit the Mural configuration file.

use crate::system_config::{self, MuralConfig};
use anyhow::{Context, Result};
use canvas::Color;
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};

/// Every key accepted by `get` and `set`
const KEYS: &[&str] = &[
    "board.width",
    "board.height",
    "board.fill",
    "board.paint_delay_ms",
    "board.debounce_delay_ms",
    "board.snapshot_interval_secs",
    "board.persist",
    "board.fresh_start",
    "storage.path",
    "verifier.base_url",
    "verifier.expected_content",
    "verifier.timeout_secs",
];

/// List all configuration values
pub async fn run_list(config_path: &Path) -> Result<()> {
    let config = system_config::load(config_path)?;

    println!("{}", "Mural Configuration".bold());
    println!("{}: {}\n", "Location".dimmed(), config_path.display().dimmed());

    let mut section = "";
    for key in KEYS {
        let (prefix, name) = key.split_once('.').unwrap_or(("", key));
        if prefix != section {
            if !section.is_empty() {
                println!();
            }
            println!("{}", format!("[{}]", prefix).yellow());
            section = prefix;
        }
        println!("  {} = {}", name.cyan(), get_value(&config, key)?);
    }

    println!("\n{}", "Valid Ranges:".bold());
    println!("  width, height: 0-16384");
    println!("  debounce_delay_ms: 0-60000 (0 = commit immediately)");
    println!("  snapshot_interval_secs: 1-86400");
    println!("  timeout_secs: 1-300");

    Ok(())
}

/// Get a single configuration value
pub async fn run_get(config_path: &Path, key: &str) -> Result<()> {
    let config = system_config::load(config_path)?;
    println!("{}", get_value(&config, key)?);
    Ok(())
}

/// Set a configuration value
pub async fn run_set(config_path: &Path, key: &str, value: &str) -> Result<()> {
    let mut config = system_config::load(config_path)?;
    set_value(&mut config, key, value)?;

    // Validate before saving
    config.validate().context("Invalid configuration value")?;

    system_config::save(config_path, &config)?;

    println!("{} {} = {}", "✓".green(), key.cyan(), value);
    println!("{}", "Note: Restart `mural run` for changes to take effect".yellow());

    Ok(())
}

/// Show the config file path and optionally create it
pub async fn run_path(config_path: &Path, create: bool) -> Result<()> {
    if create && system_config::init_if_missing(config_path)? {
        println!("{} Created config file at: {}", "✓".green(), config_path.display());
    } else if config_path.exists() {
        println!("{}", config_path.display());
    } else {
        println!("{}", config_path.display());
        println!("{}", "File does not exist. Use --create to create it.".yellow());
    }

    Ok(())
}

/// Show example configuration
pub async fn run_example() -> Result<()> {
    println!("{}", system_config::example_config());
    Ok(())
}

fn unknown_key(key: &str) -> anyhow::Error {
    anyhow::anyhow!(
        "Unknown config key: {}. Use 'mural config list' to see available keys.",
        key
    )
}

fn get_value(config: &MuralConfig, key: &str) -> Result<String> {
    let value = match key {
        "board.width" => config.board.width.to_string(),
        "board.height" => config.board.height.to_string(),
        "board.fill" => config.board.fill.to_string(),
        "board.paint_delay_ms" => config.board.paint_delay_ms.to_string(),
        "board.debounce_delay_ms" => config.board.debounce_delay_ms.to_string(),
        "board.snapshot_interval_secs" => config.board.snapshot_interval_secs.to_string(),
        "board.persist" => config.board.persist.to_string(),
        "board.fresh_start" => config.board.fresh_start.to_string(),
        "storage.path" => config.storage_dir()?.display().to_string(),
        "verifier.base_url" => config.verifier.base_url.clone(),
        "verifier.expected_content" => config.verifier.expected_content.clone(),
        "verifier.timeout_secs" => config.verifier.timeout_secs.to_string(),
        _ => return Err(unknown_key(key)),
    };
    Ok(value)
}

fn set_value(config: &mut MuralConfig, key: &str, value: &str) -> Result<()> {
    fn int<T: std::str::FromStr>(value: &str) -> Result<T> {
        value
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid value '{}': must be an integer", value))
    }

    fn flag(value: &str) -> Result<bool> {
        value
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid value '{}': must be 'true' or 'false'", value))
    }

    match key {
        "board.width" => config.board.width = int(value)?,
        "board.height" => config.board.height = int(value)?,
        "board.fill" => {
            config.board.fill = value
                .parse::<Color>()
                .with_context(|| format!("Invalid value '{}'", value))?
        }
        "board.paint_delay_ms" => config.board.paint_delay_ms = int(value)?,
        "board.debounce_delay_ms" => config.board.debounce_delay_ms = int(value)?,
        "board.snapshot_interval_secs" => config.board.snapshot_interval_secs = int(value)?,
        "board.persist" => config.board.persist = flag(value)?,
        "board.fresh_start" => config.board.fresh_start = flag(value)?,
        "storage.path" => {
            config.storage.path = if value.is_empty() {
                None
            } else {
                Some(PathBuf::from(value))
            }
        }
        "verifier.base_url" => config.verifier.base_url = value.to_string(),
        "verifier.expected_content" => config.verifier.expected_content = value.to_string(),
        "verifier.timeout_secs" => config.verifier.timeout_secs = int(value)?,
        _ => return Err(unknown_key(key)),
    }
    Ok(())
}
