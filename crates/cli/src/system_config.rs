//! Mural configuration file
//!
//! One TOML file holds the board tunables, where the board is stored and how
//! identity proofs are looked up. A missing file means all defaults.

use anyhow::{Context, Result};
use board::BoardConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Whole configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MuralConfig {
    pub board: BoardConfig,
    pub storage: StorageConfig,
    pub verifier: VerifierConfig,
}

/// Where the sled store lives
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Store directory (default: platform data dir)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// Paste service used for identity proofs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifierConfig {
    /// Pastes are fetched from `{base_url}/{paste_id}`
    pub base_url: String,
    /// Phrase the paste must contain (compared after trimming)
    pub expected_content: String,
    pub timeout_secs: u64,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080/pastes".to_string(),
            expected_content: "I want to paint on the mural".to_string(),
            timeout_secs: 10,
        }
    }
}

impl VerifierConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl MuralConfig {
    /// Check values are within supported ranges
    pub fn validate(&self) -> Result<()> {
        self.board.validate()?;

        if self.verifier.base_url.trim().is_empty() {
            anyhow::bail!("verifier.base_url must not be empty");
        }
        if !(1..=300).contains(&self.verifier.timeout_secs) {
            anyhow::bail!("verifier.timeout_secs must be between 1 and 300");
        }
        Ok(())
    }

    /// Store directory, falling back to `<data dir>/mural`
    pub fn storage_dir(&self) -> Result<PathBuf> {
        match &self.storage.path {
            Some(path) => Ok(path.clone()),
            None => dirs::data_dir()
                .map(|dir| dir.join("mural"))
                .context("Could not determine data directory; set storage.path"),
        }
    }
}

/// `<config dir>/mural/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("mural").join("config.toml"))
}

/// Explicit path if given, otherwise the default location
pub fn resolve_path(explicit: Option<PathBuf>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path),
        None => default_config_path()
            .context("Could not determine config directory; pass --config"),
    }
}

/// Load the config file, or defaults if it does not exist
pub fn load(path: &Path) -> Result<MuralConfig> {
    if !path.exists() {
        return Ok(MuralConfig::default());
    }

    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config: MuralConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

    config
        .validate()
        .with_context(|| format!("Invalid config file: {}", path.display()))?;
    Ok(config)
}

/// Write the config file, creating its directory
pub fn save(path: &Path, config: &MuralConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
    }

    let contents = toml::to_string_pretty(config).context("Failed to serialize config")?;
    fs::write(path, contents)
        .with_context(|| format!("Failed to write config file: {}", path.display()))?;
    Ok(())
}

/// Write the defaults if no file exists; returns whether one was created
pub fn init_if_missing(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    save(path, &MuralConfig::default())?;
    Ok(true)
}

/// Annotated example file
pub fn example_config() -> &'static str {
    r##"# Mural configuration

[board]
# Board size in cells
width = 1000
height = 1000
# Color of a fresh board
fill = "#dddddd"
# Minimum time between two paints with one token
paint_delay_ms = 60000
# Coalescing window per cell (0 = commit immediately)
debounce_delay_ms = 250
# Background snapshot period
snapshot_interval_secs = 60
# Load and save the board and tokens
persist = true
# Ignore the stored board on start
fresh_start = false

[storage]
# Defaults to the platform data directory
# path = "/var/lib/mural"

[verifier]
base_url = "http://127.0.0.1:8080/pastes"
expected_content = "I want to paint on the mural"
timeout_secs = 10
"##
}
