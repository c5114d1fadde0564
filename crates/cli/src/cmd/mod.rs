//! CLI command implementations

pub mod config;
pub mod export;
pub mod info;
pub mod run;

use crate::system_config::MuralConfig;
use anyhow::{Context, Result};
use journal::SledJournal;

/// Open an existing board store without creating one
pub(crate) fn open_existing_store(config: &MuralConfig) -> Result<SledJournal> {
    let dir = config.storage_dir()?;
    if !dir.join("board.db").exists() {
        anyhow::bail!("No board store at {} (has `mural run` been started?)", dir.display());
    }

    SledJournal::open(&dir).with_context(|| {
        format!(
            "Failed to open board store at {}. Is `mural run` still holding it?",
            dir.display()
        )
    })
}
