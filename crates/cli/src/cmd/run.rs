//! Host the board until Ctrl-C

use crate::system_config;
use anyhow::{Context, Result};
use board::{BoardService, PasteVerifier};
use journal::SledJournal;
use owo_colors::OwoColorize;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::info;

pub async fn run(config_path: &Path) -> Result<()> {
    let config = system_config::load(config_path)?;

    let verifier = PasteVerifier::new(
        config.verifier.base_url.clone(),
        config.verifier.expected_content.clone(),
        config.verifier.timeout(),
    )?;

    let mut builder = BoardService::builder(config.board.clone(), Arc::new(verifier));
    if config.board.persist {
        let dir = config.storage_dir()?;
        let journal = SledJournal::open(&dir)
            .with_context(|| format!("Failed to open board store at {}", dir.display()))?;
        builder = builder.store(Arc::new(journal));
    }

    let service = builder.initialize().context("Failed to start board")?;

    let commits = Arc::new(AtomicU64::new(0));
    let counter = commits.clone();
    service.set_listener(move |_, _, _| {
        counter.fetch_add(1, Ordering::Relaxed);
    });

    let stats = service.stats();
    println!(
        "{} Board {}x{} running ({} tokens). Press Ctrl-C to stop.",
        "✓".green(),
        stats.width,
        stats.height,
        stats.tokens
    );

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;

    info!("Interrupt received, shutting down");
    let pending = service.stats().pending_writes;
    service.shutdown();

    println!(
        "{} Stopped after {} commits ({} pending writes discarded)",
        "✓".green(),
        commits.load(Ordering::Relaxed),
        pending
    );
    Ok(())
}
