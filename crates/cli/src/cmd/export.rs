//! Write the stored board to a file

use crate::system_config;
use anyhow::{Context, Result};
use canvas::{BoardSnapshot, BoardStore};
use owo_colors::OwoColorize;
use std::fs;
use std::path::Path;

pub async fn run(config_path: &Path, out: &Path, ppm: bool) -> Result<()> {
    let config = system_config::load(config_path)?;
    let store = super::open_existing_store(&config)?;

    let snapshot = store.load_board()?;
    store.close()?;
    let snapshot = snapshot.context("No board stored yet")?;

    let bytes = encode(&snapshot, ppm);
    fs::write(out, &bytes).with_context(|| format!("Failed to write {}", out.display()))?;

    println!(
        "{} Exported {}x{} board to {} ({} bytes)",
        "✓".green(),
        snapshot.width,
        snapshot.height,
        out.display(),
        bytes.len()
    );
    Ok(())
}

/// Raw transfer buffer, optionally as a binary PPM image
fn encode(snapshot: &BoardSnapshot, ppm: bool) -> Vec<u8> {
    if !ppm {
        return snapshot.pixels.clone();
    }

    let header = format!("P6\n{} {}\n255\n", snapshot.width, snapshot.height);
    let mut bytes = Vec::with_capacity(header.len() + snapshot.pixels.len());
    bytes.extend_from_slice(header.as_bytes());
    bytes.extend_from_slice(&snapshot.pixels);
    bytes
}
