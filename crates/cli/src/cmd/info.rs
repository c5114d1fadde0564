//! Show the stored board and token count

use crate::system_config;
use anyhow::Result;
use canvas::{BoardSnapshot, BoardStore, Color};
use owo_colors::OwoColorize;
use std::path::Path;

pub async fn run(config_path: &Path) -> Result<()> {
    let config = system_config::load(config_path)?;
    let store = super::open_existing_store(&config)?;

    let snapshot = store.load_board()?;
    let tokens = store.token_count();
    store.close()?;

    println!("{}", "Mural Board".bold());
    println!("{}: {}\n", "Store".dimmed(), config.storage_dir()?.display().dimmed());

    match snapshot {
        Some(snapshot) => {
            println!("  {} {}x{}", "Size:".cyan(), snapshot.width, snapshot.height);
            println!("  {} {} bytes", "Buffer:".cyan(), snapshot.pixels.len());
            println!(
                "  {} {} {}",
                "Painted:".cyan(),
                painted_cells(&snapshot, config.board.fill),
                format!("(cells not {})", config.board.fill).dimmed()
            );
            if snapshot.width as i64 != config.board.width
                || snapshot.height as i64 != config.board.height
            {
                println!(
                    "  {}",
                    format!(
                        "Configured size is {}x{}; the next run will start fresh",
                        config.board.width, config.board.height
                    )
                    .yellow()
                );
            }
        }
        None => println!("  {} {}", "Size:".cyan(), "no board stored".dimmed()),
    }
    println!("  {} {}", "Tokens:".cyan(), tokens);

    Ok(())
}

/// Cells whose color differs from the fresh-board fill
fn painted_cells(snapshot: &BoardSnapshot, fill: Color) -> usize {
    let fill = fill.to_bytes();
    snapshot
        .pixels
        .chunks_exact(3)
        .filter(|cell| *cell != fill)
        .count()
}
