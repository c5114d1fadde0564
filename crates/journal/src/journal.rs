//! Board and token journal using sled

use anyhow::{Context, Result};
use canvas::{BoardSnapshot, BoardStore, Token};
use sled::{Db, Tree};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

const BOARD_TREE: &str = "board";
const TOKENS_TREE: &str = "tokens";
const SNAPSHOT_KEY: &[u8] = b"snapshot";

/// Durable board snapshot and token table
pub struct SledJournal {
    /// Sled database
    db: Db,
    /// Single-entry tree holding the latest board snapshot
    board: Tree,
    /// token string -> bincode(Token)
    tokens: Tree,
}

impl SledJournal {
    /// Open or create a journal in the given directory
    pub fn open(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create journal directory {}", dir.display()))?;

        let db = sled::open(dir.join("board.db"))
            .with_context(|| format!("Failed to open journal at {}", dir.display()))?;
        let board = db.open_tree(BOARD_TREE)?;
        let tokens = db.open_tree(TOKENS_TREE)?;

        info!("Opened journal at {} ({} tokens)", dir.display(), tokens.len());

        Ok(Self { db, board, tokens })
    }

    /// Number of stored tokens
    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    /// Drop the stored board (tokens are kept)
    pub fn clear_board(&self) -> Result<()> {
        self.board.remove(SNAPSHOT_KEY)?;
        self.db.flush()?;
        Ok(())
    }
}

impl BoardStore for SledJournal {
    fn load_board(&self) -> Result<Option<BoardSnapshot>> {
        let value = match self.board.get(SNAPSHOT_KEY)? {
            Some(v) => v,
            None => return Ok(None),
        };

        let snapshot: BoardSnapshot =
            bincode::deserialize(&value).context("Corrupt board snapshot")?;
        Ok(Some(snapshot))
    }

    fn save_board(&self, snapshot: &BoardSnapshot) -> Result<()> {
        let value = bincode::serialize(snapshot)?;
        self.board.insert(SNAPSHOT_KEY, value)?;

        // Flush to ensure durability
        self.db.flush()?;

        debug!("Saved {}x{} board snapshot", snapshot.width, snapshot.height);
        Ok(())
    }

    fn load_tokens(&self) -> Result<HashMap<String, Token>> {
        let mut tokens = HashMap::new();

        for item in self.tokens.iter() {
            let (key, value) = item?;
            let key = String::from_utf8(key.to_vec()).context("Token key is not UTF-8")?;
            let token: Token = bincode::deserialize(&value)
                .with_context(|| format!("Corrupt token record {}", key))?;
            tokens.insert(key, token);
        }

        Ok(tokens)
    }

    fn save_token(&self, token: &Token) -> Result<()> {
        let value = bincode::serialize(token)?;
        self.tokens.insert(token.token.as_bytes(), value)?;
        self.db.flush()?;
        Ok(())
    }

    fn close(&self) -> Result<()> {
        self.db.flush()?;
        info!("Journal closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use canvas::{Color, PixelGrid};
    use tempfile::TempDir;

    fn token(name: &str) -> Token {
        Token {
            identity: format!("user-{}", name),
            token: name.to_string(),
            last_paint_ms: None,
        }
    }

    #[test]
    fn test_empty_journal() {
        let temp_dir = TempDir::new().unwrap();
        let journal = SledJournal::open(temp_dir.path()).unwrap();

        assert!(journal.load_board().unwrap().is_none());
        assert!(journal.load_tokens().unwrap().is_empty());
    }

    #[test]
    fn test_board_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();

        let mut grid = PixelGrid::new(5, 3, Color::DEFAULT_FILL).unwrap();
        grid.set(4, 2, Color::new(10, 20, 30)).unwrap();

        {
            let journal = SledJournal::open(temp_dir.path()).unwrap();
            journal.save_board(&grid.snapshot()).unwrap();
            journal.close().unwrap();
        }

        let journal = SledJournal::open(temp_dir.path()).unwrap();
        let snapshot = journal.load_board().unwrap().unwrap();
        let restored = PixelGrid::from_snapshot(&snapshot).unwrap();
        assert_eq!(restored.serialize(), grid.serialize());
    }

    #[test]
    fn test_save_board_replaces_previous() {
        let temp_dir = TempDir::new().unwrap();
        let journal = SledJournal::open(temp_dir.path()).unwrap();

        let first = PixelGrid::new(2, 2, Color::DEFAULT_FILL).unwrap();
        let second = PixelGrid::new(2, 2, Color::new(0, 0, 0)).unwrap();
        journal.save_board(&first.snapshot()).unwrap();
        journal.save_board(&second.snapshot()).unwrap();

        assert_eq!(journal.load_board().unwrap(), Some(second.snapshot()));

        journal.clear_board().unwrap();
        assert!(journal.load_board().unwrap().is_none());
    }

    #[test]
    fn test_tokens_round_trip() {
        let temp_dir = TempDir::new().unwrap();

        {
            let journal = SledJournal::open(temp_dir.path()).unwrap();
            journal.save_token(&token("a")).unwrap();
            journal.save_token(&token("b")).unwrap();
            assert_eq!(journal.token_count(), 2);
        }

        let journal = SledJournal::open(temp_dir.path()).unwrap();
        let tokens = journal.load_tokens().unwrap();
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens["a"], token("a"));
        assert_eq!(tokens["b"].identity, "user-b");
    }

    #[test]
    fn test_corrupt_snapshot_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let journal = SledJournal::open(temp_dir.path()).unwrap();
        journal.board.insert(SNAPSHOT_KEY, &[1u8, 2, 3][..]).unwrap();

        assert!(journal.load_board().is_err());
    }
}
