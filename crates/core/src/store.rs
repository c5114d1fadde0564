//! Persistence collaborator
//!
//! Every call may fail. Callers log failures and keep running from memory;
//! a failed load falls back to a fresh board or an empty token table.

use crate::{BoardSnapshot, Token};
use anyhow::Result;
use std::collections::HashMap;

/// Durable storage for the board and issued tokens
pub trait BoardStore: Send + Sync {
    /// Last saved board, if any
    fn load_board(&self) -> Result<Option<BoardSnapshot>>;

    /// Replace the saved board
    fn save_board(&self, snapshot: &BoardSnapshot) -> Result<()>;

    /// All saved tokens keyed by token string
    fn load_tokens(&self) -> Result<HashMap<String, Token>>;

    /// Insert or replace one token
    fn save_token(&self, token: &Token) -> Result<()>;

    /// Flush and release resources
    fn close(&self) -> Result<()>;
}
