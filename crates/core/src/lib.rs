//! Shared canvas state for Mural
//!
//! This crate provides the synchronous core of the board:
//! - RGB colors and the pixel grid with its transfer-buffer encoding
//! - Per-cell debounced writes with injectable timers
//! - Capability tokens with per-token paint cooldown
//! - Collaborator traits for storage and identity proofs
//!
//! Nothing here depends on an async runtime; `board` wires it to Tokio.

pub mod color;
pub mod debounce;
pub mod grid;
pub mod identity;
pub mod store;
pub mod token;

// Re-exports
pub use color::{Color, ParseColorError};
pub use debounce::{
    Commit, DebounceBuffer, PendingKey, Scheduler, Submission, TimerHandle, TimerTask,
};
pub use grid::{BoardSnapshot, Cell, GridError, PixelGrid};
pub use identity::{IdentityVerifier, ProofError};
pub use store::BoardStore;
pub use token::{Token, TokenError, TokenRegistry};
