//! Board service for Mural
//!
//! This crate wires the `canvas` core to Tokio:
//! - `BoardService` orchestrating paint, read, token and shutdown
//! - Debounce timers as Tokio tasks
//! - Periodic snapshots to the configured store
//! - HTTP paste lookups for identity proofs

pub mod clock;
pub mod config;
pub mod scheduler;
pub mod service;
pub mod snapshot;
pub mod verifier;

// Re-exports
pub use clock::{Clock, SystemClock};
pub use config::BoardConfig;
pub use scheduler::TokioScheduler;
pub use service::{
    BoardService, BoardServiceBuilder, BoardStats, ChangeListener, InitError, PaintError,
};
pub use snapshot::PeriodicSnapshot;
pub use verifier::PasteVerifier;
