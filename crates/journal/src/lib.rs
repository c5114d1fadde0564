//! Persistent storage for Mural
//!
//! This crate provides:
//! - Latest board snapshot (sled embedded DB)
//! - Issued capability tokens
//!
//! Both are exposed through the `canvas::BoardStore` trait.

pub mod journal;

// Re-exports
pub use journal::SledJournal;

/// Result type for journal operations
pub type Result<T> = anyhow::Result<T>;
