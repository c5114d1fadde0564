//! Board configuration

use anyhow::Result;
use canvas::Color;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Largest accepted board edge
pub const MAX_DIMENSION: i64 = 16_384;

/// Tunables for one board instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    /// Board width in cells
    pub width: i64,
    /// Board height in cells
    pub height: i64,
    /// Color of cells on a fresh board
    pub fill: Color,
    /// Minimum time between two paints with the same token
    pub paint_delay_ms: u64,
    /// Coalescing window per cell (0 = commit immediately)
    pub debounce_delay_ms: u64,
    /// Period of the background board snapshot
    pub snapshot_interval_secs: u64,
    /// Load and save board and tokens through the store
    pub persist: bool,
    /// Ignore any stored board on start
    pub fresh_start: bool,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 1000,
            fill: Color::DEFAULT_FILL,
            paint_delay_ms: 60_000,
            debounce_delay_ms: 250,
            snapshot_interval_secs: 60,
            persist: true,
            fresh_start: false,
        }
    }
}

impl BoardConfig {
    /// Check values are within supported ranges
    pub fn validate(&self) -> Result<()> {
        if !(0..=MAX_DIMENSION).contains(&self.width) {
            anyhow::bail!("width must be between 0 and {}", MAX_DIMENSION);
        }
        if !(0..=MAX_DIMENSION).contains(&self.height) {
            anyhow::bail!("height must be between 0 and {}", MAX_DIMENSION);
        }
        if self.debounce_delay_ms > 60_000 {
            anyhow::bail!("debounce_delay_ms must be at most 60000 (1 minute)");
        }
        if !(1..=86_400).contains(&self.snapshot_interval_secs) {
            anyhow::bail!("snapshot_interval_secs must be between 1 and 86400");
        }
        Ok(())
    }

    pub fn paint_delay(&self) -> Duration {
        Duration::from_millis(self.paint_delay_ms)
    }

    pub fn debounce_delay(&self) -> Duration {
        Duration::from_millis(self.debounce_delay_ms)
    }

    pub fn snapshot_interval(&self) -> Duration {
        Duration::from_secs(self.snapshot_interval_secs)
    }
}
