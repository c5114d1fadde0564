//! Wall clock used for cooldown stamps

use std::time::{SystemTime, UNIX_EPOCH};

/// Source of Unix-millisecond timestamps
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> u64;
}

/// The system wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default()
    }
}
