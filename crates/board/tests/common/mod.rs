//! Test doubles for board service tests
//!
//! - `ManualScheduler`: timers that fire only when the test says so
//! - `ManualClock`: settable Unix-millisecond clock
//! - `FakeVerifier`: proof outcome chosen by the proof string
//! - `MemoryStore`: in-memory `BoardStore` with failure switches

#![allow(dead_code)]

use async_trait::async_trait;
use board::{BoardConfig, BoardService, BoardServiceBuilder, Clock};
use canvas::{
    BoardSnapshot, BoardStore, Color, IdentityVerifier, ProofError, Scheduler, TimerHandle,
    TimerTask, Token,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const RED: Color = Color::new(255, 0, 0);
pub const GREEN: Color = Color::new(0, 255, 0);
pub const BLUE: Color = Color::new(0, 0, 255);

/// 2023-11-14, far from the epoch so "never painted" is unambiguous
pub const T0: u64 = 1_700_000_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Armed,
    Fired,
    Cancelled,
}

struct TimerEntry {
    delay: Duration,
    task: Option<TimerTask>,
    state: TimerState,
}

/// Records every timer; `fire_all` runs the armed ones
#[derive(Default)]
pub struct ManualScheduler {
    timers: Arc<Mutex<Vec<TimerEntry>>>,
}

impl ManualScheduler {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn armed(&self) -> usize {
        self.count(TimerState::Armed)
    }

    pub fn count(&self, state: TimerState) -> usize {
        self.timers.lock().iter().filter(|t| t.state == state).count()
    }

    pub fn total(&self) -> usize {
        self.timers.lock().len()
    }

    pub fn delays(&self) -> Vec<Duration> {
        self.timers.lock().iter().map(|t| t.delay).collect()
    }

    /// Run every armed timer; returns how many ran
    pub fn fire_all(&self) -> usize {
        let tasks: Vec<TimerTask> = {
            let mut timers = self.timers.lock();
            timers
                .iter_mut()
                .filter(|t| t.state == TimerState::Armed)
                .filter_map(|t| {
                    t.state = TimerState::Fired;
                    t.task.take()
                })
                .collect()
        };

        // Run outside our lock: tasks take the board lock
        let ran = tasks.len();
        for task in tasks {
            task();
        }
        ran
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, task: TimerTask) -> Box<dyn TimerHandle> {
        let mut timers = self.timers.lock();
        timers.push(TimerEntry {
            delay,
            task: Some(task),
            state: TimerState::Armed,
        });
        Box::new(ManualTimer {
            timers: self.timers.clone(),
            index: timers.len() - 1,
        })
    }
}

struct ManualTimer {
    timers: Arc<Mutex<Vec<TimerEntry>>>,
    index: usize,
}

impl TimerHandle for ManualTimer {
    fn cancel(self: Box<Self>) {
        let mut timers = self.timers.lock();
        let entry = &mut timers[self.index];
        if entry.state == TimerState::Armed {
            entry.state = TimerState::Cancelled;
            entry.task = None;
        }
    }
}

/// Clock the test advances by hand
pub struct ManualClock(AtomicU64);

impl ManualClock {
    pub fn new() -> Arc<Self> {
        Arc::new(Self(AtomicU64::new(T0)))
    }

    pub fn advance(&self, by: Duration) {
        self.0.fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

/// Proofs: "ok" passes, "missing" / "other-user" / "wrong-text" map to the
/// specific failures, anything else is a generic failure
#[derive(Default)]
pub struct FakeVerifier {
    pub calls: AtomicUsize,
}

#[async_trait]
impl IdentityVerifier for FakeVerifier {
    async fn verify(&self, _identity: &str, proof: &str) -> Result<(), ProofError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match proof {
            "ok" => Ok(()),
            "missing" => Err(ProofError::PasteNotFound),
            "other-user" => Err(ProofError::UidMismatch),
            "wrong-text" => Err(ProofError::ContentMismatch),
            other => Err(ProofError::Failed(format!("service error for {}", other))),
        }
    }
}

/// In-memory store
#[derive(Default)]
pub struct MemoryStore {
    pub board: Mutex<Option<BoardSnapshot>>,
    pub tokens: Mutex<HashMap<String, Token>>,
    pub board_saves: AtomicUsize,
    pub closed: AtomicBool,
    pub fail_loads: AtomicBool,
    pub fail_saves: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

impl BoardStore for MemoryStore {
    fn load_board(&self) -> anyhow::Result<Option<BoardSnapshot>> {
        if self.fail_loads.load(Ordering::SeqCst) {
            anyhow::bail!("board unreadable");
        }
        Ok(self.board.lock().clone())
    }

    fn save_board(&self, snapshot: &BoardSnapshot) -> anyhow::Result<()> {
        self.board_saves.fetch_add(1, Ordering::SeqCst);
        if self.fail_saves.load(Ordering::SeqCst) {
            anyhow::bail!("disk full");
        }
        *self.board.lock() = Some(snapshot.clone());
        Ok(())
    }

    fn load_tokens(&self) -> anyhow::Result<HashMap<String, Token>> {
        if self.fail_loads.load(Ordering::SeqCst) {
            anyhow::bail!("tokens unreadable");
        }
        Ok(self.tokens.lock().clone())
    }

    fn save_token(&self, token: &Token) -> anyhow::Result<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            anyhow::bail!("disk full");
        }
        self.tokens.lock().insert(token.token.clone(), token.clone());
        Ok(())
    }

    fn close(&self) -> anyhow::Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Small board, short windows, no persistence
pub fn config(width: i64, height: i64, debounce_ms: u64) -> BoardConfig {
    BoardConfig {
        width,
        height,
        fill: Color::DEFAULT_FILL,
        paint_delay_ms: 5_000,
        debounce_delay_ms: debounce_ms,
        snapshot_interval_secs: 60,
        persist: false,
        fresh_start: false,
    }
}

/// Builder wired to manual timers and clock
pub fn builder(
    config: BoardConfig,
    scheduler: &Arc<ManualScheduler>,
    clock: &Arc<ManualClock>,
) -> BoardServiceBuilder {
    BoardService::builder(config, Arc::new(FakeVerifier::default()))
        .scheduler(scheduler.clone())
        .clock(clock.clone())
}

/// Recorded listener calls
pub fn recorder() -> (Arc<Mutex<Vec<(usize, usize, Color)>>>, board::ChangeListener) {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let sink = calls.clone();
    let listener: board::ChangeListener =
        Arc::new(move |x, y, color| sink.lock().push((x, y, color)));
    (calls, listener)
}
