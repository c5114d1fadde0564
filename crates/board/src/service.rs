//! Board orchestration
//!
//! `BoardService` owns the grid, the debounce slots and the token table.
//! Grid and slots share one lock, so a timer commit is a single atomic step
//! relative to paints and reads. Tokens live in their own concurrent map so
//! issuance never holds the board lock across the identity lookup.
//!
//! Commits are queued under the board lock and handed to the listener by a
//! single drainer, so notifications arrive in commit order without the
//! listener ever running under the board lock.

use crate::clock::{Clock, SystemClock};
use crate::config::BoardConfig;
use crate::scheduler::TokioScheduler;
use crate::snapshot::PeriodicSnapshot;
use bytes::Bytes;
use canvas::grid::resolve_cell;
use canvas::{
    BoardSnapshot, BoardStore, Cell, Color, Commit, DebounceBuffer, GridError, IdentityVerifier,
    PendingKey, PixelGrid, ProofError, Scheduler, Submission, Token, TokenError, TokenRegistry,
};
use parking_lot::{Mutex, RwLock};
use std::collections::VecDeque;
use std::sync::{Arc, Weak};
use std::time::Duration;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Receives every committed cell as (x, y, color)
///
/// Called in commit order, never under the board lock; must not block. A
/// commit may be delivered by whichever thread is draining the queue at the
/// time, not necessarily the one that made it.
pub type ChangeListener = Arc<dyn Fn(usize, usize, Color) + Send + Sync>;

/// Why a paint was rejected
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PaintError {
    #[error("Cell ({x}, {y}) is outside the board")]
    OutOfBounds { x: i64, y: i64 },

    #[error("Unknown token")]
    InvalidToken,

    #[error("Token is cooling down ({retry_after:?} left)")]
    Cooling { retry_after: Duration },

    #[error("Board is shut down")]
    Closed,
}

impl From<TokenError> for PaintError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::InvalidToken => PaintError::InvalidToken,
            TokenError::Cooling { retry_after } => PaintError::Cooling { retry_after },
        }
    }
}

/// Why the board could not start
#[derive(Debug, Error)]
pub enum InitError {
    #[error(transparent)]
    Grid(#[from] GridError),

    #[error("Invalid board config: {0:#}")]
    Config(anyhow::Error),

    #[error("Board must be initialized inside a Tokio runtime")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),
}

/// Point-in-time counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardStats {
    pub width: usize,
    pub height: usize,
    pub pending_writes: usize,
    pub tokens: usize,
}

struct BoardState {
    grid: PixelGrid,
    pending: DebounceBuffer,
    /// Commits not yet handed to the listener, oldest first
    outbox: VecDeque<Commit>,
    closed: bool,
}

/// State shared with timer tasks
struct BoardCore {
    state: Mutex<BoardState>,
    listener: RwLock<Option<ChangeListener>>,
    /// Held by the one thread delivering the outbox
    draining: Mutex<()>,
    /// Held from snapshot to save by every board writer of the store
    persisting: Arc<Mutex<()>>,
    scheduler: Arc<dyn Scheduler>,
}

impl BoardCore {
    fn submit(self: &Arc<Self>, cell: Cell, color: Color) -> Result<Submission, PaintError> {
        let outcome = {
            let mut state = self.state.lock();
            if state.closed {
                return Err(PaintError::Closed);
            }

            let BoardState {
                grid,
                pending,
                outbox,
                ..
            } = &mut *state;
            let outcome = pending.submit(grid, cell, color, |key, delay| {
                let core = Arc::downgrade(self);
                self.scheduler
                    .schedule(delay, Box::new(move || Self::fire_weak(&core, key)))
            });
            if let Submission::Committed(commit) = outcome {
                outbox.push_back(commit);
            }
            outcome
        };

        if let Submission::Committed(_) = outcome {
            self.drain();
        }
        Ok(outcome)
    }

    fn fire_weak(core: &Weak<Self>, key: PendingKey) {
        if let Some(core) = core.upgrade() {
            core.fire(key);
        }
    }

    fn fire(&self, key: PendingKey) {
        let committed = {
            let mut state = self.state.lock();
            let BoardState {
                grid,
                pending,
                outbox,
                ..
            } = &mut *state;
            match pending.fire(grid, key) {
                Some(commit) => {
                    outbox.push_back(commit);
                    true
                }
                None => false,
            }
        };

        if committed {
            self.drain();
        }
    }

    /// Deliver queued commits in order
    ///
    /// If another thread is already draining, it picks up our commits. A
    /// listener that paints re-enters here and returns at once; its commit is
    /// delivered by the outer loop.
    fn drain(&self) {
        loop {
            let Some(draining) = self.draining.try_lock() else {
                return;
            };

            while let Some(commit) = self.next_commit() {
                debug!("Committed ({}, {}) = {}", commit.x, commit.y, commit.color);

                // Clone out so the listener runs without any lock held
                let listener = self.listener.read().clone();
                if let Some(listener) = listener {
                    listener(commit.x, commit.y, commit.color);
                }
            }
            drop(draining);

            // A commit queued while we were finishing saw the drain lock taken
            if self.state.lock().outbox.is_empty() {
                return;
            }
        }
    }

    fn next_commit(&self) -> Option<Commit> {
        self.state.lock().outbox.pop_front()
    }

    fn snapshot(&self) -> BoardSnapshot {
        self.state.lock().grid.snapshot()
    }

    /// Committed board for the periodic save, `None` once shut down
    fn open_snapshot(&self) -> Option<BoardSnapshot> {
        let state = self.state.lock();
        (!state.closed).then(|| state.grid.snapshot())
    }
}

/// The shared canvas
pub struct BoardService {
    core: Arc<BoardCore>,
    tokens: TokenRegistry,
    store: Option<Arc<dyn BoardStore>>,
    clock: Arc<dyn Clock>,
    width: usize,
    height: usize,
    snapshot_task: Mutex<Option<JoinHandle<()>>>,
}

/// Collects collaborators for [`BoardService`]
pub struct BoardServiceBuilder {
    config: BoardConfig,
    verifier: Arc<dyn IdentityVerifier>,
    store: Option<Arc<dyn BoardStore>>,
    scheduler: Option<Arc<dyn Scheduler>>,
    clock: Arc<dyn Clock>,
    listener: Option<ChangeListener>,
}

impl BoardServiceBuilder {
    /// Storage for board snapshots and tokens (used only when `persist` is set)
    pub fn store(mut self, store: Arc<dyn BoardStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Timer source for debounce commits (default: Tokio tasks)
    pub fn scheduler(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    /// Timestamp source for cooldowns (default: system clock)
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn listener(mut self, listener: ChangeListener) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Build the board, load persisted state and start periodic snapshots
    pub fn initialize(self) -> Result<BoardService, InitError> {
        let config = self.config;

        // Negative sizes are a grid error; the config check covers the rest
        if config.width < 0 || config.height < 0 {
            return Err(GridError::InvalidDimensions {
                width: config.width,
                height: config.height,
            }
            .into());
        }
        config.validate().map_err(InitError::Config)?;

        let store = match (config.persist, self.store) {
            (true, Some(store)) => Some(store),
            (true, None) => {
                warn!("Persistence enabled but no store configured; running memory-only");
                None
            }
            (false, _) => None,
        };

        let grid = load_grid(&config, store.as_deref())?;
        let cells = grid.width() * grid.height();
        let (width, height) = (grid.width(), grid.height());

        let tokens = TokenRegistry::new(config.paint_delay(), self.verifier, store.clone());
        if let Some(store) = &store {
            match store.load_tokens() {
                Ok(loaded) => tokens.load(loaded),
                Err(e) => warn!("Failed to load tokens, starting with none: {:#}", e),
            }
        }

        let scheduler: Arc<dyn Scheduler> = match self.scheduler {
            Some(scheduler) => scheduler,
            None => Arc::new(TokioScheduler::try_current()?),
        };

        let core = Arc::new(BoardCore {
            state: Mutex::new(BoardState {
                grid,
                pending: DebounceBuffer::new(cells, config.debounce_delay()),
                outbox: VecDeque::new(),
                closed: false,
            }),
            listener: RwLock::new(self.listener),
            draining: Mutex::new(()),
            persisting: Arc::new(Mutex::new(())),
            scheduler,
        });

        let snapshot_task = match &store {
            Some(store) => {
                let runtime = Handle::try_current()?;
                let source = Arc::downgrade(&core);
                let task = PeriodicSnapshot::new(config.snapshot_interval(), store.clone(), move || {
                    source.upgrade().and_then(|core| core.open_snapshot())
                })
                .with_lock(core.persisting.clone());
                Some(runtime.spawn(task.run()))
            }
            None => None,
        };

        info!(
            "Board ready: {}x{}, cooldown {:?}, debounce {:?}, persistence {}",
            width,
            height,
            config.paint_delay(),
            config.debounce_delay(),
            if store.is_some() { "on" } else { "off" }
        );

        Ok(BoardService {
            core,
            tokens,
            store,
            clock: self.clock,
            width,
            height,
            snapshot_task: Mutex::new(snapshot_task),
        })
    }
}

/// Stored board when usable, otherwise a fresh one
fn load_grid(config: &BoardConfig, store: Option<&dyn BoardStore>) -> Result<PixelGrid, GridError> {
    if let Some(store) = store {
        if config.fresh_start {
            info!("Fresh start requested; ignoring stored board");
        } else {
            match store.load_board() {
                Ok(Some(snapshot))
                    if snapshot.width as i64 != config.width
                        || snapshot.height as i64 != config.height =>
                {
                    warn!(
                        "Stored board is {}x{} but configured board is {}x{}; starting fresh",
                        snapshot.width, snapshot.height, config.width, config.height
                    );
                }
                Ok(Some(snapshot)) => match PixelGrid::from_snapshot(&snapshot) {
                    Ok(grid) => {
                        info!("Restored {}x{} board from store", grid.width(), grid.height());
                        return Ok(grid);
                    }
                    Err(e) => warn!("Stored board is unusable, starting fresh: {}", e),
                },
                Ok(None) => info!("No stored board; starting fresh"),
                Err(e) => warn!("Failed to load board, starting fresh: {:#}", e),
            }
        }
    }

    PixelGrid::new(config.width, config.height, config.fill)
}

impl BoardService {
    /// Start configuring a board
    pub fn builder(config: BoardConfig, verifier: Arc<dyn IdentityVerifier>) -> BoardServiceBuilder {
        BoardServiceBuilder {
            config,
            verifier,
            store: None,
            scheduler: None,
            clock: Arc::new(SystemClock),
            listener: None,
        }
    }

    /// Paint one cell
    ///
    /// Bounds are checked before the token, so an out-of-bounds request never
    /// charges a cooldown. A valid token is charged immediately, even if the
    /// write is later discarded by shutdown. Does not wait for the debounce
    /// window.
    pub fn paint(&self, x: i64, y: i64, color: Color, token: &str) -> Result<Submission, PaintError> {
        if self.core.state.lock().closed {
            return Err(PaintError::Closed);
        }

        let cell = resolve_cell(self.width, self.height, x, y)
            .map_err(|_| PaintError::OutOfBounds { x, y })?;

        self.tokens.check_and_reserve(token, self.clock.now_ms())?;

        self.core.submit(cell, color)
    }

    /// Verify an identity proof and mint a token
    pub async fn request_token(&self, identity: &str, proof: &str) -> Result<Token, ProofError> {
        self.tokens.issue(identity, proof).await
    }

    /// Committed board as the transfer buffer (pending writes excluded)
    pub fn read_board_buffer(&self) -> Bytes {
        self.core.state.lock().grid.serialize()
    }

    /// Token record by token string
    pub fn token(&self, token: &str) -> Option<Token> {
        self.tokens.get(token)
    }

    /// Committed board in storage form
    pub fn snapshot(&self) -> BoardSnapshot {
        self.core.snapshot()
    }

    /// Register the change listener, replacing any previous one
    pub fn set_listener<F>(&self, listener: F)
    where
        F: Fn(usize, usize, Color) + Send + Sync + 'static,
    {
        *self.core.listener.write() = Some(Arc::new(listener));
    }

    pub fn clear_listener(&self) {
        *self.core.listener.write() = None;
    }

    pub fn stats(&self) -> BoardStats {
        let pending_writes = self.core.state.lock().pending.pending();
        BoardStats {
            width: self.width,
            height: self.height,
            pending_writes,
            tokens: self.tokens.len(),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.core.state.lock().closed
    }

    /// Stop snapshots, save the committed board once more and drop pending writes
    ///
    /// Pending colors are discarded, not flushed: up to one debounce window
    /// of paints is lost. Safe to call more than once. Waits for a periodic
    /// save already in progress, so the final save is the last board write.
    pub fn shutdown(&self) {
        if let Some(task) = self.snapshot_task.lock().take() {
            task.abort();
        }

        let _persisting = self.core.persisting.lock();

        let (snapshot, discarded) = {
            let mut state = self.core.state.lock();
            if state.closed {
                return;
            }
            state.closed = true;
            (state.grid.snapshot(), state.pending.cancel_all())
        };

        if let Some(store) = &self.store {
            if let Err(e) = store.save_board(&snapshot) {
                warn!("Final board flush failed: {:#}", e);
            }
            if let Err(e) = store.close() {
                warn!("Failed to close store: {:#}", e);
            }
        }

        info!("Board shut down ({} pending writes discarded)", discarded);
    }
}

impl Drop for BoardService {
    fn drop(&mut self) {
        if let Some(task) = self.snapshot_task.get_mut().take() {
            task.abort();
        }
    }
}
