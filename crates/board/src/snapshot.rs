//! Periodic board snapshots
//!
//! Periodically copies the committed board out to the store so that a crash
//! loses at most one interval of paints.

use canvas::{BoardSnapshot, BoardStore};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Periodic snapshot writer
///
/// `source` produces the snapshot to save, or `None` once the board is gone
/// or closed, which ends the loop. Reading and saving happen under `lock`, so
/// a writer sharing that lock never interleaves with a periodic save.
pub struct PeriodicSnapshot<F> {
    /// Snapshot interval (default: 60 seconds)
    interval: Duration,

    /// Destination for snapshots
    store: Arc<dyn BoardStore>,

    /// Reads the live board
    source: F,

    /// Held from read to save
    lock: Arc<Mutex<()>>,
}

impl<F> PeriodicSnapshot<F>
where
    F: Fn() -> Option<BoardSnapshot> + Send + 'static,
{
    pub fn new(interval: Duration, store: Arc<dyn BoardStore>, source: F) -> Self {
        Self {
            interval,
            store,
            source,
            lock: Arc::new(Mutex::new(())),
        }
    }

    /// Share the persistence lock with another writer of the same store
    pub fn with_lock(mut self, lock: Arc<Mutex<()>>) -> Self {
        self.lock = lock;
        self
    }

    /// Spawn the loop on the current runtime
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Run until the board is dropped
    ///
    /// The first save happens one full interval after start.
    pub async fn run(self) {
        let mut timer = interval_at(Instant::now() + self.interval, self.interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!("Starting periodic snapshots (interval: {:?})", self.interval);

        loop {
            timer.tick().await;

            let _persisting = self.lock.lock();

            let Some(snapshot) = (self.source)() else {
                debug!("Board closed; stopping periodic snapshots");
                break;
            };

            match self.store.save_board(&snapshot) {
                Ok(()) => debug!(
                    "Periodic snapshot saved ({}x{})",
                    snapshot.width, snapshot.height
                ),
                Err(e) => warn!("Periodic snapshot failed: {:#}", e),
            }
        }
    }
}
