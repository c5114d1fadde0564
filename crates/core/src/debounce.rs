//! Per-cell write coalescing
//!
//! A burst of paints on one cell touches the grid once. The first write to a
//! clean cell arms a one-shot timer; later writes only replace the stored
//! color. When the timer fires, whatever color is stored at that moment is
//! committed. The timer is never re-armed, so a cell is committed at most one
//! delay after its first pending write no matter how hot it is.

use crate::grid::{Cell, PixelGrid};
use crate::Color;
use std::time::Duration;

/// Work run when a timer expires
pub type TimerTask = Box<dyn FnOnce() + Send + 'static>;

/// Source of one-shot timers
///
/// Implementations must never run `task` synchronously from inside
/// `schedule`; the caller may be holding the board lock.
pub trait Scheduler: Send + Sync {
    /// Arm a timer that runs `task` once after `delay`
    fn schedule(&self, delay: Duration, task: TimerTask) -> Box<dyn TimerHandle>;
}

/// An armed timer
pub trait TimerHandle: Send {
    /// Disarm without running the task (no-op if it already ran)
    fn cancel(self: Box<Self>);
}

/// Identifies the pending write a timer was armed for
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PendingKey {
    cell: Cell,
    generation: u64,
}

impl PendingKey {
    pub fn cell(&self) -> Cell {
        self.cell
    }
}

/// A color written into the grid
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Commit {
    pub x: usize,
    pub y: usize,
    pub color: Color,
}

/// Outcome of a submission
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Submission {
    /// Zero delay: written to the grid immediately
    Committed(Commit),
    /// Cell was clean; a timer is now armed
    Scheduled,
    /// Cell was already pending; stored color replaced, timer untouched
    Updated,
}

struct PendingWrite {
    color: Color,
    generation: u64,
    timer: Box<dyn TimerHandle>,
}

/// One pending-write slot per board cell
pub struct DebounceBuffer {
    delay: Duration,
    slots: Vec<Option<PendingWrite>>,
    next_generation: u64,
    pending: usize,
}

impl DebounceBuffer {
    /// Create a buffer covering `cells` board cells
    pub fn new(cells: usize, delay: Duration) -> Self {
        let mut slots = Vec::with_capacity(cells);
        slots.resize_with(cells, || None);
        Self {
            delay,
            slots,
            next_generation: 0,
            pending: 0,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Number of cells with a pending write (equals the number of armed timers)
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Color waiting to be committed at `cell`, if any
    pub fn pending_color(&self, cell: Cell) -> Option<Color> {
        self.slots[cell.index].as_ref().map(|p| p.color)
    }

    /// Accept a write for `cell`
    ///
    /// `arm` is called only when a new timer is needed; it must arrange for
    /// [`DebounceBuffer::fire`] to be called with the given key after the
    /// given delay.
    pub fn submit<F>(&mut self, grid: &mut PixelGrid, cell: Cell, color: Color, arm: F) -> Submission
    where
        F: FnOnce(PendingKey, Duration) -> Box<dyn TimerHandle>,
    {
        if self.delay.is_zero() {
            grid.set_cell(cell, color);
            return Submission::Committed(Commit {
                x: cell.x,
                y: cell.y,
                color,
            });
        }

        if let Some(pending) = self.slots[cell.index].as_mut() {
            pending.color = color;
            return Submission::Updated;
        }

        let generation = self.next_generation;
        self.next_generation += 1;

        let timer = arm(PendingKey { cell, generation }, self.delay);
        self.slots[cell.index] = Some(PendingWrite {
            color,
            generation,
            timer,
        });
        self.pending += 1;

        Submission::Scheduled
    }

    /// Commit the pending write `key` refers to
    ///
    /// Returns `None` when the write was cancelled or the slot now belongs to
    /// a newer window.
    pub fn fire(&mut self, grid: &mut PixelGrid, key: PendingKey) -> Option<Commit> {
        let slot = &mut self.slots[key.cell.index];
        if slot.as_ref().map(|p| p.generation) != Some(key.generation) {
            return None;
        }

        let pending = slot.take()?;
        self.pending -= 1;
        grid.set_cell(key.cell, pending.color);

        Some(Commit {
            x: key.cell.x,
            y: key.cell.y,
            color: pending.color,
        })
    }

    /// Disarm every timer and drop the pending colors uncommitted
    ///
    /// Returns how many writes were discarded.
    pub fn cancel_all(&mut self) -> usize {
        let mut cancelled = 0;
        for slot in self.slots.iter_mut() {
            if let Some(pending) = slot.take() {
                pending.timer.cancel();
                cancelled += 1;
            }
        }
        self.pending = 0;
        cancelled
    }
}

impl std::fmt::Debug for DebounceBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DebounceBuffer")
            .field("delay", &self.delay)
            .field("cells", &self.slots.len())
            .field("pending", &self.pending)
            .finish()
    }
}
