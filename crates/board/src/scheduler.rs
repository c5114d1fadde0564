//! One-shot timers backed by Tokio tasks

use canvas::{Scheduler, TimerHandle, TimerTask};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::AbortHandle;

/// Spawns a sleeping task per timer on a Tokio runtime
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    handle: Handle,
}

impl TokioScheduler {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Use the runtime the caller is running on
    pub fn try_current() -> Result<Self, tokio::runtime::TryCurrentError> {
        Ok(Self::new(Handle::try_current()?))
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, task: TimerTask) -> Box<dyn TimerHandle> {
        let join = self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            task();
        });
        Box::new(TokioTimer(join.abort_handle()))
    }
}

struct TokioTimer(AbortHandle);

impl TimerHandle for TokioTimer {
    fn cancel(self: Box<Self>) {
        self.0.abort();
    }
}
