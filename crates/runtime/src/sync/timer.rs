//! One-shot delayed task with at most one pending instance.

use std::time::Duration;

use tokio::task::JoinHandle;

/// Holds at most one scheduled task; scheduling again cancels the previous one.
///
/// Must be used from within a tokio runtime. Dropping the timer cancels any
/// pending task.
#[derive(Debug, Default)]
pub struct SingleSlotTimer {
    slot: Option<JoinHandle<()>>,
}

impl SingleSlotTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `task` after `delay`, cancelling whatever was pending.
    pub fn schedule<F>(&mut self, delay: Duration, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.cancel();
        self.slot = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task();
        }));
    }

    /// Cancels the pending task; returns whether one was still waiting.
    pub fn cancel(&mut self) -> bool {
        match self.slot.take() {
            Some(handle) => {
                let pending = !handle.is_finished();
                handle.abort();
                pending
            }
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.slot.as_ref().is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for SingleSlotTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
