//! Cancellable trailing timer.
//!
//! [`Debouncer`] owns at most one [`ScheduledTask`]. Scheduling new work
//! aborts the pending task before it fires, so only the last call in a
//! burst runs, and only after the quiet period has elapsed.

use std::future::Future;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;

/// Handle to work scheduled on the tokio runtime.
///
/// Dropping the handle cancels the work if it has not started yet.
#[derive(Debug)]
pub struct ScheduledTask {
    handle: JoinHandle<()>,
}

impl ScheduledTask {
    /// Runs `work` after `delay` on the current runtime.
    #[must_use]
    pub fn after<F>(delay: Duration, work: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            work.await;
        });
        Self { handle }
    }

    /// Cancels the task if it has not completed.
    pub fn cancel(&self) {
        self.handle.abort();
    }

    /// Returns `true` once the task has completed or was cancelled.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for ScheduledTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Trailing-edge debouncer with a fixed quiet period.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Mutex<Option<ScheduledTask>>,
}

impl Debouncer {
    /// Creates a debouncer with the given quiet period.
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Mutex::new(None),
        }
    }

    /// Returns the quiet period.
    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }

    /// Cancels any pending work and schedules `work` after the quiet period.
    ///
    /// `work` must be short and must not be awaited on by the caller: it
    /// runs inside the timer task, which a later call may abort.
    pub fn schedule<F>(&self, work: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let task = ScheduledTask::after(self.delay, work);
        let previous = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(task);
        if let Some(previous) = previous {
            previous.cancel();
        }
    }

    /// Cancels pending work, if any. Returns `true` if something was pending.
    pub fn cancel(&self) -> bool {
        let previous = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        previous.is_some_and(|task| {
            let was_pending = !task.is_finished();
            task.cancel();
            was_pending
        })
    }

    /// Returns `true` while scheduled work has not fired.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }
}
