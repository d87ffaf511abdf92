// ── Quiescence timers for continuous intents ──
//
// Each new value for a target aborts the previous timer and starts a new
// one, so only the value still standing when the window closes is sent.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::trace;

use crate::model::Target;

#[derive(Default)]
pub(crate) struct Debouncer {
    timers: Mutex<HashMap<Target, JoinHandle<()>>>,
}

impl Debouncer {
    /// Run `fire` once `window` passes without another `schedule` or
    /// `cancel` for the same target.
    pub(crate) fn schedule<F>(&self, target: Target, window: Duration, fire: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(window).await;
            fire.await;
        });
        let previous = self
            .timers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(target, handle);
        if let Some(previous) = previous.filter(|h| !h.is_finished()) {
            trace!(to = %target, "debounce restarted");
            previous.abort();
        }
    }

    /// Drop a waiting value, e.g. because a discrete command for the same
    /// target overrides it.
    pub(crate) fn cancel(&self, target: &Target) {
        let previous = self
            .timers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(target);
        if let Some(previous) = previous {
            previous.abort();
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        let timers = self.timers.get_mut().unwrap_or_else(PoisonError::into_inner);
        for (_, handle) in timers.drain() {
            handle.abort();
        }
    }
}
