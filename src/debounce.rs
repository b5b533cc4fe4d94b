//! Collapse bursts of triggers into a single delayed execution.

use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Runs the most recent task once no new trigger has arrived for `delay`.
///
/// Each trigger cancels the pending one and starts the wait over. Work that
/// has already started is never aborted.
pub struct Debouncer {
  delay: Duration,
  pending: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
  pub fn new(delay: Duration) -> Self {
    Self {
      delay,
      pending: Mutex::new(None),
    }
  }

  /// Schedule `task`, replacing anything still waiting.
  ///
  /// Must be called from within a Tokio runtime.
  pub fn trigger<F, Fut>(&self, task: F)
  where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
  {
    let delay = self.delay;
    let handle = tokio::spawn(async move {
      tokio::time::sleep(delay).await;
      // Detach so a later trigger cannot abort work in progress
      tokio::spawn(task());
    });

    let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
    if let Some(previous) = pending.replace(handle) {
      previous.abort();
    }
  }

  /// Drop the pending task, if any.
  pub fn cancel(&self) {
    let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
    if let Some(previous) = pending.take() {
      previous.abort();
    }
  }

  /// True while a task is waiting out its quiet period.
  pub fn is_pending(&self) -> bool {
    let pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
    pending.as_ref().is_some_and(|h| !h.is_finished())
  }
}

impl Drop for Debouncer {
  fn drop(&mut self) {
    self.cancel();
  }
}
