//! Per-key fetch throttling based on the last attempted fetch.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::layer::Cache;

/// Source of the current time.
pub trait Clock: Send + Sync {
  fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> DateTime<Utc> {
    Utc::now()
  }
}

/// Decides whether a resource is due for a network fetch.
///
/// The timestamp marks the last *attempt*, not the last success: a failed
/// fetch still holds off retries for `max_age`.
#[derive(Clone)]
pub struct FetchThrottle {
  cache: Cache,
  clock: Arc<dyn Clock>,
}

impl FetchThrottle {
  pub fn new(cache: Cache, clock: Arc<dyn Clock>) -> Self {
    Self { cache, clock }
  }

  /// Cache key holding the fetch timestamp for a resource key.
  pub fn timestamp_key(key: &str) -> String {
    format!("{}_latest_date", key)
  }

  /// Instant of the last attempted fetch, or the epoch if never fetched.
  pub fn last_fetch(&self, key: &str) -> DateTime<Utc> {
    self
      .cache
      .retrieve::<DateTime<Utc>>(&Self::timestamp_key(key))
      .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
  }

  /// True unless the last fetch for `key` happened less than `max_age` ago.
  pub fn should_fetch(&self, key: &str, max_age: Duration) -> bool {
    if max_age.is_zero() {
      return true;
    }
    let Ok(max_age) = chrono::Duration::from_std(max_age) else {
      // Out of range for chrono: effectively "never refetch"
      return false;
    };

    let last = self.last_fetch(key);
    let due = self.clock.now() - last >= max_age;
    debug!(key = %key, last_fetch = %last, due, "Throttle decision");
    due
  }

  /// Mark that a fetch for `key` is being attempted now.
  pub fn record_fetch(&self, key: &str) {
    self
      .cache
      .store(&Self::timestamp_key(key), &self.clock.now());
  }
}

/// Test clock that only moves when told to.
#[cfg(test)]
pub(crate) struct ManualClock {
  now: std::sync::Mutex<DateTime<Utc>>,
}

#[cfg(test)]
impl ManualClock {
  pub(crate) fn new(start: DateTime<Utc>) -> Self {
    Self {
      now: std::sync::Mutex::new(start),
    }
  }

  pub(crate) fn advance(&self, by: Duration) {
    let mut now = self.now.lock().unwrap();
    *now += chrono::Duration::from_std(by).unwrap();
  }
}

#[cfg(test)]
impl Clock for ManualClock {
  fn now(&self) -> DateTime<Utc> {
    *self.now.lock().unwrap()
  }
}
