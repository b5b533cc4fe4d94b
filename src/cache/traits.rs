//! Core traits and types for the caching system.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};

/// Capability for values that can be written to and read back from the cache.
///
/// Implemented explicitly per domain type rather than for every serializable
/// type, so the set of cached shapes stays visible in one place.
pub trait Cacheable: Serialize + DeserializeOwned + Send + Sync {
  /// Resource type name used in log output (e.g., "games", "standings")
  fn resource_type() -> &'static str;
}

impl<T: Cacheable> Cacheable for Vec<T> {
  fn resource_type() -> &'static str {
    T::resource_type()
  }
}

/// Fetch timestamps are stored through the same cache as resources.
impl Cacheable for DateTime<Utc> {
  fn resource_type() -> &'static str {
    "fetch_timestamp"
  }
}

/// Result from a fetch, including data and where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchResult<T> {
  /// The value, if either the network or the cache produced one
  pub value: Option<T>,
  /// Where the data came from
  pub source: FetchSource,
}

impl<T> FetchResult<T> {
  /// Create a result served by the throttle or a cache-only read.
  pub fn from_cache(value: Option<T>) -> Self {
    Self {
      value,
      source: FetchSource::Cache,
    }
  }

  /// Create a result for a fetch that went to the network.
  ///
  /// The value may still be a cached fallback if the request failed.
  pub fn from_api(value: Option<T>) -> Self {
    Self {
      value,
      source: FetchSource::Api,
    }
  }

  pub fn into_value(self) -> Option<T> {
    self.value
  }
}

/// Indicates where fetched data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchSource {
  /// Served from cache without a network attempt
  Cache,
  /// A network attempt was made (value may be a cached fallback)
  Api,
}
