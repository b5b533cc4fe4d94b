//! Versioned on-disk cache with fetch throttling.
//!
//! This module is league-agnostic:
//! - `PersistentStore` persists raw bytes per `(namespace, key)`
//! - `Cache` adds key sanitization, version suffixes and JSON encoding
//! - `FetchThrottle` records when each resource was last fetched

mod layer;
mod storage;
mod throttle;
mod traits;

pub use layer::{sanitize_key, version_suffix, Cache, CACHE_NAMESPACE};
pub use storage::{NoopStorage, PersistentStore, SqliteStorage};
pub use throttle::{Clock, FetchThrottle, SystemClock};
pub use traits::{Cacheable, FetchResult, FetchSource};

#[cfg(test)]
pub(crate) use throttle::ManualClock;
