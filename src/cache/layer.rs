//! Typed cache over a persistent store.

use std::sync::Arc;
use tracing::{debug, info, warn};

use super::storage::PersistentStore;
use super::traits::Cacheable;
use crate::error::{Result, SyncError};

/// Namespace all cache entries live under in the persistent store.
pub const CACHE_NAMESPACE: &str = "cache";

/// Characters stripped from resource keys before they reach storage.
const UNSAFE_KEY_CHARS: &[char] = &['/', '\\', ':', '?', '%', '*', '|', '"', '<', '>'];

/// Strip filesystem-unsafe characters from a resource key.
pub fn sanitize_key(key: &str) -> String {
  key.chars().filter(|c| !UNSAFE_KEY_CHARS.contains(c)).collect()
}

/// Version suffix appended to every storage key (`_v<version>`).
pub fn version_suffix(app_version: Option<&str>) -> String {
  match app_version.map(str::trim).filter(|v| !v.is_empty()) {
    Some(version) => format!("_v{}", sanitize_key(version)),
    None => "_vunknown".to_string(),
  }
}

/// Typed get/set wrapper over a [`PersistentStore`].
///
/// Keys are sanitized and suffixed with the application version, so a new
/// version starts with an empty cache without touching old entries. Encode,
/// decode and storage failures are logged and reported as a miss.
#[derive(Clone)]
pub struct Cache {
  storage: Arc<dyn PersistentStore>,
  suffix: String,
}

impl Cache {
  /// Create a cache for the given application version.
  pub fn new(storage: Arc<dyn PersistentStore>, app_version: Option<&str>) -> Self {
    Self {
      storage,
      suffix: version_suffix(app_version),
    }
  }

  /// The storage key a resource key maps to.
  pub fn storage_key(&self, key: &str) -> String {
    format!("{}{}", sanitize_key(key), self.suffix)
  }

  /// Current version suffix.
  pub fn suffix(&self) -> &str {
    &self.suffix
  }

  /// Store a value, replacing whatever was cached under the key.
  ///
  /// Failures degrade freshness only, so they are logged and dropped.
  pub fn store<T: Cacheable>(&self, key: &str, value: &T) {
    if let Err(e) = self.try_store(key, value) {
      warn!(key = %key, resource = T::resource_type(), error = %e, "Cache write failed");
    }
  }

  /// Store a value, reporting failures to the caller.
  pub fn try_store<T: Cacheable>(&self, key: &str, value: &T) -> Result<()> {
    let data = serde_json::to_vec(value)?;
    self
      .storage
      .put(CACHE_NAMESPACE, &self.storage_key(key), &data)
  }

  /// Retrieve a cached value, or `None` on miss or any failure.
  pub fn retrieve<T: Cacheable>(&self, key: &str) -> Option<T> {
    let storage_key = self.storage_key(key);
    let data = match self.storage.get(CACHE_NAMESPACE, &storage_key) {
      Ok(data) => data,
      Err(SyncError::NotFound(_)) => {
        debug!(key = %storage_key, "Cache miss");
        return None;
      }
      Err(e) => {
        warn!(key = %storage_key, error = %e, "Cache read failed, treating as miss");
        return None;
      }
    };

    match serde_json::from_slice(&data) {
      Ok(value) => Some(value),
      Err(e) => {
        warn!(
          key = %storage_key,
          resource = T::resource_type(),
          error = %e,
          "Failed to decode cached value"
        );
        None
      }
    }
  }

  /// Drop a single entry. A failed removal is logged.
  pub fn remove(&self, key: &str) {
    let storage_key = self.storage_key(key);
    if let Err(e) = self.storage.remove(CACHE_NAMESPACE, &storage_key) {
      warn!(key = %storage_key, error = %e, "Cache removal failed");
    }
  }

  /// Remove every entry that does not belong to the current version.
  ///
  /// Returns the number of removed keys. This is the only eviction path.
  pub fn clear_old(&self) -> Result<usize> {
    let keys = self.storage.list_keys(CACHE_NAMESPACE)?;
    let mut removed = 0;

    for key in keys.iter().filter(|k| !k.ends_with(&self.suffix)) {
      self.storage.remove(CACHE_NAMESPACE, key)?;
      removed += 1;
    }

    if removed > 0 {
      info!(removed, suffix = %self.suffix, "Cleared cache entries from old versions");
    }
    Ok(removed)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::storage::{NoopStorage, SqliteStorage};
  use serde::{Deserialize, Serialize};

  #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
  struct Score {
    home: u32,
    away: u32,
  }

  impl Cacheable for Score {
    fn resource_type() -> &'static str {
      "score"
    }
  }

  #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
  struct Other {
    name: String,
  }

  impl Cacheable for Other {
    fn resource_type() -> &'static str {
      "other"
    }
  }

  fn memory_cache(version: Option<&str>) -> (Arc<SqliteStorage>, Cache) {
    let storage = Arc::new(SqliteStorage::open_in_memory().unwrap());
    let cache = Cache::new(storage.clone(), version);
    (storage, cache)
  }

  #[test]
  fn test_sanitize_strips_unsafe_characters() {
    assert_eq!(
      sanitize_key(r#"https://api.example.com/games/2024?x=1%*|"<>\"#),
      "httpsapi.example.comgames2024x=1"
    );
  }

  #[test]
  fn test_storage_key_appends_version() {
    let (_, cache) = memory_cache(Some("2.1.0"));
    assert_eq!(cache.storage_key("status:now?"), "statusnow_v2.1.0");

    let (_, cache) = memory_cache(None);
    assert_eq!(cache.storage_key("teams"), "teams_vunknown");

    let (_, cache) = memory_cache(Some("  "));
    assert_eq!(cache.suffix(), "_vunknown");
  }

  #[test]
  fn test_store_then_retrieve() {
    let (_, cache) = memory_cache(Some("1.0"));
    let score = Score { home: 3, away: 2 };
    cache.store("https://api/game/1", &score);

    assert_eq!(cache.retrieve::<Score>("https://api/game/1"), Some(score));
  }

  #[test]
  fn test_retrieve_missing_is_none() {
    let (_, cache) = memory_cache(Some("1.0"));
    assert_eq!(cache.retrieve::<Score>("missing"), None);
  }

  #[test]
  fn test_decode_failure_is_miss() {
    let (_, cache) = memory_cache(Some("1.0"));
    cache.store("k", &Other { name: "x".into() });

    assert_eq!(cache.retrieve::<Score>("k"), None);
  }

  #[test]
  fn test_new_version_does_not_see_old_entries() {
    let storage = Arc::new(SqliteStorage::open_in_memory().unwrap());
    let old = Cache::new(storage.clone(), Some("1.0"));
    old.store("teams", &Score { home: 1, away: 1 });

    let new = Cache::new(storage.clone(), Some("1.1"));
    assert_eq!(new.retrieve::<Score>("teams"), None);
    assert!(old.retrieve::<Score>("teams").is_some());
  }

  #[test]
  fn test_clear_old_removes_other_versions() {
    let storage = Arc::new(SqliteStorage::open_in_memory().unwrap());
    let old = Cache::new(storage.clone(), Some("1.0"));
    old.store("teams", &Score { home: 1, away: 1 });
    old.store("games", &Score { home: 2, away: 1 });

    let new = Cache::new(storage.clone(), Some("1.1"));
    new.store("teams", &Score { home: 4, away: 0 });

    assert_eq!(new.clear_old().unwrap(), 2);
    assert_eq!(
      storage.list_keys(CACHE_NAMESPACE).unwrap(),
      vec!["teams_v1.1".to_string()]
    );
    assert_eq!(new.clear_old().unwrap(), 0);
  }

  #[test]
  fn test_remove_drops_only_that_key() {
    let (_, cache) = memory_cache(Some("1.0"));
    cache.store("a", &Score { home: 1, away: 0 });
    cache.store("b", &Score { home: 2, away: 0 });

    cache.remove("a");
    cache.remove("never-stored");
    assert_eq!(cache.retrieve::<Score>("a"), None);
    assert_eq!(cache.retrieve::<Score>("b"), Some(Score { home: 2, away: 0 }));
  }

  #[test]
  fn test_noop_storage_never_hits() {
    let cache = Cache::new(Arc::new(NoopStorage), Some("1.0"));
    cache.store("k", &Score { home: 0, away: 0 });
    assert_eq!(cache.retrieve::<Score>("k"), None);
  }
}
