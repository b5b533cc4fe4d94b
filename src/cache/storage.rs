//! Persistent key/value storage and its SQLite implementation.

use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::{Result, SyncError};

/// Byte storage keyed by `(namespace, key)`.
///
/// Writes are durable before returning. Every filesystem or database failure is
/// reported; deciding whether to treat it as a miss is left to the caller.
pub trait PersistentStore: Send + Sync {
  /// Store bytes under a key, replacing any previous value.
  fn put(&self, namespace: &str, key: &str, bytes: &[u8]) -> Result<()>;

  /// Load bytes for a key. Returns `SyncError::NotFound` if absent.
  fn get(&self, namespace: &str, key: &str) -> Result<Vec<u8>>;

  /// List every raw key stored in a namespace.
  fn list_keys(&self, namespace: &str) -> Result<Vec<String>>;

  /// Remove a key. Removing a missing key is not an error.
  fn remove(&self, namespace: &str, key: &str) -> Result<()>;
}

/// Storage implementation that doesn't store anything.
/// Used when caching is disabled - every read misses.
pub struct NoopStorage;

impl PersistentStore for NoopStorage {
  fn put(&self, _namespace: &str, _key: &str, _bytes: &[u8]) -> Result<()> {
    Ok(()) // Discard
  }

  fn get(&self, _namespace: &str, key: &str) -> Result<Vec<u8>> {
    Err(SyncError::NotFound(key.to_string()))
  }

  fn list_keys(&self, _namespace: &str) -> Result<Vec<String>> {
    Ok(Vec::new())
  }

  fn remove(&self, _namespace: &str, _key: &str) -> Result<()> {
    Ok(())
  }
}

/// SQLite-based storage implementation.
///
/// One row per `(namespace, key)`; values are replaced wholesale on write.
pub struct SqliteStorage {
  conn: Mutex<Connection>,
}

impl SqliteStorage {
  /// Open the store at the default location.
  pub fn open_default() -> Result<Self> {
    let path = Self::default_path()?;
    Self::open(&path)
  }

  /// Open (or create) the store at a specific path.
  pub fn open(path: &Path) -> Result<Self> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).map_err(|e| {
        SyncError::Storage(format!(
          "Failed to create cache directory {}: {}",
          parent.display(),
          e
        ))
      })?;
    }

    let conn = Connection::open(path).map_err(|e| {
      SyncError::Storage(format!(
        "Failed to open cache database at {}: {}",
        path.display(),
        e
      ))
    })?;

    Self::with_connection(conn)
  }

  /// Open a throwaway in-memory store.
  pub fn open_in_memory() -> Result<Self> {
    Self::with_connection(Connection::open_in_memory()?)
  }

  fn with_connection(conn: Connection) -> Result<Self> {
    let storage = Self {
      conn: Mutex::new(conn),
    };
    storage.run_migrations()?;
    Ok(storage)
  }

  /// Get the default database path.
  pub fn default_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| SyncError::Storage("Could not determine data directory".to_string()))?;

    Ok(data_dir.join("rinksync").join("cache.db"))
  }

  /// Run database migrations for the store table.
  fn run_migrations(&self) -> Result<()> {
    let conn = self.lock()?;
    conn
      .execute_batch(STORE_SCHEMA)
      .map_err(|e| SyncError::Storage(format!("Failed to run cache migrations: {}", e)))?;
    Ok(())
  }

  fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
    self
      .conn
      .lock()
      .map_err(|e| SyncError::Storage(format!("Lock poisoned: {}", e)))
  }
}

/// Schema for the key/value table.
const STORE_SCHEMA: &str = r#"
PRAGMA synchronous = FULL;

CREATE TABLE IF NOT EXISTS kv_store (
    namespace TEXT NOT NULL,
    key TEXT NOT NULL,
    data BLOB NOT NULL,
    written_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (namespace, key)
);
"#;

impl PersistentStore for SqliteStorage {
  fn put(&self, namespace: &str, key: &str, bytes: &[u8]) -> Result<()> {
    let conn = self.lock()?;
    conn
      .execute(
        "INSERT OR REPLACE INTO kv_store (namespace, key, data, written_at)
         VALUES (?, ?, ?, datetime('now'))",
        params![namespace, key, bytes],
      )
      .map_err(|e| SyncError::Storage(format!("Failed to store {}: {}", key, e)))?;
    Ok(())
  }

  fn get(&self, namespace: &str, key: &str) -> Result<Vec<u8>> {
    let conn = self.lock()?;
    let data: Option<Vec<u8>> = conn
      .query_row(
        "SELECT data FROM kv_store WHERE namespace = ? AND key = ?",
        params![namespace, key],
        |row| row.get(0),
      )
      .optional()
      .map_err(|e| SyncError::Storage(format!("Failed to read {}: {}", key, e)))?;

    data.ok_or_else(|| SyncError::NotFound(key.to_string()))
  }

  fn list_keys(&self, namespace: &str) -> Result<Vec<String>> {
    let conn = self.lock()?;
    let mut stmt = conn
      .prepare("SELECT key FROM kv_store WHERE namespace = ? ORDER BY key")
      .map_err(|e| SyncError::Storage(format!("Failed to prepare query: {}", e)))?;

    let keys = stmt
      .query_map(params![namespace], |row| row.get::<_, String>(0))
      .map_err(|e| SyncError::Storage(format!("Failed to list keys: {}", e)))?
      .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(keys)
  }

  fn remove(&self, namespace: &str, key: &str) -> Result<()> {
    let conn = self.lock()?;
    conn
      .execute(
        "DELETE FROM kv_store WHERE namespace = ? AND key = ?",
        params![namespace, key],
      )
      .map_err(|e| SyncError::Storage(format!("Failed to remove {}: {}", key, e)))?;
    Ok(())
  }
}
