//! Error kinds for the sync layer.

/// Errors produced by the storage, network and decoding paths.
///
/// GET paths recover from `Transport` and `Decode` locally by serving the
/// cache; only mutations surface these to callers.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
  #[error("Network request failed: {0}")]
  Transport(String),

  #[error("Failed to decode response: {0}")]
  Decode(String),

  #[error("Unexpected status code {status}")]
  Status { status: u16 },

  #[error("Storage error: {0}")]
  Storage(String),

  #[error("Key not found: {0}")]
  NotFound(String),

  #[error("Invalid endpoint: {0}")]
  InvalidEndpoint(String),

  #[error("No API key configured")]
  MissingApiKey,
}

impl SyncError {
  /// True for failures a GET path recovers from by falling back to cache.
  pub fn is_recoverable(&self) -> bool {
    matches!(
      self,
      SyncError::Transport(_) | SyncError::Decode(_) | SyncError::Status { .. }
    )
  }
}

impl From<rusqlite::Error> for SyncError {
  fn from(e: rusqlite::Error) -> Self {
    SyncError::Storage(e.to_string())
  }
}

impl From<std::io::Error> for SyncError {
  fn from(e: std::io::Error) -> Self {
    SyncError::Storage(e.to_string())
  }
}

impl From<serde_json::Error> for SyncError {
  fn from(e: serde_json::Error) -> Self {
    SyncError::Decode(e.to_string())
  }
}

impl From<reqwest::Error> for SyncError {
  fn from(e: reqwest::Error) -> Self {
    if e.is_decode() {
      SyncError::Decode(e.to_string())
    } else {
      SyncError::Transport(e.to_string())
    }
  }
}

impl From<url::ParseError> for SyncError {
  fn from(e: url::ParseError) -> Self {
    SyncError::InvalidEndpoint(e.to_string())
  }
}

/// Result type alias for the sync layer
pub type Result<T> = std::result::Result<T, SyncError>;
