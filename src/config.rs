use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::league::MaxAges;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub api: ApiConfig,
  /// Application version used to namespace cache entries
  pub app_version: Option<String>,
  /// Season used when a command doesn't name one
  pub default_season: Option<u32>,
  #[serde(default)]
  pub cache: CacheConfig,
  #[serde(default)]
  pub throttle: ThrottleConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
  /// Database location (defaults to the user data directory)
  pub path: Option<PathBuf>,
  /// When false, nothing is persisted and every read misses
  #[serde(default = "default_true")]
  pub enabled: bool,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      path: None,
      enabled: true,
    }
  }
}

fn default_true() -> bool {
  true
}

/// Max-age per resource, in seconds
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ThrottleConfig {
  pub games: u64,
  pub standings: u64,
  pub teams: u64,
  pub playoffs: u64,
  pub players: u64,
  pub status: u64,
}

impl Default for ThrottleConfig {
  fn default() -> Self {
    let defaults = MaxAges::default();
    Self {
      games: defaults.games.as_secs(),
      standings: defaults.standings.as_secs(),
      teams: defaults.teams.as_secs(),
      playoffs: defaults.playoffs.as_secs(),
      players: defaults.players.as_secs(),
      status: defaults.status.as_secs(),
    }
  }
}

impl ThrottleConfig {
  pub fn max_ages(&self) -> MaxAges {
    MaxAges {
      games: Duration::from_secs(self.games),
      standings: Duration::from_secs(self.standings),
      teams: Duration::from_secs(self.teams),
      playoffs: Duration::from_secs(self.playoffs),
      players: Duration::from_secs(self.players),
      status: Duration::from_secs(self.status),
    }
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./rinksync.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/rinksync/config.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Err(eyre!(
        "No configuration file found. Create one at ~/.config/rinksync/config.yaml"
      )),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("rinksync.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("rinksync").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::from_yaml(&contents)
      .map_err(|e| eyre!("Invalid config file {}: {}", path.display(), e))
  }

  /// Parse and validate a YAML document.
  pub fn from_yaml(contents: &str) -> Result<Self> {
    let config: Config =
      serde_yaml::from_str(contents).map_err(|e| eyre!("Failed to parse config: {}", e))?;

    url::Url::parse(&config.api.base_url)
      .map_err(|e| eyre!("Invalid api.base_url '{}': {}", config.api.base_url, e))?;

    Ok(config)
  }

  /// Get the API key from environment variables.
  ///
  /// Checks RINKSYNC_API_KEY first, then API_KEY as fallback. Without a key
  /// only reads are possible.
  pub fn get_api_key() -> Option<String> {
    std::env::var("RINKSYNC_API_KEY")
      .or_else(|_| std::env::var("API_KEY"))
      .ok()
      .filter(|key| !key.trim().is_empty())
  }

  /// Directory for log files, next to the cache database.
  pub fn log_dir() -> Option<PathBuf> {
    dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .map(|p| p.join("rinksync").join("logs"))
  }
}
