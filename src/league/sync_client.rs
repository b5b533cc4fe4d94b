//! Sync client: throttled reads with cache fallback and idempotent writes.

use dashmap::DashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::cache::{
  Cache, Cacheable, Clock, FetchResult, FetchThrottle, NoopStorage, PersistentStore, SqliteStorage,
  SystemClock,
};
use crate::config::Config;
use crate::error::Result;

use super::api_types::{EndLiveActivity, StartLiveActivity, UserRegistration, VoteBody};
use super::cache::{MutationKey, ResourceKey};
use super::client::{LeagueApi, ReqwestTransport};
use super::types::{
  Game, GameDetails, PlayoffResults, Player, ServerStatus, StandingResults, Team, VotesPerGame,
};

/// Maximum cache age per resource before a throttled read goes to the network
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaxAges {
  pub games: Duration,
  pub standings: Duration,
  pub teams: Duration,
  pub playoffs: Duration,
  pub players: Duration,
  pub status: Duration,
}

impl Default for MaxAges {
  fn default() -> Self {
    Self {
      games: Duration::from_secs(60),
      standings: Duration::from_secs(60),
      teams: Duration::from_secs(24 * 60 * 60),
      playoffs: Duration::from_secs(60),
      players: Duration::from_secs(60 * 60),
      status: Duration::from_secs(10 * 60),
    }
  }
}

impl MaxAges {
  pub fn for_resource(&self, key: &ResourceKey) -> Duration {
    match key {
      ResourceKey::Games { .. } => self.games,
      ResourceKey::Standings { .. } => self.standings,
      ResourceKey::Teams => self.teams,
      ResourceKey::Playoffs { .. } => self.playoffs,
      ResourceKey::Players { .. } => self.players,
      // Details are always fetched directly
      ResourceKey::GameDetails { .. } => Duration::ZERO,
      ResourceKey::Status => self.status,
    }
  }
}

/// Whether a mutation may be skipped when its payload was already submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitPolicy {
  /// Skip the request if the same payload last succeeded for this key
  Idempotent,
  /// Always send
  Always,
}

/// Request/response/cache mediator for the league API.
///
/// Holds no domain state. Reads never fail: the worst case is stale or
/// absent data. Writes surface typed errors and only record the
/// idempotency marker on success.
#[derive(Clone)]
pub struct SyncClient {
  api: LeagueApi,
  cache: Cache,
  throttle: FetchThrottle,
  max_ages: MaxAges,
  /// One gate per resource key so concurrent reads share a single request
  in_flight: Arc<DashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl SyncClient {
  pub fn new(api: LeagueApi, cache: Cache, clock: Arc<dyn Clock>, max_ages: MaxAges) -> Self {
    let throttle = FetchThrottle::new(cache.clone(), clock);
    Self {
      api,
      cache,
      throttle,
      max_ages,
      in_flight: Arc::new(DashMap::new()),
    }
  }

  /// Build a client from configuration: SQLite cache and reqwest transport.
  pub fn from_config(config: &Config) -> color_eyre::Result<Self> {
    let api_key = Config::get_api_key();
    if api_key.is_none() {
      debug!("No API key set, mutations are disabled");
    }
    let api = LeagueApi::new(
      &config.api.base_url,
      api_key,
      Arc::new(ReqwestTransport::new()),
    )?;

    let storage: Arc<dyn PersistentStore> = match (&config.cache.path, config.cache.enabled) {
      (_, false) => Arc::new(NoopStorage),
      (Some(path), true) => Arc::new(SqliteStorage::open(path)?),
      (None, true) => Arc::new(SqliteStorage::open_default()?),
    };
    let cache = Cache::new(storage, config.app_version.as_deref());

    Ok(Self::new(
      api,
      cache,
      Arc::new(SystemClock),
      config.throttle.max_ages(),
    ))
  }

  pub fn cache(&self) -> &Cache {
    &self.cache
  }

  pub fn throttle(&self) -> &FetchThrottle {
    &self.throttle
  }

  /// Drop cache entries written by other application versions.
  pub fn clear_old_versions(&self) -> Result<usize> {
    self.cache.clear_old()
  }

  // ==========================================================================
  // Generic operations
  // ==========================================================================

  /// Throttled GET.
  ///
  /// 1. If the last attempt for this key is younger than `max_age`, serve cache
  /// 2. Otherwise fetch, cache the result and stamp the attempt
  /// 3. On failure stamp the attempt anyway and serve cache
  ///
  /// The source is `Api` whenever a network attempt was made, even if the
  /// value came from the cache fallback.
  pub async fn fetch<T>(&self, key: &ResourceKey, max_age: Duration) -> FetchResult<T>
  where
    T: Cacheable,
  {
    let Some(url) = self.url_for(key) else {
      return FetchResult::from_cache(None);
    };
    let cache_key = url.to_string();
    let (url, cache_key) = (&url, cache_key.as_str());

    self
      .with_key_gate(cache_key, move || async move {
        if !self.throttle.should_fetch(cache_key, max_age) {
          debug!(resource = %key.description(), "Throttled, serving cache");
          return FetchResult::from_cache(self.cache.retrieve(cache_key));
        }

        let value = self.fetch_and_store(url, cache_key).await;
        self.throttle.record_fetch(cache_key);
        FetchResult::from_api(value)
      })
      .await
  }

  /// GET that bypasses the throttle, falling back to cache on failure.
  pub async fn fetch_direct<T>(&self, key: &ResourceKey) -> Option<T>
  where
    T: Cacheable,
  {
    let url = self.url_for(key)?;
    let cache_key = url.to_string();
    self.fetch_and_store(&url, &cache_key).await
  }

  /// Read from cache only. Never touches the network.
  pub fn cached<T>(&self, key: &ResourceKey) -> Option<T>
  where
    T: Cacheable,
  {
    let url = self.url_for(key)?;
    self.cache.retrieve(url.as_str())
  }

  /// POST a mutation.
  ///
  /// With [`SubmitPolicy::Idempotent`], a payload equal to the last successful
  /// submission for `key` returns `Ok(None)` without a request. On HTTP 200
  /// the payload becomes the new marker and the response body is returned;
  /// any other outcome leaves the marker untouched so a retry goes out.
  pub async fn submit<B>(
    &self,
    key: &MutationKey,
    payload: &B,
    policy: SubmitPolicy,
  ) -> Result<Option<Vec<u8>>>
  where
    B: Cacheable + PartialEq,
  {
    let marker_key = key.cache_key();

    if policy == SubmitPolicy::Idempotent
      && self.cache.retrieve::<B>(&marker_key).as_ref() == Some(payload)
    {
      debug!(key = %marker_key, "Payload already submitted, skipping request");
      return Ok(None);
    }

    let url = self.api.mutation_url(key)?;
    let response = match self.api.post_json(&url, payload).await {
      Ok(response) => response,
      Err(e) => {
        warn!(url = %url, error = %e, "Submission failed");
        return Err(e);
      }
    };

    self.cache.store(&marker_key, payload);
    info!(url = %url, key = %marker_key, "Submitted");
    Ok(Some(response))
  }

  // ==========================================================================
  // Resources
  // ==========================================================================

  pub async fn games(&self, season: u32) -> FetchResult<Vec<Game>> {
    self.fetch_resource(ResourceKey::Games { season }).await
  }

  pub async fn standings(&self, season: u32) -> FetchResult<StandingResults> {
    self.fetch_resource(ResourceKey::Standings { season }).await
  }

  pub async fn teams(&self) -> FetchResult<Vec<Team>> {
    self.fetch_resource(ResourceKey::Teams).await
  }

  pub async fn playoffs(&self, season: u32) -> FetchResult<PlayoffResults> {
    self.fetch_resource(ResourceKey::Playoffs { season }).await
  }

  pub async fn players(&self, season: u32, team_code: &str) -> FetchResult<Vec<Player>> {
    self
      .fetch_resource(ResourceKey::Players {
        season,
        team_code: team_code.to_string(),
      })
      .await
  }

  pub async fn server_status(&self) -> FetchResult<ServerStatus> {
    self.fetch_resource(ResourceKey::Status).await
  }

  /// Details are one-off views and are always attempted.
  pub async fn game_details(&self, game_uuid: &str) -> Option<GameDetails> {
    self
      .fetch_direct(&ResourceKey::GameDetails {
        game_uuid: game_uuid.to_string(),
      })
      .await
  }

  /// Cached schedule for instant rendering at startup.
  pub fn cached_games(&self, season: u32) -> Option<Vec<Game>> {
    self.cached(&ResourceKey::Games { season })
  }

  pub fn cached_standings(&self, season: u32) -> Option<StandingResults> {
    self.cached(&ResourceKey::Standings { season })
  }

  pub fn cached_playoffs(&self, season: u32) -> Option<PlayoffResults> {
    self.cached(&ResourceKey::Playoffs { season })
  }

  pub fn cached_teams(&self) -> Option<Vec<Team>> {
    self.cached(&ResourceKey::Teams)
  }

  // ==========================================================================
  // Mutations
  // ==========================================================================

  pub async fn register_user(&self, registration: &UserRegistration) -> Result<()> {
    self
      .submit(&MutationKey::User, registration, SubmitPolicy::Idempotent)
      .await
      .map(|_| ())
  }

  /// Cast a pick. Returns the updated vote split when the server sent one.
  ///
  /// `Ok(None)` also covers a repeated, identical vote that was not re-sent.
  pub async fn vote(&self, vote: &VoteBody) -> Result<Option<VotesPerGame>> {
    let key = MutationKey::Vote {
      game_uuid: vote.game_uuid.clone(),
    };
    let Some(body) = self.submit(&key, vote, SubmitPolicy::Idempotent).await? else {
      return Ok(None);
    };

    match serde_json::from_slice::<VotesPerGame>(&body) {
      Ok(votes) => Ok(Some(votes)),
      Err(e) => {
        // The vote itself went through; only the aggregate is unavailable
        warn!(game_uuid = %vote.game_uuid, error = %e, "Failed to decode vote response");
        Ok(None)
      }
    }
  }

  pub async fn start_live_activity(&self, request: &StartLiveActivity) -> Result<()> {
    let key = MutationKey::LiveActivityStart {
      game_uuid: request.game_uuid.clone(),
    };
    self
      .submit(&key, request, SubmitPolicy::Idempotent)
      .await
      .map(|_| ())
  }

  /// Ending a live activity is attempted every time, regardless of history.
  ///
  /// A successful end forgets the matching start, so starting again for the
  /// same game is sent rather than skipped.
  pub async fn end_live_activity(&self, request: &EndLiveActivity) -> Result<()> {
    let key = MutationKey::LiveActivityEnd {
      game_uuid: request.game_uuid.clone(),
    };
    self.submit(&key, request, SubmitPolicy::Always).await?;

    let start = MutationKey::LiveActivityStart {
      game_uuid: request.game_uuid.clone(),
    };
    self.cache.remove(&start.cache_key());
    Ok(())
  }

  // ==========================================================================
  // Internals
  // ==========================================================================

  async fn fetch_resource<T: Cacheable>(&self, key: ResourceKey) -> FetchResult<T> {
    let max_age = self.max_ages.for_resource(&key);
    self.fetch(&key, max_age).await
  }

  fn url_for(&self, key: &ResourceKey) -> Option<Url> {
    match self.api.resource_url(key) {
      Ok(url) => Some(url),
      Err(e) => {
        error!(resource = %key.description(), error = %e, "Cannot build URL");
        None
      }
    }
  }

  async fn fetch_and_store<T>(&self, url: &Url, cache_key: &str) -> Option<T>
  where
    T: Cacheable,
  {
    match self.api.get_json::<T>(url).await {
      Ok(value) => {
        self.cache.store(cache_key, &value);
        info!(url = %url, resource = T::resource_type(), "Fetched");
        Some(value)
      }
      Err(e) => {
        warn!(url = %url, error = %e, "Fetch failed, falling back to cache");
        self.cache.retrieve(cache_key)
      }
    }
  }

  /// Run `f` while holding the gate for `key`.
  async fn with_key_gate<F, Fut, R>(&self, key: &str, f: F) -> R
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = R>,
  {
    let gate = Arc::clone(self.in_flight.entry(key.to_string()).or_default().value());
    let result = {
      let _guard = gate.lock().await;
      f().await
    };
    drop(gate);
    self
      .in_flight
      .remove_if(key, |_, gate| Arc::strong_count(gate) == 1);
    result
  }
}
