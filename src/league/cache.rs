//! Caching implementations and resource keys for league types.

use crate::cache::Cacheable;

use super::api_types::{EndLiveActivity, StartLiveActivity, UserRegistration, VoteBody};
use super::types::{
  Game, GameDetails, PlayoffResults, Player, ServerStatus, StandingResults, Team,
};

// ============================================================================
// Cacheable implementations
// ============================================================================

macro_rules! cacheable {
  ($($ty:ty => $name:literal),* $(,)?) => {
    $(
      impl Cacheable for $ty {
        fn resource_type() -> &'static str {
          $name
        }
      }
    )*
  };
}

cacheable! {
  Game => "game",
  StandingResults => "standings",
  PlayoffResults => "playoffs",
  Team => "team",
  Player => "player",
  GameDetails => "game_details",
  ServerStatus => "status",
  VoteBody => "vote",
  UserRegistration => "user",
  StartLiveActivity => "live_activity_start",
  EndLiveActivity => "live_activity_end",
}

// ============================================================================
// Resource keys
// ============================================================================

/// Readable resources on the league API.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ResourceKey {
  /// Full schedule for a season
  Games { season: u32 },
  /// League tables for a season
  Standings { season: u32 },
  /// All teams
  Teams,
  /// Playoff brackets for a season
  Playoffs { season: u32 },
  /// Roster and stats for one team
  Players { season: u32, team_code: String },
  /// A single game with events and stats
  GameDetails { game_uuid: String },
  /// Server status message
  Status,
}

impl ResourceKey {
  /// Unencoded path segments relative to the API base URL.
  pub fn segments(&self) -> Vec<String> {
    match self {
      Self::Games { season } => vec!["games".into(), season.to_string()],
      Self::Standings { season } => vec!["standings".into(), season.to_string()],
      Self::Teams => vec!["teams".into()],
      Self::Playoffs { season } => vec!["playoffs".into(), season.to_string()],
      Self::Players { season, team_code } => {
        vec!["players".into(), season.to_string(), team_code.clone()]
      }
      Self::GameDetails { game_uuid } => vec!["game".into(), game_uuid.clone()],
      Self::Status => vec!["status".into()],
    }
  }

  pub fn description(&self) -> String {
    match self {
      Self::Games { season } => format!("games for {}", season),
      Self::Standings { season } => format!("standings for {}", season),
      Self::Teams => "all teams".to_string(),
      Self::Playoffs { season } => format!("playoffs for {}", season),
      Self::Players { season, team_code } => format!("{} players for {}", team_code, season),
      Self::GameDetails { game_uuid } => format!("game {}", game_uuid),
      Self::Status => "server status".to_string(),
    }
  }
}

/// Mutations on the league API. Each key also names the idempotency marker.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum MutationKey {
  /// Register or update the user and their followed teams
  User,
  /// Cast a pick for a game
  Vote { game_uuid: String },
  /// Start live-activity updates for a game
  LiveActivityStart { game_uuid: String },
  /// Stop live-activity updates for a game
  LiveActivityEnd { game_uuid: String },
}

impl MutationKey {
  /// Path relative to the API base URL.
  pub fn path(&self) -> &'static str {
    match self {
      Self::User => "user",
      Self::Vote { .. } => "vote",
      Self::LiveActivityStart { .. } => "live-activity/start",
      Self::LiveActivityEnd { .. } => "live-activity/end",
    }
  }

  /// Cache key of the last successfully submitted payload.
  pub fn cache_key(&self) -> String {
    match self {
      Self::User => "user".to_string(),
      Self::Vote { game_uuid } => format!("vote_{}", game_uuid),
      Self::LiveActivityStart { game_uuid } => format!("live_activity_start_{}", game_uuid),
      Self::LiveActivityEnd { game_uuid } => format!("live_activity_end_{}", game_uuid),
    }
  }
}
