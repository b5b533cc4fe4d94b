//! Domain model: games, standings, playoffs, votes, teams and players.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::api_types::iso8601;

/// Team code used by the server while a playoff opponent is undecided.
pub const TBD_TEAM_CODE: &str = "TBD";

/// League a game or standings table belongs to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum League {
  #[default]
  #[serde(rename = "SHL")]
  Shl,
  #[serde(rename = "HA")]
  Ha,
}

/// Kind of game
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameType {
  #[default]
  Regular,
  Playoff,
  Relegation,
}

/// Server-reported game status; the only source of truth for game state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
  Coming,
  Period1,
  Period2,
  Period3,
  Overtime,
  Shootout,
  Intermission,
  Finished,
}

/// Derived state of a game. Exactly one holds for any status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
  Future,
  Live,
  Played,
}

impl GameState {
  /// Map an optional status to a state. An absent status means the game is upcoming.
  pub fn from_status(status: Option<GameStatus>) -> Self {
    match status {
      None | Some(GameStatus::Coming) => GameState::Future,
      Some(
        GameStatus::Period1
        | GameStatus::Period2
        | GameStatus::Period3
        | GameStatus::Overtime
        | GameStatus::Shootout
        | GameStatus::Intermission,
      ) => GameState::Live,
      Some(GameStatus::Finished) => GameState::Played,
    }
  }
}

/// Server-aggregated pick percentages for one game
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VotesPerGame {
  #[serde(default)]
  pub home_count: u32,
  #[serde(default)]
  pub away_count: u32,
  pub home_perc: u32,
  pub away_perc: u32,
}

/// A scheduled, live or finished game.
///
/// Identified by `game_uuid`; `game_id` repeats across seasons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
  pub game_uuid: String,
  #[serde(default)]
  pub game_id: i64,
  pub home_team_code: String,
  pub away_team_code: String,
  #[serde(default)]
  pub home_team_result: u32,
  #[serde(default)]
  pub away_team_result: u32,
  #[serde(with = "iso8601")]
  pub start_date_time: DateTime<Utc>,
  #[serde(default)]
  pub game_type: GameType,
  #[serde(default)]
  pub league: League,
  #[serde(default)]
  pub status: Option<GameStatus>,
  #[serde(default)]
  pub overtime: bool,
  #[serde(default)]
  pub shootout: bool,
  #[serde(default)]
  pub votes: Option<VotesPerGame>,
}

impl Game {
  pub fn state(&self) -> GameState {
    GameState::from_status(self.status)
  }

  pub fn is_future(&self) -> bool {
    self.state() == GameState::Future
  }

  pub fn is_live(&self) -> bool {
    self.state() == GameState::Live
  }

  pub fn is_played(&self) -> bool {
    self.state() == GameState::Played
  }

  /// Decided after regulation time
  pub fn is_overtime_or_shootout(&self) -> bool {
    self.overtime || self.shootout
  }

  pub fn includes_team(&self, team_code: &str) -> bool {
    self.home_team_code == team_code || self.away_team_code == team_code
  }

  pub fn is_home(&self, team_code: &str) -> bool {
    self.home_team_code == team_code
  }

  /// Team currently ahead on the scoreboard, if any.
  pub fn leader(&self) -> Option<&str> {
    use std::cmp::Ordering;
    match self.home_team_result.cmp(&self.away_team_result) {
      Ordering::Greater => Some(self.home_team_code.as_str()),
      Ordering::Less => Some(self.away_team_code.as_str()),
      Ordering::Equal => None,
    }
  }

  /// Winning team of a finished game.
  pub fn winner(&self) -> Option<&str> {
    if self.is_played() {
      self.leader()
    } else {
      None
    }
  }

  /// Losing team of a finished game.
  pub fn loser(&self) -> Option<&str> {
    let winner = self.winner()?;
    if winner == self.home_team_code {
      Some(self.away_team_code.as_str())
    } else {
      Some(self.home_team_code.as_str())
    }
  }

  /// Standings points this game awards `team_code`.
  ///
  /// 3/0 in regulation, 2/1 after overtime or shootout, 0 while unplayed.
  pub fn points_for(&self, team_code: &str) -> u32 {
    if !self.includes_team(team_code) {
      return 0;
    }
    let Some(winner) = self.winner() else {
      return 0;
    };
    let extra_time = self.is_overtime_or_shootout();
    match (winner == team_code, extra_time) {
      (true, false) => 3,
      (true, true) => 2,
      (false, true) => 1,
      (false, false) => 0,
    }
  }

  /// Score from `team_code`'s perspective as (for, against).
  pub fn score_for(&self, team_code: &str) -> (u32, u32) {
    if self.is_home(team_code) {
      (self.home_team_result, self.away_team_result)
    } else {
      (self.away_team_result, self.home_team_result)
    }
  }

  pub fn has_tbd_opponent(&self) -> bool {
    self.home_team_code == TBD_TEAM_CODE || self.away_team_code == TBD_TEAM_CODE
  }

  /// Whether users may still pick a winner for this game.
  pub fn is_pickable(&self) -> bool {
    self.is_future() && !self.has_tbd_opponent() && self.game_type == GameType::Regular
  }

  /// Replace the aggregated votes after a successful vote submission.
  pub fn apply_votes(&mut self, votes: VotesPerGame) {
    self.votes = Some(votes);
  }
}

/// Patch the votes of the game with `game_uuid`. Returns false if no game matched.
pub fn apply_votes_to(games: &mut [Game], game_uuid: &str, votes: VotesPerGame) -> bool {
  match games.iter_mut().find(|g| g.game_uuid == game_uuid) {
    Some(game) => {
      game.apply_votes(votes);
      true
    }
    None => false,
  }
}

/// A user's pick for a single game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pick {
  pub game_uuid: String,
  pub team_code: String,
}

/// One team's row in a league table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Standing {
  pub team_code: String,
  pub rank: u32,
  pub gp: u32,
  pub points: u32,
  pub diff: i32,
  #[serde(default)]
  pub league: League,
}

impl Standing {
  pub fn points_per_game(&self) -> f64 {
    if self.gp == 0 {
      0.0
    } else {
      f64::from(self.points) / f64::from(self.gp)
    }
  }
}

/// Standings for both leagues of a season
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StandingResults {
  #[serde(rename = "SHL", default)]
  pub shl: Vec<Standing>,
  #[serde(rename = "HA", default)]
  pub ha: Vec<Standing>,
}

impl StandingResults {
  pub fn for_league(&self, league: League) -> &[Standing] {
    match league {
      League::Shl => &self.shl,
      League::Ha => &self.ha,
    }
  }
}

/// Playoff series between two teams
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayoffEntry {
  pub team1: String,
  pub team2: String,
  #[serde(default)]
  pub score1: u32,
  #[serde(default)]
  pub score2: u32,
  /// Code of the knocked-out team, as reported by the server
  #[serde(default)]
  pub eliminated: Option<String>,
  /// Number of wins needed to take the series
  #[serde(default)]
  pub best_to: Option<u32>,
}

impl PlayoffEntry {
  pub fn includes_team(&self, team_code: &str) -> bool {
    self.team1 == team_code || self.team2 == team_code
  }

  /// Taken as given from the server, never derived from the series score.
  pub fn is_eliminated(&self, team_code: &str) -> bool {
    self.eliminated.as_deref() == Some(team_code)
  }

  /// Series score from `team_code`'s perspective as (wins, losses).
  pub fn series_for(&self, team_code: &str) -> Option<(u32, u32)> {
    if self.team1 == team_code {
      Some((self.score1, self.score2))
    } else if self.team2 == team_code {
      Some((self.score2, self.score1))
    } else {
      None
    }
  }
}

/// Named playoff round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayoffStage {
  Demotion,
  Eight,
  Quarter,
  Semi,
  Final,
}

impl PlayoffStage {
  pub const ALL: [PlayoffStage; 5] = [
    PlayoffStage::Demotion,
    PlayoffStage::Eight,
    PlayoffStage::Quarter,
    PlayoffStage::Semi,
    PlayoffStage::Final,
  ];
}

/// One league's playoff bracket
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayoffBracket {
  #[serde(default)]
  pub demotion: Option<Vec<PlayoffEntry>>,
  #[serde(default)]
  pub eight: Option<Vec<PlayoffEntry>>,
  #[serde(default)]
  pub quarter: Option<Vec<PlayoffEntry>>,
  #[serde(default)]
  pub semi: Option<Vec<PlayoffEntry>>,
  #[serde(rename = "final", default)]
  pub final_: Option<Vec<PlayoffEntry>>,
}

impl PlayoffBracket {
  pub fn stage(&self, stage: PlayoffStage) -> &[PlayoffEntry] {
    let entries = match stage {
      PlayoffStage::Demotion => &self.demotion,
      PlayoffStage::Eight => &self.eight,
      PlayoffStage::Quarter => &self.quarter,
      PlayoffStage::Semi => &self.semi,
      PlayoffStage::Final => &self.final_,
    };
    entries.as_deref().unwrap_or(&[])
  }

  /// Every series `team_code` appears in, earliest round first.
  pub fn entries_for_team(&self, team_code: &str) -> Vec<(PlayoffStage, &PlayoffEntry)> {
    PlayoffStage::ALL
      .iter()
      .flat_map(|&stage| {
        self
          .stage(stage)
          .iter()
          .filter(move |e| e.includes_team(team_code))
          .map(move |e| (stage, e))
      })
      .collect()
  }
}

/// Playoff brackets for both leagues of a season
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayoffResults {
  #[serde(rename = "SHL", default)]
  pub shl: PlayoffBracket,
  #[serde(rename = "HA", default)]
  pub ha: Option<PlayoffBracket>,
}

/// Team metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
  pub code: String,
  pub name: String,
  #[serde(default)]
  pub shortname: String,
  /// Championship seasons
  #[serde(default)]
  pub golds: Vec<String>,
}

/// Player with season totals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
  pub id: i64,
  pub first_name: String,
  pub family_name: String,
  #[serde(default)]
  pub jersey: u32,
  #[serde(default)]
  pub position: String,
  pub team_code: String,
  #[serde(default)]
  pub gp: u32,
  #[serde(default)]
  pub g: u32,
  #[serde(default)]
  pub a: u32,
  #[serde(default)]
  pub pim: u32,
}

impl Player {
  pub fn points(&self) -> u32 {
    self.g + self.a
  }
}

/// Per-team box score numbers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamGameStats {
  pub g: u32,
  pub sog: u32,
  pub pim: u32,
  pub fow: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameStats {
  pub home: TeamGameStats,
  pub away: TeamGameStats,
}

/// In-game event (goal, penalty, period change, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameEvent {
  #[serde(rename = "type")]
  pub event_type: String,
  #[serde(default)]
  pub period: u32,
  #[serde(default)]
  pub time: String,
  #[serde(default)]
  pub team: Option<String>,
  #[serde(default)]
  pub player: Option<String>,
}

/// Everything the server knows about a single game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameDetails {
  pub game: Game,
  #[serde(default)]
  pub events: Vec<GameEvent>,
  #[serde(default)]
  pub stats: Option<GameStats>,
}

/// Server status message (maintenance notices and the like)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerStatus {
  #[serde(default)]
  pub message: Option<String>,
  #[serde(flatten)]
  pub extra: HashMap<String, serde_json::Value>,
}
