//! Live-adjusted standings: a read-only projection that treats games in
//! progress as if they ended at the current score.

use std::collections::HashMap;

use super::types::{Game, GameStatus, GameType, League, Standing, StandingResults};

/// Points a live game would award `team_code` if it ended now.
///
/// The leader takes 3 (2 once in overtime or shootout), the trailing side 0
/// (1 in overtime or shootout). A tied game is headed for overtime, so both
/// sides are credited the point they are guaranteed.
fn projected_points(game: &Game, team_code: &str) -> u32 {
  let extra_time = matches!(
    game.status,
    Some(GameStatus::Overtime | GameStatus::Shootout)
  ) || game.is_overtime_or_shootout();

  match game.leader() {
    None => 1,
    Some(leader) if leader == team_code => {
      if extra_time {
        2
      } else {
        3
      }
    }
    Some(_) => u32::from(extra_time),
  }
}

/// Project standings with every live regular-season game counted at its
/// current score. Playoff and relegation games never touch the table.
///
/// Rows are re-sorted by points, then goal differential, then previous rank,
/// and re-ranked from 1. The input is left untouched.
pub fn live_standings(standings: &[Standing], games: &[Game]) -> Vec<Standing> {
  let mut by_team: HashMap<&str, Vec<&Game>> = HashMap::new();
  let live = games
    .iter()
    .filter(|g| g.is_live() && g.game_type == GameType::Regular);
  for game in live {
    by_team.entry(&game.home_team_code).or_default().push(game);
    by_team.entry(&game.away_team_code).or_default().push(game);
  }

  let mut projected: Vec<Standing> = standings
    .iter()
    .map(|row| {
      let mut row = row.clone();
      for game in by_team.get(row.team_code.as_str()).into_iter().flatten() {
        let (goals_for, goals_against) = game.score_for(&row.team_code);
        row.gp += 1;
        row.points += projected_points(game, &row.team_code);
        row.diff += goals_for as i32 - goals_against as i32;
      }
      row
    })
    .collect();

  projected.sort_by(|a, b| {
    b.points
      .cmp(&a.points)
      .then(b.diff.cmp(&a.diff))
      .then(a.rank.cmp(&b.rank))
  });
  for (i, row) in projected.iter_mut().enumerate() {
    row.rank = i as u32 + 1;
  }

  projected
}

impl StandingResults {
  /// Live-adjusted table for one league, using only that league's games.
  pub fn live_adjusted(&self, league: League, games: &[Game]) -> Vec<Standing> {
    let league_games: Vec<Game> = games
      .iter()
      .filter(|g| g.league == league)
      .cloned()
      .collect();
    live_standings(self.for_league(league), &league_games)
  }
}
