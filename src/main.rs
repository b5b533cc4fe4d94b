use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use serde::Serialize;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use rinksync::cache::FetchResult;
use rinksync::config::Config;
use rinksync::league::{League, SyncClient, VoteBody};

#[derive(Parser, Debug)]
#[command(name = "rinksync")]
#[command(about = "Fetch and cache hockey league data, offline-first")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/rinksync/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Season to query (defaults to default_season from the config)
  #[arg(short, long)]
  season: Option<u32>,

  /// Also log to stderr
  #[arg(short, long)]
  verbose: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Refresh games, standings, teams and playoffs together
  Sync,
  /// Season schedule
  Games {
    /// Read the cache only, never the network
    #[arg(long)]
    offline: bool,
  },
  /// League tables
  Standings {
    /// Count games in progress at their current score
    #[arg(long)]
    live: bool,
    #[arg(long, default_value = "shl")]
    league: String,
  },
  /// All teams
  Teams,
  /// Playoff brackets
  Playoffs,
  /// Roster for one team
  Players { team_code: String },
  /// Single game with events and stats
  Game { game_uuid: String },
  /// Server status message
  Status,
  /// Pick a winner for a game
  Vote {
    game_uuid: String,
    team: String,
    #[arg(long)]
    user_id: Option<String>,
  },
  /// Remove cache entries written by other versions
  ClearOld,
}

/// Set up file logging (and stderr with --verbose). Keep the guard alive
/// until exit so buffered lines are flushed.
fn init_tracing(verbose: bool) -> Option<WorkerGuard> {
  let filter = EnvFilter::try_from_env("RINKSYNC_LOG").unwrap_or_else(|_| EnvFilter::new("info"));

  let (file_layer, guard) = match Config::log_dir() {
    Some(dir) => {
      let appender = tracing_appender::rolling::daily(dir, "rinksync.log");
      let (writer, guard) = tracing_appender::non_blocking(appender);
      (
        Some(fmt::layer().with_writer(writer).with_ansi(false)),
        Some(guard),
      )
    }
    None => (None, None),
  };
  let stderr_layer = verbose.then(|| fmt::layer().with_writer(std::io::stderr));

  tracing_subscriber::registry()
    .with(filter)
    .with(file_layer)
    .with(stderr_layer)
    .init();

  guard
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}

/// Print a fetch result, or fail if neither network nor cache had it.
fn print_result<T: Serialize>(what: &str, result: FetchResult<T>) -> Result<()> {
  tracing::debug!(what, source = ?result.source, "Fetch finished");
  match result.value {
    Some(value) => print_json(&value),
    None => Err(eyre!("No {} available (offline and nothing cached)", what)),
  }
}

fn parse_league(value: &str) -> Result<League> {
  match value.to_ascii_lowercase().as_str() {
    "shl" => Ok(League::Shl),
    "ha" => Ok(League::Ha),
    other => Err(eyre!("Unknown league '{}', expected shl or ha", other)),
  }
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();
  let _guard = init_tracing(args.verbose);

  // Load configuration
  let config = Config::load(args.config.as_deref())?;
  let season = args
    .season
    .or(config.default_season)
    .ok_or_else(|| eyre!("No season given. Pass --season or set default_season"));

  let client = SyncClient::from_config(&config)?;

  match args.command {
    Command::Sync => {
      let season = season?;
      let (games, standings, teams, playoffs) = tokio::join!(
        client.games(season),
        client.standings(season),
        client.teams(),
        client.playoffs(season),
      );
      let summary = serde_json::json!({
        "games": games.value.map(|g| g.len()),
        "standings": standings.value.is_some(),
        "teams": teams.value.map(|t| t.len()),
        "playoffs": playoffs.value.is_some(),
      });
      print_json(&summary)?;
    }
    Command::Games { offline } => {
      let season = season?;
      let result = if offline {
        FetchResult::from_cache(client.cached_games(season))
      } else {
        client.games(season).await
      };
      print_result("games", result)?;
    }
    Command::Standings { live, league } => {
      let season = season?;
      let league = parse_league(&league)?;
      let standings = client.standings(season).await;
      let Some(standings) = standings.value else {
        return Err(eyre!("No standings available (offline and nothing cached)"));
      };

      if live {
        let games = client.games(season).await.value.unwrap_or_default();
        print_json(&standings.live_adjusted(league, &games))?;
      } else {
        print_json(&standings.for_league(league))?;
      }
    }
    Command::Teams => print_result("teams", client.teams().await)?,
    Command::Playoffs => print_result("playoffs", client.playoffs(season?).await)?,
    Command::Players { team_code } => {
      print_result("players", client.players(season?, &team_code).await)?
    }
    Command::Game { game_uuid } => {
      let details = client.game_details(&game_uuid).await;
      print_result("game details", FetchResult::from_api(details))?;
    }
    Command::Status => print_result("status", client.server_status().await)?,
    Command::Vote {
      game_uuid,
      team,
      user_id,
    } => {
      let vote = VoteBody {
        game_uuid,
        team,
        user_id,
      };
      match client.vote(&vote).await? {
        Some(votes) => print_json(&votes)?,
        None => println!("Vote recorded"),
      }
    }
    Command::ClearOld => {
      let removed = client.clear_old_versions()?;
      println!("Removed {} stale cache entries", removed);
    }
  }

  Ok(())
}
