//! League API: domain model, HTTP access and the caching sync client.

pub mod api_types;
pub mod cache;
pub mod client;
pub mod registration;
pub mod standings;
pub mod sync_client;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use api_types::{EndLiveActivity, StartLiveActivity, UserRegistration, VoteBody};
pub use cache::{MutationKey, ResourceKey};
pub use client::{HttpResponse, LeagueApi, ReqwestTransport, Transport};
pub use registration::UserRegistrar;
pub use standings::live_standings;
pub use sync_client::{MaxAges, SubmitPolicy, SyncClient};
pub use types::{
  apply_votes_to, Game, GameDetails, GameState, GameStatus, GameType, League, Pick,
  PlayoffBracket, PlayoffEntry, PlayoffResults, PlayoffStage, Player, ServerStatus, Standing,
  StandingResults, Team, VotesPerGame,
};
