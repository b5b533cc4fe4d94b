//! Offline-first sync layer for hockey league data.
//!
//! Fetches games, standings, playoffs, teams and players from the league
//! API, keeps them in a versioned on-disk cache, throttles refetches per
//! resource and submits user mutations (registration, votes, live
//! activities) with duplicate suppression.

pub mod cache;
pub mod config;
pub mod debounce;
pub mod error;
pub mod league;

pub use error::{Result, SyncError};
