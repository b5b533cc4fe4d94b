//! Wire-format helpers and request bodies for the league API.
//!
//! Response payloads deserialize straight into the domain types; this module
//! holds what only exists on the wire: date handling and POST bodies.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Remove a fractional-seconds component (`.123`) from an ISO-8601 timestamp.
pub fn strip_fractional_seconds(value: &str) -> Cow<'_, str> {
  let Some(t_pos) = value.find('T') else {
    return Cow::Borrowed(value);
  };
  let Some(dot) = value[t_pos..].find('.').map(|i| i + t_pos) else {
    return Cow::Borrowed(value);
  };

  let digits = value[dot + 1..]
    .bytes()
    .take_while(|b| b.is_ascii_digit())
    .count();
  if digits == 0 {
    return Cow::Borrowed(value);
  }

  let mut stripped = String::with_capacity(value.len());
  stripped.push_str(&value[..dot]);
  stripped.push_str(&value[dot + 1 + digits..]);
  Cow::Owned(stripped)
}

/// Parse a server timestamp. Accepts RFC 3339 with or without fractional
/// seconds; a timestamp without an offset is taken as UTC.
pub fn parse_datetime(value: &str) -> Option<DateTime<Utc>> {
  let value = strip_fractional_seconds(value.trim());

  if let Ok(dt) = DateTime::parse_from_rfc3339(&value) {
    return Some(dt.with_timezone(&Utc));
  }

  NaiveDateTime::parse_from_str(&value, "%Y-%m-%dT%H:%M:%S")
    .ok()
    .map(|dt| dt.and_utc())
}

/// Serde adapter for server timestamps.
pub mod iso8601 {
  use chrono::{DateTime, SecondsFormat, Utc};
  use serde::{de::Error, Deserialize, Deserializer, Serializer};

  pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&dt.to_rfc3339_opts(SecondsFormat::Secs, true))
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(deserializer)?;
    super::parse_datetime(&raw).ok_or_else(|| D::Error::custom(format!("invalid date '{}'", raw)))
  }
}

// ============================================================================
// POST bodies
// ============================================================================

/// `POST /vote`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteBody {
  pub game_uuid: String,
  pub team: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub user_id: Option<String>,
}

/// `POST /user`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRegistration {
  pub id: String,
  pub teams: Vec<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub apn_token: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub app_version: Option<String>,
}

/// `POST /live-activity/start`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartLiveActivity {
  pub user_id: String,
  pub token: String,
  pub game_uuid: String,
}

/// `POST /live-activity/end`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndLiveActivity {
  pub user_id: String,
  pub game_uuid: String,
}
