//! Raw HTTP access to the league API.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use tracing::debug;
use url::Url;

use crate::error::{Result, SyncError};

use super::cache::{MutationKey, ResourceKey};

/// Header carrying the API key on mutations.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Status code and body of an HTTP exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
  pub status: u16,
  pub body: Vec<u8>,
}

/// The network seam. Production uses [`ReqwestTransport`].
#[async_trait]
pub trait Transport: Send + Sync {
  async fn get(&self, url: &Url) -> Result<HttpResponse>;

  async fn post_json(&self, url: &Url, api_key: &str, body: Vec<u8>) -> Result<HttpResponse>;
}

/// HTTP transport backed by reqwest. Timeouts are reqwest's defaults.
#[derive(Clone, Default)]
pub struct ReqwestTransport {
  http: reqwest::Client,
}

impl ReqwestTransport {
  pub fn new() -> Self {
    Self::default()
  }
}

#[async_trait]
impl Transport for ReqwestTransport {
  async fn get(&self, url: &Url) -> Result<HttpResponse> {
    let response = self.http.get(url.clone()).send().await?;
    let status = response.status().as_u16();
    let body = response.bytes().await?.to_vec();
    Ok(HttpResponse { status, body })
  }

  async fn post_json(&self, url: &Url, api_key: &str, body: Vec<u8>) -> Result<HttpResponse> {
    let response = self
      .http
      .post(url.clone())
      .header(CONTENT_TYPE, "application/json")
      .header(API_KEY_HEADER, api_key)
      .body(body)
      .send()
      .await?;
    let status = response.status().as_u16();
    let body = response.bytes().await?.to_vec();
    Ok(HttpResponse { status, body })
  }
}

/// League API client: URL building, status checks and JSON decoding.
#[derive(Clone)]
pub struct LeagueApi {
  transport: Arc<dyn Transport>,
  base_url: Url,
  /// Only mutations need a key; reads work without one
  api_key: Option<String>,
}

impl LeagueApi {
  pub fn new(
    base_url: &str,
    api_key: Option<String>,
    transport: Arc<dyn Transport>,
  ) -> Result<Self> {
    // A base without a trailing slash would lose its last segment on join
    let normalized = if base_url.ends_with('/') {
      base_url.to_string()
    } else {
      format!("{}/", base_url)
    };
    let base_url = Url::parse(&normalized)?;
    if base_url.cannot_be_a_base() {
      return Err(SyncError::InvalidEndpoint(normalized));
    }

    Ok(Self {
      transport,
      base_url,
      api_key,
    })
  }

  pub fn base_url(&self) -> &Url {
    &self.base_url
  }

  /// URL of a readable resource. Identifiers are percent-encoded as path
  /// segments, so a `/` or `?` inside one cannot change the route.
  pub fn resource_url(&self, key: &ResourceKey) -> Result<Url> {
    let mut url = self.base_url.clone();
    url
      .path_segments_mut()
      .map_err(|_| SyncError::InvalidEndpoint(self.base_url.to_string()))?
      .pop_if_empty()
      .extend(key.segments());
    Ok(url)
  }

  pub fn mutation_url(&self, key: &MutationKey) -> Result<Url> {
    Ok(self.base_url.join(key.path())?)
  }

  /// GET and decode a JSON body. Any non-2xx status is an error.
  pub async fn get_json<T: DeserializeOwned>(&self, url: &Url) -> Result<T> {
    let response = self.transport.get(url).await?;
    debug!(url = %url, status = response.status, bytes = response.body.len(), "GET");

    if !(200..300).contains(&response.status) {
      return Err(SyncError::Status {
        status: response.status,
      });
    }
    Ok(serde_json::from_slice(&response.body)?)
  }

  /// POST a JSON body. Only an exact 200 counts as success.
  ///
  /// Fails with [`SyncError::MissingApiKey`] before any request when no key
  /// is configured.
  pub async fn post_json<B: Serialize>(&self, url: &Url, body: &B) -> Result<Vec<u8>> {
    let api_key = self.api_key.as_deref().ok_or(SyncError::MissingApiKey)?;
    let body = serde_json::to_vec(body)?;
    let response = self.transport.post_json(url, api_key, body).await?;
    debug!(url = %url, status = response.status, "POST");

    if response.status != 200 {
      return Err(SyncError::Status {
        status: response.status,
      });
    }
    Ok(response.body)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  struct Unreachable;

  #[async_trait]
  impl Transport for Unreachable {
    async fn get(&self, _url: &Url) -> Result<HttpResponse> {
      Err(SyncError::Transport("unreachable".to_string()))
    }

    async fn post_json(&self, _url: &Url, _api_key: &str, _body: Vec<u8>) -> Result<HttpResponse> {
      Err(SyncError::Transport("unreachable".to_string()))
    }
  }

  fn api(base: &str) -> Result<LeagueApi> {
    LeagueApi::new(base, Some("secret".to_string()), Arc::new(Unreachable))
  }

  #[test]
  fn test_urls_keep_base_path() {
    let api = api("https://api.example.com/v1").unwrap();
    assert_eq!(
      api
        .resource_url(&ResourceKey::Games { season: 2024 })
        .unwrap()
        .as_str(),
      "https://api.example.com/v1/games/2024"
    );
    assert_eq!(
      api
        .mutation_url(&MutationKey::LiveActivityEnd {
          game_uuid: "g1".to_string()
        })
        .unwrap()
        .as_str(),
      "https://api.example.com/v1/live-activity/end"
    );
  }

  #[test]
  fn test_invalid_base_url() {
    assert!(matches!(
      api("not a url"),
      Err(SyncError::InvalidEndpoint(_))
    ));
    assert!(matches!(
      api("mailto:someone@example.com"),
      Err(SyncError::InvalidEndpoint(_))
    ));
  }

  #[test]
  fn test_identifiers_are_encoded_as_single_segments() {
    let api = api("https://api.example.com/v1").unwrap();
    let url = api
      .resource_url(&ResourceKey::Players {
        season: 2024,
        team_code: "A/B?x".to_string(),
      })
      .unwrap();
    assert_eq!(
      url.as_str(),
      "https://api.example.com/v1/players/2024/A%2FB%3Fx"
    );
    assert_eq!(url.query(), None);

    let url = api
      .resource_url(&ResourceKey::GameDetails {
        game_uuid: "../user".to_string(),
      })
      .unwrap();
    assert!(url.as_str().starts_with("https://api.example.com/v1/game/"));
  }

  #[tokio::test]
  async fn test_post_without_api_key_is_rejected_before_sending() {
    let api = LeagueApi::new("https://api.example.com", None, Arc::new(Unreachable)).unwrap();
    let url = api.mutation_url(&MutationKey::User).unwrap();

    // Reads are still possible without a key
    assert!(api.resource_url(&ResourceKey::Teams).is_ok());
    let err = api.post_json(&url, &serde_json::json!({})).await.unwrap_err();
    assert!(matches!(err, SyncError::MissingApiKey));
  }

  #[tokio::test]
  async fn test_transport_error_propagates() {
    let api = api("https://api.example.com").unwrap();
    let url = api.resource_url(&ResourceKey::Teams).unwrap();
    let err = api.get_json::<serde_json::Value>(&url).await.unwrap_err();
    assert!(matches!(err, SyncError::Transport(_)));
  }
}
