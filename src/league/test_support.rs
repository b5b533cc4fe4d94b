//! Shared fixtures for sync client tests: a scripted transport and a
//! client wired to in-memory storage and a manual clock.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

use crate::cache::{Cache, ManualClock, SqliteStorage};
use crate::error::{Result, SyncError};

use super::client::{HttpResponse, LeagueApi, Transport};
use super::sync_client::{MaxAges, SyncClient};

pub(crate) const BASE: &str = "https://api.example.com";

#[derive(Clone)]
pub(crate) enum Scripted {
  Reply(u16, Vec<u8>),
  Fail,
}

/// Records every request and answers from a per-URL script.
#[derive(Default)]
pub(crate) struct MockTransport {
  pub(crate) responses: Mutex<HashMap<String, Scripted>>,
  pub(crate) gets: Mutex<Vec<String>>,
  pub(crate) posts: Mutex<Vec<(String, String, serde_json::Value)>>,
  pub(crate) delay: Option<Duration>,
}

impl MockTransport {
  pub(crate) fn reply(&self, path: &str, status: u16, body: serde_json::Value) {
    self.responses.lock().unwrap().insert(
      format!("{}/{}", BASE, path),
      Scripted::Reply(status, serde_json::to_vec(&body).unwrap()),
    );
  }

  pub(crate) fn fail(&self, path: &str) {
    self
      .responses
      .lock()
      .unwrap()
      .insert(format!("{}/{}", BASE, path), Scripted::Fail);
  }

  pub(crate) fn get_count(&self) -> usize {
    self.gets.lock().unwrap().len()
  }

  pub(crate) fn post_count(&self) -> usize {
    self.posts.lock().unwrap().len()
  }

  fn respond(&self, url: &Url) -> Result<HttpResponse> {
    let scripted = self.responses.lock().unwrap().get(url.as_str()).cloned();
    match scripted {
      Some(Scripted::Reply(status, body)) => Ok(HttpResponse { status, body }),
      Some(Scripted::Fail) | None => Err(SyncError::Transport("connection refused".to_string())),
    }
  }
}

#[async_trait]
impl Transport for MockTransport {
  async fn get(&self, url: &Url) -> Result<HttpResponse> {
    self.gets.lock().unwrap().push(url.to_string());
    if let Some(delay) = self.delay {
      tokio::time::sleep(delay).await;
    }
    self.respond(url)
  }

  async fn post_json(&self, url: &Url, api_key: &str, body: Vec<u8>) -> Result<HttpResponse> {
    let body = serde_json::from_slice(&body).unwrap();
    self
      .posts
      .lock()
      .unwrap()
      .push((url.to_string(), api_key.to_string(), body));
    self.respond(url)
  }
}

pub(crate) struct Harness {
  pub(crate) transport: Arc<MockTransport>,
  pub(crate) clock: Arc<ManualClock>,
  pub(crate) storage: Arc<SqliteStorage>,
  pub(crate) client: SyncClient,
}

pub(crate) fn harness_with(transport: MockTransport) -> Harness {
  let transport = Arc::new(transport);
  let storage = Arc::new(SqliteStorage::open_in_memory().unwrap());
  let clock = Arc::new(ManualClock::new(
    Utc.with_ymd_and_hms(2024, 10, 1, 19, 0, 0).unwrap(),
  ));
  let api = LeagueApi::new(BASE, Some("secret".to_string()), transport.clone()).unwrap();
  let cache = Cache::new(storage.clone(), Some("1.0"));
  let client = SyncClient::new(api, cache, clock.clone(), MaxAges::default());
  Harness {
    transport,
    clock,
    storage,
    client,
  }
}

pub(crate) fn harness() -> Harness {
  harness_with(MockTransport::default())
}

