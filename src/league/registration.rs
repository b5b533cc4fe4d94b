//! Debounced user registration.
//!
//! Settings screens change followed teams one toggle at a time; each change
//! schedules a registration and only the last one within the quiet period
//! is sent.

use std::time::Duration;
use tracing::warn;

use crate::debounce::Debouncer;

use super::api_types::UserRegistration;
use super::sync_client::SyncClient;

/// Quiet period before a registration is sent.
pub const REGISTRATION_DELAY: Duration = Duration::from_secs(2);

pub struct UserRegistrar {
  client: SyncClient,
  debouncer: Debouncer,
}

impl UserRegistrar {
  pub fn new(client: SyncClient) -> Self {
    Self::with_delay(client, REGISTRATION_DELAY)
  }

  pub fn with_delay(client: SyncClient, delay: Duration) -> Self {
    Self {
      client,
      debouncer: Debouncer::new(delay),
    }
  }

  /// Schedule `registration`, superseding any registration still waiting.
  pub fn schedule(&self, registration: UserRegistration) {
    let client = self.client.clone();
    self.debouncer.trigger(move || async move {
      if let Err(e) = client.register_user(&registration).await {
        warn!(user = %registration.id, error = %e, "User registration failed");
      }
    });
  }

  pub fn is_pending(&self) -> bool {
    self.debouncer.is_pending()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::league::test_support::harness;
  use serde_json::json;

  fn registration(teams: &[&str]) -> UserRegistration {
    UserRegistration {
      id: "user-1".to_string(),
      teams: teams.iter().map(|t| t.to_string()).collect(),
      apn_token: None,
      app_version: None,
    }
  }

  #[tokio::test(start_paused = true)]
  async fn test_rapid_changes_send_one_registration() {
    let h = harness();
    h.transport.reply("user", 200, json!({}));
    let registrar = UserRegistrar::with_delay(h.client.clone(), Duration::from_millis(500));

    registrar.schedule(registration(&["LHF"]));
    tokio::time::sleep(Duration::from_millis(100)).await;
    registrar.schedule(registration(&["LHF", "FHC"]));
    assert!(registrar.is_pending());

    tokio::time::sleep(Duration::from_secs(1)).await;

    assert_eq!(h.transport.post_count(), 1);
    let posts = h.transport.posts.lock().unwrap();
    assert_eq!(posts[0].2["teams"], json!(["LHF", "FHC"]));
  }

  #[tokio::test(start_paused = true)]
  async fn test_unchanged_registration_is_not_resent() {
    let h = harness();
    h.transport.reply("user", 200, json!({}));
    let registrar = UserRegistrar::with_delay(h.client.clone(), Duration::from_millis(500));

    registrar.schedule(registration(&["LHF"]));
    tokio::time::sleep(Duration::from_secs(1)).await;
    registrar.schedule(registration(&["LHF"]));
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert_eq!(h.transport.post_count(), 1);
  }
}
