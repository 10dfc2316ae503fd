//! The worker facade: request routing plus the auxiliary signal surface.
//!
//! Routing is a pure classification followed by a strategy dispatch; there is
//! no event bus. The message channel, background-sync hook and push handler
//! are pass-through contracts around the core.

use std::sync::Arc;

use color_eyre::Result;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use crate::classify::{classify, ClassifyRules};
use crate::config::Config;
use crate::http::{Request, Response};
use crate::lifecycle::{LifecycleManager, WorkerState};
use crate::net::Network;
use crate::store::{StoreBackend, StoreRegistry};
use crate::strategy::StrategyEngine;

/// Messages accepted on the worker's message channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Message {
  /// Force immediate activation instead of waiting.
  #[serde(rename = "SKIP_WAITING")]
  SkipWaiting,
  /// Ask for the current version tag.
  #[serde(rename = "GET_VERSION")]
  GetVersion,
}

/// Reply to `GET_VERSION`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionReply {
  pub version: String,
}

/// A notification constructed from a push signal. Display is the host's
/// concern; this only builds the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
  pub title: String,
  pub body: String,
  pub icon: String,
  pub actions: Vec<NotificationAction>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationAction {
  pub action: String,
  pub title: String,
}

#[derive(Debug, Default, Deserialize)]
struct PushPayload {
  title: Option<String>,
  body: Option<String>,
}

pub struct Worker {
  state: WorkerState,
  version: String,
  rules: ClassifyRules,
  engine: StrategyEngine,
  lifecycle: LifecycleManager,
}

impl Worker {
  pub fn new(
    config: &Config,
    backend: Arc<dyn StoreBackend>,
    network: Arc<dyn Network>,
  ) -> Result<Self> {
    let registry = StoreRegistry::new(backend, &config.prefix, &config.version);

    let engine = StrategyEngine::new(
      registry.clone(),
      Arc::clone(&network),
      chrono::Duration::seconds(config.api_ttl_secs as i64),
      config.entry_point_url()?,
    );

    let lifecycle = LifecycleManager::new(
      registry,
      network,
      config.precache_required_urls()?,
      config.precache_optional_urls()?,
    );

    Ok(Self {
      state: WorkerState::Installing,
      version: config.version.clone(),
      rules: config.classify_rules(),
      engine,
      lifecycle,
    })
  }

  pub fn state(&self) -> WorkerState {
    self.state
  }

  pub fn version(&self) -> &str {
    &self.version
  }

  /// Install signal: seed the static store. Returns the best-effort
  /// optional-precache task.
  pub async fn install(&mut self) -> Result<JoinHandle<()>> {
    self.state = WorkerState::Installing;
    let optional = self.lifecycle.install().await?;
    self.state = WorkerState::Installed;
    tracing::info!(version = %self.version, "Installed");
    Ok(optional)
  }

  /// Activate signal: sweep prior-version stores, then claim all clients
  /// immediately.
  pub fn activate(&mut self) -> Result<Vec<String>> {
    self.state = WorkerState::Activating;
    let deleted = self.lifecycle.activate()?;
    self.state = WorkerState::Active;
    tracing::info!(version = %self.version, swept = deleted.len(), "Activated");
    Ok(deleted)
  }

  /// Fetch signal: classify and run the bound strategy. Always produces a
  /// response.
  pub async fn handle_fetch(&self, request: &Request) -> Response {
    let category = classify(request, &self.rules);
    tracing::debug!(url = %request.url, category = ?category, "Intercepted fetch");
    self.engine.handle(request, category).await
  }

  /// Message channel. `SKIP_WAITING` forces activation state immediately;
  /// `GET_VERSION` replies with the version tag.
  pub fn handle_message(&mut self, message: Message) -> Option<VersionReply> {
    match message {
      Message::SkipWaiting => {
        tracing::info!("Skip-waiting requested, activating immediately");
        self.state = WorkerState::Active;
        None
      }
      Message::GetVersion => Some(VersionReply {
        version: self.version.clone(),
      }),
    }
  }

  /// Background-sync signal. Placeholder hook: nothing to reconcile yet.
  pub fn handle_sync(&self, tag: &str) {
    tracing::debug!(tag, "Sync signal received");
  }

  /// Push signal: build a notification with the fixed icon and action set.
  pub fn handle_push(&self, payload: Option<&str>) -> Notification {
    let parsed: PushPayload = payload
      .and_then(|raw| serde_json::from_str(raw).ok())
      .unwrap_or_default();

    Notification {
      title: parsed.title.unwrap_or_else(|| "Update".to_string()),
      body: parsed
        .body
        .unwrap_or_else(|| "New content is available.".to_string()),
      icon: "./icon-192.png".to_string(),
      actions: vec![
        NotificationAction {
          action: "open".to_string(),
          title: "Open".to_string(),
        },
        NotificationAction {
          action: "dismiss".to_string(),
          title: "Dismiss".to_string(),
        },
      ],
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::net::mock::MockNetwork;
  use crate::store::MemoryBackend;
  use url::Url;

  fn config() -> Config {
    serde_yaml::from_str(
      r#"
version: v3
api_host: api.example
entry_point: https://app.example/index.html
"#,
    )
    .unwrap()
  }

  fn worker() -> (Worker, Arc<MockNetwork>) {
    let network = Arc::new(MockNetwork::new());
    let worker = Worker::new(&config(), Arc::new(MemoryBackend::new()), network.clone()).unwrap();
    (worker, network)
  }

  #[tokio::test]
  async fn test_lifecycle_transitions() {
    let (mut worker, _network) = worker();
    assert_eq!(worker.state(), WorkerState::Installing);

    let optional = worker.install().await.unwrap();
    optional.await.unwrap();
    assert_eq!(worker.state(), WorkerState::Installed);

    worker.activate().unwrap();
    assert_eq!(worker.state(), WorkerState::Active);
  }

  #[tokio::test]
  async fn test_fetch_routes_through_classifier() {
    let (worker, network) = worker();
    let req = Request::get(Url::parse("https://api.example/data").unwrap());
    network.respond(&req.identity(), Response::new(200).with_body(r#"{"x":1}"#));

    let resp = worker.handle_fetch(&req).await;
    assert_eq!(resp.status, 200);
    assert_eq!(resp.body, br#"{"x":1}"#);
  }

  #[test]
  fn test_message_parsing_and_replies() {
    let (mut worker, _network) = worker();

    let msg: Message = serde_json::from_str(r#"{"type":"GET_VERSION"}"#).unwrap();
    let reply = worker.handle_message(msg).unwrap();
    assert_eq!(reply.version, "v3");

    let msg: Message = serde_json::from_str(r#"{"type":"SKIP_WAITING"}"#).unwrap();
    assert!(worker.handle_message(msg).is_none());
    assert_eq!(worker.state(), WorkerState::Active);

    assert!(serde_json::from_str::<Message>(r#"{"type":"UNKNOWN"}"#).is_err());
  }

  #[test]
  fn test_push_builds_fixed_notification() {
    let (worker, _network) = worker();

    let note = worker.handle_push(Some(r#"{"title":"Stock low","body":"Item 42"}"#));
    assert_eq!(note.title, "Stock low");
    assert_eq!(note.body, "Item 42");
    assert_eq!(note.icon, "./icon-192.png");
    assert_eq!(note.actions.len(), 2);

    // Malformed or absent payloads still produce a notification.
    let note = worker.handle_push(None);
    assert_eq!(note.title, "Update");
    let note = worker.handle_push(Some("not json"));
    assert_eq!(note.title, "Update");
  }
}
