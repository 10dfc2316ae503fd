//! Worker lifecycle: install-time seeding and the activation sweep.
//!
//! Runs outside the per-request flow. Install seeds the static store with
//! the required resources (all-or-nothing) and prefetches the optional list
//! best-effort; activation deletes every prior version's stores.

use std::sync::Arc;

use color_eyre::{eyre::eyre, Result};
use tokio::task::JoinHandle;
use url::Url;

use crate::http::Request;
use crate::net::Network;
use crate::store::{CachedEntry, StoreRegistry, Tier};

/// Lifecycle states, in transition order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
  /// Seeding the static store.
  Installing,
  /// Seeded, waiting to activate.
  Installed,
  /// Sweeping prior-version stores.
  Activating,
  /// Intercepting fetches for all clients.
  Active,
}

impl std::fmt::Display for WorkerState {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      WorkerState::Installing => write!(f, "installing"),
      WorkerState::Installed => write!(f, "installed"),
      WorkerState::Activating => write!(f, "activating"),
      WorkerState::Active => write!(f, "active"),
    }
  }
}

pub struct LifecycleManager {
  registry: StoreRegistry,
  network: Arc<dyn Network>,
  required: Vec<Url>,
  optional: Vec<Url>,
}

impl LifecycleManager {
  pub fn new(
    registry: StoreRegistry,
    network: Arc<dyn Network>,
    required: Vec<Url>,
    optional: Vec<Url>,
  ) -> Self {
    Self {
      registry,
      network,
      required,
      optional,
    }
  }

  /// Seed the static store.
  ///
  /// Required resources are all-or-nothing: every fetch must succeed before
  /// anything is written, and any failure aborts installation. The optional
  /// list is prefetched in a spawned task whose individual failures are
  /// logged and ignored; the returned handle lets callers await it off the
  /// critical path.
  pub async fn install(&self) -> Result<JoinHandle<()>> {
    let store = self.registry.open(Tier::Static)?;

    let mut seeded = Vec::with_capacity(self.required.len());
    for url in &self.required {
      let request = Request::get(url.clone());
      let resp = self
        .network
        .fetch(&request)
        .await
        .map_err(|e| eyre!("Required resource {} failed: {}", url, e))?;
      if !resp.is_ok() {
        return Err(eyre!(
          "Required resource {} returned status {}",
          url,
          resp.status
        ));
      }
      seeded.push((request, CachedEntry::from_response(&resp)));
    }
    for (request, entry) in seeded {
      store.put(&request, entry)?;
    }
    tracing::info!(
      store = store.name(),
      count = self.required.len(),
      "Seeded required resources"
    );

    let registry = self.registry.clone();
    let network = Arc::clone(&self.network);
    let optional = self.optional.clone();
    let handle = tokio::spawn(async move {
      let store = match registry.open(Tier::Static) {
        Ok(store) => store,
        Err(e) => {
          tracing::warn!("Optional prefetch skipped, store unavailable: {}", e);
          return;
        }
      };

      let store = &store;
      let network = &network;
      let fetches = optional.iter().map(|url| async move {
        let request = Request::get(url.clone());
        match network.fetch(&request).await {
          Ok(resp) if resp.is_ok() => {
            if let Err(e) = store.put(&request, CachedEntry::from_response(&resp)) {
              tracing::warn!("Optional resource {} not cached: {}", url, e);
            }
          }
          Ok(resp) => {
            tracing::warn!(status = resp.status, "Optional resource {} not cached", url);
          }
          Err(e) => {
            tracing::warn!("Optional resource {} failed: {}", url, e);
          }
        }
      });
      futures::future::join_all(fetches).await;
    });

    Ok(handle)
  }

  /// Delete every store in this application's namespace whose name is not
  /// one of the current-version tier names. Stores outside the namespace
  /// are left alone. Returns the deleted names.
  pub fn activate(&self) -> Result<Vec<String>> {
    let current = self.registry.current_names();
    let namespace = format!("{}-", self.registry.prefix());

    let mut deleted = Vec::new();
    for name in self.registry.list_all()? {
      if name.starts_with(&namespace) && !current.contains(&name) {
        self.registry.delete(&name)?;
        tracing::info!("Deleted stale store {}", name);
        deleted.push(name);
      }
    }

    Ok(deleted)
  }
}
