//! The store registry: version-qualified tier names over a shared backend.

use std::sync::Arc;

use color_eyre::Result;

use super::traits::{CachedEntry, StoreBackend};
use crate::http::Request;

/// The three store tiers. Exactly one store exists per tier per version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
  Static,
  Dynamic,
  Api,
}

impl Tier {
  pub const ALL: [Tier; 3] = [Tier::Static, Tier::Dynamic, Tier::Api];

  fn suffix(&self) -> &'static str {
    match self {
      Tier::Static => "static",
      Tier::Dynamic => "dynamic",
      Tier::Api => "api",
    }
  }
}

/// Owns the set of named stores for the current version.
///
/// Stores are created lazily on first `open` and deleted only by the
/// lifecycle sweep. Changing the version tag makes a disjoint set of store
/// names; prior versions become unreachable, not mutated.
#[derive(Clone)]
pub struct StoreRegistry {
  backend: Arc<dyn StoreBackend>,
  prefix: String,
  version: String,
}

impl StoreRegistry {
  pub fn new(backend: Arc<dyn StoreBackend>, prefix: &str, version: &str) -> Self {
    Self {
      backend,
      prefix: prefix.to_string(),
      version: version.to_string(),
    }
  }

  /// Namespace prefix shared by every store this application owns.
  pub fn prefix(&self) -> &str {
    &self.prefix
  }

  /// Store name for a tier under the current version.
  pub fn store_name(&self, tier: Tier) -> String {
    format!("{}-{}-{}", self.prefix, self.version, tier.suffix())
  }

  /// The three current-version store names.
  pub fn current_names(&self) -> Vec<String> {
    Tier::ALL.iter().map(|t| self.store_name(*t)).collect()
  }

  /// Open a tier's store, creating it on first call. Handles returned from
  /// separate calls address the same underlying store.
  pub fn open(&self, tier: Tier) -> Result<Store> {
    let name = self.store_name(tier);
    self.backend.open_store(&name)?;
    Ok(Store {
      backend: Arc::clone(&self.backend),
      name,
    })
  }

  /// Names of every store the backend currently holds, any version.
  pub fn list_all(&self) -> Result<Vec<String>> {
    self.backend.list_store_names()
  }

  /// Drop a store by name, entries included.
  pub fn delete(&self, name: &str) -> Result<()> {
    self.backend.delete_store(name)
  }
}

/// Handle to one named store.
#[derive(Clone)]
pub struct Store {
  backend: Arc<dyn StoreBackend>,
  name: String,
}

impl Store {
  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn get(&self, request: &Request) -> Result<Option<CachedEntry>> {
    self.backend.get(&self.name, &request.identity())
  }

  pub fn put(&self, request: &Request, entry: CachedEntry) -> Result<()> {
    self.backend.put(&self.name, &request.identity(), entry)
  }

  /// Remove one entry. The strategies never call this (entries die with
  /// their store), but the store contract includes it.
  #[allow(dead_code)]
  pub fn delete(&self, request: &Request) -> Result<()> {
    self.backend.delete(&self.name, &request.identity())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::http::{Request, Response};
  use crate::store::MemoryBackend;
  use url::Url;

  fn registry() -> StoreRegistry {
    StoreRegistry::new(Arc::new(MemoryBackend::new()), "cachefront", "v1")
  }

  fn get(url: &str) -> Request {
    Request::get(Url::parse(url).unwrap())
  }

  #[test]
  fn test_store_names_are_version_qualified() {
    let registry = registry();
    assert_eq!(registry.store_name(Tier::Static), "cachefront-v1-static");
    assert_eq!(registry.store_name(Tier::Dynamic), "cachefront-v1-dynamic");
    assert_eq!(registry.store_name(Tier::Api), "cachefront-v1-api");
  }

  #[test]
  fn test_open_is_idempotent_and_handles_share_state() {
    let registry = registry();
    let first = registry.open(Tier::Static).unwrap();
    let second = registry.open(Tier::Static).unwrap();

    let req = get("https://app.example/site.css");
    let entry = CachedEntry::from_response(&Response::new(200).with_body("body {}"));
    first.put(&req, entry).unwrap();

    // A write through one handle is visible through the other.
    let seen = second.get(&req).unwrap().unwrap();
    assert_eq!(seen.body, b"body {}");

    // Opening twice did not create a second store.
    assert_eq!(registry.list_all().unwrap(), vec!["cachefront-v1-static"]);
  }

  #[test]
  fn test_new_version_uses_disjoint_stores() {
    let backend: Arc<dyn StoreBackend> = Arc::new(MemoryBackend::new());
    let v1 = StoreRegistry::new(Arc::clone(&backend), "cachefront", "v1");
    let v2 = StoreRegistry::new(Arc::clone(&backend), "cachefront", "v2");

    let req = get("https://app.example/site.css");
    let entry = CachedEntry::from_response(&Response::new(200).with_body("old"));
    v1.open(Tier::Static).unwrap().put(&req, entry).unwrap();

    // The v2 store starts empty; v1's entry is unreachable from it.
    assert!(v2.open(Tier::Static).unwrap().get(&req).unwrap().is_none());
  }
}
