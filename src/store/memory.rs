//! In-memory backend: the test double, also usable for ephemeral runs.

use std::collections::HashMap;
use std::sync::Mutex;

use color_eyre::{eyre::eyre, Result};

use super::traits::{CachedEntry, StoreBackend};

/// Backend keeping every store in a process-local map.
#[derive(Default)]
pub struct MemoryBackend {
  stores: Mutex<HashMap<String, HashMap<String, CachedEntry>>>,
}

impl MemoryBackend {
  pub fn new() -> Self {
    Self::default()
  }

  fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, HashMap<String, CachedEntry>>>> {
    self
      .stores
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))
  }
}

impl StoreBackend for MemoryBackend {
  fn open_store(&self, name: &str) -> Result<()> {
    self.lock()?.entry(name.to_string()).or_default();
    Ok(())
  }

  fn get(&self, store: &str, key: &str) -> Result<Option<CachedEntry>> {
    Ok(self.lock()?.get(store).and_then(|s| s.get(key)).cloned())
  }

  fn put(&self, store: &str, key: &str, entry: CachedEntry) -> Result<()> {
    self
      .lock()?
      .entry(store.to_string())
      .or_default()
      .insert(key.to_string(), entry);
    Ok(())
  }

  fn delete(&self, store: &str, key: &str) -> Result<()> {
    if let Some(s) = self.lock()?.get_mut(store) {
      s.remove(key);
    }
    Ok(())
  }

  fn list_store_names(&self) -> Result<Vec<String>> {
    let mut names: Vec<String> = self.lock()?.keys().cloned().collect();
    names.sort();
    Ok(names)
  }

  fn delete_store(&self, name: &str) -> Result<()> {
    self.lock()?.remove(name);
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::http::Response;

  fn entry(body: &str) -> CachedEntry {
    CachedEntry::from_response(&Response::new(200).with_body(body))
  }

  #[test]
  fn test_put_get_roundtrip() {
    let backend = MemoryBackend::new();
    backend.put("s1", "GET https://a/x", entry("hello")).unwrap();

    let got = backend.get("s1", "GET https://a/x").unwrap().unwrap();
    assert_eq!(got.body, b"hello");
    assert!(backend.get("s1", "GET https://a/y").unwrap().is_none());
  }

  #[test]
  fn test_put_replaces_prior_entry() {
    let backend = MemoryBackend::new();
    backend.put("s1", "k", entry("first")).unwrap();
    backend.put("s1", "k", entry("second")).unwrap();

    let got = backend.get("s1", "k").unwrap().unwrap();
    assert_eq!(got.body, b"second");
  }

  #[test]
  fn test_delete_store_removes_entries() {
    let backend = MemoryBackend::new();
    backend.open_store("s1").unwrap();
    backend.put("s1", "k", entry("x")).unwrap();
    backend.delete_store("s1").unwrap();

    assert!(backend.list_store_names().unwrap().is_empty());
    assert!(backend.get("s1", "k").unwrap().is_none());
  }

  #[test]
  fn test_list_includes_empty_stores() {
    let backend = MemoryBackend::new();
    backend.open_store("empty").unwrap();
    backend.put("filled", "k", entry("x")).unwrap();

    assert_eq!(
      backend.list_store_names().unwrap(),
      vec!["empty".to_string(), "filled".to_string()]
    );
  }
}
