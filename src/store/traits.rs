//! Backend trait and the cached entry record.

use chrono::{DateTime, Utc};
use color_eyre::Result;
use serde::{Deserialize, Serialize};

use crate::http::{Headers, Response};

/// A stored response. Immutable once written: a fresh put fully replaces any
/// prior value for the same key, never merges.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedEntry {
  pub status: u16,
  pub headers: Headers,
  pub body: Vec<u8>,
  /// Set for entries whose strategy applies a TTL (the api tier).
  pub cached_at: Option<DateTime<Utc>>,
}

impl CachedEntry {
  /// Snapshot a response for storage.
  pub fn from_response(response: &Response) -> Self {
    Self {
      status: response.status,
      headers: response.headers.clone(),
      body: response.body.clone(),
      cached_at: None,
    }
  }

  pub fn with_timestamp(mut self, at: DateTime<Utc>) -> Self {
    self.cached_at = Some(at);
    self
  }

  /// Reconstruct the response this entry was snapshotted from.
  pub fn into_response(self) -> Response {
    Response {
      status: self.status,
      headers: self.headers,
      body: self.body,
    }
  }
}

/// Persistence backend for named stores.
///
/// Implementations must be safe for concurrent use; each operation is atomic
/// per entry (no partial-write visibility). Only GET identities are ever
/// used as keys; the strategy engine enforces that invariant.
pub trait StoreBackend: Send + Sync {
  /// Create the store if it does not exist. Idempotent.
  fn open_store(&self, name: &str) -> Result<()>;

  /// Look up an entry by key.
  fn get(&self, store: &str, key: &str) -> Result<Option<CachedEntry>>;

  /// Write an entry, replacing any prior value for the key.
  fn put(&self, store: &str, key: &str, entry: CachedEntry) -> Result<()>;

  /// Remove a single entry. Removing a missing key is not an error.
  fn delete(&self, store: &str, key: &str) -> Result<()>;

  /// Names of every existing store.
  fn list_store_names(&self) -> Result<Vec<String>>;

  /// Drop a whole store and all of its entries.
  fn delete_store(&self, name: &str) -> Result<()>;
}
