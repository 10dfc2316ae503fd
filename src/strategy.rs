//! The strategy engine: one fetch/cache algorithm per request category.
//!
//! Every path terminates in a best-effort response; nothing here propagates
//! an error to the caller. Cache writes on the hot path are spawned off the
//! response path, so a slow or failing store never blocks or fails the
//! reply. Store read errors during fallback count as cache misses.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use url::Url;

use crate::classify::RequestCategory;
use crate::fallback::{api_fallback, html_fallback};
use crate::http::{Request, Response};
use crate::net::Network;
use crate::store::{CachedEntry, StoreRegistry, Tier};

pub struct StrategyEngine {
  registry: StoreRegistry,
  network: Arc<dyn Network>,
  /// How long a cached API response may substitute for a failed fetch.
  api_ttl: Duration,
  /// The application entry point, substituted for unreachable HTML assets
  /// and navigations with no cached copy.
  entry_point: Url,
}

impl StrategyEngine {
  pub fn new(
    registry: StoreRegistry,
    network: Arc<dyn Network>,
    api_ttl: Duration,
    entry_point: Url,
  ) -> Self {
    Self {
      registry,
      network,
      api_ttl,
      entry_point,
    }
  }

  /// Execute the strategy bound to `category` and produce a response.
  pub async fn handle(&self, request: &Request, category: RequestCategory) -> Response {
    match category {
      RequestCategory::Api => self.api_network_first(request).await,
      RequestCategory::StaticAsset => self.static_cache_first(request).await,
      RequestCategory::PageNavigation => self.page_network_first(request).await,
      RequestCategory::OtherDynamic => self.dynamic_network_first(request).await,
    }
  }

  /// Api: network-first with a short-lived cache fallback.
  ///
  /// A non-OK status is treated the same as a transport failure: never
  /// cached, never returned. Non-GET requests skip the store entirely and
  /// fail straight to the synthesized envelope.
  async fn api_network_first(&self, request: &Request) -> Response {
    match self.network.fetch(request).await {
      Ok(resp) if resp.is_ok() => {
        if request.is_get() {
          let entry = CachedEntry::from_response(&resp).with_timestamp(Utc::now());
          self.spawn_write(Tier::Api, request, entry);
        }
        resp
      }
      Ok(resp) => {
        tracing::debug!(status = resp.status, url = %request.url, "API response not OK, using fallback");
        self.api_failure(request)
      }
      Err(e) => {
        tracing::debug!(url = %request.url, "API fetch failed: {}", e);
        self.api_failure(request)
      }
    }
  }

  fn api_failure(&self, request: &Request) -> Response {
    if request.is_get() {
      if let Some(entry) = self.read(Tier::Api, request) {
        if self.is_fresh(entry.cached_at) {
          return entry.into_response();
        }
        tracing::debug!(url = %request.url, "Cached API entry expired");
      }
    }
    api_fallback()
  }

  fn is_fresh(&self, cached_at: Option<DateTime<Utc>>) -> bool {
    // An entry without a timestamp cannot prove its age; treat as expired.
    match cached_at {
      Some(at) => Utc::now() - at < self.api_ttl,
      None => false,
    }
  }

  /// StaticAsset: cache-first. A hit never touches the network.
  async fn static_cache_first(&self, request: &Request) -> Response {
    if request.is_get() {
      if let Some(entry) = self.read(Tier::Static, request) {
        return entry.into_response();
      }
    }

    match self.network.fetch(request).await {
      Ok(resp) => {
        // Non-OK responses pass through uncached so error pages never
        // poison the static store.
        if resp.is_ok() && request.is_get() {
          self.spawn_write(Tier::Static, request, CachedEntry::from_response(&resp));
        }
        resp
      }
      Err(e) => {
        tracing::debug!(url = %request.url, "Static fetch failed: {}", e);
        if request.is_get() && is_html_resource(&request.url) {
          if let Some(entry) = self.read_entry_point() {
            return entry.into_response();
          }
        }
        html_fallback()
      }
    }
  }

  /// PageNavigation: network-first, cached copy as fallback, then the
  /// entry point, then the offline page.
  async fn page_network_first(&self, request: &Request) -> Response {
    match self.network.fetch(request).await {
      Ok(resp) if resp.is_ok() => {
        if request.is_get() {
          self.spawn_write(Tier::Dynamic, request, CachedEntry::from_response(&resp));
        }
        resp
      }
      // Non-OK counts as failure for navigations.
      Ok(_) | Err(_) => {
        if request.is_get() {
          if let Some(entry) = self.read(Tier::Dynamic, request) {
            return entry.into_response();
          }
          if let Some(entry) = self.read_entry_point() {
            return entry.into_response();
          }
        }
        html_fallback()
      }
    }
  }

  /// OtherDynamic: network-first, cache as backup.
  async fn dynamic_network_first(&self, request: &Request) -> Response {
    match self.network.fetch(request).await {
      Ok(resp) => {
        if resp.is_ok() && request.is_get() {
          self.spawn_write(Tier::Dynamic, request, CachedEntry::from_response(&resp));
        }
        resp
      }
      Err(e) => {
        tracing::debug!(url = %request.url, "Dynamic fetch failed: {}", e);
        if request.is_get() {
          if let Some(entry) = self.read(Tier::Dynamic, request) {
            return entry.into_response();
          }
        }
        html_fallback()
      }
    }
  }

  /// Read an entry, treating any store error as a miss.
  fn read(&self, tier: Tier, request: &Request) -> Option<CachedEntry> {
    self
      .registry
      .open(tier)
      .and_then(|store| store.get(request))
      .unwrap_or_else(|e| {
        tracing::warn!("Store read for {} failed: {}", request.url, e);
        None
      })
  }

  fn read_entry_point(&self) -> Option<CachedEntry> {
    self.read(Tier::Static, &Request::get(self.entry_point.clone()))
  }

  /// Write an entry off the response path. Failures are logged, never
  /// surfaced; the in-flight response is already on its way back.
  fn spawn_write(&self, tier: Tier, request: &Request, entry: CachedEntry) {
    let registry = self.registry.clone();
    let request = request.clone();
    tokio::spawn(async move {
      let result = registry.open(tier).and_then(|store| store.put(&request, entry));
      match result {
        Ok(()) => tracing::debug!(url = %request.url, tier = ?tier, "Cached response"),
        Err(e) => tracing::warn!("Cache write for {} failed: {}", request.url, e),
      }
    });
  }
}

/// Whether a URL names an HTML resource (used to decide if the entry point
/// is an acceptable substitute).
fn is_html_resource(url: &Url) -> bool {
  let path = url.path();
  if path.ends_with('/') {
    return true;
  }
  matches!(
    crate::classify::path_extension(path),
    Some(ext) if ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm")
  )
}
