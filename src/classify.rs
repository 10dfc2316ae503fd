//! Request classification.
//!
//! Pure and total: every request maps to exactly one category, derived only
//! from the request's URL and headers. Categories are recomputed per request
//! and never stored. Rule order is load-bearing: a request matching both the
//! API host and a static-asset marker is `Api`.

use crate::http::Request;

/// The closed set of request categories, each bound to one caching strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestCategory {
  /// Requests to the remote API endpoint.
  Api,
  /// Style sheets, scripts, images, fonts, icons.
  StaticAsset,
  /// Requests for an HTML document.
  PageNavigation,
  /// Everything else.
  OtherDynamic,
}

/// Classification rules, loaded from configuration.
#[derive(Debug, Clone)]
pub struct ClassifyRules {
  /// Host of the remote API endpoint.
  pub api_host: String,
  /// File-extension allowlist for static assets (lowercase, no dot).
  pub static_extensions: Vec<String>,
  /// CDN hosts whose responses are always treated as static assets.
  pub static_cdn_hosts: Vec<String>,
}

/// Map a request to its category.
///
/// Priority order, fixed:
/// 1. API host match
/// 2. static-asset markers (extension allowlist or CDN host allowlist)
/// 3. `Accept` header asking for HTML
/// 4. other dynamic
pub fn classify(request: &Request, rules: &ClassifyRules) -> RequestCategory {
  let host = request.url.host_str().unwrap_or("");

  if host.eq_ignore_ascii_case(&rules.api_host) {
    return RequestCategory::Api;
  }

  if is_static_asset(request, rules) {
    return RequestCategory::StaticAsset;
  }

  if accepts_html(request) {
    return RequestCategory::PageNavigation;
  }

  RequestCategory::OtherDynamic
}

fn is_static_asset(request: &Request, rules: &ClassifyRules) -> bool {
  let host = request.url.host_str().unwrap_or("");
  if rules
    .static_cdn_hosts
    .iter()
    .any(|cdn| host.eq_ignore_ascii_case(cdn))
  {
    return true;
  }

  match path_extension(request.url.path()) {
    Some(ext) => rules
      .static_extensions
      .iter()
      .any(|allowed| allowed.eq_ignore_ascii_case(ext)),
    None => false,
  }
}

fn accepts_html(request: &Request) -> bool {
  request
    .headers
    .get("accept")
    .is_some_and(|accept| accept.contains("text/html"))
}

/// Extension of the last path segment, if any.
pub(crate) fn path_extension(path: &str) -> Option<&str> {
  let segment = path.rsplit('/').next().unwrap_or(path);
  match segment.rsplit_once('.') {
    Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => Some(ext),
    _ => None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::http::{Method, Request};
  use url::Url;

  fn rules() -> ClassifyRules {
    ClassifyRules {
      api_host: "api.example".to_string(),
      static_extensions: vec!["css", "js", "png", "woff2", "ico"]
        .into_iter()
        .map(String::from)
        .collect(),
      static_cdn_hosts: vec!["cdn.jsdelivr.net".to_string()],
    }
  }

  fn get(url: &str) -> Request {
    Request::get(Url::parse(url).unwrap())
  }

  #[test]
  fn test_api_host_classifies_as_api() {
    let cat = classify(&get("https://api.example/data?x=1"), &rules());
    assert_eq!(cat, RequestCategory::Api);
  }

  #[test]
  fn test_api_host_wins_over_static_extension() {
    // Rule order is fixed: the API host also serving a .js path is Api.
    let cat = classify(&get("https://api.example/bundle.js"), &rules());
    assert_eq!(cat, RequestCategory::Api);
  }

  #[test]
  fn test_extension_allowlist_classifies_as_static() {
    let cat = classify(&get("https://app.example/assets/site.css"), &rules());
    assert_eq!(cat, RequestCategory::StaticAsset);

    let cat = classify(&get("https://app.example/icon-192.png"), &rules());
    assert_eq!(cat, RequestCategory::StaticAsset);
  }

  #[test]
  fn test_cdn_host_classifies_as_static() {
    let cat = classify(
      &get("https://cdn.jsdelivr.net/npm/bootstrap@5.3.0/dist/css/bootstrap.min.css"),
      &rules(),
    );
    assert_eq!(cat, RequestCategory::StaticAsset);
  }

  #[test]
  fn test_unlisted_extension_is_not_static() {
    let req = get("https://app.example/report.pdf");
    assert_eq!(classify(&req, &rules()), RequestCategory::OtherDynamic);
  }

  #[test]
  fn test_accept_html_classifies_as_navigation() {
    let req = get("https://app.example/inventory")
      .with_header("Accept", "text/html,application/xhtml+xml");
    assert_eq!(classify(&req, &rules()), RequestCategory::PageNavigation);
  }

  #[test]
  fn test_json_accept_is_other_dynamic() {
    let req = get("https://app.example/inventory").with_header("Accept", "application/json");
    assert_eq!(classify(&req, &rules()), RequestCategory::OtherDynamic);
  }

  #[test]
  fn test_no_markers_is_other_dynamic() {
    let req = get("https://app.example/inventory");
    assert_eq!(classify(&req, &rules()), RequestCategory::OtherDynamic);
  }

  #[test]
  fn test_classification_ignores_method() {
    // Non-GET exclusion from caching is the strategy engine's job; the
    // category still selects which fallback a failed request receives.
    let req = Request::new(Method::Post, Url::parse("https://api.example/data").unwrap());
    assert_eq!(classify(&req, &rules()), RequestCategory::Api);
  }

  #[test]
  fn test_path_extension() {
    assert_eq!(path_extension("/a/b/site.min.css"), Some("css"));
    assert_eq!(path_extension("/a/b/page"), None);
    assert_eq!(path_extension("/.hidden"), None);
    assert_eq!(path_extension("/"), None);
  }
}
