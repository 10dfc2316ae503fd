//! Request/response model shared by the classifier, the strategy engine and
//! the stores.

use serde::{Deserialize, Serialize};
use url::Url;

/// HTTP request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
  Get,
  Head,
  Post,
  Put,
  Patch,
  Delete,
  Options,
}

impl Method {
  pub fn as_str(&self) -> &'static str {
    match self {
      Method::Get => "GET",
      Method::Head => "HEAD",
      Method::Post => "POST",
      Method::Put => "PUT",
      Method::Patch => "PATCH",
      Method::Delete => "DELETE",
      Method::Options => "OPTIONS",
    }
  }

  /// Parse a method name (case-insensitive). Unknown names map to None.
  pub fn parse(s: &str) -> Option<Self> {
    match s.to_ascii_uppercase().as_str() {
      "GET" => Some(Method::Get),
      "HEAD" => Some(Method::Head),
      "POST" => Some(Method::Post),
      "PUT" => Some(Method::Put),
      "PATCH" => Some(Method::Patch),
      "DELETE" => Some(Method::Delete),
      "OPTIONS" => Some(Method::Options),
      _ => None,
    }
  }
}

impl std::fmt::Display for Method {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

/// An ordered header map with case-insensitive names.
///
/// Insertion order is preserved; setting an existing name replaces its value
/// in place rather than appending a duplicate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Headers(Vec<(String, String)>);

impl Headers {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn set(&mut self, name: &str, value: &str) {
    for (existing, v) in &mut self.0 {
      if existing.eq_ignore_ascii_case(name) {
        *v = value.to_string();
        return;
      }
    }
    self.0.push((name.to_string(), value.to_string()));
  }

  pub fn get(&self, name: &str) -> Option<&str> {
    self
      .0
      .iter()
      .find(|(n, _)| n.eq_ignore_ascii_case(name))
      .map(|(_, v)| v.as_str())
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
    self.0.iter().map(|(n, v)| (n.as_str(), v.as_str()))
  }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for Headers {
  fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
    let mut headers = Headers::new();
    for (n, v) in iter {
      headers.set(&n.into(), &v.into());
    }
    headers
  }
}

/// An intercepted outgoing request.
#[derive(Debug, Clone)]
pub struct Request {
  pub method: Method,
  pub url: Url,
  pub headers: Headers,
}

impl Request {
  pub fn new(method: Method, url: Url) -> Self {
    Self {
      method,
      url,
      headers: Headers::new(),
    }
  }

  /// Convenience constructor for a GET request.
  pub fn get(url: Url) -> Self {
    Self::new(Method::Get, url)
  }

  #[allow(dead_code)]
  pub fn with_header(mut self, name: &str, value: &str) -> Self {
    self.headers.set(name, value);
    self
  }

  pub fn is_get(&self) -> bool {
    self.method == Method::Get
  }

  /// Canonical identity used as the cache key: method plus the absolute URL,
  /// query string included.
  pub fn identity(&self) -> String {
    format!("{} {}", self.method, self.url)
  }
}

/// A response, either live from the network or reconstructed from a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
  pub status: u16,
  pub headers: Headers,
  pub body: Vec<u8>,
}

impl Response {
  pub fn new(status: u16) -> Self {
    Self {
      status,
      headers: Headers::new(),
      body: Vec::new(),
    }
  }

  pub fn with_header(mut self, name: &str, value: &str) -> Self {
    self.headers.set(name, value);
    self
  }

  pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
    self.body = body.into();
    self
  }

  /// Whether the status counts as success (2xx).
  pub fn is_ok(&self) -> bool {
    (200..=299).contains(&self.status)
  }
}
