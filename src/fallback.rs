//! Synthesized responses for when neither cache nor network can answer.
//!
//! Both constructors are pure: no I/O, no store access.

use chrono::Utc;

use crate::http::Response;

/// Fixed offline page served when a navigation cannot be satisfied.
const OFFLINE_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>Offline</title>
  <style>
    body { font-family: system-ui, sans-serif; margin: 4rem auto; max-width: 32rem; text-align: center; }
    h1 { font-size: 1.5rem; }
    p { color: #555; }
  </style>
</head>
<body>
  <h1>You are offline</h1>
  <p>This page is not available right now. Reconnect and try again.</p>
</body>
</html>
"#;

/// Substitute page for a failed navigation: the offline page, status 200.
pub fn html_fallback() -> Response {
  Response::new(200)
    .with_header("Content-Type", "text/html; charset=utf-8")
    .with_body(OFFLINE_PAGE)
}

/// Structured failure envelope for API requests: JSON, status 503, with an
/// offline flag and the time the failure was synthesized.
pub fn api_fallback() -> Response {
  let body = serde_json::json!({
    "error": "Network unavailable and no fresh cached response",
    "offline": true,
    "timestamp": Utc::now().to_rfc3339(),
  });

  Response::new(503)
    .with_header("Content-Type", "application/json")
    .with_body(body.to_string())
}
