use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use url::Url;

use crate::classify::ClassifyRules;

/// External configuration surface: everything the worker loads rather than
/// computes.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  /// Version tag embedded in every store name. Changing it is the sole
  /// mechanism for invalidating all prior tiers at once.
  #[serde(default = "default_version")]
  pub version: String,
  /// Namespace prefix for store names; the activation sweep only touches
  /// stores under this prefix.
  #[serde(default = "default_prefix")]
  pub prefix: String,
  /// Host of the remote API endpoint.
  pub api_host: String,
  /// Application entry point, served as a substitute for unreachable pages.
  pub entry_point: String,
  /// Resources that must seed the static store for installation to succeed.
  #[serde(default)]
  pub precache_required: Vec<String>,
  /// Resources seeded best-effort; failures never fail installation.
  #[serde(default)]
  pub precache_optional: Vec<String>,
  /// File-extension allowlist marking static assets.
  #[serde(default = "default_static_extensions")]
  pub static_extensions: Vec<String>,
  /// CDN hosts whose responses are always static assets.
  #[serde(default)]
  pub static_cdn_hosts: Vec<String>,
  /// How long a cached API response may stand in for a failed fetch.
  #[serde(default = "default_api_ttl_secs")]
  pub api_ttl_secs: u64,
}

fn default_version() -> String {
  "v1".to_string()
}

fn default_prefix() -> String {
  "cachefront".to_string()
}

fn default_static_extensions() -> Vec<String> {
  [
    "css", "js", "mjs", "png", "jpg", "jpeg", "gif", "svg", "webp", "ico", "woff", "woff2", "ttf",
  ]
  .into_iter()
  .map(String::from)
  .collect()
}

fn default_api_ttl_secs() -> u64 {
  300
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./cachefront.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/cachefront/config.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Err(eyre!(
        "No configuration file found. Create one at ~/.config/cachefront/config.yaml"
      )),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("cachefront.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("cachefront").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let config: Config = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    Ok(config)
  }

  pub fn classify_rules(&self) -> ClassifyRules {
    ClassifyRules {
      api_host: self.api_host.clone(),
      static_extensions: self.static_extensions.clone(),
      static_cdn_hosts: self.static_cdn_hosts.clone(),
    }
  }

  pub fn entry_point_url(&self) -> Result<Url> {
    Url::parse(&self.entry_point)
      .map_err(|e| eyre!("Invalid entry_point URL {}: {}", self.entry_point, e))
  }

  pub fn precache_required_urls(&self) -> Result<Vec<Url>> {
    parse_urls(&self.precache_required)
  }

  pub fn precache_optional_urls(&self) -> Result<Vec<Url>> {
    parse_urls(&self.precache_optional)
  }
}

fn parse_urls(raw: &[String]) -> Result<Vec<Url>> {
  raw
    .iter()
    .map(|s| Url::parse(s).map_err(|e| eyre!("Invalid URL {}: {}", s, e)))
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_minimal_config_gets_defaults() {
    let config: Config = serde_yaml::from_str(
      r#"
api_host: api.example
entry_point: https://app.example/index.html
"#,
    )
    .unwrap();

    assert_eq!(config.version, "v1");
    assert_eq!(config.prefix, "cachefront");
    assert_eq!(config.api_ttl_secs, 300);
    assert!(config.static_extensions.contains(&"woff2".to_string()));
    assert!(config.precache_required.is_empty());
  }

  #[test]
  fn test_full_config_roundtrip() {
    let config: Config = serde_yaml::from_str(
      r#"
version: v7
prefix: warehouse
api_host: script.google.example
entry_point: https://app.example/index.html
precache_required:
  - https://app.example/index.html
  - https://app.example/manifest.json
precache_optional:
  - https://cdn.jsdelivr.net/npm/bootstrap@5.3.0/dist/css/bootstrap.min.css
static_cdn_hosts:
  - cdn.jsdelivr.net
api_ttl_secs: 60
"#,
    )
    .unwrap();

    assert_eq!(config.version, "v7");
    assert_eq!(config.prefix, "warehouse");
    assert_eq!(config.precache_required_urls().unwrap().len(), 2);
    assert_eq!(config.api_ttl_secs, 60);

    let rules = config.classify_rules();
    assert_eq!(rules.api_host, "script.google.example");
    assert_eq!(rules.static_cdn_hosts, vec!["cdn.jsdelivr.net".to_string()]);
  }

  #[test]
  fn test_invalid_url_is_rejected() {
    let config: Config = serde_yaml::from_str(
      r#"
api_host: api.example
entry_point: "not a url"
"#,
    )
    .unwrap();

    assert!(config.entry_point_url().is_err());
  }
}
