mod classify;
mod config;
mod fallback;
mod http;
mod lifecycle;
mod net;
mod store;
mod strategy;
mod worker;

use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use std::sync::Arc;

use crate::http::{Method, Request};
use crate::store::{MemoryBackend, SqliteBackend, StoreBackend};
use crate::worker::{Message, Worker};

#[derive(Parser, Debug)]
#[command(name = "cachefront")]
#[command(about = "An offline-first request interception cache for single-origin web clients")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/cachefront/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Keep stores in memory instead of the on-disk database
  #[arg(long)]
  ephemeral: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Seed the static store with the configured precache lists
  Install,
  /// Delete stores left over from prior versions
  Activate,
  /// Route one request through the strategy engine and print the response body
  Fetch {
    /// Absolute URL to fetch
    url: String,

    /// Request method
    #[arg(short = 'X', long, default_value = "GET")]
    method: String,

    /// Additional header as "Name: value" (repeatable)
    #[arg(short = 'H', long = "header")]
    headers: Vec<String>,
  },
  /// Fire the background-sync hook
  Sync {
    /// Sync tag to pass through
    #[arg(default_value = "sync")]
    tag: String,
  },
  /// Build the notification for a push payload and print it as JSON
  Push {
    /// JSON payload with optional title and body
    payload: Option<String>,
  },
  /// Print the configured version tag
  Version,
}

/// Log to a rolling file; stdout carries fetched response bodies.
fn init_logging() -> Result<tracing_appender::non_blocking::WorkerGuard> {
  let log_dir = dirs::data_dir()
    .map(|d| d.join("cachefront").join("logs"))
    .ok_or_else(|| eyre!("Could not determine data directory"))?;
  std::fs::create_dir_all(&log_dir)
    .map_err(|e| eyre!("Failed to create log directory: {}", e))?;

  let appender = tracing_appender::rolling::daily(log_dir, "cachefront.log");
  let (writer, guard) = tracing_appender::non_blocking(appender);

  tracing_subscriber::fmt()
    .with_env_filter(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
    )
    .with_writer(writer)
    .with_ansi(false)
    .init();

  Ok(guard)
}

fn parse_request(url: &str, method: &str, headers: &[String]) -> Result<Request> {
  let method = Method::parse(method).ok_or_else(|| eyre!("Unsupported method: {}", method))?;
  let url = url::Url::parse(url).map_err(|e| eyre!("Invalid URL {}: {}", url, e))?;

  let mut request = Request::new(method, url);
  for raw in headers {
    let (name, value) = raw
      .split_once(':')
      .ok_or_else(|| eyre!("Malformed header (expected \"Name: value\"): {}", raw))?;
    request.headers.set(name.trim(), value.trim());
  }

  Ok(request)
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();
  let _guard = init_logging()?;

  let config = config::Config::load(args.config.as_deref())?;
  let backend: Arc<dyn StoreBackend> = if args.ephemeral {
    Arc::new(MemoryBackend::new())
  } else {
    Arc::new(SqliteBackend::open()?)
  };
  let network = Arc::new(net::HttpNetwork::new()?);
  let mut worker = Worker::new(&config, backend, network)?;

  match args.command {
    Command::Install => {
      let optional = worker.install().await?;
      optional
        .await
        .map_err(|e| eyre!("Optional precache task panicked: {}", e))?;
      println!("installed {}", worker.version());
    }
    Command::Activate => {
      let deleted = worker.activate()?;
      for name in &deleted {
        println!("deleted {}", name);
      }
      println!("{} {}", worker.state(), worker.version());
    }
    Command::Fetch {
      url,
      method,
      headers,
    } => {
      let request = parse_request(&url, &method, &headers)?;

      // One-shot interception: claim immediately rather than waiting.
      worker.handle_message(Message::SkipWaiting);

      let response = worker.handle_fetch(&request).await;
      eprintln!("{}", response.status);
      use std::io::Write;
      std::io::stdout().write_all(&response.body)?;
    }
    Command::Sync { tag } => {
      worker.handle_sync(&tag);
      println!("synced {}", tag);
    }
    Command::Push { payload } => {
      let notification = worker.handle_push(payload.as_deref());
      println!("{}", serde_json::to_string_pretty(&notification)?);
    }
    Command::Version => {
      println!("{}", worker.version());
    }
  }

  Ok(())
}
