//! Network collaborator: the seam between strategies and the real HTTP stack.

use async_trait::async_trait;
use color_eyre::{eyre::eyre, Result};

use crate::http::{Headers, Method, Request, Response};

/// Outbound fetch. Any transport failure (connection refused, DNS, timeout)
/// surfaces as an error; no timeout is imposed here beyond the client's own.
#[async_trait]
pub trait Network: Send + Sync {
  async fn fetch(&self, request: &Request) -> Result<Response>;
}

/// reqwest-backed implementation.
pub struct HttpNetwork {
  client: reqwest::Client,
}

impl HttpNetwork {
  pub fn new() -> Result<Self> {
    let client = reqwest::Client::builder()
      .build()
      .map_err(|e| eyre!("Failed to build HTTP client: {}", e))?;

    Ok(Self { client })
  }
}

fn to_reqwest_method(method: Method) -> reqwest::Method {
  match method {
    Method::Get => reqwest::Method::GET,
    Method::Head => reqwest::Method::HEAD,
    Method::Post => reqwest::Method::POST,
    Method::Put => reqwest::Method::PUT,
    Method::Patch => reqwest::Method::PATCH,
    Method::Delete => reqwest::Method::DELETE,
    Method::Options => reqwest::Method::OPTIONS,
  }
}

#[async_trait]
impl Network for HttpNetwork {
  async fn fetch(&self, request: &Request) -> Result<Response> {
    let mut builder = self
      .client
      .request(to_reqwest_method(request.method), request.url.clone());

    for (name, value) in request.headers.iter() {
      builder = builder.header(name, value);
    }

    let resp = builder
      .send()
      .await
      .map_err(|e| eyre!("Fetch failed for {}: {}", request.url, e))?;

    let status = resp.status().as_u16();
    let mut headers = Headers::new();
    for (name, value) in resp.headers() {
      if let Ok(value) = value.to_str() {
        headers.set(name.as_str(), value);
      }
    }

    let body = resp
      .bytes()
      .await
      .map_err(|e| eyre!("Failed to read body from {}: {}", request.url, e))?
      .to_vec();

    Ok(Response {
      status,
      headers,
      body,
    })
  }
}

/// Scripted network used by tests: responses are queued per request
/// identity, anything unscripted fails as if the network were down, and
/// every fetch bumps a counter so cache-first behavior can be asserted.
#[cfg(test)]
pub(crate) mod mock {
  use super::*;
  use std::collections::{HashMap, VecDeque};
  use std::sync::atomic::{AtomicU32, Ordering};
  use std::sync::Mutex;

  enum Scripted {
    Ok(Response),
    Fail(String),
  }

  #[derive(Default)]
  pub struct MockNetwork {
    scripted: Mutex<HashMap<String, VecDeque<Scripted>>>,
    calls: AtomicU32,
  }

  impl MockNetwork {
    pub fn new() -> Self {
      Self::default()
    }

    /// Queue a successful response for a request identity.
    pub fn respond(&self, identity: &str, response: Response) {
      self
        .scripted
        .lock()
        .unwrap()
        .entry(identity.to_string())
        .or_default()
        .push_back(Scripted::Ok(response));
    }

    /// Queue a transport failure for a request identity.
    pub fn fail(&self, identity: &str) {
      self
        .scripted
        .lock()
        .unwrap()
        .entry(identity.to_string())
        .or_default()
        .push_back(Scripted::Fail("connection refused".to_string()));
    }

    pub fn calls(&self) -> u32 {
      self.calls.load(Ordering::SeqCst)
    }
  }

  #[async_trait]
  impl Network for MockNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response> {
      self.calls.fetch_add(1, Ordering::SeqCst);

      let next = self
        .scripted
        .lock()
        .unwrap()
        .get_mut(&request.identity())
        .and_then(|queue| queue.pop_front());

      match next {
        Some(Scripted::Ok(response)) => Ok(response),
        Some(Scripted::Fail(msg)) => Err(eyre!(msg)),
        None => Err(eyre!("connection refused: {}", request.url)),
      }
    }
  }
}
