//! HTTP seam for every provider request.
//!
//! The catalog refresh, the CSS fetch and the font binary downloads all go
//! through a [`FontFetcher`], so the pipeline can run against
//! [`HttpFetcher`] in production and [`StaticFetcher`] in tests or offline.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::{MirrorError, Result};

/// Modern desktop UA: the provider picks the font format (woff2 vs ttf)
/// from the User-Agent of the CSS request.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

/// Fetches a URL and returns the response body.
pub trait FontFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;

    /// Fetch and decode as UTF-8 text (lossy).
    fn fetch_text(&self, url: &str) -> Result<String> {
        let bytes = self.fetch(url)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

impl<T: FontFetcher + ?Sized> FontFetcher for Arc<T> {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        (**self).fetch(url)
    }
}

impl<T: FontFetcher + ?Sized> FontFetcher for &T {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        (**self).fetch(url)
    }
}

// ── HTTP fetcher ────────────────────────────────────────────────────

/// Blocking HTTP fetcher backed by `ureq`.
///
/// Non-2xx statuses, empty bodies and bodies over `max_size` are errors.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    timeout: Duration,
    user_agent: String,
    max_size: usize,
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_size: 20 * 1024 * 1024, // 20MB
        }
    }
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the global request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the User-Agent header.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the maximum response size in bytes.
    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }
}

impl FontFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(self.timeout))
            .build();
        let agent: ureq::Agent = config.into();

        let mut response = agent
            .get(url)
            .header("User-Agent", &self.user_agent)
            .call()
            .map_err(|e| MirrorError::http(url, e))?;

        let bytes = response
            .body_mut()
            .with_config()
            .limit(self.max_size as u64)
            .read_to_vec()
            .map_err(|e| MirrorError::http(url, e))?;

        if bytes.is_empty() {
            return Err(MirrorError::http(url, "empty response body"));
        }
        log::debug!("fetched {} bytes from {url}", bytes.len());
        Ok(bytes)
    }
}

// ── Static fetcher ──────────────────────────────────────────────────

/// In-memory fetcher serving canned responses by exact URL.
///
/// Unknown URLs fail like a network error. Every request is recorded so
/// callers can assert on what was (or was not) fetched.
#[derive(Debug, Default)]
pub struct StaticFetcher {
    responses: HashMap<String, Vec<u8>>,
    requests: Mutex<Vec<String>>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a response body for `url`.
    pub fn with(mut self, url: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        self.insert(url, body);
        self
    }

    pub fn insert(&mut self, url: impl Into<String>, body: impl Into<Vec<u8>>) {
        self.responses.insert(url.into(), body.into());
    }

    /// URLs requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }
}

impl FontFetcher for StaticFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(url.to_string());
        }
        match self.responses.get(url) {
            Some(body) if !body.is_empty() => Ok(body.clone()),
            Some(_) => Err(MirrorError::http(url, "empty response body")),
            None => Err(MirrorError::http(url, "connection refused")),
        }
    }
}
