//! Scriptable fetcher for tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use offcache_core::Error;

use super::{FetchOptions, FetchedResponse, Fetcher};
use crate::request::AgentRequest;

#[derive(Debug, Clone)]
enum Outcome {
    Respond { status: u16, content_type: Option<String>, body: Vec<u8> },
    NetworkError,
}

/// Fetcher with per-URL scripted outcomes and a call counter.
pub(crate) struct MockFetcher {
    routes: Mutex<HashMap<String, Outcome>>,
    fallback: Outcome,
    calls: AtomicUsize,
    last_bypass: Mutex<Option<bool>>,
}

impl MockFetcher {
    /// Every fetch fails with a network error unless scripted otherwise.
    pub fn offline() -> Self {
        Self {
            routes: Mutex::new(HashMap::new()),
            fallback: Outcome::NetworkError,
            calls: AtomicUsize::new(0),
            last_bypass: Mutex::new(None),
        }
    }

    /// Every fetch succeeds with status 200 and the given body unless
    /// scripted otherwise.
    pub fn serving(body: &str) -> Self {
        Self {
            routes: Mutex::new(HashMap::new()),
            fallback: Outcome::Respond {
                status: 200,
                content_type: Some("text/html".to_string()),
                body: body.as_bytes().to_vec(),
            },
            calls: AtomicUsize::new(0),
            last_bypass: Mutex::new(None),
        }
    }

    /// Script a response for one URL.
    pub fn respond(&self, url: &str, status: u16, body: &str) {
        self.routes.lock().unwrap().insert(
            url.to_string(),
            Outcome::Respond { status, content_type: Some("text/html".to_string()), body: body.as_bytes().to_vec() },
        );
    }

    /// Script a network error for one URL.
    pub fn fail(&self, url: &str) {
        self.routes.lock().unwrap().insert(url.to_string(), Outcome::NetworkError);
    }

    /// Number of fetches attempted so far.
    pub fn fetch_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Whether the most recent fetch asked to bypass HTTP caching.
    pub fn last_bypass(&self) -> Option<bool> {
        *self.last_bypass.lock().unwrap()
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, req: &AgentRequest, opts: FetchOptions) -> Result<FetchedResponse, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_bypass.lock().unwrap() = Some(opts.bypass_http_cache);

        let outcome = self
            .routes
            .lock()
            .unwrap()
            .get(req.url.as_str())
            .cloned()
            .unwrap_or_else(|| self.fallback.clone());

        match outcome {
            Outcome::Respond { status, content_type, body } => Ok(FetchedResponse {
                status,
                reason: None,
                content_type,
                headers_json: None,
                bytes: Bytes::from(body),
            }),
            Outcome::NetworkError => Err(Error::Network(format!("unreachable: {}", req.url))),
        }
    }
}
