//! Network fetch capability behind a trait seam.
//!
//! The production implementation is [`HttpFetcher`] (reqwest with
//! rustls-tls); tests script a mock. A transport failure surfaces as
//! [`Error::Network`]; a response with a non-success status is NOT an
//! error — strategies inspect the status and decide.

use async_trait::async_trait;
use bytes::Bytes;
use offcache_core::{CachedResponse, Error};
use reqwest::{Client, header};
use std::time::Duration;

use crate::request::AgentRequest;

#[cfg(test)]
pub(crate) mod mock;

/// Per-fetch options.
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchOptions {
    /// Bypass any intermediate HTTP caching layer so the attempt reflects
    /// true network reachability. Sent as `Cache-Control: no-store`.
    pub bypass_http_cache: bool,
}

/// Response from a fetch operation.
#[derive(Debug, Clone)]
pub struct FetchedResponse {
    /// HTTP status code.
    pub status: u16,
    /// Status reason phrase, when known.
    pub reason: Option<String>,
    /// Content-Type header.
    pub content_type: Option<String>,
    /// Remaining response headers as a JSON object.
    pub headers_json: Option<String>,
    /// Response body bytes.
    pub bytes: Bytes,
}

impl FetchedResponse {
    /// Whether the status is in the HTTP success range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Convert into a store snapshot, stamped with the current time.
    pub fn into_cached(self) -> CachedResponse {
        let mut cached = CachedResponse::new(self.status, self.content_type, self.bytes.to_vec());
        cached.reason = self.reason;
        cached.headers_json = self.headers_json;
        cached
    }
}

/// Network fetch capability.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch a request from the network.
    ///
    /// # Errors
    ///
    /// Returns `Error::Network` only when no response was produced at
    /// all; upstream error statuses resolve Ok.
    async fn fetch(&self, req: &AgentRequest, opts: FetchOptions) -> Result<FetchedResponse, Error>;
}

/// Configuration for the HTTP fetcher.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "offcache/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "offcache/0.1".to_string(),
            max_bytes: 5 * 1024 * 1024,
            timeout: Duration::from_millis(20_000),
            max_redirects: 5,
        }
    }
}

impl From<&offcache_core::AgentConfig> for FetchConfig {
    fn from(config: &offcache_core::AgentConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            timeout: config.timeout(),
            max_redirects: 5,
        }
    }
}

/// reqwest-backed fetcher.
pub struct HttpFetcher {
    http: Client,
    config: FetchConfig,
}

impl HttpFetcher {
    /// Create a new fetcher with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, config })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, req: &AgentRequest, opts: FetchOptions) -> Result<FetchedResponse, Error> {
        let mut request = self.http.request(req.method.clone(), req.url.as_str());
        if opts.bypass_http_cache {
            request = request
                .header(header::CACHE_CONTROL, "no-store")
                .header(header::PRAGMA, "no-cache");
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Network(format!("fetch {} failed: {e}", req.url)))?;

        let status = response.status();
        let headers = response.headers().clone();

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(Error::Network(format!("{len} bytes exceeds {}", self.config.max_bytes)));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Network(format!("failed to read response: {e}")))?;

        if bytes.len() > self.config.max_bytes {
            return Err(Error::Network(format!("{} bytes exceeds {}", bytes.len(), self.config.max_bytes)));
        }

        let content_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let headers_json = serialize_headers(&headers);

        tracing::debug!(url = %req.url, status = status.as_u16(), bytes = bytes.len(), "fetched");

        Ok(FetchedResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().map(|r| r.to_string()),
            content_type,
            headers_json,
            bytes,
        })
    }
}

fn serialize_headers(headers: &header::HeaderMap) -> Option<String> {
    let map: serde_json::Map<String, serde_json::Value> = headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), serde_json::Value::String(v.to_string())))
        })
        .collect();
    serde_json::to_string(&map).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::default();
        assert_eq!(config.user_agent, "offcache/0.1");
        assert_eq!(config.max_bytes, 5 * 1024 * 1024);
        assert_eq!(config.timeout, Duration::from_millis(20_000));
        assert_eq!(config.max_redirects, 5);
    }

    #[test]
    fn test_fetch_config_from_agent_config() {
        let agent_config = offcache_core::AgentConfig {
            user_agent: "converter/2.0".into(),
            timeout_ms: 5_000,
            max_bytes: 1024,
            ..Default::default()
        };
        let config = FetchConfig::from(&agent_config);
        assert_eq!(config.user_agent, "converter/2.0");
        assert_eq!(config.timeout, Duration::from_millis(5_000));
        assert_eq!(config.max_bytes, 1024);
    }

    #[test]
    fn test_http_fetcher_new() {
        let fetcher = HttpFetcher::new(FetchConfig::default());
        assert!(fetcher.is_ok());
    }

    #[test]
    fn test_fetched_response_into_cached() {
        let fresh = FetchedResponse {
            status: 200,
            reason: Some("OK".to_string()),
            content_type: Some("text/css".to_string()),
            headers_json: None,
            bytes: Bytes::from_static(b"body { margin: 0 }"),
        };
        assert!(fresh.is_success());

        let cached = fresh.into_cached();
        assert_eq!(cached.status, 200);
        assert_eq!(cached.content_type.as_deref(), Some("text/css"));
        assert_eq!(cached.body, b"body { margin: 0 }");
    }

    #[test]
    fn test_serialize_headers() {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::ETAG, header::HeaderValue::from_static("\"abc\""));
        let json = serialize_headers(&headers).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["etag"], "\"abc\"");
    }
}
