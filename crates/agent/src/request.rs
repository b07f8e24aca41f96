//! Request model for the agent.
//!
//! An [`AgentRequest`] carries the identity the platform's request object
//! would: method, resolved URL, navigation intent, and declared content
//! destination. The host adapter builds one per intercepted request.

use offcache_core::Error;
use offcache_core::store::request_key;
use reqwest::Method;
use url::Url;

/// How the request was initiated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMode {
    /// Top-level document load.
    Navigate,
    /// Any subresource fetch.
    Subresource,
}

/// The declared content category of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestDestination {
    Document,
    Script,
    Style,
    Image,
    Font,
    Audio,
    Video,
    Worker,
    /// Unspecified destination (e.g. a plain programmatic fetch).
    Empty,
}

impl RequestDestination {
    /// Whether responses for this destination qualify for the runtime
    /// cache. Streaming media and workers are passed through uncached.
    pub fn is_runtime_cacheable(self) -> bool {
        matches!(
            self,
            RequestDestination::Script
                | RequestDestination::Style
                | RequestDestination::Image
                | RequestDestination::Font
                | RequestDestination::Document
                | RequestDestination::Empty
        )
    }
}

/// One intercepted outbound request.
#[derive(Debug, Clone)]
pub struct AgentRequest {
    pub method: Method,
    pub url: Url,
    pub mode: RequestMode,
    pub destination: RequestDestination,
}

impl AgentRequest {
    /// Build a plain GET subresource request.
    pub fn get(url: &str) -> Result<Self, Error> {
        let url = Url::parse(url).map_err(|e| Error::InvalidRequest(format!("{url}: {e}")))?;
        Ok(Self::from_url(Method::GET, url))
    }

    /// Build a top-level navigation request.
    pub fn navigation(url: &str) -> Result<Self, Error> {
        let mut req = Self::get(url)?;
        req.mode = RequestMode::Navigate;
        req.destination = RequestDestination::Document;
        Ok(req)
    }

    /// Build a request from an already-resolved URL.
    pub fn from_url(method: Method, url: Url) -> Self {
        Self { method, url, mode: RequestMode::Subresource, destination: RequestDestination::Empty }
    }

    /// Set the declared content destination.
    pub fn with_destination(mut self, destination: RequestDestination) -> Self {
        self.destination = destination;
        self
    }

    /// Set the method.
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// The cache key addressing this request's slot.
    pub fn key(&self) -> String {
        request_key(self.method.as_str(), self.url.as_str())
    }

    pub fn is_navigation(&self) -> bool {
        self.mode == RequestMode::Navigate
    }

    /// Runtime-cache eligibility: GET with a cacheable destination.
    pub fn is_runtime_cacheable(&self) -> bool {
        self.method == Method::GET && self.destination.is_runtime_cacheable()
    }

    /// Whether this request targets the given origin (scheme, host, port).
    pub fn same_origin(&self, origin: &Url) -> bool {
        self.url.scheme() == origin.scheme()
            && self.url.host() == origin.host()
            && self.url.port_or_known_default() == origin.port_or_known_default()
    }

    /// Normalize the URL path to precache-list form.
    ///
    /// A trailing-slash path maps to the root marker `"./"`; every other
    /// path maps by prefixing the relative-path marker.
    pub fn normalized_path(&self) -> String {
        let path = self.url.path();
        if path.ends_with('/') { "./".to_string() } else { format!(".{path}") }
    }
}
