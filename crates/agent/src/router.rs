//! Request routing: classify each request into exactly one strategy.
//!
//! Pure and deterministic; no side effects. Rules, in order:
//!
//! 1. Non-GET requests are not intercepted (pass through).
//! 2. Top-level navigations go network-first.
//! 3. Same-origin requests whose normalized path is precached go
//!    cache-first.
//! 4. Every other GET goes network-then-cache against the runtime store.

use reqwest::Method;
use url::Url;

use crate::request::AgentRequest;

/// The three mutually exclusive handling strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    CacheFirstStatic,
    NetworkFirstNavigation,
    NetworkThenCacheRuntime,
}

/// Routing decision for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Left to default network handling; the agent never touches it.
    Passthrough,
    /// Handled by the named strategy.
    Strategy(Strategy),
}

/// Assign a strategy to a request.
pub fn classify(req: &AgentRequest, origin: &Url, precache: &[String]) -> Route {
    if req.method != Method::GET {
        return Route::Passthrough;
    }

    if req.is_navigation() {
        return Route::Strategy(Strategy::NetworkFirstNavigation);
    }

    let path = req.normalized_path();
    if req.same_origin(origin) && precache.iter().any(|p| *p == path) {
        return Route::Strategy(Strategy::CacheFirstStatic);
    }

    Route::Strategy(Strategy::NetworkThenCacheRuntime)
}
