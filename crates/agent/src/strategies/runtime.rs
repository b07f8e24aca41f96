//! Network-then-cache executor for all other GET requests.
//!
//! The network response is returned regardless of caching outcome; the
//! runtime write and the trim it triggers are best-effort housekeeping
//! that never delays or fails the response path.

use offcache_core::{CacheDb, CachedResponse, Error};

use crate::fetch::{FetchOptions, Fetcher};
use crate::request::AgentRequest;
use crate::trim;

/// Fetch from the network; on success opportunistically cache eligible
/// responses into the runtime store and dispatch a trim. On transport
/// failure fall back to the runtime store, then the static store, then
/// the synthetic offline response.
pub async fn network_then_cache_runtime(
    db: &CacheDb,
    runtime_store: &str,
    static_store: &str,
    max_entries: usize,
    fetcher: &dyn Fetcher,
    req: &AgentRequest,
) -> Result<CachedResponse, Error> {
    match fetcher.fetch(req, FetchOptions::default()).await {
        Ok(fresh) => {
            let response = fresh.into_cached();
            if response.is_success() && req.is_runtime_cacheable() {
                match db.put(runtime_store, &req.key(), &response).await {
                    Ok(()) => {
                        trim::spawn_trim(db.clone(), runtime_store.to_string(), max_entries);
                    }
                    Err(e) => tracing::warn!(url = %req.url, error = %e, "runtime cache write failed"),
                }
            }
            Ok(response)
        }
        Err(Error::Network(reason)) => {
            let key = req.key();
            if let Some(hit) = db.get(runtime_store, &key).await? {
                tracing::debug!(url = %req.url, "runtime cache fallback");
                return Ok(hit);
            }
            if let Some(hit) = db.get(static_store, &key).await? {
                tracing::debug!(url = %req.url, "static cache fallback");
                return Ok(hit);
            }
            tracing::debug!(url = %req.url, %reason, "no cached fallback, serving offline response");
            Ok(CachedResponse::offline())
        }
        Err(e) => Err(e),
    }
}
