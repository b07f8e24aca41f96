//! Cache-first executor for precached static assets.
//!
//! Once an asset is precached it never causes a network round trip for
//! the lifetime of its version tag; this strategy performs no eviction.

use offcache_core::{CacheDb, CachedResponse, Error};

use crate::fetch::{FetchOptions, Fetcher};
use crate::request::AgentRequest;

/// Serve from the static store, falling back to the network on a miss.
///
/// A successful network response backfills the static store before being
/// returned; an unsuccessful response is returned unmodified and a
/// transport failure propagates.
pub async fn cache_first_static(
    db: &CacheDb,
    static_store: &str,
    fetcher: &dyn Fetcher,
    req: &AgentRequest,
) -> Result<CachedResponse, Error> {
    let key = req.key();

    if let Some(hit) = db.get(static_store, &key).await? {
        tracing::debug!(url = %req.url, "static cache hit");
        return Ok(hit);
    }

    let fresh = fetcher.fetch(req, FetchOptions::default()).await?;
    let response = fresh.into_cached();

    if response.is_success()
        && let Err(e) = db.put(static_store, &key, &response).await
    {
        tracing::warn!(url = %req.url, error = %e, "static backfill failed");
    }

    Ok(response)
}
