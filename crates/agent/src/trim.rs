//! Fire-and-forget runtime cache trimming.
//!
//! Trimming is decoupled from the response path: the task is spawned
//! without being awaited and its failure is logged, never propagated.

use offcache_core::CacheDb;
use tokio::task::JoinHandle;

/// Dispatch a trim of the given store down to `max_entries`.
///
/// The returned handle is for tests; production callers drop it.
pub fn spawn_trim(db: CacheDb, store: String, max_entries: usize) -> JoinHandle<()> {
    tokio::spawn(async move {
        match db.trim_store(&store, max_entries).await {
            Ok(0) => {}
            Ok(evicted) => tracing::debug!(store = %store, evicted, "trimmed runtime store"),
            Err(e) => tracing::warn!(store = %store, error = %e, "trim failed"),
        }
    })
}
