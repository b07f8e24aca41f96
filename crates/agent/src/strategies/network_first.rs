//! Network-first executor for top-level navigations.
//!
//! A navigation always prefers freshness when the network is reachable,
//! but degrades to the last-known application shell when offline. The
//! shell lives under the canonical root key, not the requested path, so
//! every reachable navigation refreshes the same entry.

use offcache_core::{CacheDb, CachedResponse, Error};

use crate::fetch::{FetchOptions, Fetcher};
use crate::request::AgentRequest;

/// Fetch the navigation from the network, bypassing intermediate HTTP
/// caches; fall back to the stored shell, then to the synthetic offline
/// response.
pub async fn network_first_navigation(
    db: &CacheDb,
    static_store: &str,
    root_key: &str,
    fetcher: &dyn Fetcher,
    req: &AgentRequest,
) -> Result<CachedResponse, Error> {
    match fetcher.fetch(req, FetchOptions { bypass_http_cache: true }).await {
        Ok(fresh) => {
            let response = fresh.into_cached();
            if response.is_success()
                && let Err(e) = db.put(static_store, root_key, &response).await
            {
                tracing::warn!(url = %req.url, error = %e, "shell refresh failed");
            }
            Ok(response)
        }
        Err(Error::Network(reason)) => {
            tracing::debug!(url = %req.url, %reason, "navigation offline, serving shell");
            match db.get(static_store, root_key).await? {
                Some(shell) => Ok(shell),
                None => Ok(CachedResponse::offline()),
            }
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::mock::MockFetcher;
    use offcache_core::store::request_key;

    const STORE: &str = "offcache-static-v1";

    fn root_key() -> String {
        request_key("GET", "https://converter.example/")
    }

    #[tokio::test]
    async fn test_success_refreshes_root_entry() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let fetcher = MockFetcher::serving("<html>fresh</html>");
        let req = AgentRequest::navigation("https://converter.example/index.html").unwrap();

        let got = network_first_navigation(&db, STORE, &root_key(), &fetcher, &req)
            .await
            .unwrap();
        assert_eq!(got.body, b"<html>fresh</html>");

        // Cached under the canonical root key, not the requested path
        let shell = db.get(STORE, &root_key()).await.unwrap().unwrap();
        assert_eq!(shell.body, b"<html>fresh</html>");
        assert!(db.get(STORE, &req.key()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_bypasses_http_cache() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let fetcher = MockFetcher::serving("<html></html>");
        let req = AgentRequest::navigation("https://converter.example/").unwrap();

        network_first_navigation(&db, STORE, &root_key(), &fetcher, &req)
            .await
            .unwrap();
        assert_eq!(fetcher.last_bypass(), Some(true));
    }

    #[tokio::test]
    async fn test_upstream_error_returned_and_not_cached() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let fetcher = MockFetcher::serving("ignored");
        fetcher.respond("https://converter.example/", 502, "bad gateway");
        let req = AgentRequest::navigation("https://converter.example/").unwrap();

        let got = network_first_navigation(&db, STORE, &root_key(), &fetcher, &req)
            .await
            .unwrap();
        assert_eq!(got.status, 502);
        assert!(db.get(STORE, &root_key()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_offline_serves_stored_shell() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let mut shell = CachedResponse::new(200, Some("text/html".into()), b"<html>shell</html>".to_vec());
        shell.reason = Some("OK".to_string());
        db.put(STORE, &root_key(), &shell).await.unwrap();

        let fetcher = MockFetcher::offline();
        let req = AgentRequest::navigation("https://converter.example/deep/page").unwrap();

        let got = network_first_navigation(&db, STORE, &root_key(), &fetcher, &req)
            .await
            .unwrap();
        assert_eq!(got.status, 200);
        assert_eq!(got.body, b"<html>shell</html>");
    }

    #[tokio::test]
    async fn test_offline_without_shell_is_synthetic_503() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let fetcher = MockFetcher::offline();
        let req = AgentRequest::navigation("https://converter.example/").unwrap();

        let got = network_first_navigation(&db, STORE, &root_key(), &fetcher, &req)
            .await
            .unwrap();
        assert_eq!(got.status, 503);
        assert_eq!(got.reason.as_deref(), Some("Offline"));
    }
}
