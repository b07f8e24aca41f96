//! Agent lifecycle: install, activate, and per-request handling.
//!
//! One logical agent exists per active generation. The host environment
//! serializes install/activate relative to each other but may invoke
//! [`Agent::handle`] concurrently for many in-flight requests; the agent
//! holds no mutable in-process state, so cloning it per task is cheap and
//! safe.

use std::sync::Arc;

use offcache_core::store::request_key;
use offcache_core::{AgentConfig, CacheDb, CachedResponse, Error};
use url::Url;

use crate::fetch::{FetchOptions, Fetcher};
use crate::request::AgentRequest;
use crate::router::{Route, Strategy, classify};
use crate::strategies;

/// Result of handling one request.
#[derive(Debug, Clone)]
pub enum HandleOutcome {
    /// A response to deliver to the caller.
    Response(CachedResponse),
    /// Not intercepted; left to default network handling.
    Passthrough,
}

/// The offline caching agent.
#[derive(Clone)]
pub struct Agent {
    db: CacheDb,
    fetcher: Arc<dyn Fetcher>,
    config: AgentConfig,
    origin: Url,
    static_store: String,
    runtime_store: String,
    root_key: String,
}

impl Agent {
    /// Build an agent over an opened database and a fetch capability.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidUrl` if the configured origin cannot be
    /// parsed or resolved to a root URL.
    pub fn new(db: CacheDb, fetcher: Arc<dyn Fetcher>, config: AgentConfig) -> Result<Self, Error> {
        let origin =
            Url::parse(&config.origin).map_err(|e| Error::InvalidUrl(format!("{}: {e}", config.origin)))?;
        // Canonical root: the origin's "./", where the navigation shell lives.
        let root = origin
            .join("./")
            .map_err(|e| Error::InvalidUrl(format!("{}: {e}", config.origin)))?;
        let root_key = request_key("GET", root.as_str());

        let static_store = config.static_store();
        let runtime_store = config.runtime_store();

        Ok(Self { db, fetcher, config, origin, static_store, runtime_store, root_key })
    }

    /// Name of the current static store.
    pub fn static_store(&self) -> &str {
        &self.static_store
    }

    /// Name of the current runtime store.
    pub fn runtime_store(&self) -> &str {
        &self.runtime_store
    }

    /// Install this generation: precache every configured asset.
    ///
    /// All-or-nothing: every asset is fetched first and the batch is
    /// written in one transaction, so a single failed fetch leaves no
    /// partial precache behind. Returning Ok is the readiness signal to
    /// take over immediately.
    ///
    /// # Errors
    ///
    /// Returns `Error::Precache` naming the first asset whose fetch
    /// failed or resolved with a non-success status.
    pub async fn install(&self) -> Result<(), Error> {
        self.db.open_store(&self.static_store).await?;

        let mut batch = Vec::with_capacity(self.config.precache.len());
        for path in &self.config.precache {
            let url = self
                .origin
                .join(path)
                .map_err(|e| Error::Precache { path: path.clone(), reason: format!("unresolvable: {e}") })?;
            let req = AgentRequest::from_url(reqwest::Method::GET, url);

            let fresh = self
                .fetcher
                .fetch(&req, FetchOptions::default())
                .await
                .map_err(|e| Error::Precache { path: path.clone(), reason: e.to_string() })?;
            if !fresh.is_success() {
                return Err(Error::Precache { path: path.clone(), reason: format!("status {}", fresh.status) });
            }

            batch.push((req.key(), fresh.into_cached()));
        }

        let count = batch.len();
        self.db.put_batch(&self.static_store, batch).await?;

        tracing::info!(store = %self.static_store, assets = count, "precache installed");
        Ok(())
    }

    /// Activate this generation: delete stale-generation stores.
    ///
    /// Per-store deletion failure is logged and swallowed; an orphaned
    /// old store costs storage, not correctness. Returning Ok signals
    /// the agent now controls all pages.
    pub async fn activate(&self) -> Result<(), Error> {
        let names = self.db.list_store_names().await?;
        for name in names.iter().filter(|n| self.config.is_stale_store(n)) {
            match self.db.delete_store(name).await {
                Ok(_) => tracing::debug!(store = %name, "deleted stale store"),
                Err(e) => tracing::warn!(store = %name, error = %e, "stale store cleanup failed"),
            }
        }

        tracing::info!(version = %self.config.version, "generation activated");
        Ok(())
    }

    /// Handle one intercepted request.
    ///
    /// Non-GET requests resolve to [`HandleOutcome::Passthrough`]; every
    /// other request runs exactly one strategy executor.
    pub async fn handle(&self, req: &AgentRequest) -> Result<HandleOutcome, Error> {
        match classify(req, &self.origin, &self.config.precache) {
            Route::Passthrough => Ok(HandleOutcome::Passthrough),
            Route::Strategy(Strategy::NetworkFirstNavigation) => strategies::network_first_navigation(
                &self.db,
                &self.static_store,
                &self.root_key,
                self.fetcher.as_ref(),
                req,
            )
            .await
            .map(HandleOutcome::Response),
            Route::Strategy(Strategy::CacheFirstStatic) => {
                strategies::cache_first_static(&self.db, &self.static_store, self.fetcher.as_ref(), req)
                    .await
                    .map(HandleOutcome::Response)
            }
            Route::Strategy(Strategy::NetworkThenCacheRuntime) => strategies::network_then_cache_runtime(
                &self.db,
                &self.runtime_store,
                &self.static_store,
                self.config.max_runtime_entries,
                self.fetcher.as_ref(),
                req,
            )
            .await
            .map(HandleOutcome::Response),
        }
    }

    /// Trim the runtime store down to its configured bound.
    ///
    /// Idempotent with respect to any trim the runtime strategy already
    /// dispatched.
    pub async fn trim_runtime(&self) -> Result<u64, Error> {
        self.db.trim_store(&self.runtime_store, self.config.max_runtime_entries).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::mock::MockFetcher;
    use crate::request::RequestDestination;
    use reqwest::Method;

    const ORIGIN: &str = "https://converter.example/";

    fn config() -> AgentConfig {
        AgentConfig {
            version: "v1".into(),
            origin: ORIGIN.into(),
            precache: vec!["./".to_string(), "./index.html".to_string()],
            ..Default::default()
        }
    }

    async fn agent_with(fetcher: MockFetcher, config: AgentConfig) -> Agent {
        let db = CacheDb::open_in_memory().await.unwrap();
        Agent::new(db, Arc::new(fetcher), config).unwrap()
    }

    fn expect_response(outcome: HandleOutcome) -> CachedResponse {
        match outcome {
            HandleOutcome::Response(r) => r,
            HandleOutcome::Passthrough => panic!("expected a response, got passthrough"),
        }
    }

    #[tokio::test]
    async fn test_install_populates_static_store() {
        let agent = agent_with(MockFetcher::serving("<html>"), config()).await;
        agent.install().await.unwrap();

        assert_eq!(agent.db.count(agent.static_store()).await.unwrap(), 2);
        let root_key = request_key("GET", "https://converter.example/");
        let index_key = request_key("GET", "https://converter.example/index.html");
        assert!(agent.db.get(agent.static_store(), &root_key).await.unwrap().is_some());
        assert!(agent.db.get(agent.static_store(), &index_key).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_install_is_all_or_nothing() {
        let fetcher = MockFetcher::serving("<html>");
        fetcher.respond("https://converter.example/index.html", 404, "missing");
        let agent = agent_with(fetcher, config()).await;

        let result = agent.install().await;
        assert!(matches!(result, Err(Error::Precache { ref path, .. }) if path == "./index.html"));
        assert_eq!(agent.db.count(agent.static_store()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_install_fails_on_unreachable_asset() {
        let fetcher = MockFetcher::serving("<html>");
        fetcher.fail("https://converter.example/");
        let agent = agent_with(fetcher, config()).await;

        assert!(agent.install().await.unwrap_err().is_fatal_to_install());
        assert_eq!(agent.db.count(agent.static_store()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_precached_asset_served_without_network() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let installer = Agent::new(db.clone(), Arc::new(MockFetcher::serving("shell")), config()).unwrap();
        installer.install().await.unwrap();

        // Same generation, network now dead.
        let offline = MockFetcher::offline();
        let agent = Agent::new(db, Arc::new(offline), config()).unwrap();

        for path in ["https://converter.example/", "https://converter.example/index.html"] {
            let req = AgentRequest::get(path).unwrap();
            let got = expect_response(agent.handle(&req).await.unwrap());
            assert_eq!(got.body, b"shell", "{path}");
        }
    }

    #[tokio::test]
    async fn test_activate_deletes_stale_generations() {
        let db = CacheDb::open_in_memory().await.unwrap();
        for name in [
            "offcache-static-v0",
            "offcache-runtime-v0",
            "offcache-static-v0.9",
            "offcache-runtime-v0.9",
            "offcache-static-v1",
            "offcache-runtime-v1",
        ] {
            db.open_store(name).await.unwrap();
        }

        let agent = Agent::new(db.clone(), Arc::new(MockFetcher::offline()), config()).unwrap();
        agent.activate().await.unwrap();

        let mut names = db.list_store_names().await.unwrap();
        names.sort();
        assert_eq!(names, vec!["offcache-runtime-v1", "offcache-static-v1"]);
    }

    #[tokio::test]
    async fn test_activate_spares_foreign_stores() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open_store("unrelated-static-v0").await.unwrap();

        let agent = Agent::new(db.clone(), Arc::new(MockFetcher::offline()), config()).unwrap();
        agent.activate().await.unwrap();

        assert_eq!(db.list_store_names().await.unwrap(), vec!["unrelated-static-v0"]);
    }

    #[tokio::test]
    async fn test_non_get_passes_through() {
        let agent = agent_with(MockFetcher::serving("x"), config()).await;
        let req = AgentRequest::get("https://converter.example/api/convert")
            .unwrap()
            .with_method(Method::POST);

        let outcome = agent.handle(&req).await.unwrap();
        assert!(matches!(outcome, HandleOutcome::Passthrough));
    }

    #[tokio::test]
    async fn test_navigation_offline_serves_prior_shell() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let online = Agent::new(db.clone(), Arc::new(MockFetcher::serving("shell v1")), config()).unwrap();
        let nav = AgentRequest::navigation("https://converter.example/").unwrap();
        online.handle(&nav).await.unwrap();

        let offline = Agent::new(db, Arc::new(MockFetcher::offline()), config()).unwrap();
        let got = expect_response(offline.handle(&nav).await.unwrap());
        assert_eq!(got.status, 200);
        assert_eq!(got.body, b"shell v1");
    }

    #[tokio::test]
    async fn test_navigation_offline_without_shell_is_503() {
        let agent = agent_with(MockFetcher::offline(), config()).await;
        let nav = AgentRequest::navigation("https://converter.example/").unwrap();

        let got = expect_response(agent.handle(&nav).await.unwrap());
        assert_eq!(got.status, 503);
        assert_eq!(got.reason.as_deref(), Some("Offline"));
    }

    #[tokio::test]
    async fn test_runtime_request_cached_by_key() {
        let agent = agent_with(MockFetcher::serving("pixels"), config()).await;
        let req = AgentRequest::get("https://converter.example/photo.png")
            .unwrap()
            .with_destination(RequestDestination::Image);

        let got = expect_response(agent.handle(&req).await.unwrap());
        assert_eq!(got.body, b"pixels");

        let copy = agent.db.get(agent.runtime_store(), &req.key()).await.unwrap().unwrap();
        assert_eq!(copy.body, b"pixels");
    }

    #[tokio::test]
    async fn test_runtime_store_bounded_with_oldest_evicted() {
        let mut cfg = config();
        cfg.max_runtime_entries = 40;
        let agent = agent_with(MockFetcher::serving("x"), cfg).await;

        let first = AgentRequest::get("https://converter.example/assets/0.png")
            .unwrap()
            .with_destination(RequestDestination::Image);

        for i in 0..41 {
            let req = AgentRequest::get(&format!("https://converter.example/assets/{i}.png"))
                .unwrap()
                .with_destination(RequestDestination::Image);
            agent.handle(&req).await.unwrap();
        }

        // The strategy dispatched trims already; this awaited call makes
        // the final state deterministic and is idempotent.
        agent.trim_runtime().await.unwrap();

        assert_eq!(agent.db.count(agent.runtime_store()).await.unwrap(), 40);
        assert!(agent.db.get(agent.runtime_store(), &first.key()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_new_rejects_bad_origin() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let cfg = AgentConfig { origin: "not a url".into(), ..Default::default() };
        let result = Agent::new(db, Arc::new(MockFetcher::offline()), cfg);
        assert!(matches!(result, Err(Error::InvalidUrl(_))));
    }
}
