//! Agent configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (OFFCACHE_*)
//! 2. TOML config file (if OFFCACHE_CONFIG_FILE set)
//! 3. Built-in defaults
//!
//! The version tag, precache list, and runtime cache bound are deployment
//! inputs: changing the version tag is the sole cache-invalidation
//! mechanism across deployments.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Agent configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (OFFCACHE_*)
/// 2. TOML config file (if OFFCACHE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Version tag embedded in store names.
    ///
    /// Bumping this retires the previous generation's stores on the next
    /// activation. Set via OFFCACHE_VERSION environment variable.
    #[serde(default = "default_version")]
    pub version: String,

    /// Prefix for store names: `{cache_prefix}-static-{version}` and
    /// `{cache_prefix}-runtime-{version}`.
    #[serde(default = "default_cache_prefix")]
    pub cache_prefix: String,

    /// Origin of the application the agent fronts.
    ///
    /// Precache paths are resolved against it and requests to any other
    /// origin never qualify for the static strategy.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Ordered list of same-origin paths populated at install time.
    ///
    /// Entries use `./`-relative form; `"./"` is the root marker.
    #[serde(default = "default_precache")]
    pub precache: Vec<String>,

    /// Maximum entry count for the runtime store.
    #[serde(default = "default_max_runtime_entries")]
    pub max_runtime_entries: usize,

    /// Path to the SQLite cache database.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for outbound requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Network fetch timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum bytes to accept per fetched response.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,
}

fn default_version() -> String {
    "v1".into()
}

fn default_cache_prefix() -> String {
    "offcache".into()
}

fn default_origin() -> String {
    "http://localhost:8080/".into()
}

fn default_precache() -> Vec<String> {
    vec!["./".to_string(), "./index.html".to_string()]
}

fn default_max_runtime_entries() -> usize {
    40
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./offcache.sqlite")
}

fn default_user_agent() -> String {
    "offcache/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            cache_prefix: default_cache_prefix(),
            origin: default_origin(),
            precache: default_precache(),
            max_runtime_entries: default_max_runtime_entries(),
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            max_bytes: default_max_bytes(),
        }
    }
}

impl AgentConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Name of the current static store.
    pub fn static_store(&self) -> String {
        format!("{}-static-{}", self.cache_prefix, self.version)
    }

    /// Name of the current runtime store.
    pub fn runtime_store(&self) -> String {
        format!("{}-runtime-{}", self.cache_prefix, self.version)
    }

    /// Whether a store name belongs to a stale generation.
    ///
    /// Matches the static or runtime naming pattern but differs from the
    /// current store names.
    pub fn is_stale_store(&self, name: &str) -> bool {
        let static_prefix = format!("{}-static-", self.cache_prefix);
        let runtime_prefix = format!("{}-runtime-", self.cache_prefix);
        (name.starts_with(&static_prefix) && name != self.static_store())
            || (name.starts_with(&runtime_prefix) && name != self.runtime_store())
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `OFFCACHE_`
    /// 2. TOML file from `OFFCACHE_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("OFFCACHE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("OFFCACHE_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
