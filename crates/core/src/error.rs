//! Unified error types for offcache.
//!
//! The taxonomy follows the agent's failure model: network transport
//! failures are always recoverable via cache fallback, a missing precache
//! asset is fatal to install, and store faults on non-critical paths are
//! swallowed at the call site rather than propagated.

use tokio_rusqlite::rusqlite;

/// Unified error types for the offcache agent.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Network transport failure: the fetch never produced a response.
    /// Recoverable via cache fallback or the synthetic offline response.
    #[error("NETWORK_UNREACHABLE: {0}")]
    Network(String),

    /// An install-time fetch for a required static asset failed.
    /// Fatal to the install; no partial precache is retained.
    #[error("PRECACHE_FAILED: {path}: {reason}")]
    Precache { path: String, reason: String },

    /// Database operation failed.
    #[error("STORE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("STORE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// A URL could not be parsed or resolved.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// A request the agent cannot represent (e.g. a relative URL).
    #[error("INVALID_REQUEST: {0}")]
    InvalidRequest(String),
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl Error {
    /// Whether this failure may abort a lifecycle step.
    ///
    /// Only a missing precache asset is allowed to fail install; every
    /// other failure is absorbed into a fallback response or a no-op.
    pub fn is_fatal_to_install(&self) -> bool {
        matches!(self, Error::Precache { .. })
    }
}
