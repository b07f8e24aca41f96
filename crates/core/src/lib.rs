//! Core types and shared functionality for offcache.
//!
//! This crate provides:
//! - Named cache stores with a SQLite backend
//! - Unified error types
//! - Agent configuration

pub mod config;
pub mod error;
pub mod store;

pub use config::AgentConfig;
pub use error::Error;
pub use store::{CacheDb, CachedResponse};
