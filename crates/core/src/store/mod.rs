//! SQLite-backed named cache stores.
//!
//! This module provides persistent, named key-value stores for cached
//! HTTP responses, with async access via tokio-rusqlite. It supports:
//!
//! - Multiple named stores in one database (static and runtime generations)
//! - Request-identity keys via SHA-256 hashing
//! - Insertion-order key listing for oldest-first eviction
//! - Automatic schema migrations
//! - WAL mode for concurrent access

pub mod connection;
pub mod entries;
pub mod key;
pub mod migrations;

pub use crate::Error;

pub use connection::CacheDb;
pub use entries::CachedResponse;
pub use key::request_key;
