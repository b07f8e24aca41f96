//! Named store and entry operations.
//!
//! A store is a named mapping from request key to cached response. Two
//! logical stores exist per generation: a static store holding precached
//! assets and a bounded runtime store. Stale-generation stores are deleted
//! wholesale during activation.

use super::connection::CacheDb;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// An immutable snapshot of a prior HTTP response.
///
/// Entries are never mutated in place: a fresh write with the same key
/// replaces the old row and refreshes its insertion position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedResponse {
    pub status: u16,
    pub reason: Option<String>,
    pub content_type: Option<String>,
    pub headers_json: Option<String>,
    pub body: Vec<u8>,
    pub inserted_at: String,
}

impl CachedResponse {
    /// Build a snapshot stamped with the current time.
    pub fn new(status: u16, content_type: Option<String>, body: Vec<u8>) -> Self {
        Self {
            status,
            reason: None,
            content_type,
            headers_json: None,
            body,
            inserted_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// The synthetic response returned when both network and cache are
    /// exhausted: status 503, reason "Offline", empty body.
    pub fn offline() -> Self {
        Self {
            status: 503,
            reason: Some("Offline".to_string()),
            content_type: None,
            headers_json: None,
            body: Vec::new(),
            inserted_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Whether the status is in the HTTP success range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl CacheDb {
    /// Open a store by name, creating it if absent.
    pub async fn open_store(&self, name: &str) -> Result<(), Error> {
        let name = name.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO stores (name, created_at) VALUES (?1, ?2)",
                    params![name, now],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Write an entry, replacing any prior entry with the same key.
    ///
    /// The replaced row gets a fresh insertion position, so a rewritten
    /// key counts as newest for eviction purposes. Creates the store row
    /// if it doesn't exist yet.
    pub async fn put(&self, store: &str, key: &str, response: &CachedResponse) -> Result<(), Error> {
        let store = store.to_string();
        let key = key.to_string();
        let response = response.clone();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO stores (name, created_at) VALUES (?1, ?2)",
                    params![store, response.inserted_at],
                )?;
                conn.execute(
                    "INSERT OR REPLACE INTO entries
                        (store, key, status, reason, content_type, headers_json, body, inserted_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                    params![
                        store,
                        key,
                        response.status,
                        response.reason,
                        response.content_type,
                        response.headers_json,
                        response.body,
                        response.inserted_at,
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Write a batch of entries in one transaction.
    ///
    /// Either every entry lands or none do; used for all-or-nothing
    /// precache population at install time.
    pub async fn put_batch(&self, store: &str, batch: Vec<(String, CachedResponse)>) -> Result<(), Error> {
        let store = store.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                tx.execute(
                    "INSERT OR IGNORE INTO stores (name, created_at) VALUES (?1, ?2)",
                    params![store, now],
                )?;
                for (key, response) in &batch {
                    tx.execute(
                        "INSERT OR REPLACE INTO entries
                            (store, key, status, reason, content_type, headers_json, body, inserted_at)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                        params![
                            store,
                            key,
                            response.status,
                            response.reason,
                            response.content_type,
                            response.headers_json,
                            response.body,
                            response.inserted_at,
                        ],
                    )?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Get an entry by key.
    ///
    /// Returns None if the store or key doesn't exist.
    pub async fn get(&self, store: &str, key: &str) -> Result<Option<CachedResponse>, Error> {
        let store = store.to_string();
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<Option<CachedResponse>, Error> {
                let result = conn.query_row(
                    "SELECT status, reason, content_type, headers_json, body, inserted_at
                     FROM entries WHERE store = ?1 AND key = ?2",
                    params![store, key],
                    |row| {
                        Ok(CachedResponse {
                            status: row.get(0)?,
                            reason: row.get(1)?,
                            content_type: row.get(2)?,
                            headers_json: row.get(3)?,
                            body: row.get(4)?,
                            inserted_at: row.get(5)?,
                        })
                    },
                );

                match result {
                    Ok(r) => Ok(Some(r)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Delete an entry by key. Returns true if a row was removed.
    pub async fn delete(&self, store: &str, key: &str) -> Result<bool, Error> {
        let store = store.to_string();
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let n = conn.execute("DELETE FROM entries WHERE store = ?1 AND key = ?2", params![store, key])?;
                Ok(n > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// List entry keys in insertion order, oldest first.
    pub async fn keys(&self, store: &str) -> Result<Vec<String>, Error> {
        let store = store.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT key FROM entries WHERE store = ?1 ORDER BY id ASC")?;
                let keys = stmt
                    .query_map(params![store], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(keys)
            })
            .await
            .map_err(Error::from)
    }

    /// Count entries in a store.
    pub async fn count(&self, store: &str) -> Result<u64, Error> {
        let store = store.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let n: i64 =
                    conn.query_row("SELECT COUNT(*) FROM entries WHERE store = ?1", params![store], |row| {
                        row.get(0)
                    })?;
                Ok(n as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// List all store names, oldest creation first.
    pub async fn list_store_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(move |conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM stores ORDER BY rowid ASC")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a store and all its entries. Returns true if the store existed.
    pub async fn delete_store(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let n = conn.execute("DELETE FROM stores WHERE name = ?1", params![name])?;
                Ok(n > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete oldest entries until count <= max_entries.
    ///
    /// Approximate LRU by insertion order: reads do not refresh position.
    /// Returns the number of deleted entries.
    pub async fn trim_store(&self, store: &str, max_entries: usize) -> Result<u64, Error> {
        let store = store.to_string();
        let max = max_entries as i64;
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM entries WHERE store = ?1", params![&store], |row| {
                        row.get(0)
                    })?;
                if count <= max {
                    return Ok(0);
                }

                let to_delete = count - max;
                let deleted = conn.execute(
                    "DELETE FROM entries WHERE id IN (
                        SELECT id FROM entries WHERE store = ?1 ORDER BY id ASC LIMIT ?2
                    )",
                    params![store, to_delete],
                )?;
                Ok(deleted as u64)
            })
            .await
            .map_err(Error::from)
    }
}
