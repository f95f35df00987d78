/*!
 * Repository layer for the translation cache table.
 *
 * This module provides the SQLite implementation of the persistent cache
 * tier, abstracting away the SQL details behind the `PersistentCache` trait.
 */

use async_trait::async_trait;
use log::debug;
use rusqlite::{params, OptionalExtension};

use super::connection::DatabaseConnection;
use crate::errors::CacheError;
use crate::translation::cache::{CacheKey, PersistentCache};

/// Repository for cached translations
#[derive(Clone)]
pub struct CacheRepository {
    /// Database connection
    db: DatabaseConnection,
}

impl CacheRepository {
    /// Create a new repository with the given database connection
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Open (or create) the cache database at a path
    pub fn open<P: AsRef<std::path::Path>>(path: P) -> Result<Self, CacheError> {
        Ok(Self::new(DatabaseConnection::new(path)?))
    }

    /// Create a repository with the default database location
    pub fn new_default() -> Result<Self, CacheError> {
        Ok(Self::new(DatabaseConnection::new_default()?))
    }

    /// Create a repository with an in-memory database (for testing)
    pub fn new_in_memory() -> Result<Self, CacheError> {
        Ok(Self::new(DatabaseConnection::new_in_memory()?))
    }

    /// Number of cached rows
    pub async fn len(&self) -> Result<i64, CacheError> {
        self.db
            .execute_async(|conn| {
                Ok(conn.query_row("SELECT COUNT(*) FROM translations", [], |row| row.get(0))?)
            })
            .await
    }

    /// Whether the cache holds no rows
    pub async fn is_empty(&self) -> Result<bool, CacheError> {
        Ok(self.len().await? == 0)
    }

    /// Delete every cached translation, returning the number of rows removed
    pub async fn clear(&self) -> Result<usize, CacheError> {
        self.db
            .execute_async(|conn| Ok(conn.execute("DELETE FROM translations", [])?))
            .await
    }
}

#[async_trait]
impl PersistentCache for CacheRepository {
    async fn get(&self, key: &CacheKey) -> Result<Option<String>, CacheError> {
        let key = key.clone();

        self.db
            .execute_async(move |conn| {
                let cached = conn
                    .query_row(
                        "SELECT text FROM translations WHERE src = ?1 AND tgt = ?2 AND hash = ?3",
                        params![key.source_language, key.target_language, key.content_hash],
                        |row| row.get::<_, String>(0),
                    )
                    .optional()?;
                Ok(cached)
            })
            .await
    }

    async fn set(&self, key: &CacheKey, translated: &str) -> Result<(), CacheError> {
        let key = key.clone();
        let translated = translated.to_string();

        self.db
            .execute_async(move |conn| {
                conn.execute(
                    "INSERT OR REPLACE INTO translations (src, tgt, hash, text) VALUES (?1, ?2, ?3, ?4)",
                    params![key.source_language, key.target_language, key.content_hash, translated],
                )?;
                debug!(
                    "Cached {} -> {} translation {}",
                    key.source_language,
                    key.target_language,
                    &key.content_hash[..12.min(key.content_hash.len())]
                );
                Ok(())
            })
            .await
    }
}
