/*!
 * Database module for the persistent translation cache.
 *
 * This module provides SQLite-based persistence for translated text, keyed by
 * language pair and the SHA-256 hash of the sanitized source text, so that
 * repeated runs over the same material skip the provider entirely.
 */

pub mod schema;
pub mod connection;
pub mod repository;

// Re-export main types
pub use connection::DatabaseConnection;
pub use repository::CacheRepository;
