/*!
 * Database schema definitions and migrations.
 *
 * This module contains the SQL schema for the translation cache table and
 * tracks the schema version through SQLite's `user_version` pragma.
 */

use rusqlite::Connection;
use log::{debug, info};

use crate::errors::CacheError;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// Initialize the database schema
pub fn initialize_schema(conn: &Connection) -> Result<(), CacheError> {
    // WAL keeps readers off the writer's back; NORMAL sync is enough for a cache
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

    let current_version = get_schema_version(conn)?;

    if current_version == 0 {
        info!("Initializing cache schema v{}", SCHEMA_VERSION);
        create_all_tables(conn)?;
        set_schema_version(conn, SCHEMA_VERSION)?;
    } else if current_version > SCHEMA_VERSION {
        return Err(CacheError::Open(format!(
            "Cache schema v{} is newer than supported v{}",
            current_version, SCHEMA_VERSION
        )));
    } else {
        debug!("Cache schema is up to date (v{})", current_version);
    }

    Ok(())
}

/// Get the current schema version from the database
fn get_schema_version(conn: &Connection) -> Result<i32, CacheError> {
    Ok(conn.query_row("PRAGMA user_version", [], |row| row.get(0))?)
}

/// Set the schema version in the database
fn set_schema_version(conn: &Connection, version: i32) -> Result<(), CacheError> {
    conn.execute_batch(&format!("PRAGMA user_version = {}", version))?;
    Ok(())
}

/// Create all database tables
fn create_all_tables(conn: &Connection) -> Result<(), CacheError> {
    // One row per (language pair, content hash)
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS translations (
            src TEXT NOT NULL,
            tgt TEXT NOT NULL,
            hash TEXT NOT NULL,
            text TEXT NOT NULL,
            PRIMARY KEY (src, tgt, hash)
        );
        "#,
    )?;

    Ok(())
}
