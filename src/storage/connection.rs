//! Database connection management
//!
//! Opens the SQLite file backing a store and applies the pragmas every store
//! connection runs with.

use std::path::Path;

use rusqlite::Connection;

use crate::error::{FileStoreError, Result};

/// Path understood as "no file, keep everything in memory".
pub const IN_MEMORY: &str = ":memory:";

/// Open (creating if needed) the database at `db_path`.
///
/// Creates the parent directory, enables WAL mode for concurrent readers, turns
/// foreign keys on and sets synchronous to NORMAL. `:memory:` opens a private
/// in-memory database with foreign keys on.
pub fn open_connection(db_path: &Path) -> Result<Connection> {
    if db_path.as_os_str() == IN_MEMORY {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", ON)?;
        tracing::debug!("Opened in-memory database");
        return Ok(conn);
    }

    let db_dir = db_path
        .parent()
        .ok_or_else(|| FileStoreError::InvalidArgument("Invalid database path".into()))?;

    if !db_dir.as_os_str().is_empty() {
        std::fs::create_dir_all(db_dir).map_err(FileStoreError::Io)?;
    }

    let conn = Connection::open(db_path).map_err(FileStoreError::Database)?;

    // Enable WAL mode for better concurrent access
    let mode: String =
        conn.pragma_update_and_check(None, "journal_mode", WAL, |row| row.get(0))?;
    if !mode.eq_ignore_ascii_case(WAL) {
        tracing::warn!("Journal mode is {} instead of WAL", mode);
    }

    // Enable foreign key constraints
    conn.pragma_update(None, "foreign_keys", ON)?;

    // Optimize for performance
    conn.pragma_update(None, "synchronous", NORMAL)?;

    tracing::info!("Database opened at: {}", db_path.display());

    Ok(conn)
}

// SQL pragma constants
const WAL: &str = "WAL";
const NORMAL: &str = "NORMAL";
const ON: &str = "ON";
