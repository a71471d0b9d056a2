//! Schema initialization
//!
//! One flat table holds every record. All columns are TEXT so numeric fields
//! round-trip as decimal strings regardless of driver.

use rusqlite::Connection;

use crate::error::{FileStoreError, Result};
use crate::storage::query::quote_ident;

/// Table names are spliced into SQL, so only plain identifiers are accepted.
pub fn validate_table_name(table: &str) -> Result<()> {
    let mut chars = table.chars();
    let valid_start = chars
        .next()
        .map(|c| c.is_ascii_alphabetic() || c == '_')
        .unwrap_or(false);

    if !valid_start || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(FileStoreError::InvalidArgument(format!(
            "invalid table name: {:?}",
            table
        )));
    }
    Ok(())
}

/// DDL for the records table and its lookup indexes.
pub fn table_create_sql(table: &str) -> String {
    let quoted = quote_ident(table);
    format!(
        r#"
        CREATE TABLE IF NOT EXISTS {quoted} (
            "id" TEXT NOT NULL PRIMARY KEY,
            "type" TEXT NOT NULL DEFAULT '',
            "parent_id" TEXT NOT NULL DEFAULT '',
            "name" TEXT NOT NULL DEFAULT '',
            "path" TEXT NOT NULL DEFAULT '',
            "contents" TEXT NOT NULL DEFAULT '',
            "size" TEXT NOT NULL DEFAULT '0',
            "extension" TEXT NOT NULL DEFAULT '',
            "created_at" TEXT NOT NULL,
            "updated_at" TEXT NOT NULL,
            "deleted_at" TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS {parent_idx} ON {quoted} ("parent_id");
        CREATE INDEX IF NOT EXISTS {path_idx} ON {quoted} ("path");
        "#,
        quoted = quoted,
        parent_idx = quote_ident(&format!("{}_parent_id_idx", table)),
        path_idx = quote_ident(&format!("{}_path_idx", table)),
    )
}

pub fn create_tables(conn: &Connection, table: &str) -> Result<()> {
    validate_table_name(table)?;
    conn.execute_batch(&table_create_sql(table))?;
    tracing::debug!("Created {} table", table);
    Ok(())
}
