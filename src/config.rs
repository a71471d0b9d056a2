//! Store configuration
//!
//! Static settings a [`crate::Store`] is opened with. Defaults can be overridden
//! from the environment or read from a JSON document.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::consts::DEFAULT_TABLE_NAME;
use crate::error::{FileStoreError, Result};
use crate::storage::connection::IN_MEMORY;

pub const ENV_DB_PATH: &str = "FILESTORE_DB_PATH";
pub const ENV_TABLE: &str = "FILESTORE_TABLE";
pub const ENV_DEBUG: &str = "FILESTORE_DEBUG";
pub const ENV_AUTOMIGRATE: &str = "FILESTORE_AUTOMIGRATE";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// SQLite file, or `:memory:`.
    pub db_path: PathBuf,
    pub table_name: String,
    /// Log every SQL statement at debug level.
    pub debug: bool,
    /// Create the table and root directory on open.
    pub automigrate: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            table_name: DEFAULT_TABLE_NAME.to_string(),
            debug: false,
            automigrate: true,
        }
    }
}

impl StoreConfig {
    /// Private in-memory database, bootstrapped on open.
    pub fn in_memory() -> Self {
        Self {
            db_path: PathBuf::from(IN_MEMORY),
            ..Self::default()
        }
    }

    /// Defaults overlaid with `FILESTORE_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| FileStoreError::InvalidArgument(format!("invalid store config: {}", e)))
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup(ENV_DB_PATH).filter(|v| !v.is_empty()) {
            config.db_path = PathBuf::from(path);
        }
        if let Some(table) = lookup(ENV_TABLE).filter(|v| !v.is_empty()) {
            config.table_name = table;
        }
        if let Some(raw) = lookup(ENV_DEBUG) {
            config.debug = parse_flag(ENV_DEBUG, &raw)?;
        }
        if let Some(raw) = lookup(ENV_AUTOMIGRATE) {
            config.automigrate = parse_flag(ENV_AUTOMIGRATE, &raw)?;
        }

        Ok(config)
    }
}

fn parse_flag(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(FileStoreError::InvalidArgument(format!(
            "{} must be a boolean, got {:?}",
            key, other
        ))),
    }
}

fn default_db_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("sqlfilestore"))
        .unwrap_or_else(|| PathBuf::from("/tmp").join(".sqlfilestore"))
        .join("filestore.db")
}
