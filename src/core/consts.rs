// FILE: src/core/consts.rs
//! Well-known values shared with every caller of the store.
//!
//! These form the wire contract: changing any of them invalidates data already
//! written to an existing table.

/// Id of the canonical root directory created by bootstrap.
pub const ROOT_ID: &str = "root";

/// Parent id of the root directory. No record ever carries this id.
pub const ROOT_PARENT_ID: &str = "-1";

/// Materialized path of the root directory.
pub const ROOT_PATH: &str = "/";

pub const ROOT_NAME: &str = "root";

pub const PATH_SEPARATOR: char = '/';

/// `deleted_at` value of a live record.
pub const NULL_DATETIME: &str = "0002-01-01 00:00:00";

/// Timestamp layout used for every `*_at` column (UTC).
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub const SORT_ASC: &str = "asc";
pub const SORT_DESC: &str = "desc";

pub const TYPE_FILE: &str = "file";
pub const TYPE_DIRECTORY: &str = "directory";

pub const DEFAULT_TABLE_NAME: &str = "filestore_records";

/// Current UTC time in `DATETIME_FORMAT`.
pub fn now_datetime() -> String {
    chrono::Utc::now().format(DATETIME_FORMAT).to_string()
}
