//! sqlfilestore: a file/directory tree kept in one SQL table
//!
//! Every node is a row carrying its materialized absolute path:
//! - Record (entity with field-level dirty tracking)
//! - Path resolver (normalization, child paths)
//! - Store (CRUD, soft delete, delete guard, path recalculation)
//! - Query options compiled into parameterized SQL

pub mod config;
pub mod context;
pub mod core;
pub mod error;
pub mod logging;
pub mod storage;

pub use config::StoreConfig;
pub use context::Context;
pub use crate::core::{Column, Record, RecordType};
pub use error::{FileStoreError, Result};
pub use storage::{RecordQueryOptions, Store};
