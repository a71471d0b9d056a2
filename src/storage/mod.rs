// FILE: src/storage/mod.rs
pub mod connection;
pub mod init;
pub mod query;
mod recalculate;
pub mod store;

// Common exports
pub use connection::open_connection;
pub use query::{Predicate, Projection, RecordQuery, RecordQueryOptions, SortDirection};
pub use store::Store;
