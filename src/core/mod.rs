// FILE: src/core/mod.rs
pub mod consts;
pub mod path;
pub mod record;

pub use record::{Column, Record, RecordType};
