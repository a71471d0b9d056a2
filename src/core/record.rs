// FILE: src/core/record.rs
//! The Record: one file or directory node, with field-level change tracking.
//!
//! Every setter writes the field and tags its column dirty in the same call, so the
//! dirty set always names exactly the columns mutated since construction, hydration
//! or the last successful persist. The store builds partial `UPDATE`s from it.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use uuid::Uuid;

use super::consts::{now_datetime, NULL_DATETIME, TYPE_DIRECTORY, TYPE_FILE};
use super::path;
use crate::error::{FileStoreError, Result};

/// Columns of the records table, in storage order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    Id,
    Type,
    ParentId,
    Name,
    Path,
    Contents,
    Size,
    Extension,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}

impl Column {
    pub const ALL: [Column; 11] = [
        Column::Id,
        Column::Type,
        Column::ParentId,
        Column::Name,
        Column::Path,
        Column::Contents,
        Column::Size,
        Column::Extension,
        Column::CreatedAt,
        Column::UpdatedAt,
        Column::DeletedAt,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Column::Id => "id",
            Column::Type => "type",
            Column::ParentId => "parent_id",
            Column::Name => "name",
            Column::Path => "path",
            Column::Contents => "contents",
            Column::Size => "size",
            Column::Extension => "extension",
            Column::CreatedAt => "created_at",
            Column::UpdatedAt => "updated_at",
            Column::DeletedAt => "deleted_at",
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Column {
    type Err = FileStoreError;

    fn from_str(s: &str) -> Result<Self> {
        Column::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| FileStoreError::InvalidArgument(format!("unknown column: {}", s)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordType {
    File,
    Directory,
}

impl RecordType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::File => TYPE_FILE,
            RecordType::Directory => TYPE_DIRECTORY,
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = FileStoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            TYPE_FILE => Ok(RecordType::File),
            TYPE_DIRECTORY => Ok(RecordType::Directory),
            other => Err(FileStoreError::InvalidArgument(format!(
                "unknown record type: {}",
                other
            ))),
        }
    }
}

/// A filesystem node as stored in one table row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    id: String,
    #[serde(rename = "type")]
    record_type: Option<RecordType>,
    parent_id: String,
    name: String,
    path: String,
    contents: String,
    size: u64,
    extension: String,
    created_at: String,
    updated_at: String,
    deleted_at: String,

    #[serde(skip)]
    changed: BTreeSet<Column>,
}

impl Record {
    /// Fresh record with a generated id, both timestamps stamped and no type.
    pub fn new() -> Self {
        let now = now_datetime();
        Self {
            id: Uuid::new_v4().to_string(),
            record_type: None,
            parent_id: String::new(),
            name: String::new(),
            path: String::new(),
            contents: String::new(),
            size: 0,
            extension: String::new(),
            created_at: now.clone(),
            updated_at: now,
            deleted_at: NULL_DATETIME.to_string(),
            changed: BTreeSet::new(),
        }
    }

    pub fn new_file() -> Self {
        Self {
            record_type: Some(RecordType::File),
            ..Self::new()
        }
    }

    /// Directories carry no payload: size 0, empty contents and extension.
    pub fn new_directory() -> Self {
        Self {
            record_type: Some(RecordType::Directory),
            size: 0,
            ..Self::new()
        }
    }

    /// Rebuild a record from a stored row.
    ///
    /// The row is trusted to match storage, so nothing is marked dirty. `id` is
    /// required; every other key may be missing (column projections) and falls
    /// back to its default. A malformed `type` or `size` is a decode error; `size`
    /// must be written exactly as [`Record::value_of`] would write it back.
    pub fn from_existing_data(data: &HashMap<String, String>) -> Result<Self> {
        let text = |column: Column| data.get(column.as_str()).cloned().unwrap_or_default();

        let id = text(Column::Id);
        if id.is_empty() {
            return Err(FileStoreError::Decode("missing required key `id`".into()));
        }

        let record_type = match data.get(Column::Type.as_str()).map(String::as_str) {
            None | Some("") => None,
            Some(raw) => Some(raw.parse::<RecordType>().map_err(|_| {
                FileStoreError::Decode(format!("record {}: invalid type `{}`", id, raw))
            })?),
        };

        let size = match data.get(Column::Size.as_str()).map(String::as_str) {
            None | Some("") => 0,
            Some(raw) => parse_size(raw).ok_or_else(|| {
                FileStoreError::Decode(format!(
                    "record {}: size `{}` is not a canonical decimal",
                    id, raw
                ))
            })?,
        };

        let deleted_at = data
            .get(Column::DeletedAt.as_str())
            .filter(|v| !v.is_empty())
            .cloned()
            .unwrap_or_else(|| NULL_DATETIME.to_string());

        Ok(Self {
            record_type,
            parent_id: text(Column::ParentId),
            name: text(Column::Name),
            path: text(Column::Path),
            contents: text(Column::Contents),
            size,
            extension: text(Column::Extension),
            created_at: text(Column::CreatedAt),
            updated_at: text(Column::UpdatedAt),
            deleted_at,
            changed: BTreeSet::new(),
            id,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn record_type(&self) -> Option<RecordType> {
        self.record_type
    }

    pub fn parent_id(&self) -> &str {
        &self.parent_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn contents(&self) -> &str {
        &self.contents
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn created_at(&self) -> &str {
        &self.created_at
    }

    pub fn updated_at(&self) -> &str {
        &self.updated_at
    }

    pub fn deleted_at(&self) -> &str {
        &self.deleted_at
    }

    pub fn is_directory(&self) -> bool {
        self.record_type == Some(RecordType::Directory)
    }

    pub fn is_file(&self) -> bool {
        self.record_type == Some(RecordType::File)
    }

    pub fn is_soft_deleted(&self) -> bool {
        self.deleted_at != NULL_DATETIME
    }

    pub fn set_id(&mut self, id: impl Into<String>) -> &mut Self {
        self.id = id.into();
        self.touch(Column::Id)
    }

    pub fn set_type(&mut self, record_type: RecordType) -> &mut Self {
        self.record_type = Some(record_type);
        self.touch(Column::Type)
    }

    pub fn set_parent_id(&mut self, parent_id: impl Into<String>) -> &mut Self {
        self.parent_id = parent_id.into();
        self.touch(Column::ParentId)
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = name.into();
        self.touch(Column::Name)
    }

    /// Always stored normalized, see [`path::normalize`].
    pub fn set_path(&mut self, path: &str) -> &mut Self {
        self.path = path::normalize(path);
        self.touch(Column::Path)
    }

    pub fn set_contents(&mut self, contents: impl Into<String>) -> &mut Self {
        self.contents = contents.into();
        self.touch(Column::Contents)
    }

    pub fn set_size(&mut self, size: u64) -> &mut Self {
        self.size = size;
        self.touch(Column::Size)
    }

    pub fn set_extension(&mut self, extension: impl Into<String>) -> &mut Self {
        self.extension = extension.into();
        self.touch(Column::Extension)
    }

    pub fn set_created_at(&mut self, created_at: impl Into<String>) -> &mut Self {
        self.created_at = created_at.into();
        self.touch(Column::CreatedAt)
    }

    pub fn set_updated_at(&mut self, updated_at: impl Into<String>) -> &mut Self {
        self.updated_at = updated_at.into();
        self.touch(Column::UpdatedAt)
    }

    pub fn set_deleted_at(&mut self, deleted_at: impl Into<String>) -> &mut Self {
        self.deleted_at = deleted_at.into();
        self.touch(Column::DeletedAt)
    }

    fn touch(&mut self, column: Column) -> &mut Self {
        self.changed.insert(column);
        self
    }

    pub fn is_dirty(&self) -> bool {
        !self.changed.is_empty()
    }

    pub fn dirty_columns(&self) -> impl Iterator<Item = Column> + '_ {
        self.changed.iter().copied()
    }

    pub fn is_column_dirty(&self, column: Column) -> bool {
        self.changed.contains(&column)
    }

    pub fn mark_as_not_dirty(&mut self) {
        self.changed.clear();
    }

    /// Clear only the given columns, leaving the rest of the dirty set intact.
    pub fn mark_columns_clean(&mut self, columns: &[Column]) {
        for column in columns {
            self.changed.remove(column);
        }
    }

    /// Storage representation of one column.
    pub fn value_of(&self, column: Column) -> String {
        match column {
            Column::Id => self.id.clone(),
            Column::Type => self.record_type.map(|t| t.as_str()).unwrap_or("").to_string(),
            Column::ParentId => self.parent_id.clone(),
            Column::Name => self.name.clone(),
            Column::Path => self.path.clone(),
            Column::Contents => self.contents.clone(),
            Column::Size => self.size.to_string(),
            Column::Extension => self.extension.clone(),
            Column::CreatedAt => self.created_at.clone(),
            Column::UpdatedAt => self.updated_at.clone(),
            Column::DeletedAt => self.deleted_at.clone(),
        }
    }

    /// Every column with its storage value.
    pub fn data(&self) -> BTreeMap<Column, String> {
        Column::ALL.iter().map(|&c| (c, self.value_of(c))).collect()
    }

    /// Only the dirty columns with their storage values.
    pub fn changed_data(&self) -> BTreeMap<Column, String> {
        self.changed.iter().map(|&c| (c, self.value_of(c))).collect()
    }
}

impl Default for Record {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (id: {}, type: {}, size: {})",
            self.path,
            self.id,
            self.record_type.map(|t| t.as_str()).unwrap_or("-"),
            self.size
        )
    }
}

/// Digits only, no sign and no leading zero, so the value reads back unchanged.
fn parse_size(raw: &str) -> Option<u64> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if raw.len() > 1 && raw.starts_with('0') {
        return None;
    }
    raw.parse().ok()
}
