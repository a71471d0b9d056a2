// FILE: src/storage/store.rs
//! Store Facade
//!
//! Owns the connection and the static configuration (table name, debug flag) and
//! implements create/read/update/soft-delete/delete over the records table.
//! Path recalculation lives in `recalculate.rs` as a second `impl Store` block.

use std::collections::HashMap;

use rusqlite::types::ValueRef;
use rusqlite::{params_from_iter, Connection};

use crate::config::StoreConfig;
use crate::context::Context;
use crate::core::consts::{now_datetime, ROOT_ID, ROOT_NAME, ROOT_PARENT_ID, ROOT_PATH};
use crate::core::{path, Column, Record};
use crate::error::{FileStoreError, Result};
use crate::storage::connection::open_connection;
use crate::storage::init::{create_tables, validate_table_name};
use crate::storage::query::{quote_ident, RecordQueryOptions};

pub struct Store {
    conn: Connection,
    table_name: String,
    debug_enabled: bool,
}

impl Store {
    pub fn new(conn: Connection, config: &StoreConfig) -> Result<Self> {
        validate_table_name(&config.table_name)?;
        Ok(Self {
            conn,
            table_name: config.table_name.clone(),
            debug_enabled: config.debug,
        })
    }

    /// Open the configured database and, when `automigrate` is set, bootstrap it.
    pub fn open(config: &StoreConfig) -> Result<Self> {
        let conn = open_connection(&config.db_path)?;
        let store = Self::new(conn, config)?;

        if config.automigrate {
            store.bootstrap(&Context::background())?;
        }

        Ok(store)
    }

    pub fn enable_debug(&mut self, debug: bool) {
        self.debug_enabled = debug;
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// The underlying connection, for callers wrapping store calls in their own
    /// transaction.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Ensure the table exists and holds the canonical root directory.
    pub fn bootstrap(&self, ctx: &Context) -> Result<()> {
        ctx.check()?;
        create_tables(&self.conn, &self.table_name)?;

        let root_count = self.count(
            ctx,
            RecordQueryOptions {
                path: Some(ROOT_PATH.to_string()),
                ..Default::default()
            },
        )?;

        if root_count > 0 {
            return Ok(());
        }

        let mut root = Record::new_directory();
        root.set_id(ROOT_ID)
            .set_path(ROOT_PATH)
            .set_name(ROOT_NAME)
            .set_parent_id(ROOT_PARENT_ID);

        self.create(ctx, &mut root)?;
        tracing::info!("[Store] Created root directory in {}", self.table_name);
        Ok(())
    }

    /// Insert every column of `record` and clear its dirty set.
    pub fn create(&self, ctx: &Context, record: &mut Record) -> Result<()> {
        if record.id().is_empty() {
            return Err(FileStoreError::InvalidArgument("record id is empty".into()));
        }
        check_name(record)?;

        let now = now_datetime();
        record.set_created_at(now.clone()).set_updated_at(now);

        let data = record.data();
        let columns: Vec<String> = data.keys().map(|c| quote_ident(c.as_str())).collect();
        let placeholders = vec!["?"; columns.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_ident(&self.table_name),
            columns.join(", "),
            placeholders
        );
        let params: Vec<String> = data.into_values().collect();

        self.execute(ctx, &sql, &params)?;
        record.mark_as_not_dirty();
        Ok(())
    }

    /// Write only the dirty columns of `record`.
    ///
    /// A dirty name that cannot be a path segment is rejected before anything is
    /// written.
    ///
    /// Nothing dirty is a successful no-op. `id` is never written. On success the
    /// written columns leave the dirty set; on failure it is left as it was, plus
    /// `updated_at`.
    pub fn update(&self, ctx: &Context, record: &mut Record) -> Result<()> {
        if record.id().is_empty() {
            return Err(FileStoreError::InvalidArgument("record id is empty".into()));
        }

        let mut changed = record.changed_data();
        changed.remove(&Column::Id);

        if changed.is_empty() {
            return Ok(());
        }
        if changed.contains_key(&Column::Name) {
            check_name(record)?;
        }

        let now = now_datetime();
        record.set_updated_at(now.clone());
        changed.insert(Column::UpdatedAt, now);

        let written: Vec<Column> = changed.keys().copied().collect();
        let assignments: Vec<String> = written
            .iter()
            .map(|c| format!("{} = ?", quote_ident(c.as_str())))
            .collect();
        let sql = format!(
            "UPDATE {} SET {} WHERE {} = ?",
            quote_ident(&self.table_name),
            assignments.join(", "),
            quote_ident(Column::Id.as_str())
        );

        let mut params: Vec<String> = changed.into_values().collect();
        params.push(record.id().to_string());

        self.execute(ctx, &sql, &params)?;
        record.mark_columns_clean(&written);
        Ok(())
    }

    /// First matching record, `Ok(None)` when there is none.
    pub fn find_by_id(
        &self,
        ctx: &Context,
        id: &str,
        options: RecordQueryOptions,
    ) -> Result<Option<Record>> {
        if id.is_empty() {
            return Err(FileStoreError::InvalidArgument("record id is empty".into()));
        }

        let options = RecordQueryOptions {
            id: Some(id.to_string()),
            limit: Some(1),
            ..options
        };

        Ok(self.list(ctx, &options)?.into_iter().next())
    }

    /// Like [`Store::find_by_id`]; a missing leading separator is added first.
    pub fn find_by_path(
        &self,
        ctx: &Context,
        path: &str,
        options: RecordQueryOptions,
    ) -> Result<Option<Record>> {
        if path.is_empty() {
            return Err(FileStoreError::InvalidArgument("record path is empty".into()));
        }

        let options = RecordQueryOptions {
            path: Some(path::fix_path(path)),
            limit: Some(1),
            ..options
        };

        Ok(self.list(ctx, &options)?.into_iter().next())
    }

    pub fn list(&self, ctx: &Context, options: &RecordQueryOptions) -> Result<Vec<Record>> {
        if options.count_only {
            return Err(FileStoreError::InvalidArgument(
                "count_only queries return a count, use Store::count".into(),
            ));
        }

        let (sql, params) = options.compile().to_sql(&self.table_name);
        let rows = self.select_to_map_string(ctx, &sql, &params)?;

        rows.iter().map(Record::from_existing_data).collect()
    }

    pub fn count(&self, ctx: &Context, options: RecordQueryOptions) -> Result<u64> {
        let options = RecordQueryOptions {
            count_only: true,
            ..options
        };
        let (sql, params) = options.compile().to_sql(&self.table_name);

        ctx.check()?;
        self.log_sql(&sql);

        let count: i64 = self
            .conn
            .query_row(&sql, params_from_iter(params.iter()), |row| row.get(0))?;

        u64::try_from(count)
            .map_err(|_| FileStoreError::Decode(format!("negative row count: {}", count)))
    }

    /// Stamp `deleted_at` and persist through [`Store::update`].
    pub fn soft_delete(&self, ctx: &Context, record: &mut Record) -> Result<()> {
        record.set_deleted_at(now_datetime());
        self.update(ctx, record)
    }

    pub fn soft_delete_by_id(&self, ctx: &Context, id: &str) -> Result<()> {
        let found = self.find_by_id(
            ctx,
            id,
            RecordQueryOptions {
                columns: vec![Column::Id, Column::DeletedAt],
                ..Default::default()
            },
        )?;

        let mut record = found
            .ok_or_else(|| FileStoreError::InvalidArgument(format!("record not found: {}", id)))?;

        self.soft_delete(ctx, &mut record)
    }

    pub fn delete(&self, ctx: &Context, record: &Record) -> Result<()> {
        self.delete_by_id(ctx, record.id())
    }

    /// Permanently remove a row.
    ///
    /// Refused with `DirectoryNotEmpty` while any row, soft-deleted or not, names
    /// `id` as its parent.
    pub fn delete_by_id(&self, ctx: &Context, id: &str) -> Result<()> {
        if id.is_empty() {
            return Err(FileStoreError::InvalidArgument("record id is empty".into()));
        }

        let children = self.count(
            ctx,
            RecordQueryOptions {
                parent_id: Some(id.to_string()),
                with_soft_deleted: true,
                ..Default::default()
            },
        )?;

        if children > 0 {
            tracing::warn!("[Store] Refusing to delete {}: {} child record(s)", id, children);
            return Err(FileStoreError::DirectoryNotEmpty(id.to_string()));
        }

        let sql = format!(
            "DELETE FROM {} WHERE {} = ?",
            quote_ident(&self.table_name),
            quote_ident(Column::Id.as_str())
        );
        let rows = self.execute(ctx, &sql, &[id.to_string()])?;

        tracing::debug!("[Store] Deleted record {} (rows affected: {})", id, rows);
        Ok(())
    }

    fn execute(&self, ctx: &Context, sql: &str, params: &[String]) -> Result<usize> {
        ctx.check()?;
        self.log_sql(sql);
        Ok(self.conn.execute(sql, params_from_iter(params.iter()))?)
    }

    /// Run a read and return each row as a column-name to string map.
    fn select_to_map_string(
        &self,
        ctx: &Context,
        sql: &str,
        params: &[String],
    ) -> Result<Vec<HashMap<String, String>>> {
        ctx.check()?;
        self.log_sql(sql);

        let mut stmt = self.conn.prepare(sql)?;
        let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        let rows = stmt.query_map(params_from_iter(params.iter()), |row| {
            let mut map = HashMap::with_capacity(names.len());
            for (idx, name) in names.iter().enumerate() {
                let value = match row.get_ref(idx)? {
                    ValueRef::Null => String::new(),
                    ValueRef::Integer(i) => i.to_string(),
                    ValueRef::Real(f) => f.to_string(),
                    ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
                        String::from_utf8_lossy(bytes).into_owned()
                    }
                };
                map.insert(name.clone(), value);
            }
            Ok(map)
        })?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    }

    fn log_sql(&self, sql: &str) {
        if self.debug_enabled {
            tracing::debug!("[Store] {}", sql);
        }
    }
}

fn check_name(record: &Record) -> Result<()> {
    if path::is_valid_name(record.name()) {
        return Ok(());
    }
    Err(FileStoreError::InvalidArgument(format!(
        "name `{}` contains a separator or surrounding whitespace",
        record.name()
    )))
}
