// FILE: src/storage/query.rs
//! Query Predicate Compiler
//!
//! Turns a [`RecordQueryOptions`] into a [`RecordQuery`]: a list of predicates plus
//! projection, ordering and pagination. Rendering to SQL is a separate step so the
//! compiled form can be inspected without a database.
//!
//! Values are always bound as parameters. Column names only ever come from the
//! [`Column`] enum, so nothing caller-supplied is spliced into the statement.

use crate::core::consts::{NULL_DATETIME, SORT_ASC};
use crate::core::{Column, RecordType};

/// Filter, projection and pagination for a read over the records table.
///
/// Unset fields do not constrain the query. Soft-deleted rows are hidden unless
/// `with_soft_deleted` is set.
#[derive(Debug, Clone, Default)]
pub struct RecordQueryOptions {
    pub id: Option<String>,
    pub id_in: Vec<String>,
    pub parent_id: Option<String>,
    pub record_type: Option<RecordType>,
    pub path: Option<String>,
    /// Matched with `LIKE prefix%`. `%` and `_` inside the prefix are not escaped.
    pub path_starts_with: Option<String>,
    pub created_at_greater_than: Option<String>,
    pub created_at_less_than: Option<String>,
    pub updated_at_greater_than: Option<String>,
    pub updated_at_less_than: Option<String>,
    /// Empty means every column.
    pub columns: Vec<Column>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    /// Compared case-insensitively with `asc`; anything else sorts descending.
    pub sort_order: Option<String>,
    pub order_by: Option<Column>,
    pub count_only: bool,
    pub with_soft_deleted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    Eq(Column, String),
    Gt(Column, String),
    Lt(Column, String),
    In(Column, Vec<String>),
    StartsWith(Column, String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    All,
    Columns(Vec<Column>),
    Count,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordQuery {
    pub predicates: Vec<Predicate>,
    pub projection: Projection,
    pub order: Option<(Column, SortDirection)>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl RecordQueryOptions {
    pub fn compile(&self) -> RecordQuery {
        let mut predicates = Vec::new();

        let scalar = |column: Column, value: &Option<String>| {
            value.as_ref().filter(|v| !v.is_empty()).map(|v| (column, v.clone()))
        };

        if let Some((c, v)) = scalar(Column::Id, &self.id) {
            predicates.push(Predicate::Eq(c, v));
        }
        if !self.id_in.is_empty() {
            predicates.push(Predicate::In(Column::Id, self.id_in.clone()));
        }
        if let Some((c, v)) = scalar(Column::ParentId, &self.parent_id) {
            predicates.push(Predicate::Eq(c, v));
        }
        if let Some((c, v)) = scalar(Column::CreatedAt, &self.created_at_greater_than) {
            predicates.push(Predicate::Gt(c, v));
        }
        if let Some((c, v)) = scalar(Column::CreatedAt, &self.created_at_less_than) {
            predicates.push(Predicate::Lt(c, v));
        }
        if let Some((c, v)) = scalar(Column::UpdatedAt, &self.updated_at_greater_than) {
            predicates.push(Predicate::Gt(c, v));
        }
        if let Some((c, v)) = scalar(Column::UpdatedAt, &self.updated_at_less_than) {
            predicates.push(Predicate::Lt(c, v));
        }
        if let Some(record_type) = self.record_type {
            predicates.push(Predicate::Eq(Column::Type, record_type.as_str().to_string()));
        }
        if let Some((c, v)) = scalar(Column::Path, &self.path) {
            predicates.push(Predicate::Eq(c, v));
        }
        if let Some((c, v)) = scalar(Column::Path, &self.path_starts_with) {
            predicates.push(Predicate::StartsWith(c, v));
        }
        if !self.with_soft_deleted {
            predicates.push(Predicate::Eq(Column::DeletedAt, NULL_DATETIME.to_string()));
        }

        let projection = if self.count_only {
            Projection::Count
        } else if self.columns.is_empty() {
            Projection::All
        } else {
            Projection::Columns(self.columns.clone())
        };

        // A count has no rows to page through.
        let (limit, offset) = if self.count_only {
            (None, None)
        } else {
            (self.limit.filter(|&l| l > 0), self.offset.filter(|&o| o > 0))
        };

        let order = self.order_by.map(|column| {
            let direction = match self.sort_order.as_deref() {
                Some(order) if order.eq_ignore_ascii_case(SORT_ASC) => SortDirection::Asc,
                _ => SortDirection::Desc,
            };
            (column, direction)
        });

        RecordQuery {
            predicates,
            projection,
            order,
            limit,
            offset,
        }
    }
}

impl RecordQuery {
    /// Render as SQLite SQL with positional `?` parameters.
    pub fn to_sql(&self, table: &str) -> (String, Vec<String>) {
        let mut params = Vec::new();

        let projection = match &self.projection {
            Projection::All => "*".to_string(),
            Projection::Count => "COUNT(*) AS count".to_string(),
            Projection::Columns(columns) => columns
                .iter()
                .map(|c| quote_ident(c.as_str()))
                .collect::<Vec<_>>()
                .join(", "),
        };

        let mut sql = format!("SELECT {} FROM {}", projection, quote_ident(table));

        if !self.predicates.is_empty() {
            let clauses: Vec<String> = self
                .predicates
                .iter()
                .map(|p| render_predicate(p, &mut params))
                .collect();
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }

        if let Some((column, direction)) = self.order {
            let keyword = match direction {
                SortDirection::Asc => "ASC",
                SortDirection::Desc => "DESC",
            };
            sql.push_str(&format!(" ORDER BY {} {}", quote_ident(column.as_str()), keyword));
        }

        // SQLite only accepts OFFSET after a LIMIT; -1 means unbounded.
        match (self.limit, self.offset) {
            (Some(limit), Some(offset)) => sql.push_str(&format!(" LIMIT {} OFFSET {}", limit, offset)),
            (Some(limit), None) => sql.push_str(&format!(" LIMIT {}", limit)),
            (None, Some(offset)) => sql.push_str(&format!(" LIMIT -1 OFFSET {}", offset)),
            (None, None) => {}
        }

        (sql, params)
    }
}

fn render_predicate(predicate: &Predicate, params: &mut Vec<String>) -> String {
    match predicate {
        Predicate::Eq(column, value) => {
            params.push(value.clone());
            format!("{} = ?", quote_ident(column.as_str()))
        }
        Predicate::Gt(column, value) => {
            params.push(value.clone());
            format!("{} > ?", quote_ident(column.as_str()))
        }
        Predicate::Lt(column, value) => {
            params.push(value.clone());
            format!("{} < ?", quote_ident(column.as_str()))
        }
        Predicate::In(column, values) => {
            params.extend(values.iter().cloned());
            let placeholders = vec!["?"; values.len()].join(", ");
            format!("{} IN ({})", quote_ident(column.as_str()), placeholders)
        }
        Predicate::StartsWith(column, prefix) => {
            params.push(format!("{}%", prefix));
            format!("{} LIKE ?", quote_ident(column.as_str()))
        }
    }
}

pub(crate) fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident)
}
