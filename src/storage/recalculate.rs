// FILE: src/storage/recalculate.rs
//! Path Recalculation Engine
//!
//! Repairs materialized paths after a rename or move. The walk is depth-first,
//! parent before children, and every node is rewritten even when its path did not
//! change.

use std::collections::HashSet;

use crate::context::Context;
use crate::core::consts::ROOT_PARENT_ID;
use crate::core::{path, Column, Record};
use crate::error::{FileStoreError, Result};
use crate::storage::query::RecordQueryOptions;
use crate::storage::store::Store;

impl Store {
    /// Recompute `record`'s path from its parent and persist it, then do the same
    /// for every live descendant.
    ///
    /// When `parent` is `None` it is looked up by `record.parent_id()`. A parent
    /// that is `record` itself or one of its descendants is rejected before
    /// anything is written. The walk is not transactional: the first error at any
    /// depth is returned as-is and rows already written stay written. See
    /// [`Store::recalculate_path_atomic`].
    pub fn recalculate_path(
        &self,
        ctx: &Context,
        record: &mut Record,
        parent: Option<&Record>,
    ) -> Result<()> {
        if record.id().is_empty() {
            return Err(FileStoreError::InvalidArgument("record id is empty".into()));
        }

        let fetched;
        let parent = match parent {
            Some(parent) => parent,
            None => {
                fetched = self
                    .find_by_id(
                        ctx,
                        record.parent_id(),
                        RecordQueryOptions {
                            columns: vec![Column::Id, Column::Path],
                            ..Default::default()
                        },
                    )?
                    .ok_or_else(|| FileStoreError::ParentNotFound(record.parent_id().to_string()))?;
                &fetched
            }
        };

        self.ensure_not_ancestor_of(ctx, record, parent)?;

        let mut visited = HashSet::new();
        self.recalculate_subtree(ctx, record, parent, &mut visited)
    }

    fn recalculate_subtree(
        &self,
        ctx: &Context,
        record: &mut Record,
        parent: &Record,
        visited: &mut HashSet<String>,
    ) -> Result<()> {
        if !visited.insert(record.id().to_string()) {
            return Err(FileStoreError::InvalidArgument(format!(
                "record {} is its own descendant",
                record.id()
            )));
        }

        let new_path = path::child_path(parent.path(), record.name());
        record.set_path(&new_path);
        self.update(ctx, record)?;

        // `name` is needed to rebuild each child's path.
        let children = self.list(
            ctx,
            &RecordQueryOptions {
                parent_id: Some(record.id().to_string()),
                columns: vec![Column::Id, Column::ParentId, Column::Name, Column::Path],
                ..Default::default()
            },
        )?;

        for mut child in children {
            self.recalculate_subtree(ctx, &mut child, record, visited)?;
        }

        Ok(())
    }

    /// Walk the stored `parent_id` chain upwards from `parent` and fail if it
    /// reaches `record`.
    fn ensure_not_ancestor_of(
        &self,
        ctx: &Context,
        record: &Record,
        parent: &Record,
    ) -> Result<()> {
        let mut seen = HashSet::new();
        let mut current = parent.id().to_string();

        loop {
            if current == record.id() {
                return Err(FileStoreError::InvalidArgument(format!(
                    "cannot place record {} under its own subtree",
                    record.id()
                )));
            }
            if current.is_empty() || current == ROOT_PARENT_ID || !seen.insert(current.clone()) {
                return Ok(());
            }

            let ancestor = self.find_by_id(
                ctx,
                &current,
                RecordQueryOptions {
                    columns: vec![Column::Id, Column::ParentId],
                    with_soft_deleted: true,
                    ..Default::default()
                },
            )?;
            match ancestor {
                Some(ancestor) => current = ancestor.parent_id().to_string(),
                None => return Ok(()),
            }
        }
    }

    /// [`Store::recalculate_path`] inside one transaction: either every path in
    /// the subtree is rewritten or none is.
    ///
    /// On failure `record` itself may already carry its new path in memory.
    pub fn recalculate_path_atomic(
        &self,
        ctx: &Context,
        record: &mut Record,
        parent: Option<&Record>,
    ) -> Result<()> {
        let tx = self.connection().unchecked_transaction()?;
        self.recalculate_path(ctx, record, parent)?;
        tx.commit()?;
        Ok(())
    }
}
