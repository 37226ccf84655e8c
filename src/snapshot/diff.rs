//! Snapshot Diff Engine
//!
//! Aligns a live table snapshot with a model snapshot and classifies every
//! column as matched, added or removed.
//!
//! Columns are identified by `(catalog, schema, table, column, data_type)`.
//! Because the type is part of the identity, a column whose type changed
//! shows up twice: removed with its old type and added with its new one.

use crate::snapshot::{ColumnDescriptor, TableSnapshot};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Columns to add and columns to drop to move the db toward the model
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffResult {
    /// Present in the model, absent from the database (model order)
    pub added: Vec<ColumnDescriptor>,
    /// Present in the database, absent from the model (database order)
    pub removed: Vec<ColumnDescriptor>,
}

impl DiffResult {
    /// True when the two snapshots agree
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    /// The same diff seen from the other side
    pub fn reversed(self) -> Self {
        Self {
            added: self.removed,
            removed: self.added,
        }
    }
}

type ColumnKey<'a> = (&'a str, &'a str, &'a str, &'a str, &'a str);

fn key(c: &ColumnDescriptor) -> ColumnKey<'_> {
    (&c.catalog, &c.schema, &c.table, &c.column, &c.data_type)
}

/// The diff engine that compares table snapshots
pub struct DiffEngine;

impl DiffEngine {
    /// Full outer alignment of `db` against `model`
    pub fn diff(db: &TableSnapshot, model: &TableSnapshot) -> DiffResult {
        let db_keys: HashSet<ColumnKey<'_>> = db.columns.iter().map(key).collect();
        let model_keys: HashSet<ColumnKey<'_>> = model.columns.iter().map(key).collect();

        let added = Self::unmatched(&model.columns, &db_keys);
        let removed = Self::unmatched(&db.columns, &model_keys);

        DiffResult { added, removed }
    }

    /// Columns of `side` with no counterpart in `other`, in `side` order.
    /// A key repeated within `side` is reported once.
    fn unmatched(side: &[ColumnDescriptor], other: &HashSet<ColumnKey<'_>>) -> Vec<ColumnDescriptor> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for c in side {
            let k = key(c);
            if !other.contains(&k) && seen.insert(k) {
                out.push(c.clone());
            }
        }
        out
    }
}
