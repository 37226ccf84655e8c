//! Table snapshots
//!
//! A snapshot is the normalized, point-in-time column list of one table,
//! whether it was read from the live catalog or from a model definition.
//! Both sides share this shape so the differ can align them.

pub mod diff;

pub use diff::{DiffEngine, DiffResult};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// One row of normalized table structure
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDescriptor {
    pub catalog: String,
    pub schema: String,
    pub table: String,
    pub column: String,
    pub data_type: String,
}

impl ColumnDescriptor {
    pub fn new(
        catalog: impl Into<String>,
        schema: impl Into<String>,
        table: impl Into<String>,
        column: impl Into<String>,
        data_type: impl Into<String>,
    ) -> Self {
        Self {
            catalog: catalog.into(),
            schema: schema.into(),
            table: table.into(),
            column: column.into(),
            data_type: data_type.into(),
        }
    }
}

/// Ordered columns of a single (catalog, schema, table).
///
/// Column order is the source order (catalog ordinal or declaration order)
/// and only matters for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSnapshot {
    pub catalog: String,
    pub schema: String,
    pub table: String,
    pub columns: Vec<ColumnDescriptor>,
    /// Set when the catalog query failed and this snapshot stands in for
    /// "no known state".
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub degraded: bool,
}

impl TableSnapshot {
    /// An empty snapshot for the given table
    pub fn empty(catalog: &str, schema: &str, table: &str) -> Self {
        Self {
            catalog: catalog.to_string(),
            schema: schema.to_string(),
            table: table.to_string(),
            columns: Vec::new(),
            degraded: false,
        }
    }

    /// Empty snapshot standing in for a catalog read that failed
    pub fn degraded(catalog: &str, schema: &str, table: &str) -> Self {
        Self {
            degraded: true,
            ..Self::empty(catalog, schema, table)
        }
    }

    /// Append a column of this table with the given name and type
    pub fn push(&mut self, column: impl Into<String>, data_type: impl Into<String>) {
        self.columns.push(ColumnDescriptor::new(
            self.catalog.clone(),
            self.schema.clone(),
            self.table.clone(),
            column,
            data_type,
        ));
    }

    /// Builder-style variant of [`TableSnapshot::push`]
    pub fn with_column(mut self, column: &str, data_type: &str) -> Self {
        self.push(column, data_type);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Drop every column with the given name
    pub fn without_column(mut self, column: &str) -> Self {
        self.columns.retain(|c| c.column != column);
        self
    }

    /// Order-insensitive fingerprint of the structure
    pub fn checksum(&self) -> String {
        let mut entries: Vec<String> = self
            .columns
            .iter()
            .map(|c| format!("{}.{}.{}.{}:{}", c.catalog, c.schema, c.table, c.column, c.data_type))
            .collect();
        entries.sort();

        let mut hasher = Sha256::new();
        for entry in &entries {
            hasher.update(entry.as_bytes());
            hasher.update(b"\n");
        }
        format!("{:x}", hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_inherits_table_identity() {
        let snapshot = TableSnapshot::empty("food", "food", "ingredient").with_column("weight", "numeric");
        let col = &snapshot.columns[0];
        assert_eq!(col.catalog, "food");
        assert_eq!(col.schema, "food");
        assert_eq!(col.table, "ingredient");
        assert_eq!(col.column, "weight");
        assert_eq!(col.data_type, "numeric");
    }

    #[test]
    fn test_checksum_ignores_order() {
        let a = TableSnapshot::empty("app", "s", "t")
            .with_column("id", "integer")
            .with_column("name", "text");
        let b = TableSnapshot::empty("app", "s", "t")
            .with_column("name", "text")
            .with_column("id", "integer");
        assert_eq!(a.checksum(), b.checksum());

        let c = TableSnapshot::empty("app", "s", "t")
            .with_column("id", "integer")
            .with_column("name", "numeric");
        assert_ne!(a.checksum(), c.checksum());
    }

    #[test]
    fn test_degraded_is_empty() {
        let snapshot = TableSnapshot::degraded("app", "s", "t");
        assert!(snapshot.is_empty());
        assert!(snapshot.degraded);
        assert!(!TableSnapshot::empty("app", "s", "t").degraded);
    }

    #[test]
    fn test_without_column() {
        let snapshot = TableSnapshot::empty("app", "s", "t")
            .with_column("id", "integer")
            .with_column("name", "text")
            .without_column("id");
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.columns[0].column, "name");
    }
}
