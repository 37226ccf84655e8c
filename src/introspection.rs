//! Schema Introspection Module
//!
//! Reads the live structure of tables from `information_schema`. This is the
//! "what the database actually has" side of every diff.

use crate::db::queries::{COLUMNS_FOR_SCHEMA, COLUMNS_FOR_TABLE, FOREIGN_KEYS_FOR_SCHEMA};
use crate::db::{CatalogExecutor, CatalogRow};
use crate::error::AppError;
use crate::snapshot::{ColumnDescriptor, TableSnapshot};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

/// Foreign key relationship, as listed by `table_constraints`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForeignKeyConstraint {
    pub catalog: String,
    pub schema: String,
    pub table: String,
    pub constraint_name: String,
}

/// Every column and foreign key of one schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaSummary {
    pub catalog: String,
    pub schema: String,
    pub columns: Vec<ColumnDescriptor>,
    pub foreign_keys: Vec<ForeignKeyConstraint>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub degraded: bool,
}

pub struct CatalogReader<'a> {
    executor: &'a dyn CatalogExecutor,
    strict: bool,
}

impl<'a> CatalogReader<'a> {
    pub fn new(executor: &'a dyn CatalogExecutor) -> Self {
        Self {
            executor,
            strict: false,
        }
    }

    /// Propagate catalog query errors instead of degrading to empty results
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Live columns of one table, in ordinal order
    pub async fn read_table_structure(
        &self,
        catalog: &str,
        schema: &str,
        table: &str,
    ) -> Result<TableSnapshot, AppError> {
        require("catalog", catalog)?;
        require("schema", schema)?;
        require("table", table)?;

        let rows = match self
            .executor
            .fetch(catalog, COLUMNS_FOR_TABLE, &[catalog, schema, table])
            .await
            .and_then(|rows| decode_columns(&rows))
        {
            Ok(columns) => columns,
            Err(AppError::Query(msg)) if !self.strict => {
                error!("Reading {}.{}.{} failed: {}", catalog, schema, table, msg);
                return Ok(TableSnapshot::degraded(catalog, schema, table));
            }
            Err(e) => return Err(e),
        };

        let mut snapshot = TableSnapshot::empty(catalog, schema, table);
        snapshot.columns = rows;
        debug!("Table {}.{}.{} has {} columns", catalog, schema, table, snapshot.len());
        Ok(snapshot)
    }

    /// Live columns of every table in a schema. The flag is set when the
    /// query failed and an empty list stands in.
    pub async fn read_schema_structure(
        &self,
        catalog: &str,
        schema: &str,
    ) -> Result<(Vec<ColumnDescriptor>, bool), AppError> {
        require("catalog", catalog)?;
        require("schema", schema)?;

        let result = self
            .executor
            .fetch(catalog, COLUMNS_FOR_SCHEMA, &[catalog, schema])
            .await
            .and_then(|rows| decode_columns(&rows));
        self.degrade(result, catalog, schema, "columns")
    }

    /// Foreign-key constraints declared in a schema
    pub async fn read_foreign_keys(
        &self,
        catalog: &str,
        schema: &str,
    ) -> Result<(Vec<ForeignKeyConstraint>, bool), AppError> {
        require("catalog", catalog)?;
        require("schema", schema)?;

        let result: Result<Vec<ForeignKeyConstraint>, AppError> = self
            .executor
            .fetch(catalog, FOREIGN_KEYS_FOR_SCHEMA, &[catalog, schema])
            .await
            .and_then(|rows| rows.iter().map(decode_foreign_key).collect());
        self.degrade(result, catalog, schema, "foreign keys")
    }

    /// Columns and foreign keys of a schema in one summary
    pub async fn summarize_schema(&self, catalog: &str, schema: &str) -> Result<SchemaSummary, AppError> {
        let ((columns, columns_degraded), (foreign_keys, keys_degraded)) = tokio::try_join!(
            self.read_schema_structure(catalog, schema),
            self.read_foreign_keys(catalog, schema)
        )?;

        Ok(SchemaSummary {
            catalog: catalog.to_string(),
            schema: schema.to_string(),
            columns,
            foreign_keys,
            degraded: columns_degraded || keys_degraded,
        })
    }

    fn degrade<T>(
        &self,
        result: Result<Vec<T>, AppError>,
        catalog: &str,
        schema: &str,
        what: &str,
    ) -> Result<(Vec<T>, bool), AppError> {
        match result {
            Ok(items) => {
                debug!("Schema {}.{} has {} {}", catalog, schema, items.len(), what);
                Ok((items, false))
            }
            Err(AppError::Query(msg)) if !self.strict => {
                error!("Reading {} of {}.{} failed: {}", what, catalog, schema, msg);
                Ok((Vec::new(), true))
            }
            Err(e) => Err(e),
        }
    }
}

fn require(name: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{} must not be empty", name)));
    }
    Ok(())
}

fn decode_columns(rows: &[CatalogRow]) -> Result<Vec<ColumnDescriptor>, AppError> {
    rows.iter()
        .map(|row| {
            Ok(ColumnDescriptor::new(
                row.require("table_catalog")?,
                row.require("table_schema")?,
                row.require("table_name")?,
                row.require("column_name")?,
                row.require("data_type")?,
            ))
        })
        .collect()
}

fn decode_foreign_key(row: &CatalogRow) -> Result<ForeignKeyConstraint, AppError> {
    Ok(ForeignKeyConstraint {
        catalog: row.require("table_catalog")?.to_string(),
        schema: row.require("table_schema")?.to_string(),
        table: row.require("table_name")?.to_string(),
        constraint_name: row.require("constraint_name")?.to_string(),
    })
}
