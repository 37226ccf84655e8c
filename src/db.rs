//! Database access
//!
//! The engine talks to PostgreSQL through two narrow executor traits so the
//! pipelines can run against in-memory fakes. `PgBackend` is the pooled
//! implementation used by the service.

pub mod queries;

use crate::connection::ConnectionManager;
use crate::error::{database_message, AppError};
use async_trait::async_trait;
use std::sync::Arc;
use tokio_postgres::types::ToSql;
use tracing::debug;

/// One result row, column name to text value, in select order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogRow {
    fields: Vec<(String, Option<String>)>,
}

impl CatalogRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: &str) -> Self {
        self.fields.push((name.to_string(), Some(value.to_string())));
        self
    }

    pub fn push(&mut self, name: impl Into<String>, value: Option<String>) {
        self.fields.push((name.into(), value));
    }

    /// Value of a named field; `None` when absent or SQL NULL
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, v)| v.as_deref())
    }

    /// Value of a field the query always selects
    pub fn require(&self, name: &str) -> Result<&str, AppError> {
        self.get(name)
            .ok_or_else(|| AppError::Query(format!("catalog row has no value for '{}'", name)))
    }
}

/// Runs read-only structural queries
#[async_trait]
pub trait CatalogExecutor: Send + Sync {
    async fn fetch(&self, catalog: &str, sql: &str, params: &[&str]) -> Result<Vec<CatalogRow>, AppError>;
}

/// Runs a statement body, possibly several `;`-separated statements
#[async_trait]
pub trait StatementExecutor: Send + Sync {
    async fn execute(&self, catalog: &str, sql: &str) -> Result<(), AppError>;
}

/// Pooled executor over the connection manager
#[derive(Clone)]
pub struct PgBackend {
    connections: Arc<ConnectionManager>,
}

impl PgBackend {
    pub fn new(connections: Arc<ConnectionManager>) -> Self {
        Self { connections }
    }

    pub fn connections(&self) -> &ConnectionManager {
        &self.connections
    }
}

#[async_trait]
impl CatalogExecutor for PgBackend {
    async fn fetch(&self, catalog: &str, sql: &str, params: &[&str]) -> Result<Vec<CatalogRow>, AppError> {
        let pool = self.connections.pool_for(catalog).await?;
        let client = pool.get().await?;

        let params: Vec<&(dyn ToSql + Sync)> = params.iter().map(|p| p as &(dyn ToSql + Sync)).collect();
        let rows = client.query(sql, &params).await.map_err(|e| {
            if e.is_closed() {
                AppError::Connection(e.to_string())
            } else {
                AppError::Query(database_message(&e))
            }
        })?;

        let mut out = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut decoded = CatalogRow::new();
            for (idx, column) in row.columns().iter().enumerate() {
                let value: Option<String> = row
                    .try_get(idx)
                    .map_err(|e| AppError::Query(format!("column '{}': {}", column.name(), e)))?;
                decoded.push(column.name(), value);
            }
            out.push(decoded);
        }

        debug!("Catalog query on '{}' returned {} rows", catalog, out.len());
        Ok(out)
    }
}

#[async_trait]
impl StatementExecutor for PgBackend {
    async fn execute(&self, catalog: &str, sql: &str) -> Result<(), AppError> {
        let pool = self.connections.pool_for(catalog).await?;
        let client = pool.get().await?;
        client.batch_execute(sql).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_row_lookup() {
        let mut row = CatalogRow::new().with("column_name", "weight");
        row.push("column_default", None);

        assert_eq!(row.get("column_name"), Some("weight"));
        assert_eq!(row.get("column_default"), None);
        assert_eq!(row.get("missing"), None);
        assert!(row.require("column_name").is_ok());
        assert!(matches!(row.require("column_default"), Err(AppError::Query(_))));
    }
}
