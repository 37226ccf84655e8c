//! Schema engine
//!
//! Pipelines behind the service: diff a live table against its model, apply
//! a generated body, and provision application databases. Nothing here knows
//! about HTTP; all database access goes through the executor traits.

use crate::config::DiffPolicy;
use crate::db::{CatalogExecutor, StatementExecutor};
use crate::error::AppError;
use crate::introspection::{CatalogReader, SchemaSummary};
use crate::migration::provision::{create_database_sql, create_schema_sql, create_table_sql, creation_order};
use crate::migration::{Direction, MigrationGenerator, MigrationScript};
use crate::orm::{ModelDefinition, ModelReader, ModelRegistry, ModelResolver};
use crate::snapshot::DiffEngine;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio_postgres::error::SqlState;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Result of running a statement body
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyOutcome {
    pub run_id: Uuid,
    pub catalog: String,
    pub statements: usize,
    /// `false` when the body was empty and nothing was sent
    pub executed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applied_at: Option<DateTime<Utc>>,
}

/// A diff that was applied in one direction
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationRun {
    pub direction: Direction,
    pub script: MigrationScript,
    pub outcome: ApplyOutcome,
}

/// What provisioning created and what was already there
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionReport {
    pub created: Vec<String>,
    pub existing: Vec<String>,
}

impl ProvisionReport {
    fn merge(&mut self, other: ProvisionReport) {
        self.created.extend(other.created);
        self.existing.extend(other.existing);
    }
}

pub struct SchemaEngine {
    catalog: Arc<dyn CatalogExecutor>,
    statements: Arc<dyn StatementExecutor>,
    models: Arc<ModelRegistry>,
    policy: DiffPolicy,
    maintenance_database: String,
}

impl SchemaEngine {
    pub fn new(
        catalog: Arc<dyn CatalogExecutor>,
        statements: Arc<dyn StatementExecutor>,
        models: Arc<ModelRegistry>,
        policy: DiffPolicy,
    ) -> Self {
        Self {
            catalog,
            statements,
            models,
            policy,
            maintenance_database: "postgres".to_string(),
        }
    }

    /// Database `CREATE DATABASE` is issued from
    pub fn with_maintenance_database(mut self, name: impl Into<String>) -> Self {
        self.maintenance_database = name.into();
        self
    }

    pub fn models(&self) -> &ModelRegistry {
        &self.models
    }

    /// Compare the live table with its model and build both script bodies.
    /// The application's database is the catalog.
    pub async fn diff_table(&self, app: &str, schema: &str, table: &str) -> Result<MigrationScript, AppError> {
        let catalog_reader = CatalogReader::new(self.catalog.as_ref()).strict(self.policy.strict_catalog);
        let model_reader = ModelReader::new(self.models.as_ref() as &dyn ModelResolver);

        let (db, definition) = tokio::join!(
            catalog_reader.read_table_structure(app, schema, table),
            async { model_reader.resolve(app, schema, table) }
        );
        let mut db = db?;
        let definition = definition?;
        let mut model = model_reader.snapshot_of(definition)?;

        if self.policy.exclude_identity {
            for column in self.identity_columns(definition) {
                db = db.without_column(column);
                model = model.without_column(column);
            }
        }
        debug!(
            "{}.{}.{}: live checksum {}, model checksum {}",
            app,
            schema,
            table,
            db.checksum(),
            model.checksum()
        );

        let diff = DiffEngine::diff(&db, &model);
        let mut script = MigrationGenerator::build_migration(schema, table, &diff);
        if db.degraded {
            let note = format!(
                "Reading the live structure of {}.{} failed; the table was treated as having no columns",
                schema, table
            );
            warn!("{}", note);
            script.warnings.push(note);
        }

        info!(
            "Diffed {}.{}.{}: {} to add, {} to drop",
            app,
            schema,
            table,
            diff.added.len(),
            diff.removed.len()
        );
        Ok(script)
    }

    /// Columns left out of both sides when identity is excluded: the model's
    /// primary keys, or the configured identity column when it declares none.
    fn identity_columns<'m>(&'m self, model: &'m ModelDefinition) -> Vec<&'m str> {
        let keys = model.primary_key_names();
        if keys.is_empty() {
            vec![self.policy.identity_column.as_str()]
        } else {
            keys
        }
    }

    /// Columns and foreign keys currently in a schema
    pub async fn diff_schema(&self, app: &str, schema: &str) -> Result<SchemaSummary, AppError> {
        CatalogReader::new(self.catalog.as_ref())
            .strict(self.policy.strict_catalog)
            .summarize_schema(app, schema)
            .await
    }

    /// Run a statement body against the application's database. An empty
    /// body succeeds without touching the database. Failures are returned
    /// as-is; statements that already ran stay applied.
    pub async fn apply(&self, app: &str, sql: &str) -> Result<ApplyOutcome, AppError> {
        let run_id = Uuid::new_v4();
        let statements = count_statements(sql);

        if statements == 0 {
            debug!("Run {}: empty body for '{}', nothing to apply", run_id, app);
            return Ok(ApplyOutcome {
                run_id,
                catalog: app.to_string(),
                statements,
                executed: false,
                applied_at: None,
            });
        }

        info!("Run {}: applying {} statement(s) to '{}'", run_id, statements, app);
        if let Err(e) = self.statements.execute(app, sql).await {
            error!("Run {} failed: {}", run_id, e);
            return Err(e);
        }

        Ok(ApplyOutcome {
            run_id,
            catalog: app.to_string(),
            statements,
            executed: true,
            applied_at: Some(Utc::now()),
        })
    }

    /// Diff a table and apply one direction of the result
    pub async fn migrate(
        &self,
        app: &str,
        schema: &str,
        table: &str,
        direction: Direction,
    ) -> Result<MigrationRun, AppError> {
        let script = self.diff_table(app, schema, table).await?;
        let outcome = self.apply(app, script.body(direction)).await?;
        Ok(MigrationRun {
            direction,
            script,
            outcome,
        })
    }

    /// Create the application's database
    pub async fn create_database(&self, app: &str) -> Result<ProvisionReport, AppError> {
        let mut report = ProvisionReport::default();
        self.provision(
            &self.maintenance_database,
            &create_database_sql(app),
            format!("database {}", app),
            &SqlState::DUPLICATE_DATABASE,
            &mut report,
        )
        .await?;
        Ok(report)
    }

    /// Create schemas inside the application's database
    pub async fn create_schemas(&self, app: &str, schemas: &[String]) -> Result<ProvisionReport, AppError> {
        let mut report = ProvisionReport::default();
        for schema in schemas {
            self.provision(
                app,
                &create_schema_sql(schema),
                format!("schema {}", schema),
                &SqlState::DUPLICATE_SCHEMA,
                &mut report,
            )
            .await?;
        }
        Ok(report)
    }

    /// Database, schemas and one table per registered model. Every
    /// `CREATE TABLE` is built before the first statement runs, so a model
    /// that cannot be created leaves the server untouched.
    pub async fn init_schemas(&self, app: &str, schemas: &[String]) -> Result<ProvisionReport, AppError> {
        let mut tables = Vec::new();
        for schema in schemas {
            let models = self.models.schema_models(app, schema);
            if models.is_empty() {
                warn!("No models registered for {}.{}", app, schema);
            }
            for model in creation_order(&models) {
                tables.push((format!("table {}.{}", model.schema, model.table), create_table_sql(model)?));
            }
        }

        let mut report = self.create_database(app).await?;
        report.merge(self.create_schemas(app, schemas).await?);
        for (object, sql) in tables {
            self.provision(app, &sql, object, &SqlState::DUPLICATE_TABLE, &mut report)
                .await?;
        }

        info!(
            "Initialised '{}': {} created, {} already present",
            app,
            report.created.len(),
            report.existing.len()
        );
        Ok(report)
    }

    async fn provision(
        &self,
        catalog: &str,
        sql: &str,
        object: String,
        duplicate: &SqlState,
        report: &mut ProvisionReport,
    ) -> Result<(), AppError> {
        match self.statements.execute(catalog, sql).await {
            Ok(()) => {
                info!("Created {}", object);
                report.created.push(object);
                Ok(())
            }
            Err(e) if already_exists(&e, duplicate) => {
                info!("{} already exists", object);
                report.existing.push(object);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

fn already_exists(err: &AppError, duplicate: &SqlState) -> bool {
    match err {
        AppError::Database(e) => is_duplicate(e.code(), duplicate),
        _ => false,
    }
}

fn is_duplicate(code: Option<&SqlState>, duplicate: &SqlState) -> bool {
    code == Some(duplicate)
}

/// Number of non-blank statements in a body. A `;` inside a single-quoted
/// literal, a quoted identifier or a `--` comment does not end a statement.
/// Dollar-quoted bodies and block comments are not recognised, so the count
/// is informational only.
fn count_statements(sql: &str) -> usize {
    let mut count = 0;
    let mut pending = false;
    let mut chars = sql.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\'' | '"' => {
                pending = true;
                // a doubled quote is an escaped quote, not the end
                while let Some(c) = chars.next() {
                    if c == ch && chars.peek() != Some(&ch) {
                        break;
                    }
                    if c == ch {
                        chars.next();
                    }
                }
            }
            '-' if chars.peek() == Some(&'-') => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        break;
                    }
                }
            }
            ';' => {
                if pending {
                    count += 1;
                }
                pending = false;
            }
            c if !c.is_whitespace() => pending = true,
            _ => {}
        }
    }
    count + usize::from(pending)
}
