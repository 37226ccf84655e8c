//! Table and schema inspection route handlers
//!
//! Read-only: nothing here changes the database.

use crate::error::{validation_error, ApiResult, AppError};
use crate::introspection::SchemaSummary;
use crate::migration::MigrationScript;
use crate::models::{ModelListResponse, SchemaQuery, SuccessResponse, TableQuery};
use crate::state::SharedState;
use axum::{
    extract::{Query, State},
    Json,
};
use validator::Validate;

/// Diff a live table against its model (dry run)
pub async fn diff_table(
    State(state): State<SharedState>,
    Query(query): Query<TableQuery>,
) -> ApiResult<Json<SuccessResponse<MigrationScript>>> {
    query.validate().map_err(|e| validation_error(e.to_string()))?;

    let script = state
        .engine
        .diff_table(&query.appname, &query.schema, &query.table)
        .await?;

    let message = if script.is_empty() {
        format!("{}.{} matches its model.", query.schema, query.table)
    } else {
        format!("{}.{} has drifted from its model.", query.schema, query.table)
    };
    Ok(Json(SuccessResponse::with_data(message, script)))
}

/// Columns and foreign keys of a schema
pub async fn schema_info(
    State(state): State<SharedState>,
    Query(query): Query<SchemaQuery>,
) -> ApiResult<Json<SuccessResponse<SchemaSummary>>> {
    query.validate().map_err(|e| validation_error(e.to_string()))?;

    let summary = state.engine.diff_schema(&query.appname, &query.schema).await?;
    Ok(Json(SuccessResponse::with_data(
        format!(
            "Found {} columns and {} foreign keys.",
            summary.columns.len(),
            summary.foreign_keys.len()
        ),
        summary,
    )))
}

/// Registered model definitions
pub async fn list_models(State(state): State<SharedState>) -> ApiResult<Json<serde_json::Value>> {
    let models = state.engine.models();
    let body = SuccessResponse::with_data(
        format!("{} models registered.", models.len()),
        ModelListResponse {
            count: models.len(),
            models: models.iter().collect(),
        },
    );
    let value = serde_json::to_value(&body).map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(Json(value))
}
