//! Database provisioning route handlers

use crate::connection::ConnectionTestResult;
use crate::engine::ProvisionReport;
use crate::error::{validation_error, ApiResult};
use crate::models::{CreateDatabaseRequest, SchemasRequest, SuccessResponse};
use crate::state::SharedState;
use axum::extract::State;
use axum::Json;
use tracing::debug;
use validator::Validate;

/// Create the application's database
pub async fn create_database(
    State(state): State<SharedState>,
    Json(payload): Json<CreateDatabaseRequest>,
) -> ApiResult<Json<SuccessResponse<ProvisionReport>>> {
    payload.validate().map_err(|e| validation_error(e.to_string()))?;

    let report = state.engine.create_database(&payload.appname).await?;
    Ok(Json(SuccessResponse::with_data(
        format!("Database '{}' is ready.", payload.appname),
        report,
    )))
}

/// Create schemas inside the application's database
pub async fn create_schemas(
    State(state): State<SharedState>,
    Json(payload): Json<SchemasRequest>,
) -> ApiResult<Json<SuccessResponse<ProvisionReport>>> {
    payload.validate().map_err(|e| validation_error(e.to_string()))?;

    let report = state.engine.create_schemas(&payload.appname, &payload.schemas).await?;
    Ok(Json(SuccessResponse::with_data(
        format!("{} schema(s) ready in '{}'.", payload.schemas.len(), payload.appname),
        report,
    )))
}

/// Create the database, its schemas and a table per registered model
pub async fn init_database(
    State(state): State<SharedState>,
    Json(payload): Json<SchemasRequest>,
) -> ApiResult<Json<SuccessResponse<ProvisionReport>>> {
    payload.validate().map_err(|e| validation_error(e.to_string()))?;
    debug!("Initialising '{}' with schemas {:?}", payload.appname, payload.schemas);

    let report = state.engine.init_schemas(&payload.appname, &payload.schemas).await?;
    Ok(Json(SuccessResponse::with_data(
        format!("Application '{}' initialised.", payload.appname),
        report,
    )))
}

/// Check the configured server answers
pub async fn connection_status(
    State(state): State<SharedState>,
) -> ApiResult<Json<SuccessResponse<ConnectionTestResult>>> {
    let result = state.connections.test_connection().await?;
    Ok(Json(SuccessResponse::with_data("Database server is reachable.", result)))
}
