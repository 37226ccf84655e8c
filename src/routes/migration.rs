//! Migration route handlers
//!
//! These change the database. Statements run one after another with no
//! wrapping transaction; a failure leaves earlier statements applied.

use crate::engine::{ApplyOutcome, MigrationRun};
use crate::error::{validation_error, ApiResult};
use crate::migration::Direction;
use crate::models::{ApplyRequest, MigrateRequest, SuccessResponse};
use crate::state::SharedState;
use axum::{extract::State, Json};
use tracing::info;
use validator::Validate;

/// Run a statement body against an application's database
pub async fn apply(
    State(state): State<SharedState>,
    Json(payload): Json<ApplyRequest>,
) -> ApiResult<Json<SuccessResponse<ApplyOutcome>>> {
    payload.validate().map_err(|e| validation_error(e.to_string()))?;

    let outcome = state.engine.apply(&payload.appname, &payload.sql).await?;
    let message = if outcome.executed {
        format!("Applied {} statement(s).", outcome.statements)
    } else {
        "Nothing to apply.".to_string()
    };
    Ok(Json(SuccessResponse::with_data(message, outcome)))
}

pub async fn upgrade(
    state: State<SharedState>,
    payload: Json<MigrateRequest>,
) -> ApiResult<Json<SuccessResponse<MigrationRun>>> {
    migrate(state, payload, Direction::Upgrade).await
}

pub async fn downgrade(
    state: State<SharedState>,
    payload: Json<MigrateRequest>,
) -> ApiResult<Json<SuccessResponse<MigrationRun>>> {
    migrate(state, payload, Direction::Downgrade).await
}

async fn migrate(
    State(state): State<SharedState>,
    Json(payload): Json<MigrateRequest>,
    direction: Direction,
) -> ApiResult<Json<SuccessResponse<MigrationRun>>> {
    payload.validate().map_err(|e| validation_error(e.to_string()))?;

    let run = state
        .engine
        .migrate(&payload.appname, &payload.schema, &payload.table, direction)
        .await?;

    info!(
        "{} of {}.{}.{}: {} statement(s)",
        direction, payload.appname, payload.schema, payload.table, run.outcome.statements
    );
    Ok(Json(SuccessResponse::with_data(
        format!("{} of {}.{} complete.", direction, payload.schema, payload.table),
        run,
    )))
}
