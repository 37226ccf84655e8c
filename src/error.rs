//! Error handling module
//!
//! Provides the error taxonomy shared by the engine and the HTTP surface.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    /// The database could not be reached (pool acquisition, connect).
    #[error("Connection error: {0}")]
    Connection(String),

    /// A catalog/structural query was rejected by the database.
    #[error("Catalog query failed: {0}")]
    Query(String),

    #[error("Field '{field}' uses unsupported kind '{kind}'")]
    UnsupportedFieldKind { field: String, kind: String },

    #[error("No model '{type_name}' found at '{path}'")]
    ModelNotFound { path: String, type_name: String },

    /// Statement execution failed; the database message is kept verbatim.
    #[error("Database error: {0}")]
    Database(#[from] tokio_postgres::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<deadpool_postgres::PoolError> for AppError {
    fn from(e: deadpool_postgres::PoolError) -> Self {
        AppError::Connection(e.to_string())
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl AppError {
    /// Stable machine-readable code for the error body
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Connection(_) => "CONNECTION_ERROR",
            AppError::Query(_) => "QUERY_ERROR",
            AppError::UnsupportedFieldKind { .. } => "UNSUPPORTED_FIELD_KIND",
            AppError::ModelNotFound { .. } => "MODEL_NOT_FOUND",
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.code();
        let (status, message, details) = match &self {
            AppError::Connection(msg) => {
                error!("Connection error: {}", msg);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Database is unreachable".to_string(),
                    Some(msg.clone()),
                )
            }
            AppError::Query(msg) => {
                error!("Catalog query error: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    "Catalog query failed".to_string(),
                    Some(msg.clone()),
                )
            }
            AppError::UnsupportedFieldKind { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, self.to_string(), None)
            }
            AppError::ModelNotFound { .. } => (StatusCode::NOT_FOUND, self.to_string(), None),
            AppError::Database(e) => {
                error!("Database error: {:?}", e);
                (
                    StatusCode::CONFLICT,
                    "The database rejected the statement".to_string(),
                    Some(database_message(e)),
                )
            }
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
            AppError::Config(msg) => {
                error!("Configuration error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A configuration error occurred".to_string(),
                    Some(msg.clone()),
                )
            }
            AppError::Internal(msg) => {
                error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                    Some(msg.clone()),
                )
            }
        };

        let body = Json(ErrorResponse {
            success: false,
            message,
            error: details,
            code: Some(code.to_string()),
        });

        (status, body).into_response()
    }
}

/// The server-reported message when there is one, the client error otherwise
pub fn database_message(e: &tokio_postgres::Error) -> String {
    e.as_db_error()
        .map(|db| db.message().to_string())
        .unwrap_or_else(|| e.to_string())
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, AppError>;

/// Helper function to create a validation error
pub fn validation_error(msg: impl Into<String>) -> AppError {
    AppError::Validation(msg.into())
}
