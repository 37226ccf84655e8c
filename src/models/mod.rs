//! Data models and DTOs (Data Transfer Objects)
//!
//! Request and response structures used by the API.

pub mod database;
pub mod migration;
pub mod table;

pub use database::*;
pub use migration::*;
pub use table::*;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use validator::ValidationError;

/// Generic success response
#[derive(Serialize)]
pub struct SuccessResponse<T: Serialize> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> SuccessResponse<T> {
    pub fn with_data(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }
}

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_$]*$").expect("identifier pattern is valid")
});

/// Validate a PostgreSQL identifier (database, schema or table name).
/// Names are spliced into DDL, so only plain identifiers are accepted.
pub fn validate_identifier(name: &str) -> Result<(), ValidationError> {
    if !IDENTIFIER.is_match(name) {
        let mut err = ValidationError::new("invalid_identifier");
        err.message = Some(
            "Must start with a letter or underscore and contain only letters, digits, underscores and dollar signs"
                .into(),
        );
        return Err(err);
    }
    Ok(())
}

/// Application names become database names
pub fn validate_app_name(name: &str) -> Result<(), ValidationError> {
    validate_identifier(name)?;

    let reserved = ["template0", "template1", "postgres"];
    if reserved.contains(&name.to_lowercase().as_str()) {
        let mut err = ValidationError::new("reserved_name");
        err.message = Some("Cannot use a reserved database name".into());
        return Err(err);
    }
    Ok(())
}

pub fn validate_identifiers(names: &[String]) -> Result<(), ValidationError> {
    for name in names {
        if name.is_empty() || name.len() > 63 {
            let mut err = ValidationError::new("invalid_length");
            err.message = Some("Names must be between 1 and 63 characters".into());
            return Err(err);
        }
        validate_identifier(name)?;
    }
    Ok(())
}
