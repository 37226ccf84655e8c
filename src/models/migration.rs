//! Migration requests

use super::validate_identifier;
use serde::Deserialize;
use validator::Validate;

/// Run a statement body against an application's database
#[derive(Debug, Deserialize, Validate)]
pub struct ApplyRequest {
    #[validate(length(min = 1, max = 63, message = "appname must be between 1 and 63 characters"))]
    #[validate(custom(function = "validate_identifier"))]
    pub appname: String,

    /// May be empty; an empty body is a no-op
    #[serde(default)]
    pub sql: String,
}

/// Diff a table and apply one direction
#[derive(Debug, Deserialize, Validate)]
pub struct MigrateRequest {
    #[validate(length(min = 1, max = 63, message = "appname must be between 1 and 63 characters"))]
    #[validate(custom(function = "validate_identifier"))]
    pub appname: String,

    #[validate(length(min = 1, max = 63, message = "schema must be between 1 and 63 characters"))]
    #[validate(custom(function = "validate_identifier"))]
    pub schema: String,

    #[validate(length(min = 1, max = 63, message = "table must be between 1 and 63 characters"))]
    #[validate(custom(function = "validate_identifier"))]
    pub table: String,
}
