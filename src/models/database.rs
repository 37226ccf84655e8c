//! Provisioning requests

use super::{validate_app_name, validate_identifiers};
use serde::Deserialize;
use validator::Validate;

/// Request to create an application's database
#[derive(Debug, Deserialize, Validate)]
pub struct CreateDatabaseRequest {
    #[validate(length(min = 1, max = 63, message = "Application name must be between 1 and 63 characters"))]
    #[validate(custom(function = "validate_app_name"))]
    pub appname: String,
}

/// Request to create schemas (and, for `/db/init`, their tables)
#[derive(Debug, Deserialize, Validate)]
pub struct SchemasRequest {
    #[validate(length(min = 1, max = 63, message = "Application name must be between 1 and 63 characters"))]
    #[validate(custom(function = "validate_app_name"))]
    pub appname: String,

    #[validate(length(min = 1, message = "At least one schema is required"))]
    #[validate(custom(function = "validate_identifiers"))]
    pub schemas: Vec<String>,
}
