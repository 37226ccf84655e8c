//! Table and schema inspection queries

use super::validate_identifier;
use crate::orm::ModelDefinition;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// `?appname&schema&table`
#[derive(Debug, Deserialize, Validate)]
pub struct TableQuery {
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

/// `?appname&schema`
#[derive(Debug, Deserialize, Validate)]
pub struct SchemaQuery {
    #[validate(length(min = 1, max = 63, message = "appname must be between 1 and 63 characters"))]
    #[validate(custom(function = "validate_identifier"))]
    pub appname: String,

    #[validate(length(min = 1, max = 63, message = "schema must be between 1 and 63 characters"))]
    #[validate(custom(function = "validate_identifier"))]
    pub schema: String,
}

/// Registered model definitions
#[derive(Debug, Serialize)]
pub struct ModelListResponse<'a> {
    pub count: usize,
    pub models: Vec<&'a ModelDefinition>,
}
