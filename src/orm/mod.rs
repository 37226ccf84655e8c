//! Declarative table models
//!
//! Models are explicit field lists registered up front. A model is addressed
//! the way application code lays them out: the model for table `t` of schema
//! `s` in application `a` lives at `a.orm.s.t` and is named after the table
//! in title case.

pub mod builtin;
pub mod kind;
pub mod reader;

pub use kind::FieldKind;
pub use reader::ModelReader;

use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

/// A declared field of a model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDef {
    pub name: String,
    pub kind: FieldKind,
    #[serde(default)]
    pub primary_key: bool,
    /// Derived at runtime, not backed by a column
    #[serde(default)]
    pub computed: bool,
    /// Target table of a foreign key, in the same schema
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub references: Option<String>,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            primary_key: false,
            computed: false,
            references: None,
        }
    }
}

/// The intended structure of one table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDefinition {
    pub app: String,
    pub schema: String,
    pub table: String,
    #[serde(default)]
    pub type_name: Option<String>,
    pub fields: Vec<FieldDef>,
}

impl ModelDefinition {
    pub fn new(app: impl Into<String>, schema: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            app: app.into(),
            schema: schema.into(),
            table: table.into(),
            type_name: None,
            fields: Vec::new(),
        }
    }

    /// Add a plain column-backed field
    pub fn field(mut self, name: &str, kind: FieldKind) -> Self {
        self.fields.push(FieldDef::new(name, kind));
        self
    }

    /// Add the primary-key field
    pub fn primary_key(mut self, name: &str, kind: FieldKind) -> Self {
        self.fields.push(FieldDef {
            primary_key: true,
            ..FieldDef::new(name, kind)
        });
        self
    }

    /// Add a foreign key to `target`, a table of the same schema
    pub fn foreign_key(mut self, name: &str, target: &str) -> Self {
        self.fields.push(FieldDef {
            references: Some(target.to_string()),
            ..FieldDef::new(name, FieldKind::ForeignKey)
        });
        self
    }

    /// Tables of the same schema this model references
    pub fn references(&self) -> impl Iterator<Item = &str> {
        self.columns().filter_map(|f| f.references.as_deref())
    }

    /// Add a derived property that has no column
    pub fn computed(mut self, name: &str, kind: FieldKind) -> Self {
        self.fields.push(FieldDef {
            computed: true,
            ..FieldDef::new(name, kind)
        });
        self
    }

    /// Address of this model, `{app}.orm.{schema}.{table}`
    pub fn path(&self) -> String {
        model_path(&self.app, &self.schema, &self.table)
    }

    /// Declared type name, defaulting to the title-cased table name
    pub fn type_name(&self) -> String {
        self.type_name.clone().unwrap_or_else(|| title_case(&self.table))
    }

    /// Fields that correspond to real columns
    pub fn columns(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter().filter(|f| !f.computed)
    }

    /// Names of the column-backed primary-key fields
    pub fn primary_key_names(&self) -> Vec<&str> {
        self.columns()
            .filter(|f| f.primary_key)
            .map(|f| f.name.as_str())
            .collect()
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.app.is_empty() || self.schema.is_empty() || self.table.is_empty() {
            return Err(AppError::Validation(format!(
                "Model '{}' needs a non-empty app, schema and table",
                self.path()
            )));
        }
        let mut seen = HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.name.as_str()) {
                return Err(AppError::Validation(format!(
                    "Model '{}' declares field '{}' twice",
                    self.path(),
                    field.name
                )));
            }
            if field.kind == FieldKind::ForeignKey && !field.computed && field.references.is_none() {
                return Err(AppError::Validation(format!(
                    "Foreign key '{}' of model '{}' names no target table",
                    field.name,
                    self.path()
                )));
            }
        }
        Ok(())
    }
}

/// `{app}.orm.{schema}.{table}`
pub fn model_path(app: &str, schema: &str, table: &str) -> String {
    format!("{}.orm.{}.{}", app, schema, table)
}

/// Title-case the way model classes are named: the first letter of every
/// alphabetic run is upper-cased, the rest lower-cased.
pub fn title_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut prev_alpha = false;
    for ch in name.chars() {
        if ch.is_alphabetic() {
            if prev_alpha {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(ch);
            prev_alpha = false;
        }
    }
    out
}

/// Looks up the model registered for a path and type name
pub trait ModelResolver: Send + Sync {
    fn resolve(&self, path: &str, type_name: &str) -> Option<&ModelDefinition>;

    /// Models of one schema of an application, in table order
    fn schema_models(&self, app: &str, schema: &str) -> Vec<&ModelDefinition>;
}

/// In-memory registry of model definitions, keyed by path
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    models: BTreeMap<String, ModelDefinition>,
}

#[derive(Deserialize)]
struct ModelFile {
    models: Vec<ModelDefinition>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-loaded with the built-in application models
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        for model in builtin::models() {
            // built-in models are known to be well-formed
            registry.models.insert(model.path(), model);
        }
        registry
    }

    /// Register a model, replacing any model at the same path
    pub fn register(&mut self, model: ModelDefinition) -> Result<(), AppError> {
        model.validate()?;
        let path = model.path();
        if self.models.insert(path.clone(), model).is_some() {
            debug!("Replaced model at {}", path);
        }
        Ok(())
    }

    /// Load `{"models": [...]}` JSON and register every entry
    pub fn load_json(&mut self, json: &str) -> Result<usize, AppError> {
        let file: ModelFile = serde_json::from_str(json)
            .map_err(|e| AppError::Config(format!("Invalid model file: {}", e)))?;
        let count = file.models.len();
        for model in file.models {
            self.register(model)?;
        }
        Ok(count)
    }

    /// Load a model file from disk
    pub fn load_file(&mut self, path: &str) -> Result<usize, AppError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Cannot read model file '{}': {}", path, e)))?;
        self.load_json(&json)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModelDefinition> {
        self.models.values()
    }
}

impl ModelResolver for ModelRegistry {
    fn resolve(&self, path: &str, type_name: &str) -> Option<&ModelDefinition> {
        self.models.get(path).filter(|m| m.type_name() == type_name)
    }

    fn schema_models(&self, app: &str, schema: &str) -> Vec<&ModelDefinition> {
        self.models
            .values()
            .filter(|m| m.app == app && m.schema == schema)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("ingredient"), "Ingredient");
        assert_eq!(title_case("USER"), "User");
        assert_eq!(title_case("food_item"), "Food_Item");
        assert_eq!(title_case("v2table"), "V2Table");
    }

    #[test]
    fn test_path_and_type_name() {
        let model = ModelDefinition::new("food", "food", "ingredient");
        assert_eq!(model.path(), "food.orm.food.ingredient");
        assert_eq!(model.type_name(), "Ingredient");
    }

    #[test]
    fn test_resolve_requires_matching_type_name() {
        let mut registry = ModelRegistry::new();
        registry
            .register(ModelDefinition::new("food", "food", "ingredient").primary_key("id", FieldKind::Int))
            .unwrap();

        assert!(registry.resolve("food.orm.food.ingredient", "Ingredient").is_some());
        assert!(registry.resolve("food.orm.food.ingredient", "Recipe").is_none());
        assert!(registry.resolve("food.orm.food.recipe", "Recipe").is_none());
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let mut registry = ModelRegistry::new();
        let model = ModelDefinition::new("food", "food", "ingredient")
            .field("name", FieldKind::Text)
            .field("name", FieldKind::Text);
        assert!(matches!(registry.register(model), Err(AppError::Validation(_))));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_load_json() {
        let json = r#"{
            "models": [
                {
                    "app": "food",
                    "schema": "food",
                    "table": "ingredient",
                    "fields": [
                        {"name": "id", "kind": "int", "primaryKey": true},
                        {"name": "name", "kind": "text"},
                        {"name": "weight", "kind": "decimal"},
                        {"name": "label", "kind": "text", "computed": true}
                    ]
                }
            ]
        }"#;
        let mut registry = ModelRegistry::new();
        assert_eq!(registry.load_json(json).unwrap(), 1);

        let model = registry.resolve("food.orm.food.ingredient", "Ingredient").unwrap();
        assert_eq!(model.fields.len(), 4);
        assert!(model.fields[0].primary_key);
        let columns: Vec<&str> = model.columns().map(|f| f.name.as_str()).collect();
        assert_eq!(columns, vec!["id", "name", "weight"]);
    }

    #[test]
    fn test_foreign_key_needs_target() {
        let json = r#"{"models": [{"app": "a", "schema": "s", "table": "t",
            "fields": [{"name": "owner", "kind": "foreign_key"}]}]}"#;
        let mut registry = ModelRegistry::new();
        assert!(matches!(registry.load_json(json), Err(AppError::Validation(_))));

        let json = r#"{"models": [{"app": "a", "schema": "s", "table": "t",
            "fields": [{"name": "owner", "kind": "foreign_key", "references": "owner"}]}]}"#;
        assert_eq!(registry.load_json(json).unwrap(), 1);
        let model = registry.resolve("a.orm.s.t", "T").unwrap();
        assert_eq!(model.references().collect::<Vec<_>>(), vec!["owner"]);
    }

    #[test]
    fn test_load_json_rejects_unknown_kind() {
        let json = r#"{"models": [{"app": "a", "schema": "s", "table": "t",
            "fields": [{"name": "x", "kind": "varchar"}]}]}"#;
        let mut registry = ModelRegistry::new();
        assert!(matches!(registry.load_json(json), Err(AppError::Config(_))));
    }

    #[test]
    fn test_schema_models() {
        let registry = ModelRegistry::with_builtin();
        let tables: Vec<&str> = registry
            .schema_models(builtin::APP, "user")
            .iter()
            .map(|m| m.table.as_str())
            .collect();
        assert_eq!(tables, vec!["salt", "user"]);
        assert!(registry.schema_models(builtin::APP, "food").is_empty());
    }
}
