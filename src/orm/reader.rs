//! Model reader
//!
//! Turns a registered model into the same snapshot shape the catalog
//! reader produces.

use super::{model_path, title_case, ModelDefinition, ModelResolver};
use crate::error::AppError;
use crate::snapshot::TableSnapshot;
use tracing::debug;

pub struct ModelReader<'a> {
    resolver: &'a dyn ModelResolver,
}

impl<'a> ModelReader<'a> {
    pub fn new(resolver: &'a dyn ModelResolver) -> Self {
        Self { resolver }
    }

    /// The model registered for `app.orm.schema.table`
    pub fn resolve(&self, app: &str, schema: &str, table: &str) -> Result<&'a ModelDefinition, AppError> {
        let path = model_path(app, schema, table);
        let type_name = title_case(table);

        self.resolver
            .resolve(&path, &type_name)
            .ok_or(AppError::ModelNotFound { path, type_name })
    }

    /// Snapshot of the model registered for `app.orm.schema.table`
    pub fn read_model_structure(&self, app: &str, schema: &str, table: &str) -> Result<TableSnapshot, AppError> {
        let model = self.resolve(app, schema, table)?;
        let snapshot = self.snapshot_of(model)?;
        debug!(
            "Model {}.{} declares {} columns",
            model.path(),
            model.type_name(),
            snapshot.len()
        );
        Ok(snapshot)
    }

    /// Snapshot of a model definition. The catalog of a model is its app:
    /// every application owns a database of the same name.
    pub fn snapshot_of(&self, model: &ModelDefinition) -> Result<TableSnapshot, AppError> {
        let mut snapshot = TableSnapshot::empty(&model.app, &model.schema, &model.table);
        for field in model.columns() {
            let data_type = field.kind.column_type(&field.name)?;
            snapshot.push(field.name.as_str(), data_type);
        }
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orm::{builtin, FieldKind, ModelRegistry};
    use pretty_assertions::assert_eq;

    fn registry() -> ModelRegistry {
        let mut registry = ModelRegistry::with_builtin();
        registry
            .register(
                ModelDefinition::new("food", "food", "ingredient")
                    .primary_key("id", FieldKind::Int)
                    .field("name", FieldKind::Text)
                    .field("weight", FieldKind::Decimal)
                    .field("vegan", FieldKind::Boolean)
                    .field("kcal", FieldKind::Float)
                    .computed("display_name", FieldKind::Text),
            )
            .unwrap();
        registry
    }

    #[test]
    fn test_reads_columns_in_declaration_order() {
        let registry = registry();
        let snapshot = ModelReader::new(&registry)
            .read_model_structure("food", "food", "ingredient")
            .unwrap();

        let cols: Vec<(&str, &str)> = snapshot
            .columns
            .iter()
            .map(|c| (c.column.as_str(), c.data_type.as_str()))
            .collect();
        assert_eq!(
            cols,
            vec![
                ("id", "integer"),
                ("name", "text"),
                ("weight", "numeric"),
                ("vegan", "boolean"),
                ("kcal", "double precision"),
            ]
        );
        assert!(snapshot.columns.iter().all(|c| c.catalog == "food" && c.table == "ingredient"));
    }

    #[test]
    fn test_resolve_returns_definition() {
        let registry = registry();
        let model = ModelReader::new(&registry).resolve("food", "food", "ingredient").unwrap();
        assert_eq!(model.type_name(), "Ingredient");
        assert_eq!(model.primary_key_names(), vec!["id"]);
    }

    #[test]
    fn test_model_not_found() {
        let registry = registry();
        let err = ModelReader::new(&registry)
            .read_model_structure("food", "food", "recipe")
            .unwrap_err();
        match err {
            AppError::ModelNotFound { path, type_name } => {
                assert_eq!(path, "food.orm.food.recipe");
                assert_eq!(type_name, "Recipe");
            }
            other => panic!("expected ModelNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_unsupported_kind_aborts_whole_read() {
        let registry = registry();
        let err = ModelReader::new(&registry)
            .read_model_structure(builtin::APP, "user", "user")
            .unwrap_err();
        match err {
            AppError::UnsupportedFieldKind { field, kind } => {
                assert_eq!(field, "salt");
                assert_eq!(kind, "foreign_key");
            }
            other => panic!("expected UnsupportedFieldKind, got {:?}", other),
        }
    }

    #[test]
    fn test_builtin_salt_model() {
        let registry = registry();
        let snapshot = ModelReader::new(&registry)
            .read_model_structure(builtin::APP, "user", "salt")
            .unwrap();
        assert_eq!(snapshot.catalog, "sprout");
        assert_eq!(snapshot.len(), 2);
    }
}
