//! DDL for bringing up an application database from its models
//!
//! Identifiers are always quoted here: schema names such as `user` are
//! reserved words and would not parse bare.

use crate::db::queries::SqlBuilder;
use crate::error::AppError;
use crate::orm::{FieldDef, FieldKind, ModelDefinition};

pub fn create_database_sql(name: &str) -> String {
    format!("CREATE DATABASE {};", SqlBuilder::quote_ident(name))
}

pub fn create_schema_sql(name: &str) -> String {
    format!("CREATE SCHEMA {};", SqlBuilder::quote_ident(name))
}

/// `CREATE TABLE` for a model. Computed fields are skipped; an unmapped
/// field kind fails the whole statement. A foreign key becomes an
/// `{name}_id integer` column referencing its target's primary key.
pub fn create_table_sql(model: &ModelDefinition) -> Result<String, AppError> {
    let columns = model
        .columns()
        .map(|field| column_sql(model, field))
        .collect::<Result<Vec<_>, AppError>>()?;

    if columns.is_empty() {
        return Err(AppError::Validation(format!(
            "Model '{}' has no columns to create",
            model.path()
        )));
    }

    Ok(format!(
        "CREATE TABLE {}.{} (\n{}\n);",
        SqlBuilder::quote_ident(&model.schema),
        SqlBuilder::quote_ident(&model.table),
        columns.join(",\n")
    ))
}

fn column_sql(model: &ModelDefinition, field: &FieldDef) -> Result<String, AppError> {
    if field.kind == FieldKind::ForeignKey {
        let target = field.references.as_deref().ok_or_else(|| {
            AppError::Validation(format!(
                "Foreign key '{}' of model '{}' names no target table",
                field.name,
                model.path()
            ))
        })?;
        return Ok(format!(
            "    {} integer REFERENCES {}.{}",
            SqlBuilder::quote_ident(&format!("{}_id", field.name)),
            SqlBuilder::quote_ident(&model.schema),
            SqlBuilder::quote_ident(target)
        ));
    }

    let data_type = field.kind.column_type(&field.name)?;
    let mut def = format!("    {} {}", SqlBuilder::quote_ident(&field.name), data_type);
    if field.primary_key {
        def.push_str(" PRIMARY KEY");
    }
    Ok(def)
}

/// Models in creation order: a model comes after the same-schema tables it
/// references. Cycles and references outside the list keep declaration order.
pub fn creation_order<'m>(models: &[&'m ModelDefinition]) -> Vec<&'m ModelDefinition> {
    let mut pending: Vec<&'m ModelDefinition> = models.to_vec();
    let mut ordered: Vec<&'m ModelDefinition> = Vec::with_capacity(pending.len());

    while !pending.is_empty() {
        let ready = pending.iter().position(|m| {
            m.references().all(|target| {
                target == m.table
                    || !pending
                        .iter()
                        .any(|other| other.schema == m.schema && other.table == target)
            })
        });
        // a cycle: take the first pending model as declared
        ordered.push(pending.remove(ready.unwrap_or(0)));
    }
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orm::{ModelRegistry, ModelResolver};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_create_table() {
        let model = ModelDefinition::new("food", "food", "ingredient")
            .primary_key("id", FieldKind::Int)
            .field("name", FieldKind::Text)
            .computed("label", FieldKind::Text);
        assert_eq!(
            create_table_sql(&model).unwrap(),
            "CREATE TABLE \"food\".\"ingredient\" (\n    \"id\" integer PRIMARY KEY,\n    \"name\" text\n);"
        );
    }

    #[test]
    fn test_create_table_rejects_unsupported_kind() {
        let model = ModelDefinition::new("food", "food", "recipe")
            .primary_key("id", FieldKind::Int)
            .field("steps", FieldKind::Json);
        match create_table_sql(&model) {
            Err(AppError::UnsupportedFieldKind { field, kind }) => {
                assert_eq!(field, "steps");
                assert_eq!(kind, "json");
            }
            other => panic!("expected UnsupportedFieldKind, got {:?}", other),
        }
    }

    #[test]
    fn test_create_table_with_foreign_key() {
        let registry = ModelRegistry::with_builtin();
        let user = registry.resolve("sprout.orm.user.user", "User").unwrap();
        assert_eq!(
            create_table_sql(user).unwrap(),
            "CREATE TABLE \"user\".\"user\" (\n    \"id\" integer PRIMARY KEY,\n    \"name\" text,\n    \"pw\" text,\n    \"salt_id\" integer REFERENCES \"user\".\"salt\",\n    \"contact\" text,\n    \"profile\" text\n);"
        );
    }

    #[test]
    fn test_creation_order_puts_targets_first() {
        let order = ModelDefinition::new("shop", "shop", "order")
            .primary_key("id", FieldKind::Int)
            .foreign_key("customer", "customer");
        let customer = ModelDefinition::new("shop", "shop", "customer").primary_key("id", FieldKind::Int);
        let note = ModelDefinition::new("shop", "shop", "note").field("body", FieldKind::Text);

        let tables: Vec<&str> = creation_order(&[&order, &customer, &note])
            .iter()
            .map(|m| m.table.as_str())
            .collect();
        assert_eq!(tables, vec!["customer", "order", "note"]);
    }

    #[test]
    fn test_creation_order_tolerates_cycles() {
        let a = ModelDefinition::new("x", "x", "a").foreign_key("b", "b");
        let b = ModelDefinition::new("x", "x", "b").foreign_key("a", "a");
        let tables: Vec<&str> = creation_order(&[&a, &b]).iter().map(|m| m.table.as_str()).collect();
        assert_eq!(tables, vec!["a", "b"]);
    }

    #[test]
    fn test_create_table_needs_columns() {
        let model = ModelDefinition::new("food", "food", "empty").computed("label", FieldKind::Text);
        assert!(matches!(create_table_sql(&model), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_database_and_schema() {
        assert_eq!(create_database_sql("food"), "CREATE DATABASE \"food\";");
        assert_eq!(create_schema_sql("user"), "CREATE SCHEMA \"user\";");
    }
}
