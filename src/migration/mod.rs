//! Migration SQL generator
//!
//! Generates PostgreSQL DDL from a snapshot diff. Output is advisory text:
//! no transaction wrapping and no existence guards, so re-running a script
//! against a table already in the target state fails in the database.
//! Names are quoted only when they would not survive bare (reserved words,
//! upper case).

pub mod provision;

use crate::db::queries::SqlBuilder;
use crate::snapshot::{ColumnDescriptor, DiffResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which body of a script to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Move the table toward the model
    Upgrade,
    /// Move the table away from the model
    Downgrade,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Upgrade => f.write_str("upgrade"),
            Direction::Downgrade => f.write_str("downgrade"),
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upgrade" => Ok(Direction::Upgrade),
            "downgrade" => Ok(Direction::Downgrade),
            other => Err(format!("Unknown direction '{}' (expected upgrade or downgrade)", other)),
        }
    }
}

/// Upgrade and downgrade statement bodies for one table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationScript {
    pub schema: String,
    pub table: String,
    /// One `ADD COLUMN` statement per added column
    pub upgrade: String,
    /// One `DROP COLUMN` statement per removed column
    pub downgrade: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl MigrationScript {
    pub fn body(&self, direction: Direction) -> &str {
        match direction {
            Direction::Upgrade => &self.upgrade,
            Direction::Downgrade => &self.downgrade,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.upgrade.is_empty() && self.downgrade.is_empty()
    }
}

pub struct MigrationGenerator;

impl MigrationGenerator {
    /// Build both script bodies from a diff
    pub fn build_migration(schema: &str, table: &str, diff: &DiffResult) -> MigrationScript {
        MigrationScript {
            schema: schema.to_string(),
            table: table.to_string(),
            upgrade: Self::generate_upgrade(schema, table, &diff.added),
            downgrade: Self::generate_downgrade(schema, table, &diff.removed),
            warnings: Vec::new(),
        }
    }

    /// `ADD COLUMN` statements, newline separated, in column order
    pub fn generate_upgrade(schema: &str, table: &str, added: &[ColumnDescriptor]) -> String {
        added
            .iter()
            .map(|c| Self::add_column_sql(schema, table, c))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// `DROP COLUMN` statements, newline separated, in column order
    pub fn generate_downgrade(schema: &str, table: &str, removed: &[ColumnDescriptor]) -> String {
        removed
            .iter()
            .map(|c| Self::drop_column_sql(schema, table, c))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn add_column_sql(schema: &str, table: &str, c: &ColumnDescriptor) -> String {
        format!(
            "ALTER TABLE {}.{} ADD COLUMN {} {} DEFAULT NULL;",
            SqlBuilder::ident(schema),
            SqlBuilder::ident(table),
            SqlBuilder::ident(&c.column),
            c.data_type
        )
    }

    fn drop_column_sql(schema: &str, table: &str, c: &ColumnDescriptor) -> String {
        format!(
            "ALTER TABLE {}.{} DROP COLUMN {};",
            SqlBuilder::ident(schema),
            SqlBuilder::ident(table),
            SqlBuilder::ident(&c.column)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{DiffEngine, TableSnapshot};
    use pretty_assertions::assert_eq;

    fn col(column: &str, data_type: &str) -> ColumnDescriptor {
        ColumnDescriptor::new("food", "food", "ingredient", column, data_type)
    }

    #[test]
    fn test_add_single_column() {
        let diff = DiffResult {
            added: vec![col("weight", "numeric")],
            removed: vec![],
        };
        let script = MigrationGenerator::build_migration("food", "ingredient", &diff);
        assert_eq!(
            script.upgrade,
            "ALTER TABLE food.ingredient ADD COLUMN weight numeric DEFAULT NULL;"
        );
        assert_eq!(script.downgrade, "");
    }

    #[test]
    fn test_statements_are_newline_separated_in_order() {
        let diff = DiffResult {
            added: vec![col("weight", "numeric"), col("kcal", "double precision")],
            removed: vec![col("legacy", "text"), col("old_qty", "integer")],
        };
        let script = MigrationGenerator::build_migration("food", "ingredient", &diff);
        assert_eq!(
            script.upgrade,
            "ALTER TABLE food.ingredient ADD COLUMN weight numeric DEFAULT NULL;\n\
             ALTER TABLE food.ingredient ADD COLUMN kcal double precision DEFAULT NULL;"
        );
        assert_eq!(
            script.downgrade,
            "ALTER TABLE food.ingredient DROP COLUMN legacy;\n\
             ALTER TABLE food.ingredient DROP COLUMN old_qty;"
        );
    }

    #[test]
    fn test_no_drift_gives_empty_bodies() {
        let s = TableSnapshot::empty("food", "food", "ingredient")
            .with_column("name", "text")
            .with_column("id", "integer");
        let script = MigrationGenerator::build_migration("food", "ingredient", &DiffEngine::diff(&s, &s));
        assert!(script.is_empty());
    }

    #[test]
    fn test_db_ahead_drops_column() {
        let db = TableSnapshot::empty("food", "food", "ingredient")
            .with_column("id", "integer")
            .with_column("legacy", "text");
        let model = TableSnapshot::empty("food", "food", "ingredient").with_column("id", "integer");
        let script = MigrationGenerator::build_migration("food", "ingredient", &DiffEngine::diff(&db, &model));
        assert_eq!(script.upgrade, "");
        assert_eq!(script.downgrade, "ALTER TABLE food.ingredient DROP COLUMN legacy;");
    }

    #[test]
    fn test_type_change_emits_two_statements() {
        let db = TableSnapshot::empty("food", "food", "ingredient").with_column("qty", "integer");
        let model = TableSnapshot::empty("food", "food", "ingredient").with_column("qty", "numeric");
        let script = MigrationGenerator::build_migration("food", "ingredient", &DiffEngine::diff(&db, &model));
        assert_eq!(
            script.upgrade,
            "ALTER TABLE food.ingredient ADD COLUMN qty numeric DEFAULT NULL;"
        );
        assert_eq!(script.downgrade, "ALTER TABLE food.ingredient DROP COLUMN qty;");
    }

    #[test]
    fn test_reserved_and_mixed_case_names_are_quoted() {
        let diff = DiffResult {
            added: vec![ColumnDescriptor::new("sprout", "user", "salt", "salt", "text")],
            removed: vec![ColumnDescriptor::new("sprout", "user", "salt", "LegacySalt", "text")],
        };
        let script = MigrationGenerator::build_migration("user", "salt", &diff);
        assert_eq!(
            script.upgrade,
            "ALTER TABLE \"user\".salt ADD COLUMN salt text DEFAULT NULL;"
        );
        assert_eq!(
            script.downgrade,
            "ALTER TABLE \"user\".salt DROP COLUMN \"LegacySalt\";"
        );
    }

    #[test]
    fn test_direction_parsing() {
        assert_eq!("upgrade".parse::<Direction>().unwrap(), Direction::Upgrade);
        assert_eq!("downgrade".parse::<Direction>().unwrap(), Direction::Downgrade);
        assert!("info".parse::<Direction>().is_err());

        let script = MigrationScript {
            upgrade: "up".to_string(),
            downgrade: "down".to_string(),
            ..Default::default()
        };
        assert_eq!(script.body(Direction::Upgrade), "up");
        assert_eq!(script.body(Direction::Downgrade), "down");
    }
}
