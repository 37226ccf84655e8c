//! SQL query constants and builders
//!
//! Structural queries against `information_schema`. Every selected value is
//! cast to `text` so rows decode the same way regardless of the catalog's
//! domain types.

/// Columns of one table, in ordinal order.
/// `$1` catalog, `$2` schema, `$3` table.
pub const COLUMNS_FOR_TABLE: &str = r#"
    SELECT
        c.table_catalog::text AS table_catalog,
        c.table_schema::text AS table_schema,
        c.table_name::text AS table_name,
        c.column_name::text AS column_name,
        c.data_type::text AS data_type
    FROM information_schema.columns c
    WHERE c.table_catalog = $1
        AND c.table_schema = $2
        AND c.table_name = $3
    ORDER BY c.ordinal_position
"#;

/// Columns of every table in a schema.
/// `$1` catalog, `$2` schema.
pub const COLUMNS_FOR_SCHEMA: &str = r#"
    SELECT
        c.table_catalog::text AS table_catalog,
        c.table_schema::text AS table_schema,
        c.table_name::text AS table_name,
        c.column_name::text AS column_name,
        c.data_type::text AS data_type
    FROM information_schema.columns c
    WHERE c.table_catalog = $1
        AND c.table_schema = $2
    ORDER BY c.table_name, c.ordinal_position
"#;

/// Foreign-key constraints declared in a schema.
/// `$1` catalog, `$2` schema.
pub const FOREIGN_KEYS_FOR_SCHEMA: &str = r#"
    SELECT
        tc.table_catalog::text AS table_catalog,
        tc.table_schema::text AS table_schema,
        tc.table_name::text AS table_name,
        tc.constraint_name::text AS constraint_name
    FROM information_schema.table_constraints tc
    WHERE tc.constraint_type = 'FOREIGN KEY'
        AND tc.table_catalog = $1
        AND tc.table_schema = $2
    ORDER BY tc.table_name, tc.constraint_name
"#;

/// Keywords PostgreSQL reserves outright; these never parse as bare names.
const RESERVED_KEYWORDS: &[&str] = &[
    "all", "analyse", "analyze", "and", "any", "array", "as", "asc", "asymmetric",
    "authorization", "binary", "both", "case", "cast", "check", "collate", "collation",
    "column", "concurrently", "constraint", "create", "cross", "current_catalog",
    "current_date", "current_role", "current_schema", "current_time", "current_timestamp",
    "current_user", "default", "deferrable", "desc", "distinct", "do", "else", "end",
    "except", "false", "fetch", "for", "foreign", "freeze", "from", "full", "grant",
    "group", "having", "ilike", "in", "initially", "inner", "intersect", "into", "is",
    "isnull", "join", "lateral", "leading", "left", "like", "limit", "localtime",
    "localtimestamp", "natural", "not", "notnull", "null", "offset", "on", "only", "or",
    "order", "outer", "overlaps", "placing", "primary", "references", "returning", "right",
    "select", "session_user", "similar", "some", "symmetric", "system_user", "table",
    "tablesample", "then", "to", "trailing", "true", "union", "unique", "user", "using",
    "variadic", "verbose", "when", "where", "window", "with",
];

/// SQL builder for safe identifier quoting
pub struct SqlBuilder;

impl SqlBuilder {
    /// Quote an identifier (schema/table/column name) safely
    pub fn quote_ident(ident: &str) -> String {
        format!("\"{}\"", ident.replace('"', "\"\""))
    }

    /// An identifier as written in generated DDL: bare when it is a plain
    /// lowercase non-reserved name, quoted otherwise so case and reserved
    /// words survive.
    pub fn ident(ident: &str) -> String {
        if Self::is_plain(ident) {
            ident.to_string()
        } else {
            Self::quote_ident(ident)
        }
    }

    fn is_plain(ident: &str) -> bool {
        let mut chars = ident.chars();
        let starts_ok = matches!(chars.next(), Some(c) if c.is_ascii_lowercase() || c == '_');
        starts_ok
            && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '$')
            && !RESERVED_KEYWORDS.contains(&ident)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_ident() {
        assert_eq!(SqlBuilder::quote_ident("user"), "\"user\"");
        assert_eq!(SqlBuilder::quote_ident("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn test_ident_quotes_only_when_needed() {
        assert_eq!(SqlBuilder::ident("food"), "food");
        assert_eq!(SqlBuilder::ident("old_qty2"), "old_qty2");
        assert_eq!(SqlBuilder::ident("user"), "\"user\"");
        assert_eq!(SqlBuilder::ident("Weight"), "\"Weight\"");
        assert_eq!(SqlBuilder::ident("2fast"), "\"2fast\"");
        assert_eq!(SqlBuilder::ident(""), "\"\"");
    }

    #[test]
    fn test_queries_are_parameterised() {
        assert!(COLUMNS_FOR_TABLE.contains("$3"));
        assert!(COLUMNS_FOR_TABLE.contains("ORDER BY c.ordinal_position"));
        assert!(!COLUMNS_FOR_SCHEMA.contains("$3"));
        assert!(FOREIGN_KEYS_FOR_SCHEMA.contains("'FOREIGN KEY'"));
    }
}
