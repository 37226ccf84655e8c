//! Field kinds and their Postgres column types

use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Every kind of field a model may declare.
///
/// Only a subset maps to a column type today; the rest are declared so a
/// model using them is rejected by name instead of silently mistyped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Int,
    Text,
    Boolean,
    Decimal,
    Float,
    BigInt,
    SmallInt,
    Char,
    DateTime,
    Date,
    TimeDelta,
    Json,
    Uuid,
    ForeignKey,
    ManyToMany,
    BackwardRelation,
}

impl FieldKind {
    /// Kinds with a column type mapping
    pub const SUPPORTED: [FieldKind; 5] = [
        FieldKind::Int,
        FieldKind::Text,
        FieldKind::Boolean,
        FieldKind::Decimal,
        FieldKind::Float,
    ];

    pub const ALL: [FieldKind; 16] = [
        FieldKind::Int,
        FieldKind::Text,
        FieldKind::Boolean,
        FieldKind::Decimal,
        FieldKind::Float,
        FieldKind::BigInt,
        FieldKind::SmallInt,
        FieldKind::Char,
        FieldKind::DateTime,
        FieldKind::Date,
        FieldKind::TimeDelta,
        FieldKind::Json,
        FieldKind::Uuid,
        FieldKind::ForeignKey,
        FieldKind::ManyToMany,
        FieldKind::BackwardRelation,
    ];

    /// Canonical Postgres type name, as `information_schema.columns.data_type`
    /// reports it.
    pub fn pg_type(self) -> Option<&'static str> {
        match self {
            FieldKind::Int => Some("integer"),
            FieldKind::Text => Some("text"),
            FieldKind::Boolean => Some("boolean"),
            FieldKind::Decimal => Some("numeric"),
            FieldKind::Float => Some("double precision"),
            FieldKind::BigInt
            | FieldKind::SmallInt
            | FieldKind::Char
            | FieldKind::DateTime
            | FieldKind::Date
            | FieldKind::TimeDelta
            | FieldKind::Json
            | FieldKind::Uuid
            | FieldKind::ForeignKey
            | FieldKind::ManyToMany
            | FieldKind::BackwardRelation => None,
        }
    }

    /// Column type for a named field, failing on unmapped kinds
    pub fn column_type(self, field: &str) -> Result<&'static str, AppError> {
        self.pg_type().ok_or_else(|| AppError::UnsupportedFieldKind {
            field: field.to_string(),
            kind: self.to_string(),
        })
    }

    pub fn is_supported(self) -> bool {
        self.pg_type().is_some()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FieldKind::Int => "int",
            FieldKind::Text => "text",
            FieldKind::Boolean => "boolean",
            FieldKind::Decimal => "decimal",
            FieldKind::Float => "float",
            FieldKind::BigInt => "big_int",
            FieldKind::SmallInt => "small_int",
            FieldKind::Char => "char",
            FieldKind::DateTime => "date_time",
            FieldKind::Date => "date",
            FieldKind::TimeDelta => "time_delta",
            FieldKind::Json => "json",
            FieldKind::Uuid => "uuid",
            FieldKind::ForeignKey => "foreign_key",
            FieldKind::ManyToMany => "many_to_many",
            FieldKind::BackwardRelation => "backward_relation",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| AppError::Validation(format!("Unknown field kind '{}'", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_kinds_map_to_types() {
        for kind in FieldKind::SUPPORTED {
            let ty = kind.column_type("f").unwrap();
            assert!(!ty.is_empty(), "{} mapped to an empty type", kind);
        }
        assert_eq!(FieldKind::Decimal.pg_type(), Some("numeric"));
        assert_eq!(FieldKind::Float.pg_type(), Some("double precision"));
    }

    #[test]
    fn test_unsupported_kinds_fail() {
        let unsupported: Vec<FieldKind> = FieldKind::ALL.into_iter().filter(|k| !k.is_supported()).collect();
        assert_eq!(unsupported.len(), FieldKind::ALL.len() - FieldKind::SUPPORTED.len());

        for kind in unsupported {
            match kind.column_type("created") {
                Err(AppError::UnsupportedFieldKind { field, kind: k }) => {
                    assert_eq!(field, "created");
                    assert_eq!(k, kind.as_str());
                }
                other => panic!("expected UnsupportedFieldKind for {}, got {:?}", kind, other),
            }
        }
    }

    #[test]
    fn test_name_round_trip() {
        for kind in FieldKind::ALL {
            assert_eq!(kind.as_str().parse::<FieldKind>().unwrap(), kind);
        }
        assert!("varchar".parse::<FieldKind>().is_err());
    }

    #[test]
    fn test_serde_names_match_display() {
        let json = serde_json::to_string(&FieldKind::ForeignKey).unwrap();
        assert_eq!(json, "\"foreign_key\"");
        let kind: FieldKind = serde_json::from_str("\"big_int\"").unwrap();
        assert_eq!(kind, FieldKind::BigInt);
    }
}
