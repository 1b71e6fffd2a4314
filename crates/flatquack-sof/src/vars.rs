//! User-supplied `%variable` substitution (spec.md §2, §6).

use std::collections::HashMap;

use crate::types::DuckType;

/// A scalar literal a caller binds to `%name` in a FHIRPath expression.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarLiteral {
    String(String),
    Integer(i64),
    Decimal(f64),
    Boolean(bool),
}

impl ScalarLiteral {
    pub fn physical_type(&self) -> DuckType {
        match self {
            ScalarLiteral::String(_) => DuckType::Varchar,
            ScalarLiteral::Integer(_) => DuckType::BigInt,
            ScalarLiteral::Decimal(_) => DuckType::Decimal,
            ScalarLiteral::Boolean(_) => DuckType::Boolean,
        }
    }

    pub fn fhir_type(&self) -> &'static str {
        match self {
            ScalarLiteral::String(_) => "string",
            ScalarLiteral::Integer(_) => "integer",
            ScalarLiteral::Decimal(_) => "decimal",
            ScalarLiteral::Boolean(_) => "boolean",
        }
    }

    /// Render as a SQL literal for substitution into the generated query.
    pub fn to_sql(&self) -> String {
        match self {
            ScalarLiteral::String(s) => format!("'{}'", s.replace('\'', "''")),
            ScalarLiteral::Integer(i) => i.to_string(),
            ScalarLiteral::Decimal(d) => d.to_string(),
            ScalarLiteral::Boolean(b) => b.to_string(),
        }
    }
}

pub type UserVars = HashMap<String, ScalarLiteral>;
