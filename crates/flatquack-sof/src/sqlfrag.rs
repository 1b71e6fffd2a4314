//! The lowered representation produced by stage 3 (spec.md §3, §4.3).

use crate::types::DuckType;

/// A single lateral flattening join, e.g. `UNNEST(arr) AS u3(item)`.
///
/// `dependencies` lists the aliases of lateral tables this one's `sql_text`
/// references; the assembler emits tables in topological order so every
/// dependency appears before its dependents (spec.md's "Lateral DAG"
/// invariant).
#[derive(Debug, Clone, PartialEq)]
pub struct LateralTable {
    pub alias: String,
    pub sql_text: String,
    pub dependencies: Vec<String>,
}

/// `expr` plus everything needed to make it valid SQL: the lateral joins it
/// depends on, its physical type, and whether it denotes an array.
#[derive(Debug, Clone)]
pub struct SqlFragment {
    pub expr: String,
    pub tables: Vec<LateralTable>,
    pub result_type: DuckType,
    pub is_array: bool,
    pub alias: Option<String>,
}

impl SqlFragment {
    pub fn scalar(expr: impl Into<String>, result_type: DuckType) -> Self {
        Self {
            expr: expr.into(),
            tables: Vec::new(),
            result_type,
            is_array: false,
            alias: None,
        }
    }

    pub fn array(expr: impl Into<String>, result_type: DuckType) -> Self {
        Self {
            expr: expr.into(),
            tables: Vec::new(),
            result_type,
            is_array: true,
            alias: None,
        }
    }

    pub fn with_tables(mut self, tables: Vec<LateralTable>) -> Self {
        self.tables = tables;
        self
    }

    pub fn push_table(&mut self, table: LateralTable) {
        self.tables.push(table);
    }

    /// Merge another fragment's lateral tables into this one, deduplicating
    /// by alias (spec.md §4.4: "Deduplicates lateral tables by structural
    /// equality of `sqlText`").
    pub fn absorb_tables(&mut self, other: &SqlFragment) {
        for table in &other.tables {
            if !self.tables.iter().any(|t| t.sql_text == table.sql_text) {
                self.tables.push(table.clone());
            }
        }
    }
}
