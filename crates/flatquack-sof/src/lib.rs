//! FlatQuack: a FHIRPath-to-SQL compiler for SQL on FHIR ViewDefinitions.
//!
//! FlatQuack turns a ViewDefinition into a single, self-contained DuckDB SQL
//! query through a four-stage pipeline: lex+parse the FHIRPath expressions
//! it references, resolve their element types against a FHIR structural
//! schema, lower the resolved AST into SQL fragments, then assemble the
//! whole view into one statement.
//!
//! This crate does not execute the generated SQL, build the FHIR schema
//! document it's handed, or render the query to be pretty — it compiles.
//!
//! # Example
//!
//! ```ignore
//! use flatquack_sof::{compile, FhirSchema, ViewDefinition};
//!
//! let schema = FhirSchema::from_json(&schema_json)?;
//! let view = ViewDefinition::from_json(&view_json)?;
//! let result = compile(&view, &schema, &Default::default())?;
//! println!("{}", result.sql);
//! ```
//!
//! # SQL on FHIR Specification
//!
//! See: <https://build.fhir.org/ig/FHIR/sql-on-fhir-v2/>

mod assembler;
mod ast;
mod column;
mod error;
mod lexer;
mod lower;
mod options;
mod parser;
mod resolver;
mod schema;
mod sqlfrag;
mod token;
mod types;
mod vars;
mod view_definition;

pub use assembler::CompileResult;
pub use column::{ColumnInfo, ColumnType};
pub use error::{CompileError, CompileErrorKind, Location, Result};
pub use options::{CompileOptions, SqlDialect};
pub use schema::{ElementDef, FhirSchema, ResolvedChoice};
pub use types::{Cardinality, DuckType, ResolvedType};
pub use vars::{ScalarLiteral, UserVars};
pub use view_definition::{Column, Constant, SelectColumn, ViewDefinition, WhereClause};

use assembler::Assembler;

/// Compile a ViewDefinition against a FHIR schema using default options
/// (spec.md §6).
#[tracing::instrument(skip_all, fields(view = %view.name))]
pub fn compile(view: &ViewDefinition, schema: &FhirSchema, user_vars: &UserVars) -> Result<CompileResult> {
    compile_with_options(view, schema, user_vars, &CompileOptions::default())
}

/// Compile a ViewDefinition with explicit [`CompileOptions`].
#[tracing::instrument(skip_all, fields(view = %view.name))]
pub fn compile_with_options(
    view: &ViewDefinition,
    schema: &FhirSchema,
    user_vars: &UserVars,
    options: &CompileOptions,
) -> Result<CompileResult> {
    let assembler = Assembler::new(schema, user_vars, options);
    assembler.assemble(view)
}
