//! Stage 4: the View Assembler (spec.md §4.4).
//!
//! Walks a ViewDefinition's `select` tree, threading a schema [`Focus`] and a
//! SQL [`LowerCtx`] together at every scope, and renders the final
//! single-statement query: one `SELECT`, a flat (deduplicated) list of
//! lateral joins, and an optional combined `WHERE`.

use std::collections::HashSet;

use tracing::debug;

use crate::ast::Node;
use crate::column::{ColumnInfo, ColumnType};
use crate::error::{CompileError, CompileErrorKind, Result};
use crate::lower::{LowerCtx, Lowerer};
use crate::options::CompileOptions;
use crate::parser::parse;
use crate::resolver::{Focus, Resolver};
use crate::schema::FhirSchema;
use crate::sqlfrag::LateralTable;
use crate::types::{Cardinality, DuckType};
use crate::vars::UserVars;
use crate::view_definition::{Column, SelectColumn, ViewDefinition};

/// The top-level result of a successful compile (spec.md §6).
#[derive(Debug, Clone)]
pub struct CompileResult {
    pub sql: String,
    pub input_schema: String,
    pub column_list: Vec<ColumnInfo>,
    pub diagnostics: Vec<String>,
}

const ROOT_ALIAS: &str = "base";

struct Scope {
    focus: Focus,
    ctx: LowerCtx,
}

struct AssembledColumn {
    name: String,
    expr: String,
    physical_type: DuckType,
}

pub struct Assembler<'a> {
    schema: &'a FhirSchema,
    resolver: Resolver<'a>,
    lowerer: Lowerer<'a>,
    options: &'a CompileOptions,
    tables: Vec<LateralTable>,
}

impl<'a> Assembler<'a> {
    pub fn new(schema: &'a FhirSchema, user_vars: &'a UserVars, options: &'a CompileOptions) -> Self {
        Self {
            schema,
            resolver: Resolver::new(schema, user_vars),
            lowerer: Lowerer::new(user_vars, options),
            options,
            tables: Vec::new(),
        }
    }

    #[tracing::instrument(skip_all, fields(resource = %view.resource, name = %view.name))]
    pub fn assemble(mut self, view: &ViewDefinition) -> Result<CompileResult> {
        let root_scope = Scope {
            focus: Focus::root(&view.resource),
            ctx: LowerCtx::root(ROOT_ALIAS),
        };

        let mut columns = Vec::new();
        for select in &view.select {
            self.walk_select(select, &root_scope, &mut columns)?;
        }
        if columns.is_empty() {
            return Err(CompileError::new(CompileErrorKind::InvalidViewDefinition, "view defines no output columns"));
        }

        let mut where_expr = None;
        for clause in &view.where_ {
            let mut node = self.parse(&clause.path)?;
            let resolved = self.resolver.resolve(&mut node, &root_scope.focus)?;
            if resolved.physical_type != DuckType::Boolean && resolved.physical_type != DuckType::Unknown {
                return Err(CompileError::at_view_path(
                    CompileErrorKind::CardinalityMismatch,
                    "where clause must resolve to boolean",
                    "where",
                ));
            }
            let fragment = self.lowerer.lower(&node, &root_scope.ctx)?;
            merge_tables(&mut self.tables, &fragment.tables);
            where_expr = Some(match where_expr {
                Some(acc) => format!("({acc}) AND ({})", fragment.expr),
                None => fragment.expr,
            });
        }

        let select_list = columns
            .iter()
            .map(|c| format!("{} AS {}", c.expr, quote_ident(&c.name)))
            .collect::<Vec<_>>()
            .join(",\n  ");

        let mut sql = format!("SELECT\n  {select_list}\nFROM {} AS {ROOT_ALIAS}", quote_ident(&view.resource));
        for table in &self.tables {
            sql.push_str(&format!(",\n  LATERAL {}", table.sql_text));
        }
        if let Some(w) = where_expr {
            sql.push_str(&format!("\nWHERE {w}"));
        }

        debug!(sql = %sql, "assembled view query");

        let column_list = columns
            .iter()
            .map(|c| ColumnInfo::new(c.name.clone(), ColumnType::from_duck_type(&c.physical_type)))
            .collect();

        let touched = self.resolver.touched_elements();
        let input_schema = build_input_schema(self.schema, &view.resource, &touched, 0).sql_name();
        let diagnostics = columns
            .iter()
            .filter(|c| c.physical_type == DuckType::Unknown)
            .map(|c| format!("column `{}` has no concrete scalar type; downstream consumers should treat it as JSON", c.name))
            .collect();

        Ok(CompileResult {
            sql,
            input_schema,
            column_list,
            diagnostics,
        })
    }

    fn parse(&self, expr: &str) -> Result<Node> {
        parse(expr, self.options.max_recursion_depth).map_err(|e| e.with_expr_text(expr))
    }

    fn walk_select(&mut self, select: &SelectColumn, scope: &Scope, out: &mut Vec<AssembledColumn>) -> Result<()> {
        let forks = [select.for_each.is_some(), select.for_each_or_null.is_some(), select.union_all.is_some()];
        if forks.iter().filter(|f| **f).count() > 1 {
            return Err(CompileError::new(
                CompileErrorKind::UnsupportedFeature,
                "a select item may declare at most one of forEach, forEachOrNull, unionAll",
            ));
        }

        if let Some(branches) = &select.union_all {
            if select.column.is_some() || !select.select.is_empty() {
                return Err(CompileError::new(
                    CompileErrorKind::UnsupportedFeature,
                    "UnsupportedUnionAllSelect: a unionAll select item cannot also declare column/select directly",
                ));
            }
            let union_scope = self.bind_union_all(branches, scope)?;
            // unionAll branches already fully contribute their own columns via
            // bind_union_all; nothing further to walk at this node.
            let _ = union_scope;
            return Ok(());
        }

        let owned_scope;
        let inner_scope: &Scope = if let Some(path) = &select.for_each {
            owned_scope = self.bind_for_each(path, scope, false)?;
            &owned_scope
        } else if let Some(path) = &select.for_each_or_null {
            owned_scope = self.bind_for_each(path, scope, true)?;
            &owned_scope
        } else {
            scope
        };

        if let Some(cols) = &select.column {
            for col in cols {
                out.push(self.lower_column(col, inner_scope)?);
            }
        }
        for nested in &select.select {
            self.walk_select(nested, inner_scope, out)?;
        }
        Ok(())
    }

    fn lower_column(&mut self, col: &Column, scope: &Scope) -> Result<AssembledColumn> {
        let mut node = self.parse(&col.path)?;
        let resolved = self.resolver.resolve(&mut node, &scope.focus)?;
        let fragment = self.lowerer.lower(&node, &scope.ctx)?;
        merge_tables(&mut self.tables, &fragment.tables);
        Ok(AssembledColumn {
            name: col.name.clone(),
            expr: fragment.expr,
            physical_type: resolved.physical_type,
        })
    }

    fn bind_for_each(&mut self, path: &str, scope: &Scope, or_null: bool) -> Result<Scope> {
        let mut node = self.parse(path)?;
        let resolved = self.resolver.resolve(&mut node, &scope.focus)?;
        let fragment = self.lowerer.lower(&node, &scope.ctx)?;
        merge_tables(&mut self.tables, &fragment.tables);

        let alias = self.lowerer.fresh_alias();
        let source_expr = if or_null {
            format!("COALESCE(NULLIF({}, []), [NULL])", fragment.expr)
        } else {
            fragment.expr.clone()
        };
        self.tables.push(LateralTable {
            alias: alias.clone(),
            sql_text: format!("UNNEST({source_expr}) AS {alias}(item)"),
            dependencies: Vec::new(),
        });

        let item_physical = match resolved.physical_type {
            DuckType::List(inner) => *inner,
            other => other,
        };
        Ok(Scope {
            focus: Focus {
                fhir_type: resolved.fhir_type,
                cardinality: Cardinality::Singleton,
                physical_type: item_physical,
            },
            ctx: LowerCtx::root(format!("{alias}.item")),
        })
    }

    /// `unionAll`: each branch is lowered as an independent, self-contained
    /// `SELECT`; all branches must declare identical column names in the
    /// same order, and the branches are combined with `UNION ALL` into a
    /// single lateral subquery so the rest of the row (ancestor columns)
    /// multiplies against it like any other row-expanding join.
    fn bind_union_all(&mut self, branches: &[SelectColumn], scope: &Scope) -> Result<Scope> {
        let mut branch_sqls = Vec::new();
        let mut expected_names: Option<Vec<String>> = None;

        for branch in branches {
            if !branch.select.is_empty() || branch.union_all.is_some() {
                return Err(CompileError::new(
                    CompileErrorKind::UnsupportedFeature,
                    "UnsupportedUnionAllSelect: nested select/unionAll inside a unionAll branch is not supported",
                ));
            }
            let mut branch_tables: Vec<LateralTable> = Vec::new();
            let branch_scope = if let Some(path) = &branch.for_each {
                self.bind_branch_for_each(path, scope, false, &mut branch_tables)?
            } else if let Some(path) = &branch.for_each_or_null {
                self.bind_branch_for_each(path, scope, true, &mut branch_tables)?
            } else {
                Scope {
                    focus: scope.focus.clone(),
                    ctx: scope.ctx.clone(),
                }
            };

            let cols = branch.column.as_ref().ok_or_else(|| {
                CompileError::new(CompileErrorKind::UnsupportedFeature, "a unionAll branch must declare column")
            })?;
            let mut names = Vec::with_capacity(cols.len());
            let mut exprs = Vec::with_capacity(cols.len());
            for col in cols {
                let mut node = self.parse(&col.path)?;
                self.resolver.resolve(&mut node, &branch_scope.focus)?;
                let fragment = self.lowerer.lower(&node, &branch_scope.ctx)?;
                merge_tables(&mut branch_tables, &fragment.tables);
                exprs.push(format!("{} AS {}", fragment.expr, quote_ident(&col.name)));
                names.push(col.name.clone());
            }
            match &expected_names {
                None => expected_names = Some(names),
                Some(expected) if expected == &names => {}
                Some(_) => {
                    return Err(CompileError::new(
                        CompileErrorKind::UnsupportedFeature,
                        "unionAll branches must declare identical columns in the same order",
                    ));
                }
            }

            let select_list = exprs.join(", ");
            let branch_sql = if branch_tables.is_empty() {
                format!("SELECT {select_list}")
            } else {
                let from_list = branch_tables.iter().map(|t| t.sql_text.clone()).collect::<Vec<_>>().join(", ");
                format!("SELECT {select_list} FROM {from_list}")
            };
            branch_sqls.push(branch_sql);
        }

        let alias = self.lowerer.fresh_alias();
        let union_sql = branch_sqls.join(" UNION ALL ");
        self.tables.push(LateralTable {
            alias: alias.clone(),
            sql_text: format!("({union_sql}) AS {alias}"),
            dependencies: Vec::new(),
        });
        Ok(Scope {
            focus: scope.focus.clone(),
            ctx: LowerCtx::root(alias),
        })
    }

    fn bind_branch_for_each(&mut self, path: &str, scope: &Scope, or_null: bool, branch_tables: &mut Vec<LateralTable>) -> Result<Scope> {
        let mut node = self.parse(path)?;
        let resolved = self.resolver.resolve(&mut node, &scope.focus)?;
        let fragment = self.lowerer.lower(&node, &scope.ctx)?;
        merge_tables(branch_tables, &fragment.tables);

        let alias = self.lowerer.fresh_alias();
        let source_expr = if or_null {
            format!("COALESCE(NULLIF({}, []), [NULL])", fragment.expr)
        } else {
            fragment.expr.clone()
        };
        branch_tables.push(LateralTable {
            alias: alias.clone(),
            sql_text: format!("UNNEST({source_expr}) AS {alias}(item)"),
            dependencies: Vec::new(),
        });

        let item_physical = match resolved.physical_type {
            DuckType::List(inner) => *inner,
            other => other,
        };
        Ok(Scope {
            focus: Focus {
                fhir_type: resolved.fhir_type,
                cardinality: Cardinality::Singleton,
                physical_type: item_physical,
            },
            ctx: LowerCtx::root(format!("{alias}.item")),
        })
    }
}

fn merge_tables(global: &mut Vec<LateralTable>, local: &[LateralTable]) {
    for table in local {
        if !global.iter().any(|t| t.sql_text == table.sql_text) {
            global.push(table.clone());
        }
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Build the `STRUCT(...)` type covering only the elements a compile
/// actually touched, recursing into nested complex types (capped to avoid
/// infinite recursion on schemas with cycles, e.g. `Extension` -> `Resource`).
///
/// A choice-group dict entry (`types.len() > 1`) never contributes a field
/// under its bare group name — only the concrete physical columns a select
/// actually narrowed to via `ofType()`/direct suffix access (e.g.
/// `valueDecimal`, not `value`), matching `schema::resolve_choice`.
fn build_input_schema(schema: &FhirSchema, type_name: &str, touched: &HashSet<(String, String)>, depth: usize) -> DuckType {
    const MAX_DEPTH: usize = 8;
    let Some(elements) = schema.elements(type_name) else {
        return DuckType::Unknown;
    };
    let mut fields = indexmap::IndexMap::new();
    for (field_name, def) in elements {
        if def.types.len() > 1 {
            for candidate_type in &def.types {
                let physical_name = format!("{field_name}{}", crate::schema::capitalize(candidate_type));
                if touched.contains(&(type_name.to_string(), physical_name.clone())) {
                    let field_type = resolve_field_type(schema, candidate_type, touched, depth);
                    fields.insert(physical_name, field_type);
                }
            }
            continue;
        }
        if !touched.contains(&(type_name.to_string(), field_name.clone())) {
            continue;
        }
        let Some(fhir_type) = def.types.first() else { continue };
        let field_type = resolve_field_type(schema, fhir_type, touched, depth);
        let field_type = if def.is_collection() { DuckType::List(Box::new(field_type)) } else { field_type };
        fields.insert(field_name.clone(), field_type);
    }
    DuckType::Struct(fields)
}

fn resolve_field_type(schema: &FhirSchema, fhir_type: &str, touched: &HashSet<(String, String)>, depth: usize) -> DuckType {
    const MAX_DEPTH: usize = 8;
    let scalar = DuckType::from_fhir_primitive(fhir_type);
    if scalar == DuckType::Unknown && depth < MAX_DEPTH {
        build_input_schema(schema, fhir_type, touched, depth + 1)
    } else {
        scalar
    }
}
