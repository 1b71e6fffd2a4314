//! Stage 3: translate the annotated AST into a [`SqlFragment`] (spec.md §4.3).
//!
//! Lowering is a post-order walk. Every node that denotes an array
//! contributes (or reuses) a [`LateralTable`] the moment a later step needs
//! to reach into its elements; the fragment simply accumulates the tables it
//! needed along the way, in the order it needed them.

use crate::ast::{BinOp, LiteralValue, Node, NodeKind, UnOp};
use crate::error::{CompileError, CompileErrorKind, Result};
use crate::options::CompileOptions;
use crate::sqlfrag::{LateralTable, SqlFragment};
use crate::types::DuckType;
use crate::vars::UserVars;

/// What a node is being lowered *against*: the current SQL expression for
/// the focus value, whether that value is array-typed, what `$this` is
/// bound to (inside a predicate), and the row alias of the top-level FROM
/// source (needed by `getResourceKey()`/`getReferenceKey()` regardless of
/// how deeply nested the call appears).
#[derive(Debug, Clone)]
pub struct LowerCtx {
    pub expr: String,
    pub is_array: bool,
    pub this_binding: Option<String>,
    pub root_alias: String,
}

impl LowerCtx {
    pub fn root(root_alias: impl Into<String>) -> Self {
        let root_alias = root_alias.into();
        Self {
            expr: root_alias.clone(),
            is_array: false,
            this_binding: None,
            root_alias,
        }
    }

    fn with_focus(&self, expr: impl Into<String>, is_array: bool) -> Self {
        let expr = expr.into();
        Self {
            this_binding: Some(expr.clone()),
            expr,
            is_array,
            root_alias: self.root_alias.clone(),
        }
    }
}

pub struct Lowerer<'a> {
    next_alias: usize,
    user_vars: &'a UserVars,
    #[allow(dead_code)]
    options: &'a CompileOptions,
}

impl<'a> Lowerer<'a> {
    pub fn new(user_vars: &'a UserVars, options: &'a CompileOptions) -> Self {
        Self {
            next_alias: 0,
            user_vars,
            options,
        }
    }

    pub fn fresh_alias(&mut self) -> String {
        let alias = format!("u{}", self.next_alias);
        self.next_alias += 1;
        alias
    }

    pub fn lower(&mut self, node: &Node, ctx: &LowerCtx) -> Result<SqlFragment> {
        let resolved = node.resolved.as_ref().ok_or_else(|| {
            CompileError::new(CompileErrorKind::ParseError, "internal error: node lowered before resolution")
        })?;

        match &node.kind {
            NodeKind::Literal(value, _) => Ok(SqlFragment::scalar(literal_sql(value), resolved.physical_type.clone())),
            NodeKind::Identifier(name) => self.lower_field_step(ctx, None, name, resolved),
            NodeKind::ThisRef => {
                let expr = ctx.this_binding.clone().unwrap_or_else(|| ctx.expr.clone());
                Ok(SqlFragment::scalar(expr, resolved.physical_type.clone()))
            }
            NodeKind::Variable(name) => {
                let expr = match self.user_vars.get(name) {
                    Some(lit) => lit.to_sql(),
                    None => "NULL".to_string(),
                };
                Ok(SqlFragment::scalar(expr, resolved.physical_type.clone()))
            }
            NodeKind::Indexer { receiver, index } => self.lower_indexer(receiver, index, ctx, resolved),
            NodeKind::UnaryOp { op, operand } => {
                let operand_frag = self.lower(operand, ctx)?;
                let expr = match op {
                    UnOp::Neg => format!("(-{})", operand_frag.expr),
                    UnOp::Not => format!("(NOT {})", operand_frag.expr),
                };
                Ok(SqlFragment::scalar(expr, resolved.physical_type.clone()).with_tables(operand_frag.tables))
            }
            NodeKind::BinaryOp { op, lhs, rhs } => self.lower_binary(*op, lhs, rhs, ctx, resolved),
            NodeKind::Invocation { receiver, name, args } => {
                self.lower_invocation(receiver.as_deref(), name, args, ctx, resolved, node)
            }
        }
    }

    /// A plain element-access step (an `Identifier` at the tree root, or an
    /// `Invocation` with no args whose name isn't a recognized builtin).
    fn lower_field_step(
        &mut self,
        ctx: &LowerCtx,
        receiver: Option<&Node>,
        field_name: &str,
        resolved: &crate::types::ResolvedType,
    ) -> Result<SqlFragment> {
        let recv_frag = match receiver {
            Some(r) => self.lower(r, ctx)?,
            None => SqlFragment::scalar(ctx.expr.clone(), DuckType::Unknown).with_tables(vec![]).tap_array(ctx.is_array),
        };
        let mut tables = recv_frag.tables.clone();
        let base = if recv_frag.is_array {
            let alias = self.fresh_alias();
            let deps = tables.iter().map(|t| t.alias.clone()).collect::<Vec<_>>();
            tables.push(LateralTable {
                alias: alias.clone(),
                sql_text: format!("UNNEST({}) AS {}(item)", recv_frag.expr, alias),
                dependencies: deps,
            });
            format!("{alias}.item")
        } else {
            recv_frag.expr.clone()
        };
        let physical_name = resolved.element_ref.clone().unwrap_or_else(|| field_name.to_string());
        let expr = format!("{base}.{physical_name}");
        // `is_array` reflects whether *this* field's own resolved type is a
        // `List` (set per-step in the resolver), not `resolved.cardinality`,
        // which is cumulative over the whole path — a singleton field off an
        // already-unnested collection must not be flagged for another UNNEST.
        Ok(SqlFragment {
            expr,
            tables,
            result_type: resolved.physical_type.clone(),
            is_array: matches!(resolved.physical_type, DuckType::List(_)),
            alias: None,
        })
    }

    fn lower_indexer(&mut self, receiver: &Node, index: &Node, ctx: &LowerCtx, resolved: &crate::types::ResolvedType) -> Result<SqlFragment> {
        let recv_frag = self.lower(receiver, ctx)?;
        let idx_frag = self.lower(index, ctx)?;
        // FHIRPath indices are 0-based; DuckDB lists are 1-based.
        let expr = format!("{}[({}) + 1]", recv_frag.expr, idx_frag.expr);
        let mut tables = recv_frag.tables;
        tables.extend(idx_frag.tables);
        Ok(SqlFragment {
            expr,
            tables,
            result_type: resolved.physical_type.clone(),
            is_array: false,
            alias: None,
        })
    }

    fn lower_binary(&mut self, op: BinOp, lhs: &Node, rhs: &Node, ctx: &LowerCtx, resolved: &crate::types::ResolvedType) -> Result<SqlFragment> {
        let lhs_frag = self.lower(lhs, ctx)?;
        let rhs_frag = self.lower(rhs, ctx)?;
        let expr = match op {
            BinOp::Eq => format!("({} = {})", lhs_frag.expr, rhs_frag.expr),
            BinOp::Ne => format!("({} != {})", lhs_frag.expr, rhs_frag.expr),
            BinOp::Lt => format!("({} < {})", lhs_frag.expr, rhs_frag.expr),
            BinOp::Gt => format!("({} > {})", lhs_frag.expr, rhs_frag.expr),
            BinOp::Le => format!("({} <= {})", lhs_frag.expr, rhs_frag.expr),
            BinOp::Ge => format!("({} >= {})", lhs_frag.expr, rhs_frag.expr),
            BinOp::Add => format!("({} + {})", lhs_frag.expr, rhs_frag.expr),
            BinOp::Sub => format!("({} - {})", lhs_frag.expr, rhs_frag.expr),
            BinOp::Mul => format!("({} * {})", lhs_frag.expr, rhs_frag.expr),
            BinOp::Div => format!("({} / {})", lhs_frag.expr, rhs_frag.expr),
            BinOp::And => format!("({} AND {})", lhs_frag.expr, rhs_frag.expr),
            BinOp::Or => format!("({} OR {})", lhs_frag.expr, rhs_frag.expr),
            BinOp::In => {
                if rhs_frag.is_array {
                    format!("(list_contains({}, {}))", rhs_frag.expr, lhs_frag.expr)
                } else {
                    format!("({} = {})", lhs_frag.expr, rhs_frag.expr)
                }
            }
        };
        let mut fragment = SqlFragment::scalar(expr, resolved.physical_type.clone());
        fragment.absorb_tables(&lhs_frag);
        fragment.absorb_tables(&rhs_frag);
        Ok(fragment)
    }

    #[allow(clippy::too_many_arguments)]
    fn lower_invocation(
        &mut self,
        receiver: Option<&Node>,
        name: &str,
        args: &[Node],
        ctx: &LowerCtx,
        resolved: &crate::types::ResolvedType,
        node: &Node,
    ) -> Result<SqlFragment> {
        match name {
            "where" => self.lower_where(receiver.unwrap(), &args[0], ctx, resolved),
            "ofType" => self.lower_of_type(receiver.unwrap(), ctx, resolved),
            "exists" => self.lower_predicate_reduction(receiver.unwrap(), ctx, true),
            "empty" => self.lower_predicate_reduction(receiver.unwrap(), ctx, false),
            "hasValue" => {
                let recv = self.lower(receiver.unwrap(), ctx)?;
                Ok(SqlFragment::scalar(format!("({} IS NOT NULL)", recv.expr), DuckType::Boolean).with_tables(recv.tables))
            }
            "not" => {
                let recv = self.lower(receiver.unwrap(), ctx)?;
                Ok(SqlFragment::scalar(format!("(NOT {})", recv.expr), DuckType::Boolean).with_tables(recv.tables))
            }
            "first" | "single" => {
                let recv = self.lower(receiver.unwrap(), ctx)?;
                let expr = if recv.is_array { format!("{}[1]", recv.expr) } else { recv.expr };
                Ok(SqlFragment::scalar(expr, resolved.physical_type.clone()).with_tables(recv.tables))
            }
            "count" => {
                let recv = self.lower(receiver.unwrap(), ctx)?;
                let expr = if recv.is_array {
                    format!("len({})", recv.expr)
                } else {
                    format!("(CASE WHEN {} IS NULL THEN 0 ELSE 1 END)", recv.expr)
                };
                Ok(SqlFragment::scalar(expr, DuckType::BigInt).with_tables(recv.tables))
            }
            "distinct" => {
                let recv = self.lower(receiver.unwrap(), ctx)?;
                Ok(SqlFragment {
                    expr: format!("list_distinct({})", recv.expr),
                    tables: recv.tables,
                    result_type: resolved.physical_type.clone(),
                    is_array: true,
                    alias: None,
                })
            }
            "length" => {
                let recv = self.lower(receiver.unwrap(), ctx)?;
                Ok(SqlFragment::scalar(format!("length({})", recv.expr), DuckType::BigInt).with_tables(recv.tables))
            }
            "toString" => {
                let recv = self.lower(receiver.unwrap(), ctx)?;
                Ok(SqlFragment::scalar(format!("CAST({} AS VARCHAR)", recv.expr), DuckType::Varchar).with_tables(recv.tables))
            }
            "toInteger" => {
                let recv = self.lower(receiver.unwrap(), ctx)?;
                Ok(SqlFragment::scalar(format!("TRY_CAST({} AS BIGINT)", recv.expr), DuckType::BigInt).with_tables(recv.tables))
            }
            "join" => self.lower_join(receiver.unwrap(), args, ctx),
            "substring" => self.lower_substring(receiver.unwrap(), args, ctx),
            "startsWith" => self.lower_string_predicate("starts_with", receiver.unwrap(), args, ctx),
            "endsWith" => self.lower_string_predicate("ends_with", receiver.unwrap(), args, ctx),
            "contains" => self.lower_string_predicate("contains", receiver.unwrap(), args, ctx),
            "matches" => self.lower_string_predicate("regexp_matches", receiver.unwrap(), args, ctx),
            "iif" => self.lower_iif(args, ctx, resolved),
            "extension" => self.lower_extension(receiver.unwrap(), args, ctx, resolved),
            "getResourceKey" => Ok(SqlFragment::scalar(
                format!("({}.resource_type || '/' || {}.id)", ctx.root_alias, ctx.root_alias),
                DuckType::Varchar,
            )),
            "getReferenceKey" => self.lower_get_reference_key(receiver.unwrap(), args, ctx),
            "_forEach" | "_forEachOrNull" => self.lower_for_each(receiver, args, ctx, resolved, name == "_forEachOrNull"),
            "_unionAll" => self.lower_union_all(args, ctx, resolved),
            "_splitPath" => self.lower_split_path(receiver.unwrap(), args, ctx),
            "_invoke" => self.lower_invoke(receiver, args, ctx),
            "_col" | "_col_collection" => Err(CompileError::new(
                CompileErrorKind::UnsupportedFeature,
                format!("`{name}` may only appear as a direct argument of `_forEach`/`_forEachOrNull`"),
            )),
            _ if args.is_empty() => self.lower_field_step(ctx, receiver, name, resolved),
            _ => Err(CompileError::at_offset(
                CompileErrorKind::UnsupportedFeature,
                format!("unsupported function `{name}`"),
                "",
                node.position,
            )),
        }
    }

    fn lower_where(&mut self, receiver: &Node, pred: &Node, ctx: &LowerCtx, resolved: &crate::types::ResolvedType) -> Result<SqlFragment> {
        let recv = self.lower(receiver, ctx)?;
        if recv.is_array {
            let alias = self.fresh_alias();
            let item_ctx = ctx.with_focus(format!("{alias}.item"), false);
            let pred_frag = self.lower(pred, &item_ctx)?;
            let expr = format!(
                "(SELECT * FROM UNNEST({}) AS {}(item) WHERE {})",
                recv.expr, alias, pred_frag.expr
            );
            Ok(SqlFragment {
                expr,
                tables: recv.tables,
                result_type: resolved.physical_type.clone(),
                is_array: true,
                alias: None,
            })
        } else {
            let item_ctx = ctx.with_focus(recv.expr.clone(), false);
            let pred_frag = self.lower(pred, &item_ctx)?;
            let expr = format!("(CASE WHEN {} THEN {} ELSE NULL END)", pred_frag.expr, recv.expr);
            let mut fragment = SqlFragment::scalar(expr, resolved.physical_type.clone());
            fragment.absorb_tables(&recv);
            fragment.absorb_tables(&pred_frag);
            Ok(fragment)
        }
    }

    /// `receiver.ofType(T)`: re-derives the physical choice column
    /// (`{group}{T}`) against the struct the choice group lives in, rather
    /// than naively lowering the bare group access (which has no physical
    /// column of its own — see `schema::resolve_choice`). `receiver` is the
    /// group accessor node (e.g. `value` in `value.ofType(Quantity)`); its
    /// own receiver is the struct we dot into with the resolved physical name.
    fn lower_of_type(&mut self, receiver: &Node, ctx: &LowerCtx, resolved: &crate::types::ResolvedType) -> Result<SqlFragment> {
        let Some(physical_name) = resolved.element_ref.clone() else {
            return Err(CompileError::new(CompileErrorKind::InvalidChoice, "ofType() target has no resolvable physical column"));
        };
        let parent = match &receiver.kind {
            NodeKind::Invocation { receiver: Some(r), .. } => Some(r.as_ref()),
            _ => None,
        };
        self.lower_field_step(ctx, parent, &physical_name, resolved)
    }

    fn lower_predicate_reduction(&mut self, receiver: &Node, ctx: &LowerCtx, want_exists: bool) -> Result<SqlFragment> {
        let recv = self.lower(receiver, ctx)?;
        let expr = if recv.is_array {
            if want_exists {
                format!("(len({}) > 0)", recv.expr)
            } else {
                format!("(len({}) = 0)", recv.expr)
            }
        } else if want_exists {
            format!("({} IS NOT NULL)", recv.expr)
        } else {
            format!("({} IS NULL)", recv.expr)
        };
        Ok(SqlFragment::scalar(expr, DuckType::Boolean).with_tables(recv.tables))
    }

    fn lower_join(&mut self, receiver: &Node, args: &[Node], ctx: &LowerCtx) -> Result<SqlFragment> {
        let recv = self.lower(receiver, ctx)?;
        let sep = match args.first() {
            Some(arg) => self.lower(arg, ctx)?.expr,
            None => "''".to_string(),
        };
        let expr = format!("list_aggregate({}, 'string_agg', {})", recv.expr, sep);
        Ok(SqlFragment::scalar(expr, DuckType::Varchar).with_tables(recv.tables))
    }

    fn lower_substring(&mut self, receiver: &Node, args: &[Node], ctx: &LowerCtx) -> Result<SqlFragment> {
        let recv = self.lower(receiver, ctx)?;
        let start = self.lower(&args[0], ctx)?.expr;
        let expr = match args.get(1) {
            Some(len_arg) => {
                let len = self.lower(len_arg, ctx)?.expr;
                format!("substring({}, ({}) + 1, {})", recv.expr, start, len)
            }
            None => format!("substring({}, ({}) + 1)", recv.expr, start),
        };
        Ok(SqlFragment::scalar(expr, DuckType::Varchar).with_tables(recv.tables))
    }

    fn lower_string_predicate(&mut self, sql_fn: &str, receiver: &Node, args: &[Node], ctx: &LowerCtx) -> Result<SqlFragment> {
        let recv = self.lower(receiver, ctx)?;
        let arg = self.lower(&args[0], ctx)?;
        let expr = format!("{sql_fn}({}, {})", recv.expr, arg.expr);
        let mut fragment = SqlFragment::scalar(expr, DuckType::Boolean);
        fragment.absorb_tables(&recv);
        fragment.absorb_tables(&arg);
        Ok(fragment)
    }

    fn lower_iif(&mut self, args: &[Node], ctx: &LowerCtx, resolved: &crate::types::ResolvedType) -> Result<SqlFragment> {
        let cond = self.lower(&args[0], ctx)?;
        let then_ = self.lower(&args[1], ctx)?;
        let else_ = self.lower(&args[2], ctx)?;
        let expr = format!("(CASE WHEN {} THEN {} ELSE {} END)", cond.expr, then_.expr, else_.expr);
        let mut fragment = SqlFragment::scalar(expr, resolved.physical_type.clone());
        fragment.absorb_tables(&cond);
        fragment.absorb_tables(&then_);
        fragment.absorb_tables(&else_);
        Ok(fragment)
    }

    fn lower_extension(&mut self, receiver: &Node, args: &[Node], ctx: &LowerCtx, resolved: &crate::types::ResolvedType) -> Result<SqlFragment> {
        let recv = self.lower(receiver, ctx)?;
        let url = self.lower(&args[0], ctx)?;
        let alias = self.fresh_alias();
        let expr = format!(
            "(SELECT * FROM UNNEST({}.extension) AS {}(item) WHERE {}.item.url = {})",
            recv.expr, alias, alias, url.expr
        );
        Ok(SqlFragment {
            expr,
            tables: recv.tables,
            result_type: resolved.physical_type.clone(),
            is_array: false,
            alias: None,
        })
    }

    fn lower_get_reference_key(&mut self, receiver: &Node, args: &[Node], ctx: &LowerCtx) -> Result<SqlFragment> {
        let recv = self.lower(receiver, ctx)?;
        let reference_expr = format!("{}.reference", recv.expr);
        let expr = match args.first() {
            Some(arg) => {
                let rt = self.lower(arg, ctx)?;
                format!(
                    "(CASE WHEN starts_with({reference_expr}, {rt} || '/') THEN string_split({reference_expr}, '/')[2] ELSE NULL END)",
                    rt = rt.expr
                )
            }
            None => format!("string_split({reference_expr}, '/')[2]"),
        };
        Ok(SqlFragment::scalar(expr, DuckType::Varchar).with_tables(recv.tables))
    }

    fn lower_for_each(
        &mut self,
        receiver: Option<&Node>,
        args: &[Node],
        ctx: &LowerCtx,
        resolved: &crate::types::ResolvedType,
        or_null: bool,
    ) -> Result<SqlFragment> {
        let recv = match receiver {
            Some(r) => self.lower(r, ctx)?,
            None => SqlFragment::scalar(ctx.expr.clone(), DuckType::Unknown).tap_array(ctx.is_array),
        };

        if recv.is_array {
            let alias = self.fresh_alias();
            let item_ctx = ctx.with_focus(format!("{alias}.item"), false);
            let fields = self.lower_col_fields(args, &item_ctx)?;
            let struct_expr = format!("struct_pack({})", fields.join(", "));
            let source_expr = if or_null {
                format!("COALESCE({}, [NULL])", recv.expr)
            } else {
                recv.expr.clone()
            };
            let expr = format!("(SELECT list({struct_expr}) FROM UNNEST({source_expr}) AS {alias}(item))");
            Ok(SqlFragment {
                expr,
                tables: recv.tables,
                result_type: resolved.physical_type.clone(),
                is_array: true,
                alias: None,
            })
        } else {
            let item_ctx = ctx.with_focus(recv.expr.clone(), false);
            let fields = self.lower_col_fields(args, &item_ctx)?;
            let expr = format!("struct_pack({})", fields.join(", "));
            Ok(SqlFragment {
                expr,
                tables: recv.tables,
                result_type: resolved.physical_type.clone(),
                is_array: false,
                alias: None,
            })
        }
    }

    fn lower_col_fields(&mut self, args: &[Node], item_ctx: &LowerCtx) -> Result<Vec<String>> {
        let mut fields = Vec::with_capacity(args.len());
        for arg in args {
            let NodeKind::Invocation { name: col_name, args: col_args, .. } = &arg.kind else {
                return Err(CompileError::new(CompileErrorKind::ParseError, "_forEach argument is not a _col(...) call"));
            };
            let field_name = match &col_args[0].kind {
                NodeKind::Literal(LiteralValue::String(s), _) => s.clone(),
                _ => return Err(CompileError::new(CompileErrorKind::ParseError, "_col name must be a string literal")),
            };
            let inner_resolved = col_args[1].resolved.as_ref().expect("inner _col expr resolved");
            let inner_frag = self.lower(&col_args[1], item_ctx)?;
            let value_expr = if col_name == "_col" && inner_resolved.cardinality.is_collection() {
                format!(
                    "(CASE WHEN len({e}) > 1 THEN error('_col: multi-item collection for field {field_name}') ELSE {e}[1] END)",
                    e = inner_frag.expr
                )
            } else {
                inner_frag.expr
            };
            fields.push(format!("{field_name} := {value_expr}"));
        }
        Ok(fields)
    }

    fn lower_union_all(&mut self, args: &[Node], ctx: &LowerCtx, resolved: &crate::types::ResolvedType) -> Result<SqlFragment> {
        let mut tables = Vec::new();
        let mut parts = Vec::with_capacity(args.len());
        for arg in args {
            let frag = self.lower(arg, ctx)?;
            let wrapped = if frag.is_array {
                format!("coalesce({}, [])", frag.expr)
            } else {
                format!("(CASE WHEN {0} IS NULL THEN [] ELSE [{0}] END)", frag.expr)
            };
            parts.push(wrapped);
            tables.extend(frag.tables);
        }
        let expr = parts
            .into_iter()
            .reduce(|acc, part| format!("list_concat({acc}, {part})"))
            .unwrap_or_else(|| "[]".to_string());
        Ok(SqlFragment {
            expr,
            tables,
            result_type: resolved.physical_type.clone(),
            is_array: true,
            alias: None,
        })
    }

    fn lower_split_path(&mut self, receiver: &Node, args: &[Node], ctx: &LowerCtx) -> Result<SqlFragment> {
        let recv = self.lower(receiver, ctx)?;
        let idx = self.lower(&args[0], ctx)?.expr;
        let resolve_idx = |split_expr: &str| -> String {
            format!(
                "(CASE WHEN ({idx}) >= 0 THEN ({idx}) + 1 ELSE list_length({split_expr}) + ({idx}) + 1 END)"
            )
        };
        let expr = if recv.is_array {
            let split = "string_split(s, '/')".to_string();
            let idx_sql = resolve_idx(&split);
            format!("list_transform({}, s -> {}[{}])", recv.expr, split, idx_sql)
        } else {
            let split = format!("string_split({}, '/')", recv.expr);
            let idx_sql = resolve_idx(&split);
            format!("{split}[{idx_sql}]")
        };
        Ok(SqlFragment {
            expr,
            tables: recv.tables,
            result_type: DuckType::Varchar,
            is_array: recv.is_array,
            alias: None,
        })
    }

    fn lower_invoke(&mut self, receiver: Option<&Node>, args: &[Node], ctx: &LowerCtx) -> Result<SqlFragment> {
        let fn_name = match &args[0].kind {
            NodeKind::Literal(LiteralValue::String(s), _) => s.clone(),
            _ => return Err(CompileError::new(CompileErrorKind::InvokeParamNotLiteral, "_invoke function name must be a string literal")),
        };
        let mut literal_args = Vec::new();
        for arg in &args[1..] {
            literal_args.push(self.lower(arg, ctx)?.expr);
        }
        let joined_args = literal_args.join(", ");
        match receiver {
            Some(r) => {
                let recv = self.lower(r, ctx)?;
                let expr = if recv.is_array {
                    let extra = if joined_args.is_empty() { String::new() } else { format!(", {joined_args}") };
                    format!("list_transform({}, v -> {}(v{}))", recv.expr, fn_name, extra)
                } else {
                    let extra = if joined_args.is_empty() { String::new() } else { format!(", {joined_args}") };
                    format!("{}({}{})", fn_name, recv.expr, extra)
                };
                Ok(SqlFragment {
                    expr,
                    tables: recv.tables,
                    result_type: DuckType::Unknown,
                    is_array: recv.is_array,
                    alias: None,
                })
            }
            None => Ok(SqlFragment::scalar(format!("{fn_name}({joined_args})"), DuckType::Unknown)),
        }
    }
}

trait TapArray {
    fn tap_array(self, is_array: bool) -> Self;
}

impl TapArray for SqlFragment {
    fn tap_array(mut self, is_array: bool) -> Self {
        self.is_array = is_array;
        self
    }
}

fn literal_sql(value: &LiteralValue) -> String {
    match value {
        LiteralValue::String(s) => format!("'{}'", s.replace('\'', "''")),
        LiteralValue::Integer(i) => i.to_string(),
        LiteralValue::Decimal(d) => format!("{d}"),
        LiteralValue::Boolean(b) => b.to_string().to_uppercase(),
        LiteralValue::Null => "NULL".to_string(),
    }
}
