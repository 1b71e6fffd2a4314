//! Stage 2: schema-driven resolution (spec.md §4.2).
//!
//! A bottom-up walk threading a *context type* — the FHIR type and
//! cardinality of the current focus — through the tree. At the root the
//! focus is the ViewDefinition's resource.

use std::cell::RefCell;
use std::collections::HashSet;

use crate::ast::{BinOp, LiteralValue, Node, NodeKind, ScalarType, UnOp};
use crate::error::{CompileError, CompileErrorKind, Result};
use crate::schema::FhirSchema;
use crate::types::{Cardinality, DuckType, ResolvedType};
use crate::vars::UserVars;

/// The focus type threaded through resolution: what `$this` and bare
/// identifier steps resolve against at a given point in the tree.
#[derive(Debug, Clone)]
pub struct Focus {
    pub fhir_type: String,
    pub cardinality: Cardinality,
    pub physical_type: DuckType,
}

impl Focus {
    pub fn root(resource: &str) -> Self {
        Self {
            fhir_type: resource.to_string(),
            cardinality: Cardinality::Singleton,
            physical_type: DuckType::Unknown,
        }
    }

    fn element(resolved: &ResolvedType, cardinality: Cardinality) -> Self {
        Self {
            fhir_type: resolved.fhir_type.clone(),
            cardinality,
            physical_type: resolved.physical_type.clone(),
        }
    }
}

const ZERO_ARG_BUILTINS: &[&str] = &[
    "exists", "empty", "first", "single", "count", "hasValue", "distinct", "not", "length",
    "toString", "toInteger", "getResourceKey",
];

pub struct Resolver<'a> {
    pub schema: &'a FhirSchema,
    pub user_vars: &'a UserVars,
    /// `(type, element)` pairs actually reached through a successful schema
    /// lookup, across every path resolved so far. Feeds the assembler's
    /// reduced input-schema construction (SPEC_FULL.md §F).
    touched: RefCell<HashSet<(String, String)>>,
}

impl<'a> Resolver<'a> {
    pub fn new(schema: &'a FhirSchema, user_vars: &'a UserVars) -> Self {
        Self {
            schema,
            user_vars,
            touched: RefCell::new(HashSet::new()),
        }
    }

    pub fn touched_elements(&self) -> HashSet<(String, String)> {
        self.touched.borrow().clone()
    }

    pub fn resolve(&self, node: &mut Node, focus: &Focus) -> Result<ResolvedType> {
        let resolved = self.resolve_kind(node, focus)?;
        node.resolved = Some(resolved.clone());
        Ok(resolved)
    }

    fn resolve_kind(&self, node: &mut Node, focus: &Focus) -> Result<ResolvedType> {
        match &mut node.kind {
            NodeKind::Literal(value, scalar_type) => Ok(self.resolve_literal(value, *scalar_type)),
            NodeKind::Identifier(name) => self.resolve_identifier(name, focus, node.position),
            NodeKind::ThisRef => Ok(ResolvedType {
                fhir_type: focus.fhir_type.clone(),
                cardinality: Cardinality::Singleton,
                physical_type: focus.physical_type.clone(),
                nullable: true,
                element_ref: None,
            }),
            NodeKind::Variable(name) => Ok(self.resolve_variable(name)),
            NodeKind::Indexer { receiver, index } => {
                let recv_type = self.resolve(receiver, focus)?;
                let idx_focus = Focus::root("integer");
                self.resolve(index, &idx_focus)?;
                Ok(ResolvedType {
                    fhir_type: recv_type.fhir_type,
                    cardinality: Cardinality::Singleton,
                    physical_type: recv_type.physical_type,
                    nullable: true,
                    element_ref: recv_type.element_ref,
                })
            }
            NodeKind::UnaryOp { op, operand } => {
                let operand_type = self.resolve(operand, focus)?;
                match op {
                    UnOp::Not => Ok(ResolvedType::singleton("boolean", DuckType::Boolean)),
                    UnOp::Neg => Ok(operand_type),
                }
            }
            NodeKind::BinaryOp { op, lhs, rhs } => {
                let lhs_type = self.resolve(lhs, focus)?;
                let rhs_type = self.resolve(rhs, focus)?;
                Ok(self.resolve_binary(*op, &lhs_type, &rhs_type))
            }
            NodeKind::Invocation { receiver, name, args } => {
                self.resolve_invocation(receiver.as_deref_mut(), name, args, focus, node.position)
            }
        }
    }

    fn resolve_literal(&self, value: &LiteralValue, scalar_type: ScalarType) -> ResolvedType {
        let _ = value;
        let (fhir_type, physical) = match scalar_type {
            ScalarType::String => ("string", DuckType::Varchar),
            ScalarType::Integer => ("integer", DuckType::BigInt),
            ScalarType::Decimal => ("decimal", DuckType::Decimal),
            ScalarType::Boolean => ("boolean", DuckType::Boolean),
            ScalarType::Null => ("null", DuckType::Unknown),
        };
        ResolvedType::singleton(fhir_type, physical)
    }

    fn resolve_variable(&self, name: &str) -> ResolvedType {
        match self.user_vars.get(name) {
            Some(lit) => ResolvedType::singleton(lit.fhir_type(), lit.physical_type()),
            None => ResolvedType::singleton("unknown", DuckType::Unknown),
        }
    }

    fn resolve_identifier(&self, name: &str, focus: &Focus, position: usize) -> Result<ResolvedType> {
        if let Some(el) = self.schema.element(&focus.fhir_type, name) {
            let element_cardinality = if el.is_collection() {
                Cardinality::Collection
            } else {
                Cardinality::Singleton
            };
            let cardinality = focus.cardinality.chain(element_cardinality);
            self.touched.borrow_mut().insert((focus.fhir_type.clone(), name.to_string()));
            if el.types.len() == 1 {
                let fhir_type = el.types[0].clone();
                let scalar = DuckType::from_fhir_primitive(&fhir_type);
                // `physical_type` reflects only *this* element's own
                // array-ness, not the cumulative `cardinality` chained from
                // ancestors — a collection-typed field off an
                // already-unnested receiver still wraps in `List` here, so a
                // later step can tell "my own value is an array" apart from
                // "somewhere up the chain there was an array".
                let physical = if el.is_collection() { DuckType::List(Box::new(scalar)) } else { scalar };
                return Ok(ResolvedType {
                    fhir_type,
                    cardinality,
                    physical_type: physical,
                    nullable: true,
                    element_ref: Some(name.to_string()),
                });
            }
            // Bare access to a choice group's name with no type suffix: only
            // `ofType()` can narrow it further.
            let physical = if el.is_collection() { DuckType::List(Box::new(DuckType::Unknown)) } else { DuckType::Unknown };
            return Ok(ResolvedType {
                fhir_type: format!("{name}[x]"),
                cardinality,
                physical_type: physical,
                nullable: true,
                element_ref: Some(name.to_string()),
            });
        }

        // Polymorphic value[x] expansion (spec.md §4.2, generalized per
        // SPEC_FULL.md §F to any choice-group prefix, not only "value").
        if let Some(choice) = self.schema.resolve_choice(&focus.fhir_type, name) {
            self.touched
                .borrow_mut()
                .insert((focus.fhir_type.clone(), choice.physical_name.clone()));
            let physical = DuckType::from_fhir_primitive(&choice.fhir_type);
            return Ok(ResolvedType {
                fhir_type: choice.fhir_type,
                cardinality: focus.cardinality,
                physical_type: physical,
                nullable: true,
                element_ref: Some(choice.physical_name),
            });
        }

        Err(CompileError::at_offset(
            CompileErrorKind::UnknownElement,
            format!("unknown element `{name}` on type `{}`", focus.fhir_type),
            "",
            position,
        ))
    }

    fn resolve_binary(&self, op: BinOp, lhs: &ResolvedType, rhs: &ResolvedType) -> ResolvedType {
        let cardinality = lhs.cardinality.chain(rhs.cardinality);
        match op {
            BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Gt | BinOp::Le | BinOp::Ge | BinOp::And | BinOp::Or | BinOp::In => {
                ResolvedType {
                    fhir_type: "boolean".to_string(),
                    cardinality,
                    physical_type: DuckType::Boolean,
                    nullable: true,
                    element_ref: None,
                }
            }
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div => {
                let physical = if lhs.physical_type == DuckType::Decimal || rhs.physical_type == DuckType::Decimal {
                    DuckType::Decimal
                } else if lhs.physical_type == DuckType::Varchar || rhs.physical_type == DuckType::Varchar {
                    DuckType::Varchar
                } else {
                    lhs.physical_type.clone()
                };
                ResolvedType {
                    fhir_type: lhs.fhir_type.clone(),
                    cardinality,
                    physical_type: physical,
                    nullable: true,
                    element_ref: None,
                }
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn resolve_invocation(
        &self,
        receiver: Option<&mut Node>,
        name: &str,
        args: &mut [Node],
        focus: &Focus,
        position: usize,
    ) -> Result<ResolvedType> {
        match name {
            "_forEach" | "_forEachOrNull" => self.resolve_for_each(receiver, args, focus, position),
            "_col" => self.resolve_col(args, focus, Cardinality::Singleton, position),
            "_col_collection" => self.resolve_col(args, focus, Cardinality::Collection, position),
            "_unionAll" => self.resolve_union_all(args, focus, position),
            "_splitPath" => self.resolve_split_path(receiver, args, focus, position),
            "_invoke" => self.resolve_invoke(receiver, args, focus, position),
            "where" => self.resolve_where(receiver, args, focus, position),
            "ofType" => self.resolve_of_type(receiver, args, focus, position),
            "extension" => self.resolve_extension(receiver, args, focus, position),
            "getReferenceKey" => self.resolve_get_reference_key(receiver, args, focus, position),
            "iif" => self.resolve_iif(args, focus, position),
            "join" | "substring" | "startsWith" | "endsWith" | "contains" | "matches" => {
                self.resolve_string_fn(name, receiver, args, focus, position)
            }
            _ if ZERO_ARG_BUILTINS.contains(&name) => self.resolve_zero_arg_builtin(name, receiver, args, focus, position),
            _ => {
                // Not a recognized builtin/extension: this is a plain field
                // access step, dispatched against the receiver's focus.
                let Some(receiver) = receiver else {
                    return Err(CompileError::at_offset(
                        CompileErrorKind::ParseError,
                        format!("`{name}` requires a receiver"),
                        "",
                        position,
                    ));
                };
                if !args.is_empty() {
                    return Err(CompileError::at_offset(
                        CompileErrorKind::UnsupportedFeature,
                        format!("unknown function `{name}`"),
                        "",
                        position,
                    ));
                }
                let recv_type = self.resolve(receiver, focus)?;
                let sub_focus = Focus::element(&recv_type, Cardinality::Singleton);
                self.resolve_identifier(name, &sub_focus, position).map(|r| ResolvedType {
                    cardinality: recv_type.cardinality.chain(r.cardinality),
                    ..r
                })
            }
        }
    }

    fn require_receiver<'n>(&self, receiver: Option<&'n mut Node>, fn_name: &str, position: usize) -> Result<&'n mut Node> {
        receiver.ok_or_else(|| {
            CompileError::at_offset(
                CompileErrorKind::ParseError,
                format!("`{fn_name}` requires a receiver"),
                "",
                position,
            )
        })
    }

    fn resolve_where(&self, receiver: Option<&mut Node>, args: &mut [Node], focus: &Focus, position: usize) -> Result<ResolvedType> {
        let receiver = self.require_receiver(receiver, "where", position)?;
        let recv_type = self.resolve(receiver, focus)?;
        if args.len() != 1 {
            return Err(CompileError::at_offset(CompileErrorKind::ParseError, "where() takes exactly one predicate", "", position));
        }
        let pred_focus = Focus::element(&recv_type, Cardinality::Singleton);
        let pred_type = self.resolve(&mut args[0], &pred_focus)?;
        if pred_type.physical_type != DuckType::Boolean && pred_type.physical_type != DuckType::Unknown {
            return Err(CompileError::at_offset(
                CompileErrorKind::CardinalityMismatch,
                "where() predicate must resolve to boolean",
                "",
                position,
            ));
        }
        Ok(recv_type)
    }

    /// `group.ofType(T)`: `group` itself resolved to the bare choice-group
    /// name with no physical column (see `resolve_identifier`'s multi-type
    /// branch); combine it with `T` here to get the one that actually exists
    /// on the schema, e.g. `value` + `Decimal` -> `valueDecimal`.
    fn resolve_of_type(&self, receiver: Option<&mut Node>, args: &mut [Node], focus: &Focus, position: usize) -> Result<ResolvedType> {
        let receiver = self.require_receiver(receiver, "ofType", position)?;
        let recv_type = self.resolve(receiver, focus)?;
        let Some(type_name) = args.first().and_then(type_name_of) else {
            return Err(CompileError::at_offset(CompileErrorKind::ParseError, "ofType() requires a type name argument", "", position));
        };
        let Some(group_name) = &recv_type.element_ref else {
            return Err(CompileError::at_offset(
                CompileErrorKind::InvalidChoice,
                "ofType() receiver is not a choice element",
                "",
                position,
            ));
        };
        let candidate = format!("{group_name}{}", capitalize_type(&type_name));
        let choice = self.schema.resolve_choice(&focus.fhir_type, &candidate).ok_or_else(|| {
            CompileError::at_offset(
                CompileErrorKind::InvalidChoice,
                format!("`{candidate}` is not a declared choice of `{group_name}` on `{}`", focus.fhir_type),
                "",
                position,
            )
        })?;
        self.touched.borrow_mut().insert((focus.fhir_type.clone(), choice.physical_name.clone()));
        Ok(ResolvedType {
            fhir_type: choice.fhir_type,
            cardinality: recv_type.cardinality,
            physical_type: DuckType::from_fhir_primitive(&type_name),
            nullable: true,
            element_ref: Some(choice.physical_name),
        })
    }

    /// `receiver.extension(url)`: narrows to the single extension matching
    /// `url` (spec.md §3's extension accessor), not the whole `.extension`
    /// array — chained `.extension(a).extension(b)` keeps narrowing a
    /// singleton, matching `lower_extension`'s scalar-subquery lowering.
    fn resolve_extension(&self, receiver: Option<&mut Node>, args: &mut [Node], focus: &Focus, position: usize) -> Result<ResolvedType> {
        let receiver = self.require_receiver(receiver, "extension", position)?;
        self.resolve(receiver, focus)?;
        if args.len() != 1 {
            return Err(CompileError::at_offset(CompileErrorKind::ParseError, "extension() takes exactly one url argument", "", position));
        }
        self.resolve(&mut args[0], focus)?;
        Ok(ResolvedType::singleton("Extension", DuckType::Unknown))
    }

    fn resolve_get_reference_key(&self, receiver: Option<&mut Node>, args: &mut [Node], focus: &Focus, position: usize) -> Result<ResolvedType> {
        let receiver = self.require_receiver(receiver, "getReferenceKey", position)?;
        self.resolve(receiver, focus)?;
        if args.len() > 1 {
            return Err(CompileError::at_offset(CompileErrorKind::ParseError, "getReferenceKey() takes at most one argument", "", position));
        }
        if let Some(arg) = args.first_mut() {
            self.resolve(arg, focus)?;
        }
        Ok(ResolvedType::singleton("string", DuckType::Varchar))
    }

    fn resolve_iif(&self, args: &mut [Node], focus: &Focus, position: usize) -> Result<ResolvedType> {
        if args.len() != 3 {
            return Err(CompileError::at_offset(CompileErrorKind::ParseError, "iif() takes exactly three arguments", "", position));
        }
        self.resolve(&mut args[0], focus)?;
        let then_type = self.resolve(&mut args[1], focus)?;
        self.resolve(&mut args[2], focus)?;
        Ok(ResolvedType {
            cardinality: Cardinality::Singleton,
            ..then_type
        })
    }

    fn resolve_string_fn(&self, name: &str, receiver: Option<&mut Node>, args: &mut [Node], focus: &Focus, position: usize) -> Result<ResolvedType> {
        let receiver = self.require_receiver(receiver, name, position)?;
        let recv_type = self.resolve(receiver, focus)?;
        for arg in args.iter_mut() {
            self.resolve(arg, focus)?;
        }
        let physical = if name == "startsWith" || name == "endsWith" || name == "contains" || name == "matches" {
            DuckType::Boolean
        } else {
            DuckType::Varchar
        };
        let fhir_type = if physical == DuckType::Boolean { "boolean" } else { "string" };
        Ok(ResolvedType {
            fhir_type: fhir_type.to_string(),
            cardinality: Cardinality::Singleton,
            physical_type: physical,
            nullable: true,
            element_ref: recv_type.element_ref,
        })
    }

    fn resolve_zero_arg_builtin(&self, name: &str, receiver: Option<&mut Node>, args: &mut [Node], focus: &Focus, position: usize) -> Result<ResolvedType> {
        if !args.is_empty() {
            return Err(CompileError::at_offset(CompileErrorKind::ParseError, format!("`{name}()` takes no arguments"), "", position));
        }
        if name == "getResourceKey" {
            return Ok(ResolvedType::singleton("string", DuckType::Varchar));
        }
        let receiver = self.require_receiver(receiver, name, position)?;
        let recv_type = self.resolve(receiver, focus)?;
        Ok(match name {
            "exists" | "empty" | "hasValue" => ResolvedType::singleton("boolean", DuckType::Boolean),
            "not" => ResolvedType::singleton("boolean", DuckType::Boolean),
            "count" => ResolvedType::singleton("integer", DuckType::BigInt),
            "length" => ResolvedType::singleton("integer", DuckType::BigInt),
            "toString" => ResolvedType {
                fhir_type: "string".to_string(),
                cardinality: recv_type.cardinality,
                physical_type: DuckType::Varchar,
                nullable: true,
                element_ref: recv_type.element_ref,
            },
            "toInteger" => ResolvedType {
                fhir_type: "integer".to_string(),
                cardinality: recv_type.cardinality,
                physical_type: DuckType::BigInt,
                nullable: true,
                element_ref: recv_type.element_ref,
            },
            "first" | "single" => ResolvedType {
                cardinality: Cardinality::Singleton,
                ..recv_type
            },
            "distinct" => recv_type,
            _ => unreachable!("builtin `{name}` missing from ZERO_ARG_BUILTINS dispatch"),
        })
    }

    fn resolve_for_each(&self, receiver: Option<&mut Node>, args: &mut [Node], focus: &Focus, position: usize) -> Result<ResolvedType> {
        if args.is_empty() {
            return Err(CompileError::at_offset(CompileErrorKind::ParseError, "_forEach requires at least one _col(...) argument", "", position));
        }
        let (element_focus, outer_cardinality) = match receiver {
            Some(receiver) => {
                let recv_type = self.resolve(receiver, focus)?;
                (Focus::element(&recv_type, Cardinality::Singleton), recv_type.cardinality)
            }
            None => (focus.clone(), Cardinality::Singleton),
        };

        let mut fields = indexmap::IndexMap::new();
        for arg in args.iter_mut() {
            let NodeKind::Invocation { name: col_name, args: col_args, receiver: col_receiver } = &mut arg.kind else {
                return Err(CompileError::at_offset(
                    CompileErrorKind::ParseError,
                    "_forEach arguments must be _col(...) or _col_collection(...)",
                    "",
                    arg.position,
                ));
            };
            if col_receiver.is_some() || (col_name != "_col" && col_name != "_col_collection") {
                return Err(CompileError::at_offset(
                    CompileErrorKind::ParseError,
                    "_forEach arguments must be _col(...) or _col_collection(...)",
                    "",
                    arg.position,
                ));
            }
            let forced = if col_name == "_col" { Cardinality::Singleton } else { Cardinality::Collection };
            let field_type = self.resolve_col(col_args, &element_focus, forced, arg.position)?;
            arg.resolved = Some(field_type.clone());
            let field_name = match col_args.first().map(|n| &n.kind) {
                Some(NodeKind::Literal(LiteralValue::String(s), _)) => s.clone(),
                _ => return Err(CompileError::at_offset(CompileErrorKind::ParseError, "_col name must be a string literal", "", arg.position)),
            };
            fields.insert(field_name, field_type.physical_type);
        }

        let struct_type = DuckType::Struct(fields);
        let physical = if outer_cardinality.is_collection() {
            DuckType::List(Box::new(struct_type))
        } else {
            struct_type
        };
        Ok(ResolvedType {
            fhir_type: "BackboneElement".to_string(),
            cardinality: outer_cardinality,
            physical_type: physical,
            nullable: true,
            element_ref: None,
        })
    }

    fn resolve_col(&self, args: &mut [Node], focus: &Focus, forced_cardinality: Cardinality, position: usize) -> Result<ResolvedType> {
        if args.len() != 2 {
            return Err(CompileError::at_offset(CompileErrorKind::ParseError, "_col/_col_collection take exactly two arguments", "", position));
        }
        if !matches!(args[0].kind, NodeKind::Literal(LiteralValue::String(_), _)) {
            return Err(CompileError::at_offset(CompileErrorKind::ParseError, "the first argument to _col/_col_collection must be a string literal name", "", args[0].position));
        }
        self.resolve(&mut args[0], focus)?;
        let expr_type = self.resolve(&mut args[1], focus)?;
        Ok(ResolvedType {
            cardinality: forced_cardinality,
            ..expr_type
        })
    }

    fn resolve_union_all(&self, args: &mut [Node], focus: &Focus, position: usize) -> Result<ResolvedType> {
        if args.len() < 2 {
            return Err(CompileError::at_offset(CompileErrorKind::ParseError, "_unionAll requires at least two operands", "", position));
        }
        let mut resolved_types = Vec::with_capacity(args.len());
        for arg in args.iter_mut() {
            resolved_types.push(self.resolve(arg, focus)?);
        }
        let first = &resolved_types[0];
        for (i, t) in resolved_types.iter().enumerate().skip(1) {
            let compatible = first.physical_type == DuckType::Unknown
                || t.physical_type == DuckType::Unknown
                || std::mem::discriminant(&first.physical_type) == std::mem::discriminant(&t.physical_type);
            if !compatible {
                return Err(CompileError::at_offset(
                    CompileErrorKind::CardinalityMismatch,
                    format!("_unionAll operand {i} has a type incompatible with operand 0"),
                    "",
                    args[i].position,
                ));
            }
        }
        Ok(ResolvedType {
            fhir_type: first.fhir_type.clone(),
            cardinality: Cardinality::Collection,
            physical_type: first.physical_type.clone(),
            nullable: true,
            element_ref: None,
        })
    }

    fn resolve_split_path(&self, receiver: Option<&mut Node>, args: &mut [Node], focus: &Focus, position: usize) -> Result<ResolvedType> {
        let receiver = self.require_receiver(receiver, "_splitPath", position)?;
        let recv_type = self.resolve(receiver, focus)?;
        if args.len() != 1 {
            return Err(CompileError::at_offset(CompileErrorKind::ParseError, "_splitPath takes exactly one index argument", "", position));
        }
        self.resolve(&mut args[0], focus)?;
        Ok(ResolvedType {
            fhir_type: "string".to_string(),
            cardinality: recv_type.cardinality,
            physical_type: DuckType::Varchar,
            nullable: true,
            element_ref: None,
        })
    }

    fn resolve_invoke(&self, receiver: Option<&mut Node>, args: &mut [Node], focus: &Focus, position: usize) -> Result<ResolvedType> {
        if args.is_empty() {
            return Err(CompileError::at_offset(CompileErrorKind::ParseError, "_invoke requires at least a function name argument", "", position));
        }
        if !matches!(args[0].kind, NodeKind::Literal(LiteralValue::String(_), _)) {
            return Err(CompileError::at_offset(CompileErrorKind::InvokeParamNotLiteral, "the first argument to _invoke must be a string literal function name", "", args[0].position));
        }
        self.resolve(&mut args[0], focus)?;
        for arg in args.iter_mut().skip(1) {
            if !is_scalar_literal(&arg.kind) {
                return Err(CompileError::at_offset(
                    CompileErrorKind::InvokeParamNotLiteral,
                    "_invoke arguments after the function name must be scalar literals",
                    "",
                    arg.position,
                ));
            }
            self.resolve(arg, focus)?;
        }
        let cardinality = match receiver {
            Some(receiver) => self.resolve(receiver, focus)?.cardinality,
            None => Cardinality::Singleton,
        };
        Ok(ResolvedType {
            fhir_type: "_invoke".to_string(),
            cardinality,
            physical_type: DuckType::Unknown,
            nullable: true,
            element_ref: None,
        })
    }
}

fn is_scalar_literal(kind: &NodeKind) -> bool {
    match kind {
        NodeKind::Literal(..) => true,
        NodeKind::UnaryOp { op: UnOp::Neg, operand } => matches!(operand.kind, NodeKind::Literal(LiteralValue::Integer(_) | LiteralValue::Decimal(_), _)),
        _ => false,
    }
}

fn type_name_of(node: &Node) -> Option<String> {
    match &node.kind {
        NodeKind::Identifier(name) => Some(name.clone()),
        _ => None,
    }
}

fn capitalize_type(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
