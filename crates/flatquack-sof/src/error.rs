//! Compiler diagnostics.
//!
//! Every pipeline stage returns `Result<T, CompileError>`; the first error
//! short-circuits compilation, matching the failure semantics in spec.md §4.5
//! and §7 (no partial SQL is ever returned).

use std::fmt;

use thiserror::Error;

/// Where a [`CompileError`] originated: inside a FHIRPath expression string,
/// or at a particular position in the ViewDefinition document structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// An offset into a specific FHIRPath expression.
    Expression { text: String, offset: usize },
    /// A JSON-pointer-ish path into the ViewDefinition (e.g. `select[0].column[1].path`).
    ViewPath(String),
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Expression { text, offset } => write!(f, "`{text}` at offset {offset}"),
            Location::ViewPath(path) => write!(f, "{path}"),
        }
    }
}

/// The taxonomy of compile-time failures from spec.md §6.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileErrorKind {
    ParseError,
    UnknownElement,
    InvalidChoice,
    CardinalityMismatch,
    InvokeParamNotLiteral,
    UnsupportedFeature,
    ExpressionTooDeep,
    InvalidViewDefinition,
}

impl fmt::Display for CompileErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ParseError => "ParseError",
            Self::UnknownElement => "UnknownElement",
            Self::InvalidChoice => "InvalidChoice",
            Self::CardinalityMismatch => "CardinalityMismatch",
            Self::InvokeParamNotLiteral => "InvokeParamNotLiteral",
            Self::UnsupportedFeature => "UnsupportedFeature",
            Self::ExpressionTooDeep => "ExpressionTooDeep",
            Self::InvalidViewDefinition => "InvalidViewDefinition",
        };
        f.write_str(s)
    }
}

/// A compile-time error, carrying a kind, message, optional source location,
/// and an optional hint for the caller.
#[derive(Debug, Error)]
#[error("{kind}: {message}{}", location.as_ref().map(|l| format!(" ({l})")).unwrap_or_default())]
pub struct CompileError {
    pub kind: CompileErrorKind,
    pub message: String,
    pub location: Option<Location>,
    pub hint: Option<String>,
}

impl CompileError {
    pub fn new(kind: CompileErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            location: None,
            hint: None,
        }
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn at_offset(kind: CompileErrorKind, message: impl Into<String>, text: &str, offset: usize) -> Self {
        Self::new(kind, message).with_location(Location::Expression {
            text: text.to_string(),
            offset,
        })
    }

    pub fn at_view_path(kind: CompileErrorKind, message: impl Into<String>, view_path: impl Into<String>) -> Self {
        Self::new(kind, message).with_location(Location::ViewPath(view_path.into()))
    }

    /// Fill in the source text of an `Expression` location that was recorded
    /// with only an offset (the resolver walks annotated AST nodes, not raw
    /// strings, so it cannot supply this itself). Callers that own the
    /// original FHIRPath text call this once an error escapes a stage.
    pub fn with_expr_text(mut self, text: &str) -> Self {
        if let Some(Location::Expression { text: existing, .. }) = &mut self.location {
            if existing.is_empty() {
                *existing = text.to_string();
            }
        }
        self
    }
}

/// JSON parsing failures (malformed ViewDefinition/schema documents) fold
/// into the same taxonomy via `#[from]`, same as any other external failure.
impl From<serde_json::Error> for CompileError {
    fn from(e: serde_json::Error) -> Self {
        CompileError::new(CompileErrorKind::InvalidViewDefinition, e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CompileError>;
