//! FHIR/SQL type machinery shared by the resolver and lowerer (spec.md §3).

use indexmap::IndexMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    Singleton,
    Collection,
}

impl Cardinality {
    /// `singleton . collection = collection`; once collection, stays collection
    /// (spec.md §4.2 "Cardinality propagation").
    pub fn chain(self, next: Cardinality) -> Cardinality {
        if self == Cardinality::Collection || next == Cardinality::Collection {
            Cardinality::Collection
        } else {
            Cardinality::Singleton
        }
    }

    pub fn is_collection(self) -> bool {
        matches!(self, Cardinality::Collection)
    }
}

/// The physical DuckDB type assigned to a resolved expression.
#[derive(Debug, Clone, PartialEq)]
pub enum DuckType {
    Varchar,
    Integer,
    BigInt,
    Decimal,
    Boolean,
    Date,
    Timestamp,
    Struct(IndexMap<String, DuckType>),
    List(Box<DuckType>),
    Unknown,
}

impl DuckType {
    /// Render the DuckDB type name used in cast expressions and reduced
    /// schema `STRUCT(...)` rendering (spec.md §4.4).
    pub fn sql_name(&self) -> String {
        match self {
            DuckType::Varchar => "VARCHAR".to_string(),
            DuckType::Integer => "INTEGER".to_string(),
            DuckType::BigInt => "BIGINT".to_string(),
            DuckType::Decimal => "DECIMAL".to_string(),
            DuckType::Boolean => "BOOLEAN".to_string(),
            DuckType::Date => "DATE".to_string(),
            DuckType::Timestamp => "TIMESTAMP".to_string(),
            DuckType::Struct(fields) => {
                let inner = fields
                    .iter()
                    .map(|(name, ty)| format!("{name} {}", ty.sql_name()))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("STRUCT({inner})")
            }
            DuckType::List(inner) => format!("{}[]", inner.sql_name()),
            DuckType::Unknown => "UNKNOWN".to_string(),
        }
    }

    /// Map a FHIR primitive type name to its DuckDB physical type
    /// (spec.md §8 S6 requires `valueDecimal` to resolve to `DECIMAL`, never
    /// a float, so numeric precision survives the round trip).
    pub fn from_fhir_primitive(fhir_type: &str) -> DuckType {
        match fhir_type {
            "string" | "code" | "uri" | "url" | "canonical" | "id" | "oid" | "uuid" | "markdown"
            | "base64Binary" | "xhtml" => DuckType::Varchar,
            "integer" | "positiveInt" | "unsignedInt" => DuckType::Integer,
            "integer64" => DuckType::BigInt,
            "decimal" => DuckType::Decimal,
            "boolean" => DuckType::Boolean,
            "date" => DuckType::Date,
            "dateTime" | "instant" | "time" => DuckType::Timestamp,
            _ => DuckType::Unknown,
        }
    }
}

/// The full annotation stage 2 attaches to every AST node (spec.md §3).
#[derive(Debug, Clone)]
pub struct ResolvedType {
    pub fhir_type: String,
    pub cardinality: Cardinality,
    pub physical_type: DuckType,
    pub nullable: bool,
    /// Name of the concrete schema element this node resolved against, if any
    /// (absent for literals, `$this`, and `%variables`).
    pub element_ref: Option<String>,
}

impl ResolvedType {
    pub fn singleton(fhir_type: impl Into<String>, physical_type: DuckType) -> Self {
        Self {
            fhir_type: fhir_type.into(),
            cardinality: Cardinality::Singleton,
            physical_type,
            nullable: true,
            element_ref: None,
        }
    }

    pub fn collection(fhir_type: impl Into<String>, physical_type: DuckType) -> Self {
        Self {
            fhir_type: fhir_type.into(),
            cardinality: Cardinality::Collection,
            physical_type,
            nullable: true,
            element_ref: None,
        }
    }

    pub fn with_element_ref(mut self, element_ref: impl Into<String>) -> Self {
        self.element_ref = Some(element_ref.into());
        self
    }

    pub fn is_collection(&self) -> bool {
        self.cardinality.is_collection()
    }
}
