//! The FHIR structural schema consumed (not produced) by the compiler
//! (spec.md §6: "FHIR schema document").

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{CompileError, CompileErrorKind, Result};

/// One element definition inside a resource/complex-type dictionary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementDef {
    /// The FHIR type(s) this element may hold. More than one entry means
    /// this is a choice element (`value[x]`-style).
    #[serde(rename = "type")]
    pub types: Vec<String>,
    /// `"1"` for a singleton element, `"*"` for a collection.
    pub max: String,
    /// The choice group name this element belongs to, if any (e.g. `"value"`).
    #[serde(default)]
    pub choice: Option<String>,
}

impl ElementDef {
    pub fn is_collection(&self) -> bool {
        self.max == "*"
    }

    pub fn is_choice(&self) -> bool {
        self.types.len() > 1 || self.choice.is_some()
    }
}

/// `{ [resourceOrTypeName]: { [elementName]: ElementDef } }`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FhirSchema {
    #[serde(flatten)]
    types: IndexMap<String, IndexMap<String, ElementDef>>,
}

/// A single resolved choice of a polymorphic `value[x]`-style element.
#[derive(Debug, Clone)]
pub struct ResolvedChoice {
    /// The concrete physical field name, e.g. `valueDecimal`.
    pub physical_name: String,
    /// The FHIR type this choice narrows to, e.g. `decimal`.
    pub fhir_type: String,
}

impl FhirSchema {
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        serde_json::from_value(value.clone()).map_err(CompileError::from)
    }

    pub fn elements(&self, type_name: &str) -> Option<&IndexMap<String, ElementDef>> {
        self.types.get(type_name)
    }

    pub fn element(&self, type_name: &str, element_name: &str) -> Option<&ElementDef> {
        self.types.get(type_name)?.get(element_name)
    }

    /// Resolver helper referenced in spec.md §9: given a parent FHIR type and
    /// a concrete step name the path used (e.g. `valueDecimal`), find the
    /// choice-group element whose base name this step narrows, and return the
    /// single matching physical choice.
    ///
    /// Only invoked when a plain `elements(parent).get(base_name)` lookup
    /// misses and `base_name` begins with the literal prefix `"value"`
    /// (spec.md §4.2's identifier-step rule).
    pub fn resolve_choice(&self, parent_type: &str, base_name: &str) -> Option<ResolvedChoice> {
        let elements = self.elements(parent_type)?;
        // The group element is conventionally named "value" in FHIR; accept
        // any group whose name is a strict prefix of base_name so nested
        // choice groups (e.g. "effective" -> effectiveDateTime) resolve too.
        for (group_name, def) in elements {
            if !base_name.starts_with(group_name.as_str()) {
                continue;
            }
            let suffix = &base_name[group_name.len()..];
            if suffix.is_empty() {
                continue;
            }
            for candidate_type in &def.types {
                let type_name_cap = capitalize(candidate_type);
                if suffix == type_name_cap {
                    return Some(ResolvedChoice {
                        physical_name: base_name.to_string(),
                        fhir_type: candidate_type.clone(),
                    });
                }
            }
        }
        None
    }
}

pub(crate) fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
