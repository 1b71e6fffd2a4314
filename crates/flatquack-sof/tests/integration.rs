//! Integration tests for the ViewDefinition -> DuckDB SQL compiler.
//!
//! Each test builds a ViewDefinition and a small FHIR schema by hand, compiles
//! it, and checks the shape of the generated SQL rather than a byte-for-byte
//! match (the lowerer's alias numbering is an implementation detail).

use std::collections::HashMap;

use flatquack_sof::{compile, CompileErrorKind, FhirSchema, ScalarLiteral, ViewDefinition};
use serde_json::json;

fn patient_schema() -> FhirSchema {
    FhirSchema::from_json(&json!({
        "Patient": {
            "id": { "type": ["string"], "max": "1" },
            "gender": { "type": ["code"], "max": "1" },
            "birthDate": { "type": ["date"], "max": "1" },
            "active": { "type": ["boolean"], "max": "1" },
            "name": { "type": ["HumanName"], "max": "*" },
            "identifier": { "type": ["Identifier"], "max": "*" },
            "extension": { "type": ["Extension"], "max": "*" },
            "address": { "type": ["Address"], "max": "*" },
            "contact": { "type": ["PatientContact"], "max": "*" },
            "multipleBirth": { "type": ["integer", "boolean"], "max": "1", "choice": "multipleBirth" }
        },
        "HumanName": {
            "use": { "type": ["code"], "max": "1" },
            "family": { "type": ["string"], "max": "1" },
            "given": { "type": ["string"], "max": "*" }
        },
        "Identifier": {
            "system": { "type": ["uri"], "max": "1" },
            "value": { "type": ["string"], "max": "1" }
        },
        "Address": {
            "postalCode": { "type": ["string"], "max": "1" }
        },
        "PatientContact": {
            "address": { "type": ["Address"], "max": "1" }
        },
        "Extension": {
            "url": { "type": ["uri"], "max": "1" },
            "extension": { "type": ["Extension"], "max": "*" },
            "value": { "type": ["string", "decimal", "Coding"], "max": "1", "choice": "value" }
        },
        "Coding": {
            "system": { "type": ["uri"], "max": "1" },
            "code": { "type": ["code"], "max": "1" },
            "display": { "type": ["string"], "max": "1" }
        }
    }))
    .expect("valid schema json")
}

fn observation_schema() -> FhirSchema {
    FhirSchema::from_json(&json!({
        "Observation": {
            "id": { "type": ["string"], "max": "1" },
            "status": { "type": ["code"], "max": "1" },
            "subject": { "type": ["Reference"], "max": "1" },
            "value": { "type": ["Quantity", "string", "decimal"], "max": "1", "choice": "value" }
        },
        "Reference": {
            "reference": { "type": ["string"], "max": "1" }
        },
        "Quantity": {
            "value": { "type": ["decimal"], "max": "1" },
            "unit": { "type": ["string"], "max": "1" }
        }
    }))
    .expect("valid schema json")
}

fn view(json_value: serde_json::Value) -> ViewDefinition {
    ViewDefinition::from_json(&json_value).expect("valid ViewDefinition")
}

// ---------------------------------------------------------------------------
// Basic projection
// ---------------------------------------------------------------------------

#[test]
fn basic_projection_selects_scalar_columns() {
    let v = view(json!({
        "resourceType": "ViewDefinition",
        "name": "patient_demographics",
        "status": "active",
        "resource": "Patient",
        "select": [{
            "column": [
                {"name": "id", "path": "id"},
                {"name": "gender", "path": "gender"},
                {"name": "birth_date", "path": "birthDate"}
            ]
        }]
    }));

    let result = compile(&v, &patient_schema(), &HashMap::new()).expect("compiles");

    assert!(result.sql.contains("FROM \"Patient\" AS base"));
    assert!(result.sql.contains("base.id AS \"id\""));
    assert!(result.sql.contains("base.gender AS \"gender\""));
    assert!(result.sql.contains("base.birthDate AS \"birth_date\""));
    assert_eq!(result.column_list.len(), 3);
    assert_eq!(result.column_list[0].name, "id");
}

#[test]
fn empty_select_is_rejected() {
    let v = view(json!({
        "resourceType": "ViewDefinition",
        "name": "empty_view",
        "status": "active",
        "resource": "Patient",
        "select": []
    }));

    let err = compile(&v, &patient_schema(), &HashMap::new()).unwrap_err();
    assert_eq!(err.kind, CompileErrorKind::InvalidViewDefinition);
}

// ---------------------------------------------------------------------------
// forEach / forEachOrNull (ViewDefinition-level row multiplication)
// ---------------------------------------------------------------------------

#[test]
fn for_each_expands_array_via_lateral_unnest() {
    let v = view(json!({
        "resourceType": "ViewDefinition",
        "name": "patient_names",
        "status": "active",
        "resource": "Patient",
        "select": [{
            "forEach": "name",
            "column": [
                {"name": "family", "path": "family"},
                {"name": "given_joined", "path": "given.join(' ')"}
            ]
        }]
    }));

    let result = compile(&v, &patient_schema(), &HashMap::new()).expect("compiles");

    assert!(result.sql.contains("LATERAL UNNEST(base.name) AS"));
    assert!(result.sql.contains(".family AS \"family\""));
    assert!(result.sql.contains("list_aggregate("));
}

#[test]
fn for_each_or_null_guards_empty_and_null_arrays() {
    let v = view(json!({
        "resourceType": "ViewDefinition",
        "name": "patient_identifiers",
        "status": "active",
        "resource": "Patient",
        "select": [{
            "forEachOrNull": "identifier",
            "column": [
                {"name": "system", "path": "system"},
                {"name": "value", "path": "value"}
            ]
        }]
    }));

    let result = compile(&v, &patient_schema(), &HashMap::new()).expect("compiles");

    assert!(result.sql.contains("COALESCE(NULLIF(base.identifier, []), [NULL])"));
}

// ---------------------------------------------------------------------------
// where clause
// ---------------------------------------------------------------------------

#[test]
fn where_clause_combines_with_and() {
    let v = view(json!({
        "resourceType": "ViewDefinition",
        "name": "active_patients",
        "status": "active",
        "resource": "Patient",
        "select": [{
            "column": [{"name": "id", "path": "id"}]
        }],
        "where": [
            {"path": "active"},
            {"path": "gender = 'female'"}
        ]
    }));

    let result = compile(&v, &patient_schema(), &HashMap::new()).expect("compiles");

    assert!(result.sql.contains("WHERE"));
    assert!(result.sql.contains(") AND ("));
}

#[test]
fn where_clause_must_resolve_to_boolean() {
    let v = view(json!({
        "resourceType": "ViewDefinition",
        "name": "bad_where",
        "status": "active",
        "resource": "Patient",
        "select": [{
            "column": [{"name": "id", "path": "id"}]
        }],
        "where": [{"path": "gender"}]
    }));

    let err = compile(&v, &patient_schema(), &HashMap::new()).unwrap_err();
    assert_eq!(err.kind, CompileErrorKind::CardinalityMismatch);
}

// ---------------------------------------------------------------------------
// unionAll
// ---------------------------------------------------------------------------

#[test]
fn union_all_combines_branches_with_identical_columns() {
    let v = view(json!({
        "resourceType": "ViewDefinition",
        "name": "patient_contacts",
        "status": "active",
        "resource": "Patient",
        "select": [{
            "unionAll": [
                {
                    "forEach": "name",
                    "column": [
                        {"name": "kind", "path": "use"},
                        {"name": "text", "path": "family"}
                    ]
                },
                {
                    "forEach": "identifier",
                    "column": [
                        {"name": "kind", "path": "system"},
                        {"name": "text", "path": "value"}
                    ]
                }
            ]
        }]
    }));

    let result = compile(&v, &patient_schema(), &HashMap::new()).expect("compiles");

    assert!(result.sql.contains("UNION ALL"));
    assert!(result.sql.contains("LATERAL ("));
}

#[test]
fn union_all_rejects_mismatched_column_names() {
    let v = view(json!({
        "resourceType": "ViewDefinition",
        "name": "patient_contacts_bad",
        "status": "active",
        "resource": "Patient",
        "select": [{
            "unionAll": [
                {"column": [{"name": "a", "path": "id"}]},
                {"column": [{"name": "b", "path": "id"}]}
            ]
        }]
    }));

    let err = compile(&v, &patient_schema(), &HashMap::new()).unwrap_err();
    assert_eq!(err.kind, CompileErrorKind::UnsupportedFeature);
}

#[test]
fn union_all_rejects_column_at_the_same_select_node() {
    let v = view(json!({
        "resourceType": "ViewDefinition",
        "name": "patient_contacts_conflict",
        "status": "active",
        "resource": "Patient",
        "select": [{
            "column": [{"name": "id", "path": "id"}],
            "unionAll": [
                {"column": [{"name": "id", "path": "id"}]},
                {"column": [{"name": "id", "path": "id"}]}
            ]
        }]
    }));

    let err = compile(&v, &patient_schema(), &HashMap::new()).unwrap_err();
    assert_eq!(err.kind, CompileErrorKind::UnsupportedFeature);
}

#[test]
fn union_all_builtin_combines_a_singleton_field_chained_off_two_different_collections() {
    // `address` is a collection directly on Patient; `contact` is a
    // collection whose own `address` is a singleton Address. Both operands
    // reduce to the same scalar `postalCode` field, chained through a
    // different number of array hops — exactly the shape that used to
    // mislabel the second hop as an array and double-`UNNEST` it.
    let v = view(json!({
        "resourceType": "ViewDefinition",
        "name": "patient_postal_codes",
        "status": "active",
        "resource": "Patient",
        "select": [{
            "column": [
                {"name": "postal_codes", "path": "_unionAll(address.postalCode, contact.address.postalCode)"}
            ]
        }]
    }));

    let result = compile(&v, &patient_schema(), &HashMap::new()).expect("compiles");

    assert!(result.sql.contains("LATERAL UNNEST(base.address) AS"));
    assert!(result.sql.contains("LATERAL UNNEST(base.contact) AS"));
    assert!(result.sql.contains(".address.postalCode"), "contact's singleton address must not be re-unnested");
    assert!(result.sql.contains("list_concat("));
    // Both operands resolve to a scalar VARCHAR, not an array, so both must
    // take unionAll's scalar-wrap branch rather than its `coalesce(expr, [])`
    // array branch.
    assert!(!result.sql.contains("coalesce("));
    assert_eq!(result.sql.matches("IS NULL THEN [] ELSE [").count(), 2);
}

// ---------------------------------------------------------------------------
// where()/first()/exists() FHIRPath functions
// ---------------------------------------------------------------------------

#[test]
fn where_function_filters_array_via_correlated_subquery() {
    let v = view(json!({
        "resourceType": "ViewDefinition",
        "name": "official_family",
        "status": "active",
        "resource": "Patient",
        "select": [{
            "column": [
                {"name": "family", "path": "name.where(use = 'official').first().family"}
            ]
        }]
    }));

    let result = compile(&v, &patient_schema(), &HashMap::new()).expect("compiles");

    assert!(result.sql.contains("SELECT * FROM UNNEST(base.name)"));
    assert!(result.sql.contains("WHERE"));
    assert!(result.sql.contains("'official'"));
    assert!(result.sql.contains("[1]"), "first() should index the 1-based list");
}

#[test]
fn exists_on_collection_checks_length() {
    let v = view(json!({
        "resourceType": "ViewDefinition",
        "name": "has_names",
        "status": "active",
        "resource": "Patient",
        "select": [{
            "column": [{"name": "has_name", "path": "name.exists()"}]
        }]
    }));

    let result = compile(&v, &patient_schema(), &HashMap::new()).expect("compiles");
    assert!(result.sql.contains("len(base.name) > 0"));
}

// ---------------------------------------------------------------------------
// Polymorphic ofType()
// ---------------------------------------------------------------------------

#[test]
fn of_type_resolves_to_concrete_physical_column() {
    let v = view(json!({
        "resourceType": "ViewDefinition",
        "name": "observation_values",
        "status": "active",
        "resource": "Observation",
        "select": [{
            "column": [
                {"name": "id", "path": "id"},
                {"name": "value_decimal", "path": "value.ofType(decimal)"},
                {"name": "value_quantity_unit", "path": "value.ofType(Quantity).unit"}
            ]
        }]
    }));

    let result = compile(&v, &observation_schema(), &HashMap::new()).expect("compiles");

    assert!(result.sql.contains("base.valueDecimal AS \"value_decimal\""));
    assert!(result.sql.contains("base.valueQuantity.unit AS \"value_quantity_unit\""));
    assert_eq!(
        result.column_list[1].col_type,
        flatquack_sof::ColumnType::Decimal
    );
}

#[test]
fn of_type_rejects_undeclared_choice() {
    let v = view(json!({
        "resourceType": "ViewDefinition",
        "name": "observation_bad_value",
        "status": "active",
        "resource": "Observation",
        "select": [{
            "column": [{"name": "x", "path": "value.ofType(boolean)"}]
        }]
    }));

    let err = compile(&v, &observation_schema(), &HashMap::new()).unwrap_err();
    assert_eq!(err.kind, CompileErrorKind::InvalidChoice);
}

// ---------------------------------------------------------------------------
// Extension traversal
// ---------------------------------------------------------------------------

#[test]
fn extension_accessor_filters_by_url() {
    let v = view(json!({
        "resourceType": "ViewDefinition",
        "name": "patient_race",
        "status": "active",
        "resource": "Patient",
        "select": [{
            "column": [
                {
                    "name": "race_code",
                    "path": "$this.extension('http://example.org/us-core-race').extension('ombCategory').valueCoding.code"
                }
            ]
        }]
    }));

    let result = compile(&v, &patient_schema(), &HashMap::new()).expect("compiles");

    assert!(result.sql.contains("'http://example.org/us-core-race'"));
    assert!(result.sql.contains("'ombCategory'"));
    assert!(result.sql.contains(".item.url ="));
    assert!(result.sql.contains("valueCoding.code"));
}

// ---------------------------------------------------------------------------
// User-supplied %variables (constants)
// ---------------------------------------------------------------------------

#[test]
fn user_variable_substitutes_into_predicate() {
    let mut vars: HashMap<String, ScalarLiteral> = HashMap::new();
    vars.insert("system".to_string(), ScalarLiteral::String("http://loinc.org".to_string()));

    let v = view(json!({
        "resourceType": "ViewDefinition",
        "name": "identifiers_by_system",
        "status": "active",
        "resource": "Patient",
        "select": [{
            "column": [
                {"name": "value", "path": "identifier.where(system = %system).first().value"}
            ]
        }]
    }));

    let result = compile(&v, &patient_schema(), &vars).expect("compiles");
    assert!(result.sql.contains("http://loinc.org"));
    assert!(!result.sql.contains("%system"));
}

// ---------------------------------------------------------------------------
// _forEach / _forEachOrNull / _col / _col_collection (FHIRPath-level)
// ---------------------------------------------------------------------------

#[test]
fn for_each_builtin_builds_struct_list_over_array_receiver() {
    let v = view(json!({
        "resourceType": "ViewDefinition",
        "name": "patient_name_structs",
        "status": "active",
        "resource": "Patient",
        "select": [{
            "column": [
                {
                    "name": "names",
                    "path": "name._forEach(_col('family', family), _col_collection('given', given))"
                }
            ]
        }]
    }));

    let result = compile(&v, &patient_schema(), &HashMap::new()).expect("compiles");

    assert!(result.sql.contains("SELECT list(struct_pack("));
    assert!(result.sql.contains("family :="));
    assert!(result.sql.contains("given :="));
}

#[test]
fn col_rejects_multi_item_collection_at_runtime() {
    let v = view(json!({
        "resourceType": "ViewDefinition",
        "name": "patient_name_structs_bad",
        "status": "active",
        "resource": "Patient",
        "select": [{
            "column": [
                {
                    "name": "names",
                    "path": "name._forEach(_col('given_first', given))"
                }
            ]
        }]
    }));

    let result = compile(&v, &patient_schema(), &HashMap::new()).expect("compiles");
    assert!(result.sql.contains("error('_col: multi-item collection for field given_first')"));
}

#[test]
fn bare_col_outside_for_each_is_rejected() {
    let v = view(json!({
        "resourceType": "ViewDefinition",
        "name": "bad_col_usage",
        "status": "active",
        "resource": "Patient",
        "select": [{
            "column": [{"name": "x", "path": "_col('id', id)"}]
        }]
    }));

    let err = compile(&v, &patient_schema(), &HashMap::new()).unwrap_err();
    assert_eq!(err.kind, CompileErrorKind::UnsupportedFeature);
}

// ---------------------------------------------------------------------------
// _invoke
// ---------------------------------------------------------------------------

#[test]
fn invoke_calls_named_function_with_literal_args() {
    let v = view(json!({
        "resourceType": "ViewDefinition",
        "name": "patient_soundex",
        "status": "active",
        "resource": "Patient",
        "select": [{
            "column": [
                {"name": "soundex", "path": "gender._invoke('soundex')"}
            ]
        }]
    }));

    let result = compile(&v, &patient_schema(), &HashMap::new()).expect("compiles");
    assert!(result.sql.contains("soundex(base.gender)"));
}

#[test]
fn invoke_rejects_non_literal_function_name() {
    let v = view(json!({
        "resourceType": "ViewDefinition",
        "name": "patient_bad_invoke",
        "status": "active",
        "resource": "Patient",
        "select": [{
            "column": [
                {"name": "bad", "path": "gender._invoke(gender)"}
            ]
        }]
    }));

    let err = compile(&v, &patient_schema(), &HashMap::new()).unwrap_err();
    assert_eq!(err.kind, CompileErrorKind::InvokeParamNotLiteral);
}

// ---------------------------------------------------------------------------
// _splitPath
// ---------------------------------------------------------------------------

#[test]
fn split_path_resolves_negative_index_from_the_end() {
    let v = view(json!({
        "resourceType": "ViewDefinition",
        "name": "patient_reference_last_segment",
        "status": "active",
        "resource": "Observation",
        "select": [{
            "column": [
                {"name": "last_segment", "path": "subject.reference._splitPath(-1)"}
            ]
        }]
    }));

    let result = compile(&v, &observation_schema(), &HashMap::new()).expect("compiles");
    assert!(result.sql.contains("string_split(base.subject.reference, '/')"));
    assert!(result.sql.contains("list_length(string_split(base.subject.reference, '/')) + ((-1)) + 1"));
    assert!(result.sql.contains("CASE WHEN ((-1)) >= 0 THEN"));
}

// ---------------------------------------------------------------------------
// getReferenceKey / getResourceKey
// ---------------------------------------------------------------------------

#[test]
fn get_reference_key_filters_by_declared_resource_type() {
    let v = view(json!({
        "resourceType": "ViewDefinition",
        "name": "observation_patient_ref",
        "status": "active",
        "resource": "Observation",
        "select": [{
            "column": [
                {"name": "patient_id", "path": "subject.getReferenceKey('Patient')"}
            ]
        }]
    }));

    let result = compile(&v, &observation_schema(), &HashMap::new()).expect("compiles");
    assert!(result.sql.contains("starts_with("));
    assert!(result.sql.contains("string_split("));
}

#[test]
fn get_resource_key_combines_type_and_id() {
    let v = view(json!({
        "resourceType": "ViewDefinition",
        "name": "patient_resource_key",
        "status": "active",
        "resource": "Patient",
        "select": [{
            "column": [{"name": "key", "path": "getResourceKey()"}]
        }]
    }));

    let result = compile(&v, &patient_schema(), &HashMap::new()).expect("compiles");
    assert!(result.sql.contains("base.resource_type || '/' || base.id"));
}

// ---------------------------------------------------------------------------
// Decimal fidelity
// ---------------------------------------------------------------------------

#[test]
fn value_decimal_keeps_decimal_physical_type_not_float() {
    let v = view(json!({
        "resourceType": "ViewDefinition",
        "name": "observation_decimal",
        "status": "active",
        "resource": "Observation",
        "select": [{
            "column": [
                {"name": "qty_value", "path": "value.ofType(Quantity).value"}
            ]
        }]
    }));

    let result = compile(&v, &observation_schema(), &HashMap::new()).expect("compiles");
    assert_eq!(result.column_list[0].col_type, flatquack_sof::ColumnType::Decimal);
}

// ---------------------------------------------------------------------------
// Input schema (reduced touched-element STRUCT)
// ---------------------------------------------------------------------------

#[test]
fn input_schema_only_lists_touched_elements() {
    let v = view(json!({
        "resourceType": "ViewDefinition",
        "name": "patient_minimal",
        "status": "active",
        "resource": "Patient",
        "select": [{
            "column": [{"name": "id", "path": "id"}]
        }]
    }));

    let result = compile(&v, &patient_schema(), &HashMap::new()).expect("compiles");
    assert!(result.input_schema.contains("id VARCHAR"));
    assert!(!result.input_schema.contains("birthDate"));
    assert!(!result.input_schema.contains("name HumanName"));
}

#[test]
fn input_schema_includes_resolved_choice_column_not_bare_group() {
    let v = view(json!({
        "resourceType": "ViewDefinition",
        "name": "observation_minimal",
        "status": "active",
        "resource": "Observation",
        "select": [{
            "column": [{"name": "id", "path": "id"}, {"name": "v", "path": "value.ofType(decimal)"}]
        }]
    }));

    let result = compile(&v, &observation_schema(), &HashMap::new()).expect("compiles");
    assert!(result.input_schema.contains("valueDecimal DECIMAL"));
    assert!(!result.input_schema.contains("valueQuantity"));
    assert!(!result.input_schema.contains("valueString"));
}

// ---------------------------------------------------------------------------
// Diagnostics surface unknown/JSON-typed columns
// ---------------------------------------------------------------------------

#[test]
fn unknown_physical_type_surfaces_a_diagnostic() {
    let v = view(json!({
        "resourceType": "ViewDefinition",
        "name": "patient_invoke_unknown",
        "status": "active",
        "resource": "Patient",
        "select": [{
            "column": [
                {"name": "raw", "path": "gender._invoke('my_udf')"}
            ]
        }]
    }));

    let result = compile(&v, &patient_schema(), &HashMap::new()).expect("compiles");
    assert_eq!(result.diagnostics.len(), 1);
    assert!(result.diagnostics[0].contains("raw"));
}
