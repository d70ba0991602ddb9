//! Negative tests for malformed JSON Schemas.
//!
//! Every input is valid JSON but semantically invalid JSON Schema. The deep
//! merge must return `Ok` (keywords of the wrong shape are carried through
//! or kept as fragments) or a `MergeError`; it must never panic.
//!
//! Complements `fuzz/fuzz_targets/fuzz_merge.rs`, which feeds arbitrary
//! bytes through the same entry point.

use json_schema_allof_core::{
    create_deep_all_of_merge, create_merger, create_shallow_all_of_merge, DeepAllOfMerge,
    MergeOptions,
};
use proptest::prelude::*;
use serde_json::{json, Value};

fn strict() -> DeepAllOfMerge {
    create_deep_all_of_merge(create_shallow_all_of_merge(create_merger(
        MergeOptions::default(),
    )))
}

fn lenient() -> DeepAllOfMerge {
    create_deep_all_of_merge(create_shallow_all_of_merge(create_merger(
        MergeOptions::best_effort(),
    )))
}

// ===========================================================================
// 1. Deterministic negative tests
// ===========================================================================

/// `allOf` must be an array; an object is carried through untouched.
#[test]
fn malformed_allof_as_object() {
    let schema = json!({ "allOf": { "type": "string" } });
    let out = strict().merge(schema.clone()).unwrap();
    assert_eq!(out.schema, schema);
}

/// `required` of the wrong shape on one side is kept as a fragment.
#[test]
fn malformed_required_as_string() {
    let out = strict()
        .merge(json!({ "allOf": [{ "required": "id" }, { "required": ["id"] }] }))
        .unwrap();
    assert_eq!(
        out.schema,
        json!({ "allOf": [{ "required": "id" }, { "required": ["id"] }] })
    );
}

/// `type` as a number has no type strings to intersect.
#[test]
fn malformed_type_as_number() {
    let result = strict().merge(json!({ "allOf": [{ "type": 42 }, { "type": "string" }] }));
    assert!(result.is_ok());
}

/// `oneOf` as a string on both sides.
#[test]
fn malformed_oneof_as_string() {
    let result = strict().merge(json!({ "allOf": [{ "oneOf": "a" }, { "oneOf": "b" }] }));
    assert!(result.is_ok());
}

/// `properties` as a string is not a map of schemas.
#[test]
fn malformed_properties_as_string() {
    let result = strict().merge(json!({
        "allOf": [{ "properties": "nope" }, { "properties": { "a": true } }]
    }));
    assert!(result.is_ok());
}

/// `multipleOf` of zero has no least common multiple.
#[test]
fn malformed_zero_multiple_of() {
    let out = strict()
        .merge(json!({ "allOf": [{ "multipleOf": 0 }, { "multipleOf": 3 }] }))
        .unwrap();
    assert_eq!(
        out.schema,
        json!({ "allOf": [{ "multipleOf": 0 }, { "multipleOf": 3 }] })
    );
}

/// Lookaround is not supported by the regex engine. With no
/// additionalProperties to classify, the property keeps its own schema.
#[test]
fn malformed_invalid_pattern_regex() {
    let out = strict()
        .merge(json!({
            "allOf": [
                { "patternProperties": { "(?!x)": { "type": "string" } } },
                { "properties": { "a": { "minLength": 1 } } }
            ]
        }))
        .unwrap();
    assert_eq!(out.schema["properties"]["a"], json!({ "minLength": 1 }));
}

#[test]
fn edge_case_boolean_schemas() {
    assert_eq!(strict().merge(json!(true)).unwrap().schema, json!(true));
    assert_eq!(strict().merge(json!(false)).unwrap().schema, json!(false));
    assert_eq!(
        strict().merge(json!({ "allOf": [true, false] })).unwrap().schema,
        json!(false)
    );
    assert_eq!(strict().merge(json!({ "allOf": [] })).unwrap().schema, json!({}));
}

/// Scalars and arrays at the top level are not schemas.
#[test]
fn malformed_top_level_values() {
    for schema in [json!(null), json!([1, 2, 3]), json!("just_a_string"), json!(42)] {
        let out = strict().merge(schema.clone()).unwrap();
        assert_eq!(out.schema, schema);
    }
}

/// Malformed schema buried several levels deep.
#[test]
fn malformed_deeply_nested() {
    let schema = json!({
        "properties": {
            "level1": {
                "properties": {
                    "level2": {
                        "allOf": [{ "required": 42 }, { "required": ["x"] }]
                    }
                }
            }
        }
    });
    let result = lenient().merge(schema);
    assert!(result.is_ok());
}

// ===========================================================================
// 2. Property-based negative tests
// ===========================================================================

/// Strategy: a JSON Schema keyword with the WRONG value type.
fn arb_malformed_keyword() -> impl Strategy<Value = (&'static str, Value)> {
    prop_oneof![
        Just(("required", json!("not_an_array"))),
        Just(("required", json!(42))),
        Just(("type", json!(42))),
        Just(("type", json!({ "nested": true }))),
        Just(("enum", json!("not_an_array"))),
        Just(("const", json!(null))),
        Just(("properties", json!([1, 2]))),
        Just(("patternProperties", json!("x"))),
        Just(("additionalProperties", json!("yes"))),
        Just(("items", json!(7))),
        Just(("anyOf", json!({ "a": 1 }))),
        Just(("oneOf", json!([]))),
        Just(("not", json!([]))),
        Just(("minimum", json!("zero"))),
        Just(("maxLength", json!(-1))),
        Just(("multipleOf", json!(-0.5))),
        Just(("exclusiveMinimum", json!(true))),
        Just(("pattern", json!(["^a"]))),
        Just(("allOf", json!("nope"))),
    ]
}

/// Strategy: an `allOf` whose members carry one to three malformed keywords.
fn arb_malformed_schema() -> impl Strategy<Value = Value> {
    let member = proptest::collection::vec(arb_malformed_keyword(), 1..=3).prop_map(|pairs| {
        let mut obj = serde_json::Map::new();
        for (key, value) in pairs {
            obj.insert(key.to_string(), value);
        }
        Value::Object(obj)
    });
    proptest::collection::vec(member, 1..=3).prop_map(|members| json!({ "allOf": members }))
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 128, ..Default::default() })]

    /// Property: the deep merge NEVER panics on malformed schemas.
    #[test]
    fn merge_never_panics_on_malformed(schema in arb_malformed_schema()) {
        let _ = strict().merge(schema);
    }

    /// Property: best-effort merge of malformed schemas never fails a check.
    #[test]
    fn best_effort_accepts_malformed(schema in arb_malformed_schema()) {
        prop_assert!(lenient().merge(schema).is_ok());
    }

    /// Property: error messages are non-empty.
    #[test]
    fn merge_errors_have_messages(schema in arb_malformed_schema()) {
        if let Err(e) = strict().merge(schema) {
            prop_assert!(!e.to_string().is_empty(), "MergeError message should be non-empty");
        }
    }
}
