//! Semantic equality over JSON values and schema definitions.
//!
//! `serde_json`'s `PartialEq` is already key-order independent for objects,
//! but treats `1` and `1.0` as different numbers. JSON Schema does not, so
//! every comparison used by the merger goes through [`compare_values`].

use std::borrow::Cow;

use serde_json::{json, Number, Value};

/// Comparison functions handed to the array utilities and the merger.
#[derive(Debug, Clone, Copy, Default)]
pub struct Comparator;

impl Comparator {
    /// Deep semantic equality over arbitrary JSON values.
    pub fn compare_values(&self, a: &Value, b: &Value) -> bool {
        compare_values(a, b)
    }

    /// Semantic equality over schema definitions (booleans normalized).
    pub fn compare_definitions(&self, a: &Value, b: &Value) -> bool {
        compare_definitions(a, b)
    }
}

/// Create the default comparator.
pub fn create_comparator() -> Comparator {
    Comparator
}

/// Deep equality: object key order is irrelevant, array order is
/// significant, and values of different JSON types never match.
pub fn compare_values(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => numbers_equal(x, y),
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(l, r)| compare_values(l, r))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x
                    .iter()
                    .all(|(key, l)| y.get(key).is_some_and(|r| compare_values(l, r)))
        }
        _ => false,
    }
}

/// Like [`compare_values`], but boolean schemas are first rewritten to their
/// keyword form: `true` → `{}`, `false` → `{"not": {}}`.
pub fn compare_definitions(a: &Value, b: &Value) -> bool {
    compare_values(&canonical_definition(a), &canonical_definition(b))
}

fn canonical_definition(schema: &Value) -> Cow<'_, Value> {
    match schema {
        Value::Bool(true) => Cow::Owned(json!({})),
        Value::Bool(false) => Cow::Owned(json!({ "not": {} })),
        other => Cow::Borrowed(other),
    }
}

fn numbers_equal(a: &Number, b: &Number) -> bool {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return x == y;
    }
    if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
        return x == y;
    }
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}
