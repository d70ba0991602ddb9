//! Shared schema utilities: JSON Pointer construction and keyword helpers.

use std::borrow::Cow;

use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// JSON Pointer escaping (RFC 6901)
// ---------------------------------------------------------------------------

/// Escape a single path segment per RFC 6901.
///
/// - `~` → `~0`
/// - `/` → `~1`
///
/// Returns `Cow::Borrowed` when no escaping is needed (the common case).
pub fn escape_pointer_segment(segment: &str) -> Cow<'_, str> {
    if segment.contains('~') || segment.contains('/') {
        Cow::Owned(segment.replace('~', "~0").replace('/', "~1"))
    } else {
        Cow::Borrowed(segment)
    }
}

/// Build a JSON Pointer path by appending segments to a parent path.
///
/// Each segment is escaped per RFC 6901 before joining.
///
/// # Example
/// ```
/// use json_schema_allof_core::build_path;
/// assert_eq!(build_path("#", &["properties", "a/b"]), "#/properties/a~1b");
/// ```
pub fn build_path(parent: &str, segments: &[&str]) -> String {
    let mut path = parent.to_string();
    for segment in segments {
        path.push('/');
        path.push_str(&escape_pointer_segment(segment));
    }
    path
}

// ---------------------------------------------------------------------------
// Keyword helpers
// ---------------------------------------------------------------------------

/// Extract all type strings from a `type` value (string or array form).
pub fn extract_type_strings(type_val: &Value) -> Vec<String> {
    match type_val {
        Value::String(s) => vec![s.clone()],
        Value::Array(arr) => arr
            .iter()
            .filter_map(|v| v.as_str().map(String::from))
            .collect(),
        _ => Vec::new(),
    }
}

/// Whether a schema definition accepts everything (`true` or `{}`).
pub fn is_trivially_true(schema: &Value) -> bool {
    match schema {
        Value::Bool(b) => *b,
        Value::Object(obj) => obj.is_empty(),
        _ => false,
    }
}

/// Whether a schema definition is the boolean `false` schema.
pub fn is_false(schema: &Value) -> bool {
    matches!(schema, Value::Bool(false))
}

/// Wrap a single keyword/value pair as a schema object.
pub fn single_keyword(key: &str, value: Value) -> Value {
    let mut obj = Map::new();
    obj.insert(key.to_string(), value);
    Value::Object(obj)
}

// ===========================================================================
// Tests
// ===========================================================================
