//! Post-order JSON Schema traversal with structural context.
//!
//! Provides [`SchemaVisitor`] — a trait that transformations implement — and
//! [`SchemaTraverser`] — a driver that walks every schema-bearing keyword,
//! presenting each sub-schema to the visitor together with a
//! [`TraverserContext`] describing where it sits. All knowledge of which
//! keywords carry sub-schemas lives here.
//!
//! Traversal is post-order: a node's children are visited and replaced
//! before the node itself is handed to the visitor, so a visitor always
//! sees already-normalized children.
//!
//! The traverser owns the tree. Each child is removed from its parent,
//! visited, and the visitor's result is inserted back at the same keyword
//! and index or property, so replacements land in their exact position.

use serde_json::{Map, Value};

use crate::error::MergeError;
use crate::schema_utils::build_path;

// ---------------------------------------------------------------------------
// Keyword lists
// ---------------------------------------------------------------------------

/// Keywords whose values are maps of schemas (each map entry is a sub-schema).
pub(crate) const RECORD_KEYWORDS: &[&str] = &[
    "properties",
    "patternProperties",
    "$defs",
    "definitions",
    "dependentSchemas",
];

/// Keywords whose values are single sub-schemas (when the value is an object).
pub(crate) const SUB_KEYWORDS: &[&str] = &[
    "additionalProperties",
    "additionalItems",
    "unevaluatedProperties",
    "unevaluatedItems",
    "propertyNames",
    "contains",
    "not",
    "if",
    "then",
    "else",
];

/// Keywords whose values are arrays of sub-schemas.
pub(crate) const ARRAY_KEYWORDS: &[&str] = &["allOf", "anyOf", "oneOf", "prefixItems"];

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

/// One step of the location path accumulated from the document root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Index(usize),
    Key(String),
}

/// Where a visited sub-schema sits relative to its parent.
///
/// `path` accumulates one segment per array element (its index) and per
/// record entry (its property name); labeled sub-schemas such as `not` or
/// `items` leave it unchanged. `pointer` is the full RFC 6901 schema
/// pointer (`#/properties/a/allOf/0`) used for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraverserContext {
    /// The document root.
    Root,
    /// An element of an array-of-schemas keyword (`allOf`, `items` tuple, ...).
    Array {
        keyword: &'static str,
        index: usize,
        path: Vec<PathSegment>,
        pointer: String,
    },
    /// An entry of a map-of-schemas keyword (`properties`, ...).
    Record {
        keyword: &'static str,
        property: String,
        path: Vec<PathSegment>,
        pointer: String,
    },
    /// A single labeled sub-schema (`not`, `items`, `additionalProperties`, ...).
    Sub {
        keyword: &'static str,
        path: Vec<PathSegment>,
        pointer: String,
    },
}

impl TraverserContext {
    /// The keyword the node hangs off, or `None` at the root.
    pub fn keyword(&self) -> Option<&'static str> {
        match self {
            TraverserContext::Root => None,
            TraverserContext::Array { keyword, .. }
            | TraverserContext::Record { keyword, .. }
            | TraverserContext::Sub { keyword, .. } => Some(*keyword),
        }
    }

    /// Accumulated location path from the root.
    pub fn path(&self) -> &[PathSegment] {
        match self {
            TraverserContext::Root => &[],
            TraverserContext::Array { path, .. }
            | TraverserContext::Record { path, .. }
            | TraverserContext::Sub { path, .. } => path.as_slice(),
        }
    }

    /// RFC 6901 schema pointer to the node.
    pub fn pointer(&self) -> &str {
        match self {
            TraverserContext::Root => "#",
            TraverserContext::Array { pointer, .. }
            | TraverserContext::Record { pointer, .. }
            | TraverserContext::Sub { pointer, .. } => pointer.as_str(),
        }
    }

    fn array(&self, keyword: &'static str, index: usize) -> Self {
        let mut path = self.path().to_vec();
        path.push(PathSegment::Index(index));
        TraverserContext::Array {
            keyword,
            index,
            path,
            pointer: build_path(self.pointer(), &[keyword, &index.to_string()]),
        }
    }

    fn record(&self, keyword: &'static str, property: &str) -> Self {
        let mut path = self.path().to_vec();
        path.push(PathSegment::Key(property.to_string()));
        TraverserContext::Record {
            keyword,
            property: property.to_string(),
            path,
            pointer: build_path(self.pointer(), &[keyword, property]),
        }
    }

    fn sub(&self, keyword: &'static str) -> Self {
        TraverserContext::Sub {
            keyword,
            path: self.path().to_vec(),
            pointer: build_path(self.pointer(), &[keyword]),
        }
    }
}

// ---------------------------------------------------------------------------
// Visitor trait
// ---------------------------------------------------------------------------

/// A post-order schema transformer.
///
/// The returned value replaces the visited node in its parent.
pub trait SchemaVisitor {
    type Error: From<MergeError>;

    /// Called for each schema node AFTER its children have been visited.
    fn visit(&mut self, schema: Value, ctx: &TraverserContext) -> Result<Value, Self::Error>;
}

impl<F, E> SchemaVisitor for F
where
    F: FnMut(Value, &TraverserContext) -> Result<Value, E>,
    E: From<MergeError>,
{
    type Error = E;

    fn visit(&mut self, schema: Value, ctx: &TraverserContext) -> Result<Value, E> {
        self(schema, ctx)
    }
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

/// Depth-bounded, synchronous traversal driver.
#[derive(Debug, Clone, Copy)]
pub struct SchemaTraverser {
    max_depth: usize,
}

impl SchemaTraverser {
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    /// Walk `schema`, presenting every node (root last) to `visitor`.
    ///
    /// Consumes the document and returns the rebuilt tree.
    pub fn traverse<V: SchemaVisitor>(
        &self,
        schema: Value,
        visitor: &mut V,
    ) -> Result<Value, V::Error> {
        self.walk(schema, visitor, &TraverserContext::Root, 0)
    }

    fn walk<V: SchemaVisitor>(
        &self,
        schema: Value,
        visitor: &mut V,
        ctx: &TraverserContext,
        depth: usize,
    ) -> Result<Value, V::Error> {
        if depth > self.max_depth {
            return Err(MergeError::UnboundedRecursion {
                path: ctx.pointer().to_string(),
                max_depth: self.max_depth,
            }
            .into());
        }

        tracing::trace!(pointer = ctx.pointer(), depth, "visiting schema node");

        let rebuilt = match schema {
            Value::Object(obj) => Value::Object(self.walk_children(obj, visitor, ctx, depth)?),
            other => other,
        };
        visitor.visit(rebuilt, ctx)
    }

    fn walk_children<V: SchemaVisitor>(
        &self,
        mut obj: Map<String, Value>,
        visitor: &mut V,
        ctx: &TraverserContext,
        depth: usize,
    ) -> Result<Map<String, Value>, V::Error> {
        // --- Map-of-schemas keywords ---
        for keyword in RECORD_KEYWORDS {
            if let Some(val) = obj.remove(*keyword) {
                let walked = match val {
                    Value::Object(map) => {
                        let mut new_map = Map::new();
                        for (key, val) in map {
                            let child_ctx = ctx.record(keyword, &key);
                            new_map.insert(key, self.walk(val, visitor, &child_ctx, depth + 1)?);
                        }
                        Value::Object(new_map)
                    }
                    // Not a map-of-schemas — preserve
                    other => other,
                };
                obj.insert(keyword.to_string(), walked);
            }
        }

        // --- Single-schema keywords ---
        for keyword in SUB_KEYWORDS {
            if let Some(val) = obj.remove(*keyword) {
                let walked = if val.is_object() {
                    self.walk(val, visitor, &ctx.sub(keyword), depth + 1)?
                } else {
                    // Not a schema (e.g. `additionalProperties: false`) — preserve
                    val
                };
                obj.insert(keyword.to_string(), walked);
            }
        }

        // --- Array-of-schemas keywords ---
        for keyword in ARRAY_KEYWORDS {
            if let Some(val) = obj.remove(*keyword) {
                let walked = match val {
                    Value::Array(variants) => Value::Array(
                        self.walk_array(variants, visitor, ctx, keyword, depth)?,
                    ),
                    other => other,
                };
                obj.insert(keyword.to_string(), walked);
            }
        }

        // --- `items` (object or tuple form) ---
        if let Some(items) = obj.remove("items") {
            let walked = match items {
                Value::Object(_) => self.walk(items, visitor, &ctx.sub("items"), depth + 1)?,
                Value::Array(arr) => {
                    Value::Array(self.walk_array(arr, visitor, ctx, "items", depth)?)
                }
                // `items: true/false` — preserve
                other => other,
            };
            obj.insert("items".to_string(), walked);
        }

        Ok(obj)
    }

    fn walk_array<V: SchemaVisitor>(
        &self,
        items: Vec<Value>,
        visitor: &mut V,
        ctx: &TraverserContext,
        keyword: &'static str,
        depth: usize,
    ) -> Result<Vec<Value>, V::Error> {
        let mut walked = Vec::with_capacity(items.len());
        for (i, item) in items.into_iter().enumerate() {
            walked.push(self.walk(item, visitor, &ctx.array(keyword, i), depth + 1)?);
        }
        Ok(walked)
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn identity(schema: Value, _ctx: &TraverserContext) -> Result<Value, MergeError> {
        Ok(schema)
    }

    fn collect_pointers(schema: Value) -> Vec<String> {
        let mut seen = Vec::new();
        let mut visitor = |schema: Value, ctx: &TraverserContext| -> Result<Value, MergeError> {
            seen.push(ctx.pointer().to_string());
            Ok(schema)
        };
        SchemaTraverser::new(50)
            .traverse(schema, &mut visitor)
            .unwrap();
        seen
    }

    #[test]
    fn test_identity_preserves_schema() {
        let schema = json!({
            "type": "object",
            "properties": {
                "name": { "type": "string" },
                "tags": { "type": "array", "items": { "type": "string" } }
            },
            "additionalProperties": false,
            "required": ["name"]
        });

        let result = SchemaTraverser::new(50)
            .traverse(schema.clone(), &mut identity)
            .unwrap();
        assert_eq!(result, schema);
    }

    #[test]
    fn test_visits_all_keyword_categories() {
        let schema = json!({
            "properties": { "a": { "type": "string" } },
            "patternProperties": { "^x-": { "type": "string" } },
            "$defs": { "D": { "type": "integer" } },
            "additionalProperties": { "type": "string" },
            "not": { "type": "null" },
            "if": { "type": "object" },
            "then": { "type": "string" },
            "else": { "type": "integer" },
            "contains": { "type": "number" },
            "anyOf": [{ "type": "string" }, { "type": "integer" }],
            "oneOf": [{ "type": "boolean" }],
            "allOf": [{ "type": "object" }],
            "items": { "type": "number" }
        });

        // 1 root + 3 records + 6 subs + 4 array elements + 1 items = 15
        assert_eq!(collect_pointers(schema).len(), 15);
    }

    #[test]
    fn test_post_order_root_last() {
        let schema = json!({
            "properties": {
                "a": { "allOf": [{ "type": "string" }] }
            }
        });

        let pointers = collect_pointers(schema);
        assert_eq!(
            pointers,
            vec![
                "#/properties/a/allOf/0".to_string(),
                "#/properties/a".to_string(),
                "#".to_string(),
            ]
        );
    }

    #[test]
    fn test_context_paths() {
        let schema = json!({
            "properties": {
                "a/b": {
                    "items": { "oneOf": [true, { "type": "null" }] }
                }
            }
        });

        let mut contexts = Vec::new();
        let mut visitor = |schema: Value, ctx: &TraverserContext| -> Result<Value, MergeError> {
            contexts.push(ctx.clone());
            Ok(schema)
        };
        SchemaTraverser::new(50)
            .traverse(schema, &mut visitor)
            .unwrap();

        // oneOf/1 is the second visited node.
        match &contexts[1] {
            TraverserContext::Array {
                keyword,
                index,
                path,
                pointer,
            } => {
                assert_eq!(*keyword, "oneOf");
                assert_eq!(*index, 1);
                assert_eq!(
                    path,
                    &vec![PathSegment::Key("a/b".to_string()), PathSegment::Index(1)]
                );
                assert_eq!(pointer, "#/properties/a~1b/items/oneOf/1");
            }
            other => panic!("expected array context, got {other:?}"),
        }

        // items leaves the path unchanged.
        match &contexts[2] {
            TraverserContext::Sub { keyword, path, .. } => {
                assert_eq!(*keyword, "items");
                assert_eq!(path, &vec![PathSegment::Key("a/b".to_string())]);
            }
            other => panic!("expected sub context, got {other:?}"),
        }

        assert!(matches!(contexts[3], TraverserContext::Record { .. }));
        assert_eq!(contexts[4], TraverserContext::Root);
        assert_eq!(contexts[4].keyword(), None);
    }

    #[test]
    fn test_replacement_substituted_in_place() {
        let schema = json!({
            "anyOf": [{ "type": "string" }, { "type": "integer" }],
            "properties": { "x": { "type": "boolean" } }
        });

        let mut visitor = |schema: Value, ctx: &TraverserContext| -> Result<Value, MergeError> {
            if ctx.keyword() == Some("anyOf") {
                Ok(json!({ "replaced": ctx.pointer() }))
            } else {
                Ok(schema)
            }
        };

        let result = SchemaTraverser::new(50)
            .traverse(schema, &mut visitor)
            .unwrap();

        assert_eq!(
            result["anyOf"],
            json!([{ "replaced": "#/anyOf/0" }, { "replaced": "#/anyOf/1" }])
        );
        assert_eq!(result["properties"]["x"], json!({ "type": "boolean" }));
    }

    #[test]
    fn test_items_tuple_form() {
        let schema = json!({ "items": [{ "type": "string" }, { "type": "integer" }] });
        let pointers = collect_pointers(schema);
        assert_eq!(pointers, vec!["#/items/0", "#/items/1", "#"]);
    }

    #[test]
    fn test_non_schema_values_preserved() {
        let schema = json!({
            "additionalProperties": false,
            "items": true,
            "properties": "not-a-map"
        });
        let result = SchemaTraverser::new(50)
            .traverse(schema.clone(), &mut identity)
            .unwrap();
        assert_eq!(result, schema);
        assert_eq!(collect_pointers(schema), vec!["#"]);
    }

    #[test]
    fn test_depth_limit_fails_fast() {
        let schema = json!({ "not": { "not": { "not": { "type": "string" } } } });

        let err = SchemaTraverser::new(2)
            .traverse(schema, &mut identity)
            .unwrap_err();
        match err {
            MergeError::UnboundedRecursion { path, max_depth } => {
                assert_eq!(path, "#/not/not/not");
                assert_eq!(max_depth, 2);
            }
            other => panic!("expected recursion error, got {other:?}"),
        }
    }

    #[test]
    fn test_boolean_root_visited() {
        assert_eq!(collect_pointers(json!(true)), vec!["#"]);
    }
}
