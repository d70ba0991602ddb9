//! Shallow and deep `allOf` elimination.
//!
//! [`ShallowAllOfMerge`] rewrites a single node: its own `allOf` and the
//! `allOf` of its direct `oneOf`/`anyOf` branches. [`DeepAllOfMerge`] runs
//! the shallow merge on every node of a document, children before parents.

use serde_json::Value;

use super::checks::CheckFailure;
use super::{MergeResult, Merger};
use crate::config::FailurePolicy;
use crate::error::MergeError;
use crate::schema_utils::build_path;
use crate::traverse::{SchemaTraverser, TraverserContext};

const BRANCH_KEYWORDS: &[&str] = &["oneOf", "anyOf"];

// ---------------------------------------------------------------------------
// Shallow
// ---------------------------------------------------------------------------

/// Merges the `allOf` of one node. Nested schemas such as
/// `properties.x.allOf` are left untouched.
#[derive(Debug, Clone, Default)]
pub struct ShallowAllOfMerge {
    merger: Merger,
}

pub fn create_shallow_all_of_merge(merger: Merger) -> ShallowAllOfMerge {
    ShallowAllOfMerge { merger }
}

impl ShallowAllOfMerge {
    pub fn merger(&self) -> &Merger {
        &self.merger
    }

    /// Merge the root node of `schema`.
    pub fn merge(&self, schema: Value) -> Result<MergeResult, MergeError> {
        self.merge_at(schema, "#")
    }

    /// Merge one node, reporting failures relative to `path`.
    pub fn merge_at(&self, schema: Value, path: &str) -> Result<MergeResult, MergeError> {
        let Value::Object(mut obj) = schema else {
            return Ok(MergeResult::schema_only(schema));
        };

        let mut advisories = Vec::new();
        for keyword in BRANCH_KEYWORDS {
            match obj.remove(*keyword) {
                Some(Value::Array(branches)) => {
                    let branch_path = build_path(path, &[*keyword]);
                    let branches = self.merge_branches(branches, &branch_path, &mut advisories)?;
                    obj.insert(keyword.to_string(), Value::Array(branches));
                }
                Some(other) => {
                    obj.insert(keyword.to_string(), other);
                }
                None => {}
            }
        }

        if !obj.contains_key("allOf") {
            return Ok(MergeResult {
                schema: Value::Object(obj),
                advisories,
            });
        }

        let mut merged = self.merger.merge_at(vec![Value::Object(obj)], path)?;
        advisories.append(&mut merged.advisories);
        merged.advisories = advisories;
        Ok(merged)
    }

    fn merge_branches(
        &self,
        branches: Vec<Value>,
        path: &str,
        advisories: &mut Vec<CheckFailure>,
    ) -> Result<Vec<Value>, MergeError> {
        let mut out = Vec::with_capacity(branches.len());
        for (i, branch) in branches.into_iter().enumerate() {
            if !needs_merge(&branch) {
                out.push(branch);
                continue;
            }
            let branch_path = build_path(path, &[&i.to_string()]);
            let merged = self.merger.merge_at(vec![branch], &branch_path)?;
            advisories.extend(merged.advisories);
            out.push(merged.schema);
        }
        Ok(out)
    }
}

fn needs_merge(schema: &Value) -> bool {
    schema.as_object().is_some_and(|obj| obj.contains_key("allOf"))
}

// ---------------------------------------------------------------------------
// Deep
// ---------------------------------------------------------------------------

/// Eliminates `allOf` throughout a document.
#[derive(Debug, Clone, Default)]
pub struct DeepAllOfMerge {
    shallow: ShallowAllOfMerge,
}

pub fn create_deep_all_of_merge(shallow: ShallowAllOfMerge) -> DeepAllOfMerge {
    DeepAllOfMerge { shallow }
}

impl DeepAllOfMerge {
    pub fn shallow(&self) -> &ShallowAllOfMerge {
        &self.shallow
    }

    /// Merge every `allOf` in `schema`, innermost first.
    ///
    /// Under [`FailurePolicy::PassThrough`] a node whose merge fails a check
    /// is kept as it was and the failure is returned as an advisory.
    /// Depth-limit failures always abort.
    pub fn merge(&self, schema: Value) -> Result<MergeResult, MergeError> {
        let options = self.shallow.merger.options();
        let pass_through = options.on_failure == FailurePolicy::PassThrough;
        let mut advisories: Vec<CheckFailure> = Vec::new();

        let mut visit = |node: Value, ctx: &TraverserContext| -> Result<Value, MergeError> {
            if !needs_merge(&node) && !has_branch_all_of(&node) {
                return Ok(node);
            }
            let original = pass_through.then(|| node.clone());

            match (self.shallow.merge_at(node, ctx.pointer()), original) {
                (Ok(merged), _) => {
                    advisories.extend(merged.advisories);
                    Ok(merged.schema)
                }
                (
                    Err(MergeError::Check {
                        check,
                        path,
                        message,
                    }),
                    Some(original),
                ) => {
                    tracing::debug!(%check, path = %path, "merge failed, passing subtree through");
                    advisories.push(CheckFailure {
                        check,
                        path,
                        message,
                    });
                    Ok(original)
                }
                (Err(e), _) => Err(e),
            }
        };

        let schema = SchemaTraverser::new(options.max_depth).traverse(schema, &mut visit)?;
        Ok(MergeResult { schema, advisories })
    }
}

fn has_branch_all_of(schema: &Value) -> bool {
    BRANCH_KEYWORDS.iter().any(|keyword| {
        schema
            .get(*keyword)
            .and_then(Value::as_array)
            .is_some_and(|branches| branches.iter().any(needs_merge))
    })
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MergeOptions;
    use crate::merge::checks::CheckName;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn shallow() -> ShallowAllOfMerge {
        create_shallow_all_of_merge(Merger::default())
    }

    fn deep_with(options: MergeOptions) -> DeepAllOfMerge {
        create_deep_all_of_merge(create_shallow_all_of_merge(Merger::new(options)))
    }

    #[test]
    fn test_shallow_siblings_are_first_fragment() {
        let out = shallow()
            .merge(json!({
                "title": "Base",
                "allOf": [{ "title": "Override", "type": "object" }]
            }))
            .unwrap();
        assert_eq!(out.schema, json!({ "title": "Override", "type": "object" }));
    }

    #[test]
    fn test_shallow_leaves_nested_all_of() {
        let schema = json!({
            "properties": { "x": { "allOf": [{ "type": "string" }] } }
        });
        let out = shallow().merge(schema.clone()).unwrap();
        assert_eq!(out.schema, schema);
    }

    #[test]
    fn test_shallow_normalizes_branches() {
        let out = shallow()
            .merge(json!({
                "oneOf": [
                    { "allOf": [{ "type": "integer" }, { "minimum": 0 }] },
                    { "type": "null" }
                ]
            }))
            .unwrap();
        assert_eq!(
            out.schema,
            json!({ "oneOf": [{ "type": "integer", "minimum": 0 }, { "type": "null" }] })
        );
    }

    #[test]
    fn test_shallow_branch_failure_reports_branch_path() {
        let err = shallow()
            .merge(json!({
                "anyOf": [
                    { "type": "null" },
                    { "allOf": [{ "type": "string" }, { "type": "array" }] }
                ]
            }))
            .unwrap_err();
        assert_eq!(err.path(), Some("#/anyOf/1"));
    }

    #[test]
    fn test_shallow_non_object_unchanged() {
        assert_eq!(shallow().merge(json!(true)).unwrap().schema, json!(true));
    }

    #[test]
    fn test_deep_merges_nested_nodes() {
        let out = deep_with(MergeOptions::default())
            .merge(json!({
                "type": "object",
                "properties": {
                    "name": { "allOf": [{ "type": "string" }, { "maxLength": 8 }] },
                    "tags": {
                        "type": "array",
                        "items": { "allOf": [{ "minLength": 1 }, { "type": "string" }] }
                    }
                }
            }))
            .unwrap();
        assert_eq!(
            out.schema,
            json!({
                "type": "object",
                "properties": {
                    "name": { "type": "string", "maxLength": 8 },
                    "tags": {
                        "type": "array",
                        "items": { "minLength": 1, "type": "string" }
                    }
                }
            })
        );
        assert!(out.advisories.is_empty());
    }

    #[test]
    fn test_deep_merges_inner_all_of_first() {
        let out = deep_with(MergeOptions::default())
            .merge(json!({
                "allOf": [
                    { "properties": { "a": { "allOf": [{ "minimum": 1 }, { "minimum": 4 }] } } },
                    { "properties": { "a": { "maximum": 10 } } }
                ]
            }))
            .unwrap();
        assert_eq!(
            out.schema,
            json!({ "properties": { "a": { "minimum": 4, "maximum": 10 } } })
        );
    }

    #[test]
    fn test_deep_abort_surfaces_pointer() {
        let err = deep_with(MergeOptions::default())
            .merge(json!({
                "$defs": {
                    "bad": { "allOf": [{ "type": "string" }, { "type": "integer" }] }
                }
            }))
            .unwrap_err();
        assert_eq!(err.check(), Some(CheckName::IncompatibleTypes));
        assert_eq!(err.path(), Some("#/$defs/bad"));
    }

    #[test]
    fn test_deep_pass_through_keeps_failing_subtree() {
        let bad = json!({ "allOf": [{ "type": "string" }, { "type": "integer" }] });
        let out = deep_with(MergeOptions {
            on_failure: FailurePolicy::PassThrough,
            ..MergeOptions::default()
        })
        .merge(json!({
            "properties": {
                "bad": bad.clone(),
                "good": { "allOf": [{ "type": "string" }] }
            }
        }))
        .unwrap();

        assert_eq!(
            out.schema,
            json!({ "properties": { "bad": bad, "good": { "type": "string" } } })
        );
        assert_eq!(out.advisories.len(), 1);
        assert_eq!(out.advisories[0].check, CheckName::IncompatibleTypes);
        assert_eq!(out.advisories[0].path, "#/properties/bad");
    }

    #[test]
    fn test_deep_best_effort_never_fails_checks() {
        let out = deep_with(MergeOptions::best_effort())
            .merge(json!({ "allOf": [{ "enum": [1] }, { "enum": [2] }] }))
            .unwrap();
        assert_eq!(out.schema, json!({ "enum": [] }));
    }

    #[test]
    fn test_deep_depth_limit() {
        let err = deep_with(MergeOptions {
            max_depth: 2,
            on_failure: FailurePolicy::PassThrough,
            ..MergeOptions::default()
        })
        .merge(json!({ "not": { "not": { "not": { "type": "string" } } } }))
        .unwrap_err();
        assert!(matches!(err, MergeError::UnboundedRecursion { .. }));
    }

    #[test]
    fn test_deep_collects_residual_advisories() {
        let out = deep_with(MergeOptions::default())
            .merge(json!({
                "items": { "allOf": [{ "pattern": "^a" }, { "pattern": "z$" }] }
            }))
            .unwrap();
        assert_eq!(
            out.schema,
            json!({ "items": { "allOf": [{ "pattern": "^a" }, { "pattern": "z$" }] } })
        );
        assert_eq!(out.advisories.len(), 1);
        assert_eq!(out.advisories[0].path, "#/items");
    }

    #[test]
    fn test_mergers_are_thread_safe() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Merger>();
        assert_send_sync::<ShallowAllOfMerge>();
        assert_send_sync::<DeepAllOfMerge>();
    }
}
