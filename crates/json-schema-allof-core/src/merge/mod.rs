//! allOf merging: the keyword algebra, the check pipeline and the shallow
//! and deep compositions built on top of it.
//!
//! Merge semantics follow JSON Schema's `allOf` definition: a value must
//! satisfy ALL sub-schemas simultaneously. Constraints tighten (not loosen),
//! types narrow (not widen), and value sets intersect.

pub mod all_of;
mod bounds;
pub mod checks;
mod keywords;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::array::{create_deduplicator, create_intersector, DedupeFn, IntersectFn};
use crate::compare::{compare_definitions, compare_values};
use crate::config::MergeOptions;
use crate::error::MergeError;
use checks::CheckFailure;

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

/// Outcome of a successful merge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeResult {
    /// The merged schema definition.
    pub schema: Value,
    /// Non-fatal check outcomes raised while merging.
    pub advisories: Vec<CheckFailure>,
}

impl MergeResult {
    /// Create a result with only a schema (no advisories).
    pub fn schema_only(schema: Value) -> Self {
        Self {
            schema,
            advisories: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Merger
// ---------------------------------------------------------------------------

/// Merges arrays of schema definitions under the configured checks.
///
/// Comparison strategies are injected as function values; the defaults use
/// [`compare_values`] for `enum`/`const` intersection and
/// [`compare_definitions`] for deduplicating sub-schema lists.
#[derive(Clone)]
pub struct Merger {
    pub(crate) options: MergeOptions,
    pub(crate) intersect_json: IntersectFn,
    pub(crate) dedupe_schema_defs: DedupeFn,
}

impl fmt::Debug for Merger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Merger")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Default for Merger {
    fn default() -> Self {
        Self::new(MergeOptions::default())
    }
}

/// Create a merger with the default comparison strategies.
pub fn create_merger(options: MergeOptions) -> Merger {
    Merger::new(options)
}

impl Merger {
    pub fn new(options: MergeOptions) -> Self {
        Self {
            options,
            intersect_json: Arc::new(create_intersector(compare_values)),
            dedupe_schema_defs: Arc::new(create_deduplicator(compare_definitions)),
        }
    }

    /// Replace the intersector used for `enum`/`const` value sets.
    pub fn with_intersector(mut self, intersect_json: IntersectFn) -> Self {
        self.intersect_json = intersect_json;
        self
    }

    /// Replace the deduplicator used for sub-schema lists.
    pub fn with_deduplicator(mut self, dedupe_schema_defs: DedupeFn) -> Self {
        self.dedupe_schema_defs = dedupe_schema_defs;
        self
    }

    pub fn options(&self) -> &MergeOptions {
        &self.options
    }

    /// Merge `defs` as if they were the members of one `allOf`.
    ///
    /// Consumes the definitions; clone them first if they are needed again.
    /// An empty list yields `true`.
    pub fn merge_array_of_schema_definitions(
        &self,
        defs: Vec<Value>,
    ) -> Result<MergeResult, MergeError> {
        self.merge_at(defs, "#")
    }

    /// Like [`merge_array_of_schema_definitions`](Self::merge_array_of_schema_definitions),
    /// reporting failures relative to the schema pointer `path`.
    pub fn merge_at(&self, defs: Vec<Value>, path: &str) -> Result<MergeResult, MergeError> {
        let mut advisories = Vec::new();
        let schema = self.merge_all(defs, path, 0, &mut advisories)?;
        Ok(MergeResult { schema, advisories })
    }

    /// Left-to-right pairwise reduction over flattened definitions.
    pub(crate) fn merge_all(
        &self,
        defs: Vec<Value>,
        path: &str,
        depth: usize,
        advisories: &mut Vec<CheckFailure>,
    ) -> Result<Value, MergeError> {
        let mut flat = Vec::with_capacity(defs.len());
        self.flatten_all_of(defs, path, depth, &mut flat)?;

        let mut iter = flat.into_iter();
        let Some(mut acc) = iter.next() else {
            return Ok(Value::Bool(true));
        };
        for overlay in iter {
            acc = self.merge_two(acc, overlay, path, depth, advisories)?;
        }
        Ok(acc)
    }

    /// A copy of this merger with every check disabled.
    pub(crate) fn best_effort(&self) -> Merger {
        Merger {
            options: MergeOptions {
                checks: Vec::new(),
                ..self.options.clone()
            },
            ..self.clone()
        }
    }

    /// Expand nested `allOf` members: a definition carrying `allOf`
    /// contributes its sibling keywords followed by its members.
    fn flatten_all_of(
        &self,
        defs: Vec<Value>,
        path: &str,
        depth: usize,
        out: &mut Vec<Value>,
    ) -> Result<(), MergeError> {
        self.guard_depth(path, depth)?;
        for def in defs {
            match def {
                Value::Object(mut obj) => match obj.remove("allOf") {
                    Some(Value::Array(members)) => {
                        out.push(Value::Object(obj));
                        self.flatten_all_of(members, path, depth + 1, out)?;
                    }
                    Some(other) => {
                        obj.insert("allOf".to_string(), other);
                        out.push(Value::Object(obj));
                    }
                    None => out.push(Value::Object(obj)),
                },
                other => out.push(other),
            }
        }
        Ok(())
    }

    pub(crate) fn guard_depth(&self, path: &str, depth: usize) -> Result<(), MergeError> {
        if depth > self.options.max_depth {
            return Err(MergeError::UnboundedRecursion {
                path: path.to_string(),
                max_depth: self.options.max_depth,
            });
        }
        Ok(())
    }
}

// ===========================================================================
// Tests
// ===========================================================================
