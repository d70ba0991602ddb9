//! # json-schema-allof-core
//!
//! Eliminates `allOf` from JSON Schema documents by merging each list of
//! sub-schemas into one equivalent definition.
//!
//! The building blocks are layered: a semantic [`Comparator`], order-preserving
//! array utilities, the pairwise [`Merger`] with its configurable checks, and
//! the [`ShallowAllOfMerge`] / [`DeepAllOfMerge`] compositions. Deep merge is
//! driven by the [`SchemaTraverser`], which walks every nested schema
//! location post-order.
//!
//! ```
//! use json_schema_allof_core::{
//!     create_deep_all_of_merge, create_merger, create_shallow_all_of_merge, MergeOptions,
//! };
//! use serde_json::json;
//!
//! let deep = create_deep_all_of_merge(create_shallow_all_of_merge(create_merger(
//!     MergeOptions::default(),
//! )));
//! let out = deep
//!     .merge(json!({
//!         "allOf": [
//!             { "type": "string", "minLength": 1 },
//!             { "type": "string", "maxLength": 5 }
//!         ]
//!     }))
//!     .unwrap();
//! assert_eq!(out.schema, json!({ "type": "string", "minLength": 1, "maxLength": 5 }));
//! ```

pub mod array;
pub mod compare;
pub mod config;
pub mod error;
pub mod merge;
pub mod schema_utils;
pub mod traverse;

pub use array::{create_deduplicator, create_intersector, DedupeFn, IntersectFn};
pub use compare::{compare_definitions, compare_values, create_comparator, Comparator};
pub use config::{FailurePolicy, MergeOptions};
pub use error::{ErrorCode, MergeError};
pub use merge::all_of::{
    create_deep_all_of_merge, create_shallow_all_of_merge, DeepAllOfMerge, ShallowAllOfMerge,
};
pub use merge::checks::{CheckFailure, CheckName};
pub use merge::{create_merger, MergeResult, Merger};
pub use schema_utils::{build_path, escape_pointer_segment};
pub use traverse::{PathSegment, SchemaTraverser, SchemaVisitor, TraverserContext};
