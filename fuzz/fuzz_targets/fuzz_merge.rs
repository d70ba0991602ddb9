#![no_main]

use json_schema_allof_core::{
    create_deep_all_of_merge, create_merger, create_shallow_all_of_merge, MergeOptions,
};
use libfuzzer_sys::fuzz_target;

// Accepts arbitrary bytes, attempts to parse as JSON, feeds the result to a
// best-effort deep merge. Goal: no panics and no check failures.
fuzz_target!(|data: &[u8]| {
    if let Ok(schema) = serde_json::from_slice::<serde_json::Value>(data) {
        let deep = create_deep_all_of_merge(create_shallow_all_of_merge(create_merger(
            MergeOptions::best_effort(),
        )));
        if let Err(e) = deep.merge(schema) {
            assert!(e.check().is_none(), "best-effort merge failed a check: {e}");
        }
    }
});
