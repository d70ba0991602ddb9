//! Order-preserving deduplication and intersection under a custom comparator.

use std::sync::Arc;

use serde_json::Value;

/// Type-erased deduplicator over schema definitions, as stored by the merger.
pub type DedupeFn = Arc<dyn Fn(&[Value]) -> Vec<Value> + Send + Sync>;

/// Type-erased intersector over JSON values, as stored by the merger.
pub type IntersectFn = Arc<dyn Fn(&[Value], &[Value]) -> Vec<Value> + Send + Sync>;

/// Build a deduplicator that keeps the first occurrence of each element
/// under `cmp`. Survivors keep their relative order.
///
/// # Example
/// ```
/// use json_schema_allof_core::{compare_values, create_deduplicator};
/// use serde_json::json;
///
/// let dedupe = create_deduplicator(compare_values);
/// assert_eq!(dedupe(&[json!(1), json!(1.0), json!("1")]), vec![json!(1), json!("1")]);
/// ```
pub fn create_deduplicator<T, C>(cmp: C) -> impl Fn(&[T]) -> Vec<T>
where
    T: Clone,
    C: Fn(&T, &T) -> bool,
{
    move |items: &[T]| {
        let mut kept: Vec<T> = Vec::with_capacity(items.len());
        for item in items {
            if !kept.iter().any(|existing| cmp(existing, item)) {
                kept.push(item.clone());
            }
        }
        kept
    }
}

/// Build an intersector returning the elements of `a` that match at least
/// one element of `b` under `cmp`, deduplicated, in `a`'s order.
pub fn create_intersector<T, C>(cmp: C) -> impl Fn(&[T], &[T]) -> Vec<T>
where
    T: Clone,
    C: Fn(&T, &T) -> bool,
{
    move |a: &[T], b: &[T]| {
        let mut kept: Vec<T> = Vec::new();
        for item in a {
            if b.iter().any(|other| cmp(item, other))
                && !kept.iter().any(|existing| cmp(existing, item))
            {
                kept.push(item.clone());
            }
        }
        kept
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::{compare_definitions, compare_values};
    use serde_json::json;

    #[test]
    fn test_dedupe_keeps_first_occurrence_in_order() {
        let dedupe = create_deduplicator(|a: &i32, b: &i32| a == b);
        assert_eq!(dedupe(&[3, 1, 3, 2, 1]), vec![3, 1, 2]);
    }

    #[test]
    fn test_dedupe_semantic_values() {
        let dedupe = create_deduplicator(compare_values);
        let input = vec![
            json!("foo"),
            json!({"bar": "baz"}),
            json!("foo"),
            json!({"bar": "baz"}),
        ];
        assert_eq!(dedupe(&input), vec![json!("foo"), json!({"bar": "baz"})]);
    }

    #[test]
    fn test_dedupe_boolean_and_object_definitions() {
        let dedupe = create_deduplicator(compare_definitions);
        assert_eq!(dedupe(&[json!({}), json!(true)]), vec![json!({})]);
    }

    #[test]
    fn test_dedupe_empty() {
        let dedupe = create_deduplicator(compare_values);
        assert!(dedupe(&[]).is_empty());
    }

    #[test]
    fn test_intersect_follows_first_operand_order() {
        let intersect = create_intersector(|a: &i32, b: &i32| a == b);
        assert_eq!(intersect(&[4, 1, 2, 3], &[3, 2, 9]), vec![2, 3]);
    }

    #[test]
    fn test_intersect_deduplicates() {
        let intersect = create_intersector(compare_values);
        let a = vec![json!("a"), json!("a"), json!(1)];
        let b = vec![json!(1.0), json!("a")];
        assert_eq!(intersect(&a, &b), vec![json!("a"), json!(1)]);
    }

    #[test]
    fn test_intersect_disjoint_is_empty() {
        let intersect = create_intersector(compare_values);
        assert!(intersect(&[json!("x")], &[json!("y")]).is_empty());
    }

    #[test]
    fn test_erased_aliases_accept_factories() {
        let dedupe: DedupeFn = Arc::new(create_deduplicator(compare_definitions));
        let intersect: IntersectFn = Arc::new(create_intersector(compare_values));
        assert_eq!(dedupe(&[json!(true), json!({})]).len(), 1);
        assert_eq!(intersect(&[json!(1)], &[json!(1)]), vec![json!(1)]);
    }
}
