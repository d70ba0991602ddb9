//! Pairwise merge of two schema definitions, keyword by keyword.
//!
//! Each step collects its conflicts in a [`Step`] while always producing a
//! best-effort value; [`settle`] decides at the end whether the step fails.
//! Keywords that cannot be combined soundly are moved into residual `allOf`
//! fragments rather than dropped.

use std::collections::HashMap;

use regex::Regex;
use serde_json::{Map, Value};

use super::bounds::{
    bound_direction, collapse_numeric_bounds, find_empty_range, least_common_multiple, tighten,
};
use super::checks::{settle, CheckFailure, CheckName};
use super::Merger;
use crate::compare::compare_values;
use crate::error::MergeError;
use crate::schema_utils::{
    build_path, extract_type_strings, is_false, is_trivially_true, single_keyword,
};

/// Annotations where the overlay's value replaces the base's.
const OVERLAY_WINS: &[&str] = &[
    "title",
    "default",
    "examples",
    "$comment",
    "deprecated",
    "readOnly",
    "writeOnly",
    "$schema",
    "$id",
];

/// Keywords that only mean something together. When both sides carry a
/// group and the groups differ, each side's group becomes one fragment.
const COUPLED_GROUPS: &[&[&str]] = &[
    &["if", "then", "else"],
    &["contains", "minContains", "maxContains"],
];

/// Tuple validation: `additionalItems` depends on its sibling array `items`.
const TUPLE_GROUP: &[&str] = &["items", "additionalItems"];

/// Draft 4 bounds: a boolean exclusive keyword qualifies its sibling.
const DRAFT4_GROUPS: &[(&str, &[&str])] = &[
    ("exclusiveMinimum", &["minimum", "exclusiveMinimum"]),
    ("exclusiveMaximum", &["maximum", "exclusiveMaximum"]),
];

// ---------------------------------------------------------------------------
// Step bookkeeping
// ---------------------------------------------------------------------------

/// Conflicts and residual fragments of one merge step.
struct Step<'p> {
    path: &'p str,
    conflicts: Vec<CheckFailure>,
    fragments: Vec<Value>,
}

impl<'p> Step<'p> {
    fn new(path: &'p str) -> Self {
        Self {
            path,
            conflicts: Vec::new(),
            fragments: Vec::new(),
        }
    }

    fn conflict(&mut self, check: CheckName, message: impl Into<String>) {
        self.conflicts.push(CheckFailure::new(check, self.path, message));
    }

    /// Keep `key` from both sides as separate fragments. Always yields `None`
    /// so callers can drop the keyword from the merged object.
    fn residual(&mut self, key: &str, base: Value, overlay: Value) -> Option<Value> {
        self.fragments.push(single_keyword(key, base));
        self.fragments.push(single_keyword(key, overlay));
        self.conflict(
            CheckName::ResidualFragment,
            format!("'{key}' values differ and were kept as allOf fragments"),
        );
        None
    }

    /// A later operand's value for a keyword that already lives in a
    /// fragment joins the fragments too.
    fn append_fragment(&mut self, fragment: Value, label: &str) {
        self.fragments.push(fragment);
        self.conflict(
            CheckName::ResidualFragment,
            format!("{label} joined existing allOf fragments"),
        );
    }

    fn residual_group(
        &mut self,
        label: &str,
        base: Map<String, Value>,
        overlay: Map<String, Value>,
    ) {
        self.fragments.push(Value::Object(base));
        self.fragments.push(Value::Object(overlay));
        self.conflict(
            CheckName::ResidualFragment,
            format!("{label} differ and were kept as allOf fragments"),
        );
    }
}

// ---------------------------------------------------------------------------
// Value sets and object keywords
// ---------------------------------------------------------------------------

/// The values an `enum` and/or `const` admit.
struct ValueSet {
    values: Vec<Value>,
    from_const: bool,
}

fn has_value_set(obj: &Map<String, Value>) -> bool {
    obj.contains_key("enum") || obj.contains_key("const")
}

/// `patternProperties` keys compiled once per merge step. Keys the regex
/// engine rejects (lookaround, backreferences) keep their compile error.
type RegexCache = HashMap<String, Result<Regex, String>>;

fn compile_patterns(patterns: Option<&Map<String, Value>>) -> RegexCache {
    patterns
        .into_iter()
        .flat_map(|p| p.keys())
        .map(|pattern| {
            let compiled = Regex::new(pattern).map_err(|e| e.to_string());
            if let Err(error) = &compiled {
                tracing::debug!(%pattern, %error, "patternProperties key not supported by the regex engine");
            }
            (pattern.clone(), compiled)
        })
        .collect()
}

/// `properties`, `patternProperties` and `additionalProperties` of one side.
#[derive(Default)]
struct ObjectKeywords {
    properties: Option<Map<String, Value>>,
    pattern_properties: Option<Map<String, Value>>,
    additional: Option<Value>,
    regex_cache: RegexCache,
}

impl ObjectKeywords {
    /// Remove the well-formed object keywords from `obj`. Malformed values
    /// stay behind for the generic keyword rules.
    fn take(obj: &mut Map<String, Value>) -> Self {
        let additional = if obj
            .get("additionalProperties")
            .is_some_and(|v| v.is_object() || v.is_boolean())
        {
            obj.remove("additionalProperties")
        } else {
            None
        };
        let pattern_properties = take_map(obj, "patternProperties");
        Self {
            properties: take_map(obj, "properties"),
            regex_cache: compile_patterns(pattern_properties.as_ref()),
            pattern_properties,
            additional,
        }
    }

    /// Whether some pattern of this side cannot be evaluated, so a property
    /// name it might match cannot be classified.
    fn has_unsupported_patterns(&self) -> bool {
        self.regex_cache.values().any(Result::is_err)
    }

    /// Whether `other` declares a property this side does not.
    fn lacks_properties_of(&self, other: &ObjectKeywords) -> bool {
        let Some(theirs) = &other.properties else {
            return false;
        };
        theirs.keys().any(|name| {
            !self
                .properties
                .as_ref()
                .is_some_and(|ours| ours.contains_key(name))
        })
    }

    /// Whether `other` declares patterns this side does not know about.
    fn misses_patterns_of(&self, other: &ObjectKeywords) -> bool {
        let Some(theirs) = &other.pattern_properties else {
            return false;
        };
        theirs.keys().any(|pattern| {
            !self
                .pattern_properties
                .as_ref()
                .is_some_and(|ours| ours.contains_key(pattern))
        })
    }

    /// Move a restrictive `additionalProperties` out into a standalone
    /// fragment that keeps its scope.
    fn detach_additional(&mut self) -> Option<Value> {
        if self.additional.as_ref().map_or(true, is_trivially_true) {
            return None;
        }
        let additional = self.additional.take()?;
        let mut fragment = Map::new();
        if let Some(props) = &self.properties {
            let scope = props.keys().map(|k| (k.clone(), Value::Bool(true))).collect();
            fragment.insert("properties".to_string(), Value::Object(scope));
        }
        if let Some(patterns) = &self.pattern_properties {
            let scope = patterns
                .keys()
                .map(|k| (k.clone(), Value::Bool(true)))
                .collect();
            fragment.insert("patternProperties".to_string(), Value::Object(scope));
        }
        fragment.insert("additionalProperties".to_string(), additional);
        Some(Value::Object(fragment))
    }

    /// Schemas this side applies to a property it does not declare.
    fn constraints_for(&self, name: &str) -> Vec<Value> {
        let mut out = Vec::new();
        if let Some(patterns) = &self.pattern_properties {
            for (pattern, schema) in patterns {
                if let Some(Ok(re)) = self.regex_cache.get(pattern) {
                    if re.is_match(name) {
                        out.push(schema.clone());
                    }
                }
            }
        }
        if out.is_empty() && !self.has_unsupported_patterns() {
            if let Some(additional) = &self.additional {
                out.push(additional.clone());
            }
        }
        out
    }
}

fn detach_unscoped_additional(
    side: &mut ObjectKeywords,
    other: &ObjectKeywords,
    step: &mut Step<'_>,
) {
    let message = if side.misses_patterns_of(other) {
        "additionalProperties kept as an allOf fragment next to unknown patternProperties"
    } else if side.has_unsupported_patterns() && side.lacks_properties_of(other) {
        "additionalProperties kept as an allOf fragment: its patternProperties use syntax the regex engine cannot evaluate"
    } else {
        return;
    };
    if let Some(fragment) = side.detach_additional() {
        step.fragments.push(fragment);
        step.conflict(CheckName::ResidualFragment, message);
    }
}

fn take_map(obj: &mut Map<String, Value>, key: &str) -> Option<Map<String, Value>> {
    if !obj.get(key).is_some_and(Value::is_object) {
        return None;
    }
    match obj.remove(key) {
        Some(Value::Object(map)) => Some(map),
        _ => None,
    }
}

fn take_group(obj: &mut Map<String, Value>, group: &[&str]) -> Map<String, Value> {
    group
        .iter()
        .filter_map(|k| obj.remove(*k).map(|v| (k.to_string(), v)))
        .collect()
}

fn has_any(obj: &Map<String, Value>, group: &[&str]) -> bool {
    group.iter().any(|k| obj.contains_key(*k))
}

/// Whether a member of `obj`'s `allOf` constrains `key`.
fn fragments_mention(obj: &Map<String, Value>, key: &str) -> bool {
    obj.get("allOf")
        .and_then(Value::as_array)
        .is_some_and(|members| members.iter().any(|m| m.get(key).is_some()))
}

// ---------------------------------------------------------------------------
// Pairwise merge
// ---------------------------------------------------------------------------

impl Merger {
    /// Merge two definitions into one that admits exactly the instances both
    /// admit, as far as the keyword algebra allows.
    pub(crate) fn merge_two(
        &self,
        base: Value,
        overlay: Value,
        path: &str,
        depth: usize,
        advisories: &mut Vec<CheckFailure>,
    ) -> Result<Value, MergeError> {
        self.guard_depth(path, depth)?;

        if is_false(&base) || is_false(&overlay) {
            return Ok(Value::Bool(false));
        }
        if is_trivially_true(&overlay) {
            return Ok(base);
        }
        if is_trivially_true(&base) {
            return Ok(overlay);
        }
        match (base, overlay) {
            (Value::Object(b), Value::Object(o)) => {
                self.merge_objects(b, o, path, depth, advisories)
            }
            (base, _) => Ok(base),
        }
    }

    fn merge_objects(
        &self,
        mut result: Map<String, Value>,
        mut overlay: Map<String, Value>,
        path: &str,
        depth: usize,
        advisories: &mut Vec<CheckFailure>,
    ) -> Result<Value, MergeError> {
        let mut step = Step::new(path);

        // Keyword families merged jointly are lifted out before the
        // per-keyword pass.
        let value_sets = if has_value_set(&result) && has_value_set(&overlay) {
            Some((
                self.take_value_set(&mut result),
                self.take_value_set(&mut overlay),
            ))
        } else {
            None
        };
        let base_object = ObjectKeywords::take(&mut result);
        let overlay_object = ObjectKeywords::take(&mut overlay);
        split_coupled_groups(&mut result, &mut overlay, &mut step);

        for (key, value) in overlay {
            let Some(existing) = result.remove(&key) else {
                if key != "allOf" && fragments_mention(&result, &key) {
                    let label = format!("'{key}'");
                    step.append_fragment(single_keyword(&key, value), &label);
                } else {
                    result.insert(key, value);
                }
                continue;
            };
            let merged =
                self.merge_keyword(&key, existing, value, depth, &mut step, advisories)?;
            if let Some(merged) = merged {
                result.insert(key, merged);
            }
        }

        if let Some((base_set, overlay_set)) = value_sets {
            self.merge_value_sets(&mut result, base_set, overlay_set, &mut step);
        }
        self.merge_object_keywords(
            &mut result,
            base_object,
            overlay_object,
            depth,
            &mut step,
            advisories,
        )?;

        collapse_numeric_bounds(&mut result);
        if let Some(message) = find_empty_range(&result) {
            step.conflict(CheckName::IncompatibleBounds, message);
        }

        let Step {
            conflicts,
            fragments,
            ..
        } = step;
        self.attach_fragments(&mut result, fragments);
        advisories.extend(settle(&self.options, conflicts)?);
        Ok(Value::Object(result))
    }

    /// Combine one keyword present on both sides. `None` drops the keyword
    /// from the merged object (it moved into a residual fragment).
    fn merge_keyword(
        &self,
        key: &str,
        base: Value,
        overlay: Value,
        depth: usize,
        step: &mut Step<'_>,
        advisories: &mut Vec<CheckFailure>,
    ) -> Result<Option<Value>, MergeError> {
        // Equal combinator lists still go through the cross product so that
        // duplicate branches collapse.
        if !matches!(key, "oneOf" | "anyOf") && compare_values(&base, &overlay) {
            return Ok(Some(base));
        }

        let merged = match key {
            "type" => merge_type(base, overlay, step),
            "oneOf" | "anyOf" => {
                self.merge_combinator(key, base, overlay, depth, step, advisories)?
            }
            "allOf" => match (base, overlay) {
                (Value::Array(mut b), Value::Array(o)) => {
                    b.extend(o);
                    Some(Value::Array((self.dedupe_schema_defs)(&b)))
                }
                (b, o) => step.residual(key, b, o),
            },
            "not" => Some(self.merge_not(base, overlay)),
            "required" => match (base, overlay) {
                (Value::Array(mut b), Value::Array(o)) => {
                    for name in o {
                        if !b.iter().any(|existing| compare_values(existing, &name)) {
                            b.push(name);
                        }
                    }
                    Some(Value::Array(b))
                }
                (b, o) => step.residual(key, b, o),
            },
            "uniqueItems" => match (base.as_bool(), overlay.as_bool()) {
                (Some(a), Some(b)) => Some(Value::Bool(a || b)),
                _ => step.residual(key, base, overlay),
            },
            "multipleOf" => {
                let lcm = match (&base, &overlay) {
                    (Value::Number(a), Value::Number(b)) => least_common_multiple(a, b),
                    _ => None,
                };
                match lcm {
                    Some(lcm) => Some(lcm),
                    None => step.residual(key, base, overlay),
                }
            }
            "items" => match (base, overlay) {
                (b @ (Value::Object(_) | Value::Bool(_)), o @ (Value::Object(_) | Value::Bool(_))) => {
                    let items_path = build_path(step.path, &["items"]);
                    Some(self.merge_two(b, o, &items_path, depth + 1, advisories)?)
                }
                (b, o) => step.residual(key, b, o),
            },
            "description" => match (base, overlay) {
                (Value::String(b), Value::String(o)) => Some(Value::String(format!("{b}\n{o}"))),
                (_, o) => Some(o),
            },
            k if OVERLAY_WINS.contains(&k) => Some(overlay),
            k => match bound_direction(k) {
                Some(direction) if base.is_number() && overlay.is_number() => {
                    Some(tighten(base, overlay, direction))
                }
                _ => step.residual(k, base, overlay),
            },
        };
        Ok(merged)
    }

    // -----------------------------------------------------------------------
    // enum / const
    // -----------------------------------------------------------------------

    fn take_value_set(&self, obj: &mut Map<String, Value>) -> ValueSet {
        let constant = obj.remove("const");
        let members = obj.remove("enum").map(|v| match v {
            Value::Array(members) => members,
            other => vec![other],
        });
        match (constant, members) {
            (Some(c), Some(members)) => ValueSet {
                values: (self.intersect_json)(&members, std::slice::from_ref(&c)),
                from_const: true,
            },
            (Some(c), None) => ValueSet {
                values: vec![c],
                from_const: true,
            },
            (None, members) => ValueSet {
                values: members.unwrap_or_default(),
                from_const: false,
            },
        }
    }

    fn merge_value_sets(
        &self,
        result: &mut Map<String, Value>,
        base: ValueSet,
        overlay: ValueSet,
        step: &mut Step<'_>,
    ) {
        let mut values = (self.intersect_json)(&base.values, &overlay.values);
        if values.is_empty() {
            step.conflict(
                CheckName::IncompatibleEnum,
                "enum/const sets have no value in common",
            );
            result.insert("enum".to_string(), Value::Array(values));
        } else if values.len() == 1 && (base.from_const || overlay.from_const) {
            result.insert("const".to_string(), values.remove(0));
        } else {
            result.insert("enum".to_string(), Value::Array(values));
        }
    }

    // -----------------------------------------------------------------------
    // properties / patternProperties / additionalProperties
    // -----------------------------------------------------------------------

    fn merge_object_keywords(
        &self,
        result: &mut Map<String, Value>,
        mut base: ObjectKeywords,
        mut overlay: ObjectKeywords,
        depth: usize,
        step: &mut Step<'_>,
        advisories: &mut Vec<CheckFailure>,
    ) -> Result<(), MergeError> {
        let path = step.path;

        // A restrictive additionalProperties cannot be pushed into patterns
        // it never saw, nor onto names its own patterns may or may not
        // match; keep it with its own scope instead.
        detach_unscoped_additional(&mut base, &overlay, step);
        detach_unscoped_additional(&mut overlay, &base, step);

        match (base.properties.take(), overlay.properties.take()) {
            (None, None) => {}
            (base_props, overlay_props) => {
                let mut overlay_props = overlay_props.unwrap_or_default();
                let mut merged = Map::new();
                for (name, schema) in base_props.unwrap_or_default() {
                    let mut defs = vec![schema];
                    match overlay_props.remove(&name) {
                        Some(other) => defs.push(other),
                        None => defs.extend(overlay.constraints_for(&name)),
                    }
                    let prop_path = build_path(path, &["properties", &name]);
                    let schema = self.fold(defs, &prop_path, depth + 1, advisories)?;
                    merged.insert(name, schema);
                }
                for (name, schema) in overlay_props {
                    let mut defs = base.constraints_for(&name);
                    defs.push(schema);
                    let prop_path = build_path(path, &["properties", &name]);
                    let schema = self.fold(defs, &prop_path, depth + 1, advisories)?;
                    merged.insert(name, schema);
                }
                result.insert("properties".to_string(), Value::Object(merged));
            }
        }

        match (base.pattern_properties, overlay.pattern_properties) {
            (None, None) => {}
            (base_patterns, overlay_patterns) => {
                let mut merged = base_patterns.unwrap_or_default();
                for (pattern, schema) in overlay_patterns.unwrap_or_default() {
                    let schema = match merged.remove(&pattern) {
                        Some(existing) => {
                            let pattern_path = build_path(path, &["patternProperties", &pattern]);
                            self.merge_two(existing, schema, &pattern_path, depth + 1, advisories)?
                        }
                        None => schema,
                    };
                    merged.insert(pattern, schema);
                }
                result.insert("patternProperties".to_string(), Value::Object(merged));
            }
        }

        let additional = match (base.additional, overlay.additional) {
            (Some(b), Some(o)) => {
                let additional_path = build_path(path, &["additionalProperties"]);
                Some(self.merge_two(b, o, &additional_path, depth + 1, advisories)?)
            }
            (b, o) => b.or(o),
        };
        if let Some(additional) = additional {
            result.insert("additionalProperties".to_string(), additional);
        }
        Ok(())
    }

    fn fold(
        &self,
        defs: Vec<Value>,
        path: &str,
        depth: usize,
        advisories: &mut Vec<CheckFailure>,
    ) -> Result<Value, MergeError> {
        let mut iter = defs.into_iter();
        let Some(mut acc) = iter.next() else {
            return Ok(Value::Bool(true));
        };
        for def in iter {
            acc = self.merge_two(acc, def, path, depth, advisories)?;
        }
        Ok(acc)
    }

    // -----------------------------------------------------------------------
    // oneOf / anyOf / not
    // -----------------------------------------------------------------------

    /// Distribute two branch lists: every left branch is merged with every
    /// right branch. A pair is pruned only when it admits no instance at all,
    /// i.e. it is `false` or fails at its own level with a conflict that
    /// rules out every value. Failures nested under a subschema propagate.
    fn merge_combinator(
        &self,
        keyword: &str,
        base: Value,
        overlay: Value,
        depth: usize,
        step: &mut Step<'_>,
        advisories: &mut Vec<CheckFailure>,
    ) -> Result<Option<Value>, MergeError> {
        let (left, right) = match (base, overlay) {
            (Value::Array(l), Value::Array(r)) => (l, r),
            (b, o) => return Ok(step.residual(keyword, b, o)),
        };
        let branch_path = build_path(step.path, &[keyword]);

        let mut branches = Vec::with_capacity(left.len() * right.len());
        let mut branch_advisories = Vec::new();
        for (i, x) in left.iter().enumerate() {
            for (j, y) in right.iter().enumerate() {
                let mut pair_advisories = Vec::new();
                match self.merge_all(
                    vec![x.clone(), y.clone()],
                    &branch_path,
                    depth + 1,
                    &mut pair_advisories,
                ) {
                    Ok(Value::Bool(false)) => {
                        tracing::debug!(path = %branch_path, left = i, right = j, "pruned unsatisfiable branch pair");
                    }
                    Ok(branch) => {
                        branch_advisories.extend(pair_advisories);
                        branches.push(branch);
                    }
                    Err(MergeError::Check {
                        check,
                        path,
                        message,
                    }) if path == branch_path && rules_out_every_value(check) => {
                        tracing::debug!(path = %branch_path, left = i, right = j, %check, %message, "pruned conflicting branch pair");
                    }
                    Err(other) => return Err(other),
                }
            }
        }

        if branches.is_empty() && !left.is_empty() && !right.is_empty() {
            step.conflict(
                CheckName::NoConsistentResolution,
                format!("no {keyword} branch pair can be satisfied together"),
            );
            if !self.options.is_enabled(CheckName::NoConsistentResolution) {
                let lenient = self.best_effort();
                for x in &left {
                    for y in &right {
                        branches.push(lenient.merge_all(
                            vec![x.clone(), y.clone()],
                            &branch_path,
                            depth + 1,
                            &mut Vec::new(),
                        )?);
                    }
                }
            }
        }

        advisories.extend(branch_advisories);
        Ok(Some(Value::Array((self.dedupe_schema_defs)(&branches))))
    }

    /// `not A` and `not B` is `not (A or B)`.
    fn merge_not(&self, base: Value, overlay: Value) -> Value {
        let mut branches = match base {
            Value::Object(mut obj)
                if obj.len() == 1 && obj.get("anyOf").is_some_and(Value::is_array) =>
            {
                match obj.remove("anyOf") {
                    Some(Value::Array(existing)) => existing,
                    _ => Vec::new(),
                }
            }
            other => vec![other],
        };
        branches.push(overlay);

        let mut branches = (self.dedupe_schema_defs)(&branches);
        if branches.len() == 1 {
            branches.remove(0)
        } else {
            single_keyword("anyOf", Value::Array(branches))
        }
    }

    fn attach_fragments(&self, result: &mut Map<String, Value>, fragments: Vec<Value>) {
        if fragments.is_empty() {
            return;
        }
        let mut members = match result.remove("allOf") {
            Some(Value::Array(members)) => members,
            _ => Vec::new(),
        };
        members.extend(fragments);
        result.insert(
            "allOf".to_string(),
            Value::Array((self.dedupe_schema_defs)(&members)),
        );
    }
}

/// Conflicts that leave a definition with no valid instance. Bounds only
/// constrain instances of one type, so they never rule out every value.
fn rules_out_every_value(check: CheckName) -> bool {
    matches!(
        check,
        CheckName::IncompatibleTypes
            | CheckName::IncompatibleEnum
            | CheckName::NoConsistentResolution
    )
}

/// Intersect `type` with subtype awareness: `integer` is a `number`.
fn merge_type(base: Value, overlay: Value, step: &mut Step<'_>) -> Option<Value> {
    let left = extract_type_strings(&base);
    let right = extract_type_strings(&overlay);
    if left.is_empty() || right.is_empty() {
        return step.residual("type", base, overlay);
    }

    let mut common: Vec<String> = Vec::new();
    let mut keep = |t: &str| {
        if !common.iter().any(|c| c == t) {
            common.push(t.to_string());
        }
    };
    for t in &left {
        if right.contains(t) {
            keep(t);
        } else if (t == "number" && right.iter().any(|r| r == "integer"))
            || (t == "integer" && right.iter().any(|r| r == "number"))
        {
            keep("integer");
        }
    }
    if common.iter().any(|t| t == "number") {
        common.retain(|t| t != "integer");
    }

    let merged = match common.len() {
        0 => {
            step.conflict(
                CheckName::IncompatibleTypes,
                format!("types {base} and {overlay} have nothing in common"),
            );
            base
        }
        1 => Value::String(common.remove(0)),
        _ => Value::Array(common.into_iter().map(Value::String).collect()),
    };
    Some(merged)
}

/// Split out coupled keyword groups that differ between the two sides.
fn split_coupled_groups(
    result: &mut Map<String, Value>,
    overlay: &mut Map<String, Value>,
    step: &mut Step<'_>,
) {
    let mut groups: Vec<&[&str]> = COUPLED_GROUPS.to_vec();
    if result.get("items").is_some_and(Value::is_array)
        || overlay.get("items").is_some_and(Value::is_array)
    {
        groups.push(TUPLE_GROUP);
    }
    for (flag, group) in DRAFT4_GROUPS {
        if result.get(*flag).is_some_and(Value::is_boolean)
            || overlay.get(*flag).is_some_and(Value::is_boolean)
        {
            groups.push(group);
        }
    }

    for group in groups {
        if !has_any(overlay, group) {
            continue;
        }
        let label = group.join("/");
        if !has_any(result, group) {
            if group.iter().any(|k| fragments_mention(result, k)) {
                let overlay_part = take_group(overlay, group);
                step.append_fragment(Value::Object(overlay_part), &label);
            }
            continue;
        }
        let base_part = take_group(result, group);
        let overlay_part = take_group(overlay, group);
        if base_part.len() == overlay_part.len()
            && base_part
                .iter()
                .all(|(k, v)| overlay_part.get(k).is_some_and(|o| compare_values(v, o)))
        {
            result.extend(base_part);
        } else {
            step.residual_group(&label, base_part, overlay_part);
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
