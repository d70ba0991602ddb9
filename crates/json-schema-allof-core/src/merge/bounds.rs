//! Numeric bound algebra: tightening, collapsing and `multipleOf`.

use serde_json::{Map, Number, Value};

/// Lower-bound keywords tightened by taking the maximum.
pub(crate) const LOWER_BOUNDS: &[&str] = &[
    "minimum",
    "exclusiveMinimum",
    "minLength",
    "minItems",
    "minProperties",
    "minContains",
];

/// Upper-bound keywords tightened by taking the minimum.
pub(crate) const UPPER_BOUNDS: &[&str] = &[
    "maximum",
    "exclusiveMaximum",
    "maxLength",
    "maxItems",
    "maxProperties",
    "maxContains",
];

/// Inclusive/exclusive keyword pairs for the numeric range.
const NUMERIC_PAIRS: &[(&str, &str, Direction)] = &[
    ("minimum", "exclusiveMinimum", Direction::Lower),
    ("maximum", "exclusiveMaximum", Direction::Upper),
];

/// Count-style lower/upper pairs checked for emptiness.
const COUNT_PAIRS: &[(&str, &str)] = &[
    ("minLength", "maxLength"),
    ("minItems", "maxItems"),
    ("minProperties", "maxProperties"),
    ("minContains", "maxContains"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Direction {
    Lower,
    Upper,
}

/// Keep the tighter of two bounds. Non-numeric values leave `base` in place.
pub(crate) fn tighten(base: Value, overlay: Value, direction: Direction) -> Value {
    let (Some(b), Some(o)) = (base.as_f64(), overlay.as_f64()) else {
        return base;
    };
    let overlay_tighter = match direction {
        Direction::Lower => o > b,
        Direction::Upper => o < b,
    };
    if overlay_tighter {
        overlay
    } else {
        base
    }
}

/// Direction of a bound keyword, if it is one.
pub(crate) fn bound_direction(keyword: &str) -> Option<Direction> {
    if LOWER_BOUNDS.contains(&keyword) {
        Some(Direction::Lower)
    } else if UPPER_BOUNDS.contains(&keyword) {
        Some(Direction::Upper)
    } else {
        None
    }
}

/// Drop the looser of `minimum`/`exclusiveMinimum` (and likewise for the
/// upper bound) so at most one keyword per direction survives. On a tie the
/// exclusive keyword wins.
pub(crate) fn collapse_numeric_bounds(obj: &mut Map<String, Value>) {
    for (inclusive, exclusive, direction) in NUMERIC_PAIRS {
        let (Some(i), Some(e)) = (
            obj.get(*inclusive).and_then(Value::as_f64),
            obj.get(*exclusive).and_then(Value::as_f64),
        ) else {
            continue;
        };
        let keep_exclusive = match direction {
            Direction::Lower => e >= i,
            Direction::Upper => e <= i,
        };
        if keep_exclusive {
            obj.remove(*inclusive);
        } else {
            obj.remove(*exclusive);
        }
    }
}

/// Describe the first empty range in `obj`, if any.
pub(crate) fn find_empty_range(obj: &Map<String, Value>) -> Option<String> {
    let number = |key: &str| obj.get(key).and_then(Value::as_f64);

    let lower = number("exclusiveMinimum")
        .map(|v| (v, true))
        .or_else(|| number("minimum").map(|v| (v, false)));
    let upper = number("exclusiveMaximum")
        .map(|v| (v, true))
        .or_else(|| number("maximum").map(|v| (v, false)));
    if let (Some((lo, lo_excl)), Some((hi, hi_excl))) = (lower, upper) {
        if lo > hi || (lo == hi && (lo_excl || hi_excl)) {
            return Some(format!("numeric range is empty (lower {lo}, upper {hi})"));
        }
    }

    for (min_key, max_key) in COUNT_PAIRS {
        if let (Some(lo), Some(hi)) = (number(min_key), number(max_key)) {
            if lo > hi {
                return Some(format!("{min_key} {lo} exceeds {max_key} {hi}"));
            }
        }
    }
    None
}

// ---------------------------------------------------------------------------
// multipleOf
// ---------------------------------------------------------------------------

/// Decimal places beyond which `multipleOf` values are not combined.
const MAX_SCALE_DIGITS: u32 = 9;

/// Least common multiple of two positive `multipleOf` values.
///
/// Integers combine exactly. Decimals are scaled by a shared power of ten,
/// combined as integers and scaled back. Returns `None` when the values are
/// not positive, overflow, or carry too many decimal places.
pub(crate) fn least_common_multiple(a: &Number, b: &Number) -> Option<Value> {
    if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
        return lcm_u64(x, y).map(Value::from);
    }

    let (x, y) = (a.as_f64()?, b.as_f64()?);
    if x <= 0.0 || y <= 0.0 {
        return None;
    }
    let digits = decimal_places(a)?.max(decimal_places(b)?);
    let scale = 10u64.checked_pow(digits)?;
    let xi = scaled_integer(x, scale)?;
    let yi = scaled_integer(y, scale)?;
    let lcm = lcm_u64(xi, yi)?;

    if lcm % scale == 0 {
        Some(Value::from(lcm / scale))
    } else {
        Number::from_f64(lcm as f64 / scale as f64).map(Value::Number)
    }
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

fn lcm_u64(a: u64, b: u64) -> Option<u64> {
    if a == 0 || b == 0 {
        return None;
    }
    (a / gcd(a, b)).checked_mul(b)
}

fn decimal_places(n: &Number) -> Option<u32> {
    let text = n.to_string();
    if text.contains(['e', 'E']) {
        return None;
    }
    let digits = text.split_once('.').map_or(0, |(_, frac)| frac.len()) as u32;
    (digits <= MAX_SCALE_DIGITS).then_some(digits)
}

fn scaled_integer(value: f64, scale: u64) -> Option<u64> {
    let scaled = value * scale as f64;
    let rounded = scaled.round();
    ((scaled - rounded).abs() < 1e-6 && rounded >= 1.0 && rounded < u64::MAX as f64)
        .then_some(rounded as u64)
}
