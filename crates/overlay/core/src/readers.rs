//! Type-guarded scalar extraction from untrusted JSON.
//!
//! Every reader takes the raw slot (`None` when the key is missing) and a
//! fallback. Wrong types and non-finite numbers yield the fallback; numbers
//! outside the accepted range are clamped into it. Nothing here ever fails.

use std::ops::RangeInclusive;
use std::str::FromStr;

use serde_json::{Map, Value};

/// JSON object view used by every reconciler.
pub type Object = Map<String, Value>;

/// Returns the object behind `value`, rejecting arrays, null and scalars.
pub fn as_object(value: &Value) -> Option<&Object> {
    match value {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

/// Looks up `key` on an optional object and returns it only if it is itself an object.
pub fn child_object<'a>(parent: Option<&'a Object>, key: &str) -> Option<&'a Object> {
    parent.and_then(|map| map.get(key)).and_then(as_object)
}

/// Looks up `key` on an optional object.
pub fn field<'a>(parent: Option<&'a Object>, key: &str) -> Option<&'a Value> {
    parent.and_then(|map| map.get(key))
}

/// Finite number or `None`.
pub fn finite(value: Option<&Value>) -> Option<f64> {
    value.and_then(Value::as_f64).filter(|n| n.is_finite())
}

/// Reads a number clamped into `range`, falling back when absent or not a finite number.
pub fn read_number(value: Option<&Value>, fallback: f64, range: RangeInclusive<f64>) -> f64 {
    match finite(value) {
        Some(n) => n.clamp(*range.start(), *range.end()),
        None => fallback,
    }
}

/// [`read_number`] followed by truncation toward zero.
pub fn read_whole(value: Option<&Value>, fallback: f64, range: RangeInclusive<f64>) -> f64 {
    read_number(value, fallback, range).trunc()
}

pub fn read_bool(value: Option<&Value>, fallback: bool) -> bool {
    value.and_then(Value::as_bool).unwrap_or(fallback)
}

/// Reads a string; empty strings are only accepted when `allow_empty` is set.
pub fn read_text(value: Option<&Value>, fallback: &str, allow_empty: bool) -> String {
    match value.and_then(Value::as_str) {
        Some(text) if allow_empty || !text.is_empty() => text.to_owned(),
        _ => fallback.to_owned(),
    }
}

/// Parses a string into one of the enum's known literals.
pub fn read_enum<T: FromStr>(value: Option<&Value>, fallback: T) -> T {
    value
        .and_then(Value::as_str)
        .and_then(|text| text.parse().ok())
        .unwrap_or(fallback)
}

/// Reads an ordering counter (`seq` / `rev` / `schemaVersion`).
///
/// Only finite, non-negative numbers count; the fractional part is dropped.
pub fn read_sequence(value: Option<&Value>) -> Option<u64> {
    let n = finite(value)?.trunc();
    if n < 0.0 {
        return None;
    }
    Some(n as u64)
}

/// Rounds to two decimal places so fractional XP renders exactly.
pub fn quantize2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn numbers_clamp_and_fall_back() {
        assert_eq!(read_number(Some(&json!(-10)), 5.0, 0.0..=100.0), 0.0);
        assert_eq!(read_number(Some(&json!(250.5)), 5.0, 0.0..=100.0), 100.0);
        assert_eq!(read_number(Some(&json!("12")), 5.0, 0.0..=100.0), 5.0);
        assert_eq!(read_number(None, 5.0, 0.0..=100.0), 5.0);
        assert_eq!(read_whole(Some(&json!(7.9)), 0.0, 0.0..=10.0), 7.0);
    }

    #[test]
    fn objects_exclude_arrays_and_null() {
        assert!(as_object(&json!({})).is_some());
        assert!(as_object(&json!([])).is_none());
        assert!(as_object(&Value::Null).is_none());
    }

    #[test]
    fn text_respects_allow_empty() {
        assert_eq!(read_text(Some(&json!("")), "prev", false), "prev");
        assert_eq!(read_text(Some(&json!("")), "prev", true), "");
        assert_eq!(read_text(Some(&json!(3)), "prev", true), "prev");
    }

    #[test]
    fn sequences_reject_negative_and_non_numeric() {
        assert_eq!(read_sequence(Some(&json!(12.7))), Some(12));
        assert_eq!(read_sequence(Some(&json!(-1))), None);
        assert_eq!(read_sequence(Some(&json!("3"))), None);
        assert_eq!(read_sequence(None), None);
    }

    #[test]
    fn quantize_keeps_two_decimals() {
        assert_eq!(quantize2(1280.25), 1280.25);
        assert_eq!(quantize2(619.754), 619.75);
    }
}
