//! Structural comparison over declarative values.
//!
//! Marker options and selection criteria are plain JSON trees. Matching uses
//! loose scalar equality (`"1"` equals `1`, `true` equals `1`) and a recursive
//! subset test with a fixed depth limit.

use crate::{error::Result, Error};
use serde_json::Value;

/// Loose scalar equality.
///
/// Numbers compare numerically, strings and booleans are coerced to numbers
/// when compared against a number, and `null` only equals `null`. Containers
/// are never loosely equal to anything; use [`is_subset`] for those.
pub fn loose_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Array(_) | Value::Object(_), _) | (_, Value::Array(_) | Value::Object(_)) => false,
        _ => match (as_number(a), as_number(b)) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        },
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(true) => Some(1.0),
        Value::Bool(false) => Some(0.0),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Some(0.0)
            } else {
                trimmed.parse().ok()
            }
        }
        _ => None,
    }
}

/// Truthiness of a declarative value: `null`, `false`, `0`, `NaN` and the
/// empty string are falsy; everything else, including empty containers, is truthy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Check that every property of `needle` exists in `haystack` with an equal value.
///
/// Nested objects and arrays in the needle are matched recursively, so
/// `{"data": {"id": 1}}` matches `{"data": {"id": 1, "name": "x"}, "title": "y"}`.
/// Properties only present in the haystack never disqualify a match. A key that is
/// present with a `null` value counts as present.
///
/// Fails with [`Error::MatchDepthExceeded`] once nesting goes deeper than `max_depth`.
pub fn is_subset(needle: &Value, haystack: &Value, max_depth: usize) -> Result<bool> {
    subset_at(needle, haystack, 0, max_depth)
}

fn subset_at(needle: &Value, haystack: &Value, depth: usize, max_depth: usize) -> Result<bool> {
    if depth > max_depth {
        return Err(Error::MatchDepthExceeded(max_depth));
    }

    match (needle, haystack) {
        (Value::Object(wanted), Value::Object(present)) => {
            for (key, value) in wanted {
                let Some(candidate) = present.get(key) else {
                    return Ok(false);
                };
                if !subset_at(value, candidate, depth + 1, max_depth)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        (Value::Array(wanted), Value::Array(present)) => {
            for (index, value) in wanted.iter().enumerate() {
                let Some(candidate) = present.get(index) else {
                    return Ok(false);
                };
                if !subset_at(value, candidate, depth + 1, max_depth)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        (Value::Object(_) | Value::Array(_), _) => Ok(false),
        (scalar, candidate) => Ok(loose_eq(scalar, candidate)),
    }
}

/// Short human-readable name of a value's shape, used in diagnostics.
pub fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const DEPTH: usize = 32;

    #[test]
    fn loose_equality_coerces_scalars() {
        assert!(loose_eq(&json!(1), &json!(1.0)));
        assert!(loose_eq(&json!("1"), &json!(1)));
        assert!(loose_eq(&json!(true), &json!(1)));
        assert!(loose_eq(&json!(""), &json!(0)));
        assert!(loose_eq(&json!(null), &json!(null)));
        assert!(!loose_eq(&json!(null), &json!(0)));
        assert!(!loose_eq(&json!("a"), &json!("b")));
        assert!(!loose_eq(&json!("true"), &json!(true)));
        assert!(!loose_eq(&json!([1]), &json!([1])));
    }

    #[test]
    fn truthiness() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(is_truthy(&json!("0")));
        assert!(is_truthy(&json!({})));
        assert!(is_truthy(&json!([])));
    }

    #[test]
    fn subset_ignores_extra_haystack_keys() {
        let marker = json!({"position": [0, 0], "hello": "world", "title": "x"});
        assert!(is_subset(&json!({"hello": "world"}), &marker, DEPTH).unwrap());
        assert!(!is_subset(&json!({"hello": "world", "foo": "bar"}), &marker, DEPTH).unwrap());
    }

    #[test]
    fn subset_recurses_into_nested_objects() {
        let marker = json!({
            "userdefined": {"identity": "id_0815", "rank": 3},
            "hello": "world"
        });
        let needle = json!({"userdefined": {"identity": "id_0815"}});
        assert!(is_subset(&needle, &marker, DEPTH).unwrap());

        let needle = json!({"userdefined": {"identity": "id_0816"}});
        assert!(!is_subset(&needle, &marker, DEPTH).unwrap());

        let needle = json!({"hello": {"nested": true}});
        assert!(!is_subset(&needle, &marker, DEPTH).unwrap());
    }

    #[test]
    fn subset_matches_arrays_by_index() {
        let marker = json!({"position": [52.25, 0.05], "tags": ["a", "b", "c"]});
        assert!(is_subset(&json!({"position": [52.25, 0.05]}), &marker, DEPTH).unwrap());
        assert!(is_subset(&json!({"tags": ["a"]}), &marker, DEPTH).unwrap());
        assert!(!is_subset(&json!({"tags": ["b"]}), &marker, DEPTH).unwrap());
    }

    #[test]
    fn null_valued_key_counts_as_present() {
        let marker = json!({"uid": null});
        assert!(is_subset(&json!({"uid": null}), &marker, DEPTH).unwrap());
        assert!(!is_subset(&json!({"title": null}), &marker, DEPTH).unwrap());
    }

    #[test]
    fn empty_needle_matches_everything() {
        assert!(is_subset(&json!({}), &json!({"a": 1}), DEPTH).unwrap());
    }

    #[test]
    fn depth_limit_is_enforced() {
        let mut nested = json!({"value": "leaf"});
        for _ in 0..10 {
            nested = json!({"nested": nested});
        }
        assert!(is_subset(&nested, &nested, 16).unwrap());
        assert_eq!(
            is_subset(&nested, &nested, 4),
            Err(Error::MatchDepthExceeded(4))
        );
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        fn arb_value() -> impl Strategy<Value = Value> {
            let leaf = prop_oneof![
                Just(Value::Null),
                any::<bool>().prop_map(Value::Bool),
                (-1000i64..1000).prop_map(|n| json!(n)),
                "[a-z]{0,6}".prop_map(Value::String),
            ];
            leaf.prop_recursive(4, 32, 6, |inner| {
                prop_oneof![
                    prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                    prop::collection::btree_map("[a-z]{1,4}", inner, 0..4)
                        .prop_map(|m| Value::Object(m.into_iter().collect())),
                ]
            })
        }

        proptest! {
            #[test]
            fn prop_subset_is_reflexive(value in arb_value()) {
                prop_assert!(is_subset(&value, &value, DEPTH).unwrap());
            }

            #[test]
            fn prop_extra_haystack_keys_keep_match(
                value in arb_value(),
                extra in "[A-Z]{3,6}",
            ) {
                let needle = json!({"inner": value.clone()});
                let haystack = json!({"inner": value, extra: 1});
                prop_assert!(is_subset(&needle, &haystack, DEPTH).unwrap());
            }
        }
    }
}
