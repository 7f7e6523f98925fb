//! Content fingerprints for duplicate detection.
//!
//! The fingerprint is the SHA-256 of a canonical JSON rendering: object keys
//! sorted, integral floats written as integers. Structurally equal records
//! therefore share a fingerprint regardless of key order or `1` vs `1.0`.

use std::fmt::{self, Write};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use sha2::{Digest, Sha256};

use crate::domain::aggregates::SubmissionData;

const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Hex-encoded SHA-256 of a canonical record.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash(String);

impl ContentHash {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex digits, for logs.
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn fingerprint(data: &SubmissionData) -> ContentHash {
    let mut canonical = String::new();
    write_object(data, &mut canonical);
    ContentHash(hex::encode(Sha256::digest(canonical.as_bytes())))
}

fn write_value(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => write_number(n, out),
        Value::String(_) => {
            let _ = write!(out, "{value}");
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => write_object(map, out),
    }
}

fn write_object(map: &Map<String, Value>, out: &mut String) {
    let mut entries: Vec<_> = map.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    out.push('{');
    for (i, (key, value)) in entries.into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        let _ = write!(out, "{}:", Value::String(key.clone()));
        write_value(value, out);
    }
    out.push('}');
}

fn write_number(n: &Number, out: &mut String) {
    let _ = match (n.as_i64(), n.as_u64(), n.as_f64()) {
        (Some(i), _, _) => write!(out, "{i}"),
        (None, Some(u), _) => write!(out, "{u}"),
        (None, None, Some(f)) if f.fract() == 0.0 && f.abs() <= MAX_SAFE_INTEGER => {
            write!(out, "{}", f as i64)
        }
        _ => write!(out, "{n}"),
    };
}

/// Deep equality with order-independent objects and numeric comparison of
/// numbers (`1 == 1.0`).
pub fn structurally_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => same_number(x, y),
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(p, q)| structurally_equal(p, q))
        }
        (Value::Object(x), Value::Object(y)) => same_record(x, y),
        _ => a == b,
    }
}

/// Integers compare exactly; only a float on either side falls back to `f64`.
fn same_number(x: &Number, y: &Number) -> bool {
    if x.is_f64() || y.is_f64() {
        matches!((x.as_f64(), y.as_f64()), (Some(p), Some(q)) if p == q)
    } else {
        x == y
    }
}

/// [`structurally_equal`] for two records.
pub fn same_record(a: &SubmissionData, b: &SubmissionData) -> bool {
    a.len() == b.len()
        && a.iter()
            .all(|(key, value)| b.get(key).is_some_and(|other| structurally_equal(value, other)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn record(value: Value) -> SubmissionData {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_key_order_does_not_matter() {
        let a: SubmissionData = serde_json::from_str(r#"{"b":1,"a":{"y":2,"x":[1,2]}}"#).unwrap();
        let b: SubmissionData = serde_json::from_str(r#"{"a":{"x":[1,2],"y":2},"b":1}"#).unwrap();
        assert!(same_record(&a, &b));
        assert_eq!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn test_integral_float_matches_integer() {
        let a = record(json!({ "age": 45 }));
        let b = record(json!({ "age": 45.0 }));
        assert!(same_record(&a, &b));
        assert_eq!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn test_any_single_change_differs() {
        let base = record(json!({ "name": "Ada", "age": 36 }));
        for changed in [
            json!({ "name": "Ada", "age": 37 }),
            json!({ "name": "ada", "age": 36 }),
            json!({ "name": "Ada", "age": "36" }),
            json!({ "name": "Ada" }),
            json!({ "name": "Ada", "age": 36, "x": null }),
        ] {
            let changed = record(changed);
            assert!(!same_record(&base, &changed));
            assert_ne!(fingerprint(&base), fingerprint(&changed));
        }
    }

    #[test]
    fn test_large_integers_compare_exactly() {
        let a = record(json!({ "id": 9_007_199_254_740_993_u64 }));
        let b = record(json!({ "id": 9_007_199_254_740_992_u64 }));
        assert!(!same_record(&a, &b));
        assert_ne!(fingerprint(&a), fingerprint(&b));
        assert!(same_record(&b, &record(json!({ "id": 9_007_199_254_740_992.0 }))));
    }

    #[test]
    fn test_array_order_matters() {
        let a = record(json!({ "tags": [1, 2] }));
        let b = record(json!({ "tags": [2, 1] }));
        assert!(!same_record(&a, &b));
        assert_ne!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn test_fingerprint_is_hex_sha256() {
        let hash = fingerprint(&SubmissionData::new());
        assert_eq!(hash.as_str().len(), 64);
        assert_eq!(hash.short().len(), 12);
    }

    proptest! {
        #[test]
        fn prop_equal_records_share_fingerprint(
            entries in proptest::collection::btree_map("[a-z]{1,6}", "[ -~]{0,10}", 0..8)
        ) {
            let forward: SubmissionData = entries
                .iter()
                .map(|(k, v)| (k.clone(), Value::from(v.as_str())))
                .collect();
            let reversed: SubmissionData = entries
                .iter()
                .rev()
                .map(|(k, v)| (k.clone(), Value::from(v.as_str())))
                .collect();
            prop_assert!(same_record(&forward, &reversed));
            prop_assert_eq!(fingerprint(&forward), fingerprint(&reversed));
        }
    }
}
