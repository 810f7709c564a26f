//! Canonical comparison of evaluated values
//!
//! Evaluators do not promise a stable key order for records, so values are
//! serialized with sorted object keys and fixed indentation before comparing.
//! Array order is significant and left untouched.

use serde_json::{Map, Value};

/// Serialize a value with lexicographically sorted keys and two-space indentation
pub fn canonicalize(value: &Value) -> String {
    serde_json::to_string_pretty(&sorted(value)).unwrap_or_default()
}

/// Structural equality under canonicalization
pub fn equal(a: &Value, b: &Value) -> bool {
    canonicalize(a) == canonicalize(b)
}

fn sorted(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));

            let mut out = Map::new();
            for (key, value) in entries {
                out.insert(key.clone(), sorted(value));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(sorted).collect()),
        other => other.clone(),
    }
}
