//! Canonical JSON serialization for model files
//!
//! Model artifacts are written with recursively sorted keys and no
//! whitespace so that the same model always yields the same bytes and the
//! same BLAKE3 digest.

use serde::Serialize;
use serde_json::{Map, Value};

/// Serialize a value to canonical JSON (sorted keys, no whitespace)
pub fn to_canonical_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let canonical = canonicalize_value(serde_json::to_value(value)?);
    serde_json::to_string(&canonical)
}

/// Recursively sort object keys
fn canonicalize_value(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));

            let mut sorted = Map::with_capacity(entries.len());
            for (key, val) in entries {
                sorted.insert(key, canonicalize_value(val));
            }
            Value::Object(sorted)
        }
        Value::Array(elements) => Value::Array(elements.into_iter().map(canonicalize_value).collect()),
        other => other,
    }
}

/// BLAKE3 digest of the canonical JSON encoding, as lowercase hex
pub fn hash_canonical_hex<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let json = to_canonical_json(value)?;
    Ok(hex::encode(blake3::hash(json.as_bytes()).as_bytes()))
}
