//! Canonical request hashing for idempotent creation.

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// JSON stringification with object keys sorted recursively, so logically
/// equal payloads hash identically regardless of key order. Array order is
/// preserved; it is part of the payload's meaning.
pub fn stable_stringify(value: &Value) -> String {
    serde_json::to_string(&sort_value(value)).unwrap_or_default()
}

fn sort_value(value: &Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.iter().map(sort_value).collect()),
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut sorted = Map::new();
            for key in keys {
                sorted.insert(key.clone(), sort_value(&map[key]));
            }
            Value::Object(sorted)
        }
        other => other.clone(),
    }
}

/// Hex-encoded SHA-256 digest.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}
