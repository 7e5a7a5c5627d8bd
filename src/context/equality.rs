//! Structural equality of raw contexts.
//!
//! Typed contexts already implement `PartialEq` ignoring their instance id. This module
//! covers the untyped case, e.g. contexts coming back from a store or from a binding
//! layer as plain JSON.

use super::taxonomy::RESERVED_KEY_PREFIX;
use serde_json::{Map, Value};

/// Whether `value` has the minimal shape of a context: an object with string `_type` and `id`.
pub fn is_context(value: &Value) -> bool {
    match value {
        Value::Object(map) => {
            map.get("_type").is_some_and(Value::is_string)
                && map.get("id").is_some_and(Value::is_string)
        }
        _ => false,
    }
}

fn public_keys(map: &Map<String, Value>) -> impl Iterator<Item = (&String, &Value)> {
    map.iter().filter(|(key, _)| !key.starts_with(RESERVED_KEY_PREFIX))
}

/// Compares two contexts by their public properties.
///
/// Keys starting with `__` (instance ids and other bookkeeping) are ignored. The key
/// sets must match exactly and values are compared strictly, without coercion.
/// Anything that isn't a context compares unequal, including two identical non-contexts.
pub fn is_context_equal(a: &Value, b: &Value) -> bool {
    if !is_context(a) || !is_context(b) {
        return false;
    }

    let (Value::Object(a), Value::Object(b)) = (a, b) else {
        return false;
    };

    if public_keys(a).count() != public_keys(b).count() {
        return false;
    }

    public_keys(a).all(|(key, value)| b.get(key) == Some(value))
}
