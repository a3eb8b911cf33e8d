// SPDX-License-Identifier: MIT OR Apache-2.0
//! Accessors for the Config Tree interchange value.
//!
//! The universal interchange format for node data, edge data, and
//! persisted state is `serde_json::Value` built with the
//! `preserve_order` feature, so map keys keep their insertion order.
//! These helpers keep model and loader code free of repeated
//! `get`/`and_then` chains.

use serde_json::Value;

/// Look up a string field.
pub fn str_of<'a>(map: &'a Value, key: &str) -> Option<&'a str> {
    map.get(key).and_then(Value::as_str)
}

/// Look up a string field, defaulting to the empty string.
pub fn string_of(map: &Value, key: &str) -> String {
    str_of(map, key).unwrap_or_default().to_string()
}

/// Look up a floating point field (integers coerce).
pub fn f64_of(map: &Value, key: &str) -> Option<f64> {
    map.get(key).and_then(Value::as_f64)
}

/// Look up an unsigned integer field.
pub fn u64_of(map: &Value, key: &str) -> Option<u64> {
    map.get(key).and_then(Value::as_u64)
}

/// Look up a boolean field.
pub fn bool_of(map: &Value, key: &str) -> Option<bool> {
    map.get(key).and_then(Value::as_bool)
}

/// Borrow an array field as a slice, empty when absent or not an array.
pub fn items<'a>(map: &'a Value, key: &str) -> &'a [Value] {
    map.get(key)
        .and_then(Value::as_array)
        .map_or(&[], Vec::as_slice)
}

/// True if `map` has `key` at all.
pub fn has_key(map: &Value, key: &str) -> bool {
    map.get(key).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_accessors() {
        let map = json!({
            "name": "osc1",
            "weight": 2.5,
            "order": 4,
            "smooth": true,
            "inputs": [{"name": "in1"}],
        });
        assert_eq!(str_of(&map, "name"), Some("osc1"));
        assert_eq!(string_of(&map, "missing"), "");
        assert_eq!(f64_of(&map, "weight"), Some(2.5));
        assert_eq!(u64_of(&map, "order"), Some(4));
        assert_eq!(bool_of(&map, "smooth"), Some(true));
        assert_eq!(items(&map, "inputs").len(), 1);
        assert!(items(&map, "outputs").is_empty());
        assert!(has_key(&map, "order"));
    }

    #[test]
    fn test_preserve_order_round_trip() {
        let map = json!({"z": 1, "a": 2, "m": 3});
        let keys: Vec<&String> = map.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["z", "a", "m"]);
    }
}
