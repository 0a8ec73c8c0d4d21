//! Pure transforms over JSON payloads

use serde_json::Value;

/// Key suffix marking attributes that need a transport key to write
pub const ENCRYPTED_SUFFIX: &str = "-encrypted";

/// Remove every object key ending with `suffix`, at any depth
///
/// Arrays are walked element by element; all other keys and values are left
/// untouched.
pub fn delete_deep_by_key_suffix(value: &mut Value, suffix: &str) {
    match value {
        Value::Object(map) => {
            map.retain(|key, _| !key.ends_with(suffix));
            for child in map.values_mut() {
                delete_deep_by_key_suffix(child, suffix);
            }
        }
        Value::Array(items) => {
            for child in items.iter_mut() {
                delete_deep_by_key_suffix(child, suffix);
            }
        }
        _ => {}
    }
}

/// Set `key` to an empty string when it is absent from a top-level object
///
/// An explicit value (including `null`) is left as is.
pub fn default_to_empty_string(value: &mut Value, key: &str) {
    if let Value::Object(map) = value {
        if !map.contains_key(key) {
            map.insert(key.to_string(), Value::String(String::new()));
        }
    }
}

/// Extract a value from JSON using a dot-notation path
pub fn extract_json_value(item: &Value, path: &str) -> String {
    let mut current = item;

    for part in path.split('.') {
        // Handle array index
        let next = match part.parse::<usize>() {
            Ok(idx) => current.get(idx),
            Err(_) => current.get(part),
        };
        current = match next {
            Some(v) => v,
            None => return "-".to_string(),
        };
    }

    match current {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "-".to_string(),
        Value::Array(arr) => format!("[{} items]", arr.len()),
        Value::Object(_) => "[object]".to_string(),
    }
}
