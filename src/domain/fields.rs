//! Lenient JSON field readers
//!
//! Imported files come from many application versions and are routinely
//! missing fields or carry them with the wrong JSON type. These helpers read a
//! field and return `None` (or an empty value) instead of failing, so callers
//! can apply their own defaults.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::{Map, Value};

/// JSON object type used for entity bodies
pub type JsonObject = Map<String, Value>;

/// Reads a string field. Numbers and booleans are rendered as strings.
pub fn string(obj: &JsonObject, key: &str) -> Option<String> {
    match obj.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Reads a non-empty string field
pub fn non_empty_string(obj: &JsonObject, key: &str) -> Option<String> {
    string(obj, key).filter(|s| !s.is_empty())
}

/// Reads a field as text, serializing structured values to JSON
///
/// Used for payloads, which some versions stored as objects.
pub fn text(obj: &JsonObject, key: &str) -> Option<String> {
    match obj.get(key)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Reads an integer field, accepting floats and numeric strings
pub fn integer(obj: &JsonObject, key: &str) -> Option<i64> {
    value_as_i64(obj.get(key)?)
}

/// Reads a timestamp as epoch milliseconds
///
/// Accepts numbers, numeric strings and RFC 3339 / ISO-8601 date strings.
pub fn timestamp(obj: &JsonObject, key: &str) -> Option<i64> {
    let value = obj.get(key)?;
    if let Some(ms) = value_as_i64(value) {
        return Some(ms);
    }
    value.as_str().and_then(parse_iso_millis)
}

/// Reads a boolean field, accepting `"true"`/`"false"` strings
pub fn boolean(obj: &JsonObject, key: &str) -> Option<bool> {
    match obj.get(key)? {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        Value::Number(n) => n.as_i64().map(|n| n != 0),
        _ => None,
    }
}

/// Reads an array field; anything else is treated as empty
pub fn array<'a>(obj: &'a JsonObject, key: &str) -> &'a [Value] {
    obj.get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Reads an object field
pub fn object<'a>(obj: &'a JsonObject, key: &str) -> Option<&'a JsonObject> {
    obj.get(key).and_then(Value::as_object)
}

/// Reads a list of identifiers, skipping entries that are not strings or numbers
pub fn string_list(obj: &JsonObject, key: &str) -> Vec<String> {
    array(obj, key).iter().filter_map(value_as_id).collect()
}

/// Renders an identifier value (string or number) as a string
pub fn value_as_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn value_as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Parses an ISO-8601 date string into epoch milliseconds
pub fn parse_iso_millis(value: &str) -> Option<i64> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.timestamp_millis());
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|dt| dt.and_utc().timestamp_millis())
}

/// Current time in epoch milliseconds
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Returns a copy of `obj` without the listed keys
pub fn without(obj: &JsonObject, keys: &[&str]) -> JsonObject {
    obj.iter()
        .filter(|(k, _)| !keys.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}
