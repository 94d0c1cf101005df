//! Collection response normalization.
//!
//! Collection endpoints answer with a bare array or with the array wrapped
//! under one of several keys, depending on the endpoint and backend version.

use serde_json::Value;

/// Wrapper keys checked, in order, when the response is not a bare array.
const WRAPPER_KEYS: &[&str] = &["content", "data", "items", "results"];

/// Returns the entries of a collection response, in server order.
///
/// Unrecognized shapes (including `null`) yield an empty sequence.
pub fn collection(response: &Value) -> Vec<Value> {
    collection_slice(response).to_vec()
}

/// Borrowing variant of [`collection`].
pub fn collection_slice(response: &Value) -> &[Value] {
    if let Some(items) = response.as_array() {
        return items;
    }
    WRAPPER_KEYS
        .iter()
        .find_map(|key| response.get(*key).and_then(Value::as_array))
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Consuming variant of [`collection`], avoiding clones of the entries.
pub fn into_collection(response: Value) -> Vec<Value> {
    match response {
        Value::Array(items) => items,
        Value::Object(mut obj) => WRAPPER_KEYS
            .iter()
            .find_map(|key| match obj.remove(*key) {
                Some(Value::Array(items)) => Some(items),
                _ => None,
            })
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

/// Returns the array stored under `field` of a record, if non-empty.
pub fn embedded(record: &Value, field: &str) -> Option<Vec<Value>> {
    record
        .get(field)
        .and_then(Value::as_array)
        .filter(|items| !items.is_empty())
        .cloned()
}
