//! Record flattening
//!
//! Nested objects collapse into `parent_child` keys. Arrays are not walked:
//! they become their compact JSON text and count as one scalar.

use crate::types::JsonObject;
use serde_json::Value;

/// Separator between parent and child keys
pub const KEY_SEPARATOR: &str = "_";

/// Flatten one object record into `(field, value)` pairs in key order.
///
/// Nulls are kept so the caller can see the field; empty nested objects
/// contribute no fields.
pub fn flatten_record(record: &JsonObject) -> Vec<(String, Value)> {
    let mut fields = Vec::with_capacity(record.len());
    flatten_into(None, record, &mut fields);
    fields
}

fn flatten_into(prefix: Option<&str>, object: &JsonObject, out: &mut Vec<(String, Value)>) {
    for (key, value) in object {
        let name = match prefix {
            Some(parent) => format!("{parent}{KEY_SEPARATOR}{key}"),
            None => key.clone(),
        };

        match value {
            Value::Object(child) => flatten_into(Some(&name), child, out),
            Value::Array(_) => out.push((name, Value::String(value.to_string()))),
            scalar => out.push((name, scalar.clone())),
        }
    }
}
