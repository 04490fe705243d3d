//! Field access for anything the query engine can filter.

use crate::query::value::Value;

/// A read-only bag of fields addressed by key.
///
/// Implementations return [`Value::Null`] for keys they do not carry; the
/// evaluator applies its coercion rules from there.
pub trait Record {
    /// Returns the value stored under `key`.
    fn field(&self, key: &str) -> Value;
}

impl<R: Record + ?Sized> Record for &R {
    fn field(&self, key: &str) -> Value {
        (**self).field(key)
    }
}

impl<R: Record + ?Sized> Record for Box<R> {
    fn field(&self, key: &str) -> Value {
        (**self).field(key)
    }
}

/// Ad-hoc JSON objects. Arrays become lists of their scalar items' text;
/// nested objects and non-object roots read as null.
impl Record for serde_json::Value {
    fn field(&self, key: &str) -> Value {
        self.get(key).map_or(Value::Null, json_to_value)
    }
}

fn json_to_value(json: &serde_json::Value) -> Value {
    use serde_json::Value as Json;
    match json {
        Json::Null | Json::Object(_) => Value::Null,
        Json::Bool(v) => Value::Bool(*v),
        Json::Number(n) => n.as_f64().map_or(Value::Null, Value::Number),
        Json::String(s) => Value::String(s.clone()),
        Json::Array(items) => Value::List(
            items
                .iter()
                .filter_map(|item| match item {
                    Json::String(s) => Some(s.clone()),
                    Json::Number(n) => Some(n.to_string()),
                    Json::Bool(b) => Some(b.to_string()),
                    Json::Null | Json::Array(_) | Json::Object(_) => None,
                })
                .collect(),
        ),
    }
}
