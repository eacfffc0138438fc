//! Conversions between event values and `serde_json` values.
//!
//! The pipeline boundary speaks `serde_json::Value` (pipeline configuration,
//! NDJSON input); the engine speaks [`Value`]. Conversions follow the same
//! rules as JSON decoding: whole numbers become `Integer`, everything else
//! numeric becomes `Float`, and neither `UnsignedInteger` nor `Timestamp` is
//! ever inferred.

use crate::event::Event;
use crate::value::Value;

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Integer(i)
                } else if let Some(f) = n.as_f64() {
                    Value::Float(f)
                } else {
                    Value::Null
                }
            }
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(fields) => Value::Object(
                fields
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl Value {
    /// Converts to a `serde_json::Value`. Fails on non-finite floats;
    /// timestamps render as RFC-3339 strings.
    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

impl Event {
    /// Builds an event from a JSON value. The value must be an object.
    pub fn from_json(value: serde_json::Value) -> serde_json::Result<Event> {
        serde_json::from_value(value)
    }

    /// Renders the event as a JSON value.
    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}
