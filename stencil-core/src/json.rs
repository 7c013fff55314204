//! Conversions between [`Value`] and JSON.

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::value::Value;

/// Largest magnitude below which every whole `f64` is an exact integer.
const SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Values JSON cannot represent. They are dropped from objects and become
/// `null` elsewhere.
fn is_unrepresentable(v: &Value) -> bool {
    matches!(v, Value::Undefined | Value::Function(_) | Value::Handler(_))
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Undefined | Value::Null | Value::Function(_) | Value::Handler(_) => {
                s.serialize_unit()
            }
            Value::Bool(b) => s.serialize_bool(*b),
            Value::Number(n) if !n.is_finite() => s.serialize_unit(),
            Value::Number(n) if n.fract() == 0.0 && n.abs() < SAFE_INTEGER => {
                s.serialize_i64(*n as i64)
            }
            Value::Number(n) => s.serialize_f64(*n),
            Value::Str(text) => s.serialize_str(text),
            Value::Array(items) => s.collect_seq(items.iter()),
            Value::Object(map) => {
                let mut out = s.serialize_map(None)?;
                for (k, v) in map.iter().filter(|(_, v)| !is_unrepresentable(v)) {
                    out.serialize_entry(k, v)?;
                }
                out.end()
            }
        }
    }
}

impl Value {
    /// JSON text for the value, or `None` when it has no JSON form.
    pub fn to_json(&self) -> Option<String> {
        if is_unrepresentable(self) {
            return None;
        }
        serde_json::to_string(self).ok()
    }
}

impl From<&serde_json::Value> for Value {
    fn from(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::str(s),
            serde_json::Value::Array(items) => Value::array(items.iter().map(Value::from)),
            serde_json::Value::Object(map) => {
                Value::object(map.iter().map(|(k, v)| (k.as_str(), Value::from(v))))
            }
        }
    }
}
