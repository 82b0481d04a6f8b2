//! Conversion between `ConfigValue` and `serde_json::Value`.
//!
//! `serde_json` is built with `preserve_order`, so object member order
//! survives both directions.

use crate::types::{ConfigValue, ConfigValueKind, Scalar};
use serde_json::Value;

/// Convert a JSON value to a `ConfigValue` without source locations.
pub fn from_json(value: &Value) -> ConfigValue {
    let kind = match value {
        Value::Null => ConfigValueKind::Scalar(Scalar::Null),
        Value::Bool(b) => ConfigValueKind::Scalar(Scalar::Bool(*b)),
        Value::Number(n) => ConfigValueKind::Scalar(Scalar::Number(n.clone())),
        Value::String(s) => ConfigValueKind::Scalar(Scalar::String(s.clone())),
        Value::Array(items) => ConfigValueKind::Array(items.iter().map(from_json).collect()),
        Value::Object(map) => ConfigValueKind::Object(
            map.iter()
                .map(|(key, value)| (key.clone(), from_json(value)))
                .collect(),
        ),
    };
    ConfigValue::new(kind)
}

/// Convert a `ConfigValue` to a JSON value, dropping source locations.
pub fn to_json(value: &ConfigValue) -> Value {
    match &value.value {
        ConfigValueKind::Scalar(scalar) => scalar_to_json(scalar),
        ConfigValueKind::Array(items) => Value::Array(items.iter().map(to_json).collect()),
        ConfigValueKind::Object(entries) => Value::Object(
            entries
                .iter()
                .map(|(key, value)| (key.clone(), to_json(value)))
                .collect(),
        ),
    }
}

pub fn scalar_to_json(scalar: &Scalar) -> Value {
    match scalar {
        Scalar::Null => Value::Null,
        Scalar::Bool(b) => Value::Bool(*b),
        Scalar::Number(n) => Value::Number(n.clone()),
        Scalar::String(s) => Value::String(s.clone()),
    }
}

impl From<&Value> for ConfigValue {
    fn from(value: &Value) -> Self {
        from_json(value)
    }
}

impl From<&ConfigValue> for Value {
    fn from(value: &ConfigValue) -> Self {
        to_json(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_round_trip_keeps_member_order() {
        let original = json!({"z": 1, "a": [true, null, "s", 1.5], "m": {"y": {}, "b": []}});
        let back = to_json(&from_json(&original));
        assert_eq!(
            serde_json::to_string(&back).unwrap(),
            serde_json::to_string(&original).unwrap()
        );
    }

    #[test]
    fn test_integer_stays_integer() {
        let value = from_json(&json!(3));
        assert_eq!(to_json(&value).to_string(), "3");
        let value = from_json(&json!(3.0));
        assert_eq!(to_json(&value).to_string(), "3.0");
    }
}
