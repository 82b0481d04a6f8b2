//! Deterministic JSON text for configuration values.
//!
//! Generated regions must be byte-identical across runs for an unchanged
//! value, so serialization depends only on the value (member order included)
//! and the indentation unit.

use crate::convert::to_json;
use crate::types::ConfigValue;
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};

/// Pretty-print a value with the given indentation unit.
///
/// Nested lines are indented relative to column zero; callers embedding the
/// text deeper must prefix continuation lines themselves.
pub fn to_pretty_string(value: &ConfigValue, indent: &str) -> String {
    let json = to_json(value);
    let mut out = Vec::new();
    let formatter = PrettyFormatter::with_indent(indent.as_bytes());
    let mut serializer = Serializer::with_formatter(&mut out, formatter);
    // Serializing a serde_json::Value into memory cannot fail
    if json.serialize(&mut serializer).is_err() {
        return json.to_string();
    }
    String::from_utf8(out).unwrap_or_else(|_| json.to_string())
}

/// Quote and escape an object key.
pub fn quote_key(key: &str) -> String {
    serde_json::Value::String(key.to_string()).to_string()
}

/// Render one object member as `"key": value`, pretty-printed, with every
/// continuation line prefixed by `line_prefix`.
pub fn member_text(key: &str, value: &ConfigValue, indent: &str, line_prefix: &str) -> String {
    let body = to_pretty_string(value, indent);
    let mut text = format!("{}: ", quote_key(key));
    for (i, line) in body.split('\n').enumerate() {
        if i > 0 {
            text.push('\n');
            text.push_str(line_prefix);
        }
        text.push_str(line);
    }
    text
}
