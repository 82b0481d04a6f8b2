//! Core type definitions for configuration values.

use computed_settings_source_map::SourceInfo;
use indexmap::IndexMap;
use serde_json::Number;
use thiserror::Error;

/// An atomic configuration value.
#[derive(Debug, Clone)]
pub enum Scalar {
    Null,
    Bool(bool),
    /// Numbers keep their written form (`1` stays an integer, `1.0` a float)
    Number(Number),
    String(String),
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Scalar::Null, Scalar::Null) => true,
            (Scalar::Bool(a), Scalar::Bool(b)) => a == b,
            (Scalar::String(a), Scalar::String(b)) => a == b,
            // `1` and `1.0` denote the same setting value
            (Scalar::Number(a), Scalar::Number(b)) => {
                a == b || matches!((a.as_f64(), b.as_f64()), (Some(x), Some(y)) if x == y)
            }
            _ => false,
        }
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Number(value.into())
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::String(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::String(value)
    }
}

/// A configuration value.
///
/// Every node optionally carries the location it was read from. Locations
/// never take part in equality: two values are equal when their structure
/// and scalars are equal, wherever they came from.
#[derive(Debug, Clone)]
pub struct ConfigValue {
    /// The underlying value
    pub value: ConfigValueKind,

    /// Source location for this value
    pub source_info: Option<SourceInfo>,
}

/// The kind of configuration value.
#[derive(Debug, Clone)]
pub enum ConfigValueKind {
    /// Atomic values. Always "last wins" when merged.
    Scalar(Scalar),

    /// Arrays are replaced as a whole when merged, never concatenated.
    Array(Vec<ConfigValue>),

    /// Objects are merged key by key. Keys keep first-insertion order.
    Object(IndexMap<String, ConfigValue>),
}

impl ConfigValue {
    pub fn new(value: ConfigValueKind) -> Self {
        Self {
            value,
            source_info: None,
        }
    }

    /// Create a new scalar ConfigValue.
    pub fn new_scalar(scalar: impl Into<Scalar>) -> Self {
        Self::new(ConfigValueKind::Scalar(scalar.into()))
    }

    /// Create a new array ConfigValue.
    pub fn new_array(items: Vec<ConfigValue>) -> Self {
        Self::new(ConfigValueKind::Array(items))
    }

    /// Create a new object ConfigValue.
    pub fn new_object(entries: IndexMap<String, ConfigValue>) -> Self {
        Self::new(ConfigValueKind::Object(entries))
    }

    /// An object without members.
    pub fn empty_object() -> Self {
        Self::new_object(IndexMap::new())
    }

    /// Create a null ConfigValue.
    pub fn null() -> Self {
        Self::new(ConfigValueKind::Scalar(Scalar::Null))
    }

    /// Attach a source location.
    pub fn with_source_info(mut self, source_info: SourceInfo) -> Self {
        self.source_info = Some(source_info);
        self
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self.value, ConfigValueKind::Scalar(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self.value, ConfigValueKind::Array(_))
    }

    pub fn is_object(&self) -> bool {
        matches!(self.value, ConfigValueKind::Object(_))
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match &self.value {
            ConfigValueKind::Scalar(scalar) => Some(scalar),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.value {
            ConfigValueKind::Scalar(Scalar::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[ConfigValue]> {
        match &self.value {
            ConfigValueKind::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&IndexMap<String, ConfigValue>> {
        match &self.value {
            ConfigValueKind::Object(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut IndexMap<String, ConfigValue>> {
        match &mut self.value {
            ConfigValueKind::Object(entries) => Some(entries),
            _ => None,
        }
    }

    /// Member of an object value.
    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.as_object().and_then(|entries| entries.get(key))
    }

    /// Short type name used in messages ("object", "array", "string", ...).
    pub fn type_name(&self) -> &'static str {
        match &self.value {
            ConfigValueKind::Object(_) => "object",
            ConfigValueKind::Array(_) => "array",
            ConfigValueKind::Scalar(Scalar::Null) => "null",
            ConfigValueKind::Scalar(Scalar::Bool(_)) => "boolean",
            ConfigValueKind::Scalar(Scalar::Number(_)) => "number",
            ConfigValueKind::Scalar(Scalar::String(_)) => "string",
        }
    }

    /// Drop all source locations, recursively.
    pub fn without_source_info(mut self) -> Self {
        self.strip_source_info();
        self
    }

    fn strip_source_info(&mut self) {
        self.source_info = None;
        match &mut self.value {
            ConfigValueKind::Array(items) => items.iter_mut().for_each(Self::strip_source_info),
            ConfigValueKind::Object(entries) => {
                entries.values_mut().for_each(Self::strip_source_info)
            }
            ConfigValueKind::Scalar(_) => {}
        }
    }
}

impl PartialEq for ConfigValue {
    fn eq(&self, other: &Self) -> bool {
        match (&self.value, &other.value) {
            (ConfigValueKind::Scalar(a), ConfigValueKind::Scalar(b)) => a == b,
            (ConfigValueKind::Array(a), ConfigValueKind::Array(b)) => a == b,
            (ConfigValueKind::Object(a), ConfigValueKind::Object(b)) => {
                // Member order is not part of a setting's meaning
                a.len() == b.len()
                    && a.iter()
                        .all(|(key, value)| b.get(key).is_some_and(|other| value == other))
            }
            _ => false,
        }
    }
}

/// Errors that can occur during configuration operations.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration nesting exceeds maximum depth.
    #[error("Config nesting too deep (max depth: {max_depth}) at path: {}", path.join("."))]
    NestingTooDeep {
        /// Maximum allowed depth
        max_depth: usize,
        /// Path where the limit was exceeded
        path: Vec<String>,
    },

    /// A merge layer's root is not an object.
    #[error("Cannot merge a {found} at the root of layer {layer}")]
    NonObjectRoot {
        /// Index of the offending layer
        layer: usize,
        /// Type name of the value found
        found: &'static str,
    },
}
