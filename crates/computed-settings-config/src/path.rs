//! Property paths into configuration objects.

use crate::types::{ConfigValue, ConfigValueKind};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A sequence of object member names, outermost first.
///
/// Segments are taken literally: a segment may itself contain dots, as
/// editor settings keys usually do (`"editor.fontSize"`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PropertyPath(Vec<String>);

impl PropertyPath {
    /// The empty path, naming the document root.
    pub fn root() -> Self {
        PropertyPath(Vec::new())
    }

    pub fn new<S: Into<String>>(segments: impl IntoIterator<Item = S>) -> Self {
        PropertyPath(segments.into_iter().map(Into::into).collect())
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// This path extended by one segment.
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        PropertyPath(segments)
    }

    /// This path followed by all segments of `other`.
    pub fn join(&self, other: &PropertyPath) -> Self {
        let mut segments = self.0.clone();
        segments.extend(other.0.iter().cloned());
        PropertyPath(segments)
    }

    /// Follow the path through nested objects.
    pub fn lookup<'a>(&self, value: &'a ConfigValue) -> Option<&'a ConfigValue> {
        self.0
            .iter()
            .try_fold(value, |current, segment| current.get(segment))
    }

    /// Store `new_value` at this path, creating or replacing intermediate
    /// objects as needed. At the root the whole value is replaced.
    pub fn insert(&self, value: &mut ConfigValue, new_value: ConfigValue) {
        let Some((last, parents)) = self.0.split_last() else {
            *value = new_value;
            return;
        };

        let mut current = value;
        for segment in parents {
            current = object_entries(current)
                .entry(segment.clone())
                .or_insert_with(ConfigValue::empty_object);
        }
        object_entries(current).insert(last.clone(), new_value);
    }
}

fn object_entries(value: &mut ConfigValue) -> &mut IndexMap<String, ConfigValue> {
    if !value.is_object() {
        *value = ConfigValue::empty_object();
    }
    match &mut value.value {
        ConfigValueKind::Object(entries) => entries,
        _ => unreachable!("value was just made an object"),
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("<root>");
        }
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" > ")?;
            }
            write!(f, "{segment:?}")?;
        }
        Ok(())
    }
}

/// Look up an editor setting written either flat (`"a.b.c": v`) or nested
/// (`"a": {"b": {"c": v}}`), or any mix of the two.
///
/// Flat spellings take precedence over nested ones at each level, matching
/// how editors read their own settings files.
pub fn lookup_setting<'a>(settings: &'a ConfigValue, dotted_key: &str) -> Option<&'a ConfigValue> {
    if let Some(value) = settings.get(dotted_key) {
        return Some(value);
    }
    // Try every split point from the longest first segment down
    let mut split_points: Vec<usize> = dotted_key.match_indices('.').map(|(i, _)| i).collect();
    split_points.reverse();
    for idx in split_points {
        let (head, rest) = (&dotted_key[..idx], &dotted_key[idx + 1..]);
        if let Some(inner) = settings.get(head).filter(|v| v.is_object()) {
            if let Some(found) = lookup_setting(inner, rest) {
                return Some(found);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::from_json;
    use serde_json::json;

    #[test]
    fn test_lookup() {
        let value = from_json(&json!({"settings": {"editor.fontSize": 12}}));
        let path = PropertyPath::new(["settings", "editor.fontSize"]);
        assert_eq!(path.lookup(&value), Some(&from_json(&json!(12))));
        assert_eq!(PropertyPath::root().lookup(&value), Some(&value));
        assert!(PropertyPath::new(["nope"]).lookup(&value).is_none());
    }

    #[test]
    fn test_insert_creates_intermediate_objects() {
        let mut value = from_json(&json!({"a": 1}));
        PropertyPath::new(["b", "c"]).insert(&mut value, from_json(&json!(true)));
        assert_eq!(value, from_json(&json!({"a": 1, "b": {"c": true}})));

        PropertyPath::new(["a", "d"]).insert(&mut value, from_json(&json!(2)));
        assert_eq!(value, from_json(&json!({"a": {"d": 2}, "b": {"c": true}})));
    }

    #[test]
    fn test_insert_at_root_replaces() {
        let mut value = from_json(&json!({"a": 1}));
        PropertyPath::root().insert(&mut value, from_json(&json!({"b": 2})));
        assert_eq!(value, from_json(&json!({"b": 2})));
    }

    #[test]
    fn test_display() {
        assert_eq!(PropertyPath::root().to_string(), "<root>");
        assert_eq!(
            PropertyPath::new(["settings", "x.y"]).to_string(),
            "\"settings\" > \"x.y\""
        );
    }

    #[test]
    fn test_lookup_setting_flat_nested_and_mixed() {
        let flat = from_json(&json!({"computed-settings.imports": ["a.json"]}));
        let nested = from_json(&json!({"computed-settings": {"imports": ["b.json"]}}));
        let mixed = from_json(&json!({"x": {"y.z": 1}}));

        assert_eq!(
            lookup_setting(&flat, "computed-settings.imports"),
            Some(&from_json(&json!(["a.json"])))
        );
        assert_eq!(
            lookup_setting(&nested, "computed-settings.imports"),
            Some(&from_json(&json!(["b.json"])))
        );
        assert_eq!(lookup_setting(&mixed, "x.y.z"), Some(&from_json(&json!(1))));
        assert!(lookup_setting(&nested, "computed-settings.importInto").is_none());
    }
}
