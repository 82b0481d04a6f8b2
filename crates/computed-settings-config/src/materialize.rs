//! Materialization of merged configuration into owned values.
//!
//! Converts a lazily-evaluated [`MergedConfig`] into an owned [`ConfigValue`]
//! tree: the computed value that is serialized into a generated region and
//! compared against the host's view.
//!
//! # Depth Limiting
//!
//! Materialization enforces a maximum depth to prevent stack overflow from
//! deeply nested configurations. The default limit is 256 levels.

use crate::merged::{MergedConfig, MergedCursor, MergedValue};
use crate::types::{ConfigError, ConfigValue, ConfigValueKind};
use computed_settings_error_reporting::{DiagnosticMessage, ErrorKind};
use computed_settings_source_map::SourceInfo;
use indexmap::IndexMap;

/// Options for materialization.
#[derive(Debug, Clone)]
pub struct MaterializeOptions {
    /// Maximum nesting depth (default: 256).
    pub max_depth: usize,
}

impl Default for MaterializeOptions {
    fn default() -> Self {
        Self { max_depth: 256 }
    }
}

impl<'a> MergedConfig<'a> {
    /// Materialize with default options.
    ///
    /// Each value keeps the `SourceInfo` of the layer it came from. An empty
    /// merge materializes to an empty object.
    pub fn materialize(&self) -> Result<ConfigValue, ConfigError> {
        self.materialize_with_options(&MaterializeOptions::default())
    }

    /// Materialize with custom options.
    pub fn materialize_with_options(
        &self,
        options: &MaterializeOptions,
    ) -> Result<ConfigValue, ConfigError> {
        let cursor = self.cursor();
        if !cursor.exists() {
            return Ok(ConfigValue::empty_object());
        }
        materialize_cursor(&cursor, 0, options, &mut Vec::new())
    }
}

fn materialize_cursor(
    cursor: &MergedCursor<'_>,
    depth: usize,
    options: &MaterializeOptions,
    path: &mut Vec<String>,
) -> Result<ConfigValue, ConfigError> {
    if depth > options.max_depth {
        return Err(ConfigError::NestingTooDeep {
            max_depth: options.max_depth,
            path: path.clone(),
        });
    }

    match cursor.as_value() {
        Some(MergedValue::Leaf(leaf)) => Ok(leaf.value.clone()),
        Some(MergedValue::Object(object)) => {
            let mut entries = IndexMap::new();
            for (key, child) in object.iter() {
                path.push(key.to_string());
                let value = materialize_cursor(&child, depth + 1, options, path)?;
                path.pop();
                entries.insert(key.to_string(), value);
            }

            // The highest-priority object stands for the merged one
            let source_info = object
                .contributions()
                .last()
                .and_then(|(_, value)| value.source_info.clone());

            Ok(ConfigValue {
                value: ConfigValueKind::Object(entries),
                source_info,
            })
        }
        None => Ok(ConfigValue::null()),
    }
}

/// One root value to merge, with the location of the declaration that produced it.
#[derive(Debug, Clone, Copy)]
pub struct MergeLayer<'a> {
    pub value: &'a ConfigValue,
    pub declared_at: Option<&'a SourceInfo>,
}

/// Merge root values in order, collecting diagnostics.
///
/// A root that is not an object is reported as `NonObjectImport` at its
/// declaration and contributes nothing; the remaining layers still merge.
pub fn merge_with_diagnostics(
    layers: &[MergeLayer<'_>],
    diagnostics: &mut Vec<DiagnosticMessage>,
) -> Result<ConfigValue, ConfigError> {
    let mut objects = Vec::with_capacity(layers.len());

    for layer in layers {
        if layer.value.is_object() {
            objects.push(layer.value);
            continue;
        }

        let location = layer
            .declared_at
            .cloned()
            .or_else(|| layer.value.source_info.clone());
        diagnostics.push(
            ErrorKind::NonObjectImport
                .diagnostic()
                .problem(format!(
                    "The imported value is a {}, but only objects can be merged",
                    layer.value.type_name()
                ))
                .with_optional_location(location)
                .build(),
        );
    }

    MergedConfig::new(objects).materialize()
}

/// Merge object values in order (later wins).
///
/// Non-object values are skipped. Use [`merge_with_diagnostics`] to report them.
pub fn merge(values: &[ConfigValue]) -> Result<ConfigValue, ConfigError> {
    MergedConfig::new(values.iter().filter(|v| v.is_object()).collect()).materialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::from_json;
    use computed_settings_source_map::{PathConvention, Uri};
    use serde_json::json;

    fn j(value: serde_json::Value) -> ConfigValue {
        from_json(&value)
    }

    #[test]
    fn test_materialize_empty() {
        let merged = MergedConfig::empty();
        assert_eq!(merged.materialize().unwrap(), ConfigValue::empty_object());
    }

    #[test]
    fn test_merge_later_wins() {
        let result = merge(&[j(json!({"x": 1, "y": 2})), j(json!({"y": 3, "z": 4}))]).unwrap();
        assert_eq!(result, j(json!({"x": 1, "y": 3, "z": 4})));

        let keys: Vec<_> = result.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["x", "y", "z"]);
    }

    #[test]
    fn test_merge_is_deep_for_objects_only() {
        let result = merge(&[
            j(json!({"editor": {"fontSize": 12, "rulers": [80, 100]}})),
            j(json!({"editor": {"tabSize": 2, "rulers": [120]}})),
        ])
        .unwrap();
        assert_eq!(
            result,
            j(json!({"editor": {"fontSize": 12, "rulers": [120], "tabSize": 2}}))
        );
    }

    #[test]
    fn test_merge_associativity() {
        let a = j(json!({"k": {"a": 1, "b": [1]}, "s": "a"}));
        let b = j(json!({"k": {"b": 2, "c": {"d": 1}}, "t": null}));
        let c = j(json!({"k": {"c": {"e": 2}, "a": {"x": 0}}, "s": "c"}));

        let all = merge(&[a.clone(), b.clone(), c.clone()]).unwrap();
        let left = merge(&[merge(&[a.clone(), b.clone()]).unwrap(), c.clone()]).unwrap();
        let right = merge(&[a, merge(&[b, c]).unwrap()]).unwrap();

        assert_eq!(all, left);
        assert_eq!(all, right);
    }

    #[test]
    fn test_depth_limit() {
        let mut value = json!(1);
        for _ in 0..5 {
            value = json!({ "n": value });
        }
        let layer = j(value);
        let merged = MergedConfig::new(vec![&layer]);
        let err = merged
            .materialize_with_options(&MaterializeOptions { max_depth: 3 })
            .unwrap_err();
        assert!(matches!(err, ConfigError::NestingTooDeep { max_depth: 3, .. }));
    }

    #[test]
    fn test_non_object_root_is_reported_and_skipped() {
        let uri = Uri::file("/w/settings.json", PathConvention::Posix);
        let declared = SourceInfo::from_offsets(uri, "[\"a.json\"]", 1, 9);
        let a = j(json!([1, 2]));
        let b = j(json!({"x": 1}));

        let mut diagnostics = Vec::new();
        let result = merge_with_diagnostics(
            &[
                MergeLayer {
                    value: &a,
                    declared_at: Some(&declared),
                },
                MergeLayer {
                    value: &b,
                    declared_at: None,
                },
            ],
            &mut diagnostics,
        )
        .unwrap();

        assert_eq!(result, j(json!({"x": 1})));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].error_kind(), Some(ErrorKind::NonObjectImport));
        assert_eq!(diagnostics[0].location, Some(declared));
    }

    #[test]
    fn test_source_info_from_highest_layer() {
        let uri_a = Uri::file("/a.json", PathConvention::Posix);
        let uri_b = Uri::file("/b.json", PathConvention::Posix);
        let a = j(json!({"x": 1})).with_source_info(SourceInfo::start_of(uri_a));
        let b = j(json!({"y": 1})).with_source_info(SourceInfo::start_of(uri_b.clone()));

        let result = merge(&[a, b]).unwrap();
        assert_eq!(result.source_info.unwrap().uri, uri_b);
    }
}
