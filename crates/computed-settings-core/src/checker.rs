/*
 * checker.rs
 * Copyright (c) 2026 computed-settings contributors
 *
 * Comparison of computed values with the host-reported configuration.
 */

//! Cross-checking computed values against the host's own view.

use async_trait::async_trait;
use computed_settings_config::{ConfigValue, DifferenceKind, PropertyPath, diff, to_json};
use computed_settings_error_reporting::{DiagnosticMessage, ErrorKind};
use computed_settings_jsonc::parse_config;
use computed_settings_runtime::SharedRuntime;
use computed_settings_source_map::{SourceInfo, Uri};
use indexmap::IndexMap;
use tracing::debug;

/// The host that independently parses and merges settings files.
#[async_trait]
pub trait HostConfiguration: Send + Sync {
    /// The host's resolved value of `property` in `destination`, if any.
    async fn effective_value(&self, destination: &Uri, property: &PropertyPath)
    -> Option<ConfigValue>;
}

/// A host that re-reads the destination file and parses it on its own.
///
/// Duplicate keys resolve to the last occurrence, as editors do, so a
/// hand-written member after the region overrides the generated one.
pub struct ReparsingHost {
    runtime: SharedRuntime,
}

impl ReparsingHost {
    pub fn new(runtime: SharedRuntime) -> Self {
        ReparsingHost { runtime }
    }
}

#[async_trait]
impl HostConfiguration for ReparsingHost {
    async fn effective_value(
        &self,
        destination: &Uri,
        property: &PropertyPath,
    ) -> Option<ConfigValue> {
        let bytes = self.runtime.file_read(destination).await.ok()?;
        let text = String::from_utf8(bytes).ok()?;
        let (value, _) = parse_config(destination, &text);
        property.lookup(&value?).cloned()
    }
}

/// Compare the computed value with the host's value for the same object.
///
/// Only the members the computed value defines are compared; other
/// members of the destination are hand-written and none of our business.
/// Each difference is one `ImportsMismatch` warning.
pub fn check(
    computed: &ConfigValue,
    host_value: Option<&ConfigValue>,
    destination: &Uri,
    property: &PropertyPath,
) -> Vec<DiagnosticMessage> {
    let Some(expected) = computed.as_object() else {
        return Vec::new();
    };
    if expected.is_empty() {
        return Vec::new();
    }

    let Some(actual) = host_value.and_then(ConfigValue::as_object) else {
        return vec![
            ErrorKind::ImportsMismatch
                .diagnostic()
                .problem(format!(
                    "The host reports no object at `{}` in `{destination}`",
                    display_path(property)
                ))
                .with_location(SourceInfo::start_of(destination.clone()))
                .build(),
        ];
    };

    let compared: IndexMap<String, ConfigValue> = expected
        .keys()
        .filter_map(|key| Some((key.clone(), actual.get(key)?.clone())))
        .collect();
    let compared = ConfigValue::new_object(compared);

    let differences = diff(computed, &compared);
    debug!(
        destination = %destination,
        differences = differences.len(),
        "checked host configuration"
    );

    differences
        .into_iter()
        .map(|difference| {
            let location = difference
                .path
                .lookup(&compared)
                .and_then(|value| value.source_info.clone())
                .unwrap_or_else(|| SourceInfo::start_of(destination.clone()));
            let builder = ErrorKind::ImportsMismatch
                .diagnostic()
                .problem(format!(
                    "`{}` differs from the computed value",
                    display_path(&property.join(&difference.path))
                ));
            let builder = match &difference.kind {
                DifferenceKind::Missing { expected } => builder
                    .add_detail(format!("computed: {}", to_json(expected)))
                    .add_detail("the host has no value"),
                DifferenceKind::Unexpected { actual } => builder
                    .add_detail("computed: no value")
                    .add_detail(format!("host: {}", to_json(actual))),
                DifferenceKind::Changed { expected, actual } => builder
                    .add_detail(format!("computed: {}", to_json(expected)))
                    .add_detail(format!("host: {}", to_json(actual))),
            };
            builder
                .add_hint("A hand-written member after the generated region may override it")
                .with_location(location)
                .build()
        })
        .collect()
}

fn display_path(path: &PropertyPath) -> String {
    if path.is_root() {
        "(root)".to_string()
    } else {
        path.to_string()
    }
}
