/*
 * pass.rs
 * Copyright (c) 2026 computed-settings contributors
 *
 * The resolution pass driver.
 */

//! One resolution pass: resolve, load, merge, patch, write, check.
//!
//! A pass runs in three phases:
//!
//! 1. every target's import graph is built (loads shared across targets)
//!    and its merged value patched into the pending text of its
//!    destination, all in memory
//! 2. unless cancelled, changed destinations are written
//! 3. the host's view of each destination object is checked against the
//!    computed value
//!
//! Cancellation aborts in phase 1 only; nothing is written for a cancelled
//! pass.

use crate::cancel::{Cancellation, Cancelled};
use crate::checker::{HostConfiguration, check};
use crate::graph::GraphBuilder;
use crate::loader::LoadContext;
use crate::patch::{PatchError, patch_destination};
use crate::scope::{ConfigScope, ImportTarget, ScopeSettings};
use computed_settings_config::{ConfigValue, PropertyPath, to_json};
use computed_settings_error_reporting::{DiagnosticMessage, ErrorKind};
use computed_settings_ncl::Evaluator;
use computed_settings_runtime::{SharedRuntime, SystemRuntime};
use computed_settings_source_map::{PathConvention, SourceContext, SourceInfo, Uri};
use futures::future::try_join_all;
use indexmap::IndexMap;
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Why a pass produced no report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PassError {
    #[error(transparent)]
    Cancelled(#[from] Cancelled),
}

#[derive(Debug, Clone)]
pub struct PassOptions {
    pub convention: PathConvention,
    /// Indentation of generated members when the destination shows none
    pub indent: String,
    /// Compute everything but write nothing
    pub dry_run: bool,
}

impl Default for PassOptions {
    fn default() -> Self {
        PassOptions {
            convention: PathConvention::native(),
            indent: "  ".to_string(),
            dry_run: false,
        }
    }
}

/// The outcome for one target.
#[derive(Debug, Clone)]
pub struct TargetReport {
    pub scope: ConfigScope,
    pub destination: Uri,
    pub property: PropertyPath,
    /// The merged value of the target's imports
    pub value: ConfigValue,
    /// Whether the region text differs from what was on disk
    pub changed: bool,
    pub written: bool,
    pub diagnostics: Vec<DiagnosticMessage>,
    /// Every file the target's imports reached
    pub files: Vec<Uri>,
}

impl TargetReport {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(DiagnosticMessage::is_error)
    }
}

/// Everything one pass did.
#[derive(Debug, Clone, Default)]
pub struct PassReport {
    pub targets: Vec<TargetReport>,
    /// Problems with the import settings themselves
    pub diagnostics: Vec<DiagnosticMessage>,
    /// Text of every file read or written, for rendering diagnostics
    pub sources: SourceContext,
    /// Every scope settings file, whether or not it exists
    pub settings_files: Vec<Uri>,
}

impl PassReport {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(DiagnosticMessage::is_error)
            || self.targets.iter().any(TargetReport::has_errors)
    }

    pub fn all_diagnostics(&self) -> impl Iterator<Item = &DiagnosticMessage> {
        self.diagnostics
            .iter()
            .chain(self.targets.iter().flat_map(|t| t.diagnostics.iter()))
    }

    /// Files whose change should trigger another pass.
    pub fn watched_files(&self) -> Vec<Uri> {
        let mut files = self.settings_files.clone();
        for target in &self.targets {
            for uri in std::iter::once(&target.destination).chain(&target.files) {
                if !files.contains(uri) {
                    files.push(uri.clone());
                }
            }
        }
        files
    }

    /// Human-readable summary followed by every diagnostic.
    pub fn to_text(&self, color: bool) -> String {
        let mut out = String::new();
        for target in &self.targets {
            let status = match (target.changed, target.written) {
                (_, true) => "updated",
                (true, false) => "out of date",
                (false, false) => "up to date",
            };
            out.push_str(&format!(
                "{} {}: {} ({status})\n",
                target.scope,
                target.destination,
                display_property(&target.property)
            ));
        }
        for diagnostic in self.all_diagnostics() {
            let text = if color {
                diagnostic.to_ansi_text(Some(&self.sources))
            } else {
                diagnostic.to_text(Some(&self.sources))
            };
            out.push_str(&text);
        }
        out
    }

    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "targets": self.targets.iter().map(|target| json!({
                "scope": target.scope.to_string(),
                "destination": target.destination.as_str(),
                "property": target.property.segments(),
                "value": to_json(&target.value),
                "changed": target.changed,
                "written": target.written,
                "files": target.files.iter().map(Uri::as_str).collect::<Vec<_>>(),
                "diagnostics": target.diagnostics.iter().map(DiagnosticMessage::to_json).collect::<Vec<_>>(),
            })).collect::<Vec<_>>(),
            "diagnostics": self.diagnostics.iter().map(DiagnosticMessage::to_json).collect::<Vec<_>>(),
        })
    }
}

fn display_property(property: &PropertyPath) -> String {
    if property.is_root() {
        "(root)".to_string()
    } else {
        property.to_string()
    }
}

/// A destination file as the pass sees it.
struct PendingFile {
    /// What is on disk; `None` for a missing file
    original: Option<String>,
    text: String,
}

/// Drives resolution passes.
pub struct ResolutionPass {
    runtime: SharedRuntime,
    evaluator: Arc<dyn Evaluator>,
    host: Arc<dyn HostConfiguration>,
    options: PassOptions,
}

impl ResolutionPass {
    pub fn new(
        runtime: SharedRuntime,
        evaluator: Arc<dyn Evaluator>,
        host: Arc<dyn HostConfiguration>,
        options: PassOptions,
    ) -> Self {
        ResolutionPass {
            runtime,
            evaluator,
            host,
            options,
        }
    }

    pub fn options(&self) -> &PassOptions {
        &self.options
    }

    /// Run one pass over `scopes`, which must be in precedence order.
    pub async fn run(
        &self,
        scopes: &[ScopeSettings],
        cancel: &Cancellation,
    ) -> Result<PassReport, PassError> {
        let mut report = PassReport::default();
        let mut targets: Vec<(ConfigScope, ImportTarget)> = Vec::new();
        for settings in scopes {
            report.settings_files.push(settings.location.settings_file.clone());
            report.diagnostics.extend(settings.diagnostics.iter().cloned());
            if let Some(text) = &settings.text {
                report
                    .sources
                    .add_file(settings.location.settings_file.clone(), text.clone());
            }
            targets.extend(
                settings
                    .targets()
                    .into_iter()
                    .map(|target| (settings.location.scope.clone(), target)),
            );
        }
        debug!(targets = targets.len(), "starting resolution pass");

        // Phase 1
        let builder = GraphBuilder::new(
            LoadContext::new(self.runtime.clone(), cancel.clone(), self.options.convention),
            self.evaluator.clone(),
        );
        let outcomes = try_join_all(
            targets
                .iter()
                .map(|(_, target)| builder.build(&target.declarations, target.base.as_ref())),
        )
        .await?;

        let mut pending: IndexMap<Uri, PendingFile> = IndexMap::new();
        for ((scope, target), outcome) in targets.into_iter().zip(outcomes) {
            for node in outcome.graph.nodes() {
                if let Some(text) = &node.text {
                    report.sources.add_file(node.uri.clone(), text.clone());
                }
            }
            let (value, merge_diagnostics) = outcome.merge();
            let mut diagnostics = outcome.diagnostics;
            diagnostics.extend(merge_diagnostics);

            if !pending.contains_key(&target.destination) {
                match self.read_destination(&target.destination).await {
                    Ok(original) => {
                        let text = original.clone().unwrap_or_default();
                        pending.insert(target.destination.clone(), PendingFile { original, text });
                    }
                    Err(diagnostic) => diagnostics.push(diagnostic),
                }
            }
            cancel.check()?;

            let mut changed = false;
            if let Some(file) = pending.get_mut(&target.destination) {
                match patch_destination(&file.text, &target.property, &value, &self.options.indent) {
                    Ok(text) => {
                        changed = file.original.as_deref() != Some(text.as_str());
                        file.text = text;
                    }
                    Err(error) => {
                        report_patch_error(&error, &target, &file.text, &mut diagnostics);
                    }
                }
            }

            report.targets.push(TargetReport {
                scope,
                destination: target.destination,
                property: target.property,
                value,
                changed,
                written: false,
                diagnostics,
                files: outcome.graph.files(),
            });
        }

        cancel.check()?;

        // Phase 2
        for (uri, file) in &pending {
            if file.original.as_deref() == Some(file.text.as_str()) {
                continue;
            }
            if self.options.dry_run {
                info!(uri = %uri, "would update destination");
                continue;
            }
            let outcome = self.runtime.file_write(uri, file.text.as_bytes()).await;
            for target in report.targets.iter_mut().filter(|t| &t.destination == uri) {
                match &outcome {
                    Ok(()) => target.written = true,
                    Err(error) => target.diagnostics.push(
                        ErrorKind::CannotWriteFile
                            .diagnostic()
                            .problem(error.to_string())
                            .with_location(SourceInfo::start_of(uri.clone()))
                            .build(),
                    ),
                }
            }
            match outcome {
                Ok(()) => info!(uri = %uri, "updated destination"),
                Err(error) => warn!(uri = %uri, %error, "cannot write destination"),
            }
        }
        for (uri, file) in pending {
            report.sources.add_file(uri, file.text);
        }

        // Phase 3
        for index in self.checked_targets(&report.targets) {
            let target = &report.targets[index];
            let host_value = self
                .host
                .effective_value(&target.destination, &target.property)
                .await;
            let mismatches = check(
                &target.value,
                host_value.as_ref(),
                &target.destination,
                &target.property,
            );
            report.targets[index].diagnostics.extend(mismatches);
        }

        Ok(report)
    }

    /// Targets whose destination now holds their value on disk. A later
    /// target writing the same object replaces an earlier one, so only the
    /// last is checked.
    fn checked_targets(&self, targets: &[TargetReport]) -> Vec<usize> {
        let mut last: IndexMap<(&Uri, &PropertyPath), usize> = IndexMap::new();
        for (index, target) in targets.iter().enumerate() {
            let on_disk = target.written || (!target.changed && !target.has_errors());
            if on_disk {
                last.insert((&target.destination, &target.property), index);
            } else {
                last.shift_remove(&(&target.destination, &target.property));
            }
        }
        last.into_values().collect()
    }

    async fn read_destination(&self, uri: &Uri) -> Result<Option<String>, DiagnosticMessage> {
        read_optional(self.runtime.as_ref(), uri).await
    }
}

/// Read a file that may legitimately be missing.
async fn read_optional(
    runtime: &dyn SystemRuntime,
    uri: &Uri,
) -> Result<Option<String>, DiagnosticMessage> {
    let at = || SourceInfo::start_of(uri.clone());
    match runtime.file_read(uri).await {
        Ok(bytes) => String::from_utf8(bytes).map(Some).map_err(|_| {
            ErrorKind::FileIsNotUtf8
                .diagnostic()
                .with_location(at())
                .build()
        }),
        Err(error) if error.is_not_found() => Ok(None),
        Err(error) => Err(ErrorKind::CannotReadFile
            .diagnostic()
            .problem(error.to_string())
            .with_location(at())
            .build()),
    }
}

fn report_patch_error(
    error: &PatchError,
    target: &ImportTarget,
    text: &str,
    diagnostics: &mut Vec<DiagnosticMessage>,
) {
    warn!(
        destination = %target.destination,
        %error,
        "cannot patch destination"
    );
    diagnostics.extend(error.to_diagnostics(&target.destination, text));
}
