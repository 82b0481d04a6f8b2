/*
 * graph.rs
 * Copyright (c) 2026 computed-settings contributors
 *
 * Single-flight import graph construction and merging.
 */

//! The import graph builder.
//!
//! Loads every file reachable from a target's declarations. Loads are
//! single-flight per resolved location: concurrent requests for one file
//! share the in-flight load, and each file is read and parsed at most once
//! per builder. Branches load concurrently, but results are always combined
//! in declaration order, so completion order never shows in the outcome.

use crate::cancel::Cancelled;
use crate::loader::{
    FileFormat, FormatLoader, JsonLoader, LoadContext, LoadFailure, Loaded, NclLoader,
};
use crate::resolver::{resolve, resolve_from_file};
use computed_settings_config::{ConfigValue, MergeLayer, merge_with_diagnostics};
use computed_settings_error_reporting::{DiagnosticCollector, DiagnosticMessage, ErrorKind};
use computed_settings_ncl::{Evaluator, ReadFailure};
use computed_settings_source_map::{SourceInfo, Uri};
use futures::future::{BoxFuture, FutureExt, Shared, try_join_all};
use indexmap::IndexMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, trace};

/// An import reference as written in configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportDeclaration {
    pub reference: String,
    /// Where the reference is written, when known
    pub declared_at: Option<SourceInfo>,
}

impl ImportDeclaration {
    pub fn new(reference: impl Into<String>, declared_at: Option<SourceInfo>) -> Self {
        ImportDeclaration {
            reference: reference.into(),
            declared_at,
        }
    }
}

/// One loaded file.
#[derive(Debug, Clone)]
pub struct GraphNode {
    pub uri: Uri,
    pub format: Option<FileFormat>,
    /// The file text, when it could be read
    pub text: Option<String>,
    pub loaded: Loaded,
    /// Set when the file could not be loaded at all
    pub failure: Option<LoadFailure>,
}

impl GraphNode {
    fn failed(uri: Uri, format: Option<FileFormat>, failure: LoadFailure) -> Self {
        GraphNode {
            uri,
            format,
            text: None,
            loaded: Loaded::default(),
            failure: Some(failure),
        }
    }
}

/// The files one target reached, in the order they were first reached.
#[derive(Debug, Clone, Default)]
pub struct ImportGraph {
    nodes: IndexMap<Uri, Arc<GraphNode>>,
    dependencies: Vec<Uri>,
}

impl ImportGraph {
    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.values().map(Arc::as_ref)
    }

    pub fn get(&self, uri: &Uri) -> Option<&GraphNode> {
        self.nodes.get(uri).map(Arc::as_ref)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Every file the target depends on, including files read by the
    /// interpreter while following its own imports.
    pub fn files(&self) -> Vec<Uri> {
        let mut files: Vec<Uri> = self.nodes.keys().cloned().collect();
        for uri in &self.dependencies {
            if !files.contains(uri) {
                files.push(uri.clone());
            }
        }
        files
    }

    fn add(&mut self, node: Arc<GraphNode>) {
        self.dependencies
            .extend(node.loaded.dependencies.iter().cloned());
        self.nodes.entry(node.uri.clone()).or_insert(node);
    }
}

/// The value one declaration contributes.
#[derive(Debug, Clone, PartialEq)]
pub struct RootValue {
    pub declaration: ImportDeclaration,
    /// The resolved location, if the reference could be resolved
    pub uri: Option<Uri>,
    /// `None` when the branch failed; the diagnostics say why
    pub value: Option<ConfigValue>,
}

#[derive(Debug, Clone, Default)]
pub struct GraphOutcome {
    /// One entry per declaration, in declaration order
    pub roots: Vec<RootValue>,
    pub graph: ImportGraph,
    /// Every problem found, each reported once
    pub diagnostics: Vec<DiagnosticMessage>,
}

impl GraphOutcome {
    /// Merge the root values in declaration order.
    ///
    /// A root that is not an object contributes nothing and is reported at
    /// its declaration.
    pub fn merge(&self) -> (ConfigValue, Vec<DiagnosticMessage>) {
        let layers: Vec<MergeLayer<'_>> = self
            .roots
            .iter()
            .filter_map(|root| {
                Some(MergeLayer {
                    value: root.value.as_ref()?,
                    declared_at: root.declaration.declared_at.as_ref(),
                })
            })
            .collect();
        merge_layers(&layers)
    }
}

fn merge_layers(layers: &[MergeLayer<'_>]) -> (ConfigValue, Vec<DiagnosticMessage>) {
    let mut diagnostics = Vec::new();
    match merge_with_diagnostics(layers, &mut diagnostics) {
        Ok(value) => (value, diagnostics),
        Err(error) => {
            diagnostics.push(
                ErrorKind::EvaluationFailed
                    .diagnostic()
                    .problem(error.to_string())
                    .build(),
            );
            (ConfigValue::empty_object(), diagnostics)
        }
    }
}

type LoadFuture = Shared<BoxFuture<'static, Result<Arc<GraphNode>, Cancelled>>>;

#[derive(Clone)]
struct Loaders {
    json: Arc<dyn FormatLoader>,
    ncl: Arc<dyn FormatLoader>,
}

/// What a branch of the graph produced.
#[derive(Default)]
struct Contribution {
    value: Option<ConfigValue>,
    diagnostics: Vec<DiagnosticMessage>,
    nodes: Vec<Arc<GraphNode>>,
}

impl Contribution {
    fn failed(diagnostic: DiagnosticMessage) -> Self {
        Contribution {
            diagnostics: vec![diagnostic],
            ..Default::default()
        }
    }

    fn absorb(&mut self, other: Contribution) -> Option<ConfigValue> {
        self.diagnostics.extend(other.diagnostics);
        self.nodes.extend(other.nodes);
        other.value
    }
}

/// Builds import graphs, sharing loads across every target of one pass.
pub struct GraphBuilder {
    ctx: LoadContext,
    loaders: Loaders,
    loads: Mutex<IndexMap<Uri, LoadFuture>>,
}

impl GraphBuilder {
    pub fn new(ctx: LoadContext, evaluator: Arc<dyn Evaluator>) -> Self {
        GraphBuilder {
            ctx,
            loaders: Loaders {
                json: Arc::new(JsonLoader),
                ncl: Arc::new(NclLoader::new(evaluator)),
            },
            loads: Mutex::new(IndexMap::new()),
        }
    }

    /// Load the graph for `declarations`, resolving relative references
    /// against `base`.
    pub async fn build(
        &self,
        declarations: &[ImportDeclaration],
        base: Option<&Uri>,
    ) -> Result<GraphOutcome, Cancelled> {
        self.ctx.cancel.check()?;

        let branches = declarations.iter().map(|declaration| async move {
            match resolve(&declaration.reference, base, self.ctx.convention) {
                Ok(uri) => {
                    let contribution = self
                        .contribute(uri.clone(), declaration.declared_at.clone(), Vec::new())
                        .await?;
                    Ok::<_, Cancelled>((Some(uri), contribution))
                }
                Err(error) => Ok((
                    None,
                    Contribution::failed(
                        ErrorKind::InvalidFileUri
                            .diagnostic()
                            .problem(error.to_string())
                            .with_optional_location(declaration.declared_at.clone())
                            .build(),
                    ),
                )),
            }
        });
        let branches = try_join_all(branches).await?;

        let mut outcome = GraphOutcome::default();
        let mut collector = DiagnosticCollector::new();
        for (declaration, (uri, contribution)) in declarations.iter().zip(branches) {
            collector.extend(contribution.diagnostics);
            for node in contribution.nodes {
                outcome.graph.add(node);
            }
            outcome.roots.push(RootValue {
                declaration: declaration.clone(),
                uri,
                value: contribution.value,
            });
        }
        outcome.diagnostics = collector.into_diagnostics();
        debug!(
            declarations = declarations.len(),
            files = outcome.graph.len(),
            diagnostics = outcome.diagnostics.len(),
            "import graph built"
        );
        Ok(outcome)
    }

    /// The value `uri` contributes when reached from `ancestors`.
    fn contribute(
        &self,
        uri: Uri,
        declared_at: Option<SourceInfo>,
        ancestors: Vec<Uri>,
    ) -> BoxFuture<'_, Result<Contribution, Cancelled>> {
        async move {
            if let Some(start) = ancestors.iter().position(|a| a == &uri) {
                return Ok(Contribution::failed(
                    ErrorKind::ImportCycle
                        .diagnostic()
                        .problem(cycle_message(&ancestors[start..], &uri))
                        .with_optional_location(declared_at)
                        .build(),
                ));
            }

            let node = self.load(&uri).await?;
            let mut out = Contribution {
                nodes: vec![node.clone()],
                ..Default::default()
            };
            if let Some(failure) = &node.failure {
                out.diagnostics.push(failure.at(declared_at));
                return Ok(out);
            }
            out.diagnostics.extend(node.loaded.diagnostics.iter().cloned());

            let Some(own) = &node.loaded.value else {
                return Ok(out);
            };
            // The interpreter already followed its own imports
            if node.format == Some(FileFormat::Ncl) {
                out.value = Some(own.clone());
                return Ok(out);
            }

            let mut path = ancestors;
            path.push(uri.clone());
            let children = node.loaded.imports.iter().map(|import| {
                let path = path.clone();
                let importer = &uri;
                async move {
                    match resolve_from_file(&import.reference, importer, self.ctx.convention) {
                        Ok(target) => {
                            self.contribute(target, Some(import.location.clone()), path)
                                .await
                        }
                        Err(error) => Ok(Contribution::failed(
                            ErrorKind::InvalidFileUri
                                .diagnostic()
                                .problem(error.to_string())
                                .with_location(import.location.clone())
                                .build(),
                        )),
                    }
                }
            });
            let children = try_join_all(children).await?;

            // Nested imports first, then the file's own keys on top
            let mut values = Vec::new();
            for (import, child) in node.loaded.imports.iter().zip(children) {
                if let Some(value) = out.absorb(child) {
                    values.push((value, Some(&import.location)));
                }
            }
            values.push((own.clone(), None));
            let layers: Vec<MergeLayer<'_>> = values
                .iter()
                .map(|(value, declared_at)| MergeLayer {
                    value,
                    declared_at: *declared_at,
                })
                .collect();
            let (merged, diagnostics) = merge_layers(&layers);
            out.diagnostics.extend(diagnostics);
            out.value = Some(merged);
            Ok(out)
        }
        .boxed()
    }

    /// Load `uri`, joining an in-flight load of the same file if there is one.
    async fn load(&self, uri: &Uri) -> Result<Arc<GraphNode>, Cancelled> {
        let load = {
            let mut loads = self.loads.lock().unwrap_or_else(|e| e.into_inner());
            loads
                .entry(uri.clone())
                .or_insert_with(|| {
                    trace!(uri = %uri, "starting load");
                    load_node(self.ctx.clone(), self.loaders.clone(), uri.clone())
                        .boxed()
                        .shared()
                })
                .clone()
        };
        load.await
    }
}

async fn load_node(
    ctx: LoadContext,
    loaders: Loaders,
    uri: Uri,
) -> Result<Arc<GraphNode>, Cancelled> {
    let Some(format) = FileFormat::of(&uri) else {
        return Ok(Arc::new(GraphNode::failed(
            uri.clone(),
            None,
            LoadFailure {
                kind: ErrorKind::UnsupportedFileType,
                message: format!(
                    "`{}` is not a .json, .jsonc, .json5 or .ncl file",
                    uri.file_name().unwrap_or(uri.as_str())
                ),
            },
        )));
    };

    let text = match ctx.read(&uri).await {
        Ok(text) => text,
        Err(ReadFailure::Cancelled) => return Err(Cancelled),
        Err(ReadFailure::Failed { kind, message }) => {
            debug!(uri = %uri, %message, "cannot load import");
            return Ok(Arc::new(GraphNode::failed(
                uri,
                Some(format),
                LoadFailure { kind, message },
            )));
        }
    };

    let loader = match format {
        FileFormat::Json => &loaders.json,
        FileFormat::Ncl => &loaders.ncl,
    };
    let loaded = loader.load(&uri, &text, &ctx).await?;
    debug!(
        uri = %uri,
        imports = loaded.imports.len(),
        diagnostics = loaded.diagnostics.len(),
        "loaded import"
    );
    Ok(Arc::new(GraphNode {
        uri,
        format: Some(format),
        text: Some(text),
        loaded,
        failure: None,
    }))
}

fn cycle_message(cycle: &[Uri], closing: &Uri) -> String {
    let names: Vec<&str> = cycle
        .iter()
        .chain(std::iter::once(closing))
        .map(|uri| uri.file_name().unwrap_or(uri.as_str()))
        .collect();
    format!("import cycle: {}", names.join(" -> "))
}
