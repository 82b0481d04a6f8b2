/*
 * loader.rs
 * Copyright (c) 2026 computed-settings contributors
 *
 * JSON and Nickel file loaders, with shared file reads.
 */

//! Format loaders: file text to `ConfigValue`.
//!
//! Both loaders produce the same value shape, so merging never depends on
//! the format a value was written in. Problems inside a file become
//! diagnostics located in that file; problems reaching the file at all
//! (unreadable, not UTF-8, unsupported extension) are returned as a
//! [`LoadFailure`] so the caller can report them at the declaration that
//! referenced the file.

use crate::cancel::{Cancellation, Cancelled};
use crate::resolver::resolve_from_file;
use async_trait::async_trait;
use computed_settings_config::ConfigValue;
use computed_settings_error_reporting::{DiagnosticMessage, ErrorKind};
use computed_settings_jsonc::{Node, parse, to_config_value};
use computed_settings_ncl::{EvalError, Evaluator, ImportHost, ReadFailure};
use computed_settings_runtime::{SharedRuntime, SystemRuntime};
use computed_settings_source_map::{FileInformation, PathConvention, SourceInfo, Uri};
use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, trace};

/// The setting listing nested imports inside an imported JSON file.
pub const IMPORTS_KEY: &str = "computed-settings.imports";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileFormat {
    /// JSON with comments and trailing commas (`.json`, `.jsonc`, `.json5`)
    Json,
    /// The richer configuration language (`.ncl`)
    Ncl,
}

impl FileFormat {
    /// Choose the format by file extension.
    pub fn of(uri: &Uri) -> Option<FileFormat> {
        match uri.extension()? {
            "json" | "jsonc" | "json5" => Some(FileFormat::Json),
            "ncl" => Some(FileFormat::Ncl),
            _ => None,
        }
    }
}

/// An import found inside a loaded file.
#[derive(Debug, Clone, PartialEq)]
pub struct NestedImport {
    /// The reference as written
    pub reference: String,
    /// Where the reference is written
    pub location: SourceInfo,
    /// Set when the loader already resolved the reference itself
    pub target: Option<Uri>,
}

/// Why a file could not be loaded at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadFailure {
    pub kind: ErrorKind,
    pub message: String,
}

impl LoadFailure {
    /// The diagnostic for this failure, reported where the file was referenced.
    pub fn at(&self, location: Option<SourceInfo>) -> DiagnosticMessage {
        self.kind
            .diagnostic()
            .problem(self.message.clone())
            .with_optional_location(location)
            .build()
    }
}

/// The result of loading one file's own content.
#[derive(Debug, Clone, Default)]
pub struct Loaded {
    /// The file's own value; `None` when the diagnostics explain why not
    pub value: Option<ConfigValue>,
    pub imports: Vec<NestedImport>,
    pub diagnostics: Vec<DiagnosticMessage>,
    /// Other files read while loading (imports followed by an interpreter)
    pub dependencies: Vec<Uri>,
}

/// Everything a loader may use besides the file text.
///
/// Clones share one [`ReadTable`], so a file is read once no matter how
/// many loaders or interpreter imports ask for it.
#[derive(Clone)]
pub struct LoadContext {
    pub runtime: SharedRuntime,
    pub cancel: Cancellation,
    pub convention: PathConvention,
    pub reads: ReadTable,
}

impl LoadContext {
    pub fn new(runtime: SharedRuntime, cancel: Cancellation, convention: PathConvention) -> Self {
        LoadContext {
            runtime,
            cancel,
            convention,
            reads: ReadTable::default(),
        }
    }

    /// Read `uri` through the shared read table.
    pub async fn read(&self, uri: &Uri) -> Result<String, ReadFailure> {
        self.reads.read(&self.runtime, uri, &self.cancel).await
    }
}

type ReadFuture = Shared<BoxFuture<'static, Result<String, ReadFailure>>>;

/// Single-flight file reads, keyed by resolved location.
#[derive(Clone, Default)]
pub struct ReadTable {
    reads: Arc<Mutex<HashMap<Uri, ReadFuture>>>,
}

impl ReadTable {
    /// Read `uri`, joining an earlier or in-flight read of the same file.
    pub async fn read(
        &self,
        runtime: &SharedRuntime,
        uri: &Uri,
        cancel: &Cancellation,
    ) -> Result<String, ReadFailure> {
        let read = {
            let mut reads = self.reads.lock().unwrap_or_else(|e| e.into_inner());
            reads
                .entry(uri.clone())
                .or_insert_with(|| {
                    trace!(uri = %uri, "starting read");
                    let (runtime, uri, cancel) = (runtime.clone(), uri.clone(), cancel.clone());
                    async move { read_text(runtime.as_ref(), &uri, &cancel).await }
                        .boxed()
                        .shared()
                })
                .clone()
        };
        read.await
    }
}

/// A parser for one file format.
#[async_trait]
pub trait FormatLoader: Send + Sync {
    async fn load(&self, uri: &Uri, text: &str, ctx: &LoadContext) -> Result<Loaded, Cancelled>;
}

/// Read `uri` as UTF-8 text, checking for cancellation around the read.
///
/// A leading byte order mark is kept; the parsers treat it as whitespace.
pub async fn read_text(
    runtime: &dyn SystemRuntime,
    uri: &Uri,
    cancel: &Cancellation,
) -> Result<String, ReadFailure> {
    if cancel.is_cancelled() {
        return Err(ReadFailure::Cancelled);
    }
    let bytes = runtime
        .file_read(uri)
        .await
        .map_err(|e| ReadFailure::Failed {
            kind: ErrorKind::CannotReadFile,
            message: e.to_string(),
        })?;
    if cancel.is_cancelled() {
        return Err(ReadFailure::Cancelled);
    }
    String::from_utf8(bytes).map_err(|e| ReadFailure::Failed {
        kind: ErrorKind::FileIsNotUtf8,
        message: format!(
            "`{uri}` has an invalid UTF-8 sequence at byte {}",
            e.utf8_error().valid_up_to()
        ),
    })
}

/// Loader for JSON with comments.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonLoader;

#[async_trait]
impl FormatLoader for JsonLoader {
    async fn load(&self, uri: &Uri, text: &str, _ctx: &LoadContext) -> Result<Loaded, Cancelled> {
        Ok(load_json(uri, text))
    }
}

/// Parse an imported JSON document.
///
/// Only a well-formed object is accepted. Nested imports listed under
/// [`IMPORTS_KEY`] are returned separately and removed from the value.
pub fn load_json(uri: &Uri, text: &str) -> Loaded {
    let output = parse(text);
    let index = FileInformation::new(text);
    let at = |start: usize, end: usize| SourceInfo::from_index(uri.clone(), &index, text, start, end);

    let mut loaded = Loaded::default();
    for error in &output.errors {
        loaded.diagnostics.push(
            ErrorKind::CannotParseFile
                .diagnostic()
                .problem(error.code.to_string())
                .with_location(at(error.offset, error.end()))
                .build(),
        );
    }
    if !output.errors.is_empty() {
        return loaded;
    }
    let Some(root) = output.root else {
        return loaded;
    };

    if !root.is_object() {
        loaded.diagnostics.push(
            ErrorKind::NonObjectImport
                .diagnostic()
                .problem(format!(
                    "The file contains a {}, but only objects can be imported",
                    root.type_name()
                ))
                .with_location(at(root.span.start, root.span.end))
                .build(),
        );
        return loaded;
    }

    if let Some(list) = find_imports(&root) {
        match list.items() {
            Some(items) => {
                for item in items {
                    match item.as_str() {
                        Some(reference) => loaded.imports.push(NestedImport {
                            reference: reference.to_string(),
                            location: at(item.span.start, item.span.end),
                            target: None,
                        }),
                        None => loaded.diagnostics.push(
                            ErrorKind::InvalidSetting
                                .diagnostic()
                                .problem(format!(
                                    "Import entries must be strings, found a {}",
                                    item.type_name()
                                ))
                                .with_location(at(item.span.start, item.span.end))
                                .build(),
                        ),
                    }
                }
            }
            None => loaded.diagnostics.push(
                ErrorKind::InvalidSetting
                    .diagnostic()
                    .problem(format!("`{IMPORTS_KEY}` must be an array of strings"))
                    .with_location(at(list.span.start, list.span.end))
                    .build(),
            ),
        }
    }

    let mut value = to_config_value(&root, uri, text);
    remove_imports(&mut value);
    loaded.value = Some(value);
    loaded
}

fn find_imports(root: &Node) -> Option<&Node> {
    let (section, key) = IMPORTS_KEY.split_once('.')?;
    root.get(IMPORTS_KEY)
        .or_else(|| root.get(section)?.get(key))
}

fn remove_imports(value: &mut ConfigValue) {
    let Some((section, key)) = IMPORTS_KEY.split_once('.') else {
        return;
    };
    let Some(entries) = value.as_object_mut() else {
        return;
    };
    entries.shift_remove(IMPORTS_KEY);

    let emptied = match entries.get_mut(section).and_then(ConfigValue::as_object_mut) {
        Some(inner) => {
            inner.shift_remove(key);
            inner.is_empty()
        }
        None => false,
    };
    if emptied {
        entries.shift_remove(section);
    }
}

/// Loader for the richer configuration language.
pub struct NclLoader {
    evaluator: Arc<dyn Evaluator>,
}

impl NclLoader {
    pub fn new(evaluator: Arc<dyn Evaluator>) -> Self {
        NclLoader { evaluator }
    }
}

#[async_trait]
impl FormatLoader for NclLoader {
    async fn load(&self, uri: &Uri, text: &str, ctx: &LoadContext) -> Result<Loaded, Cancelled> {
        let host = LoaderHost {
            ctx,
            root: uri,
            state: Mutex::new(Loaded::default()),
        };
        let result = self.evaluator.evaluate(uri, text, &host).await;
        let mut loaded = host.into_loaded();

        match result {
            Ok(value) => loaded.value = Some(value),
            Err(EvalError::Cancelled) => return Err(Cancelled),
            Err(error) => {
                debug!(uri = %uri, %error, "evaluation failed");
                loaded.diagnostics.extend(error.to_diagnostic());
            }
        }
        Ok(loaded)
    }
}

/// The capabilities handed to the interpreter for one file.
struct LoaderHost<'a> {
    ctx: &'a LoadContext,
    root: &'a Uri,
    state: Mutex<Loaded>,
}

impl LoaderHost<'_> {
    fn with_state<T>(&self, f: impl FnOnce(&mut Loaded) -> T) -> T {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut state)
    }

    fn into_loaded(self) -> Loaded {
        self.state.into_inner().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl ImportHost for LoaderHost<'_> {
    fn resolve(&self, reference: &str, location: &SourceInfo) -> Result<Uri, String> {
        let uri = resolve_from_file(reference, &location.uri, self.ctx.convention)
            .map_err(|e| e.to_string())?;
        // Imports written in deeper files belong to those files
        if &location.uri == self.root {
            self.with_state(|state| {
                state.imports.push(NestedImport {
                    reference: reference.to_string(),
                    location: location.clone(),
                    target: Some(uri.clone()),
                })
            });
        }
        Ok(uri)
    }

    async fn read(&self, uri: &Uri) -> Result<String, ReadFailure> {
        self.with_state(|state| {
            if !state.dependencies.contains(uri) {
                state.dependencies.push(uri.clone());
            }
        });
        self.ctx.read(uri).await
    }

    fn report(&self, diagnostic: DiagnosticMessage) {
        self.with_state(|state| state.diagnostics.push(diagnostic));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use computed_settings_config::{from_json, to_json};
    use computed_settings_ncl::NickelEvaluator;
    use computed_settings_runtime::MemoryRuntime;
    use serde_json::json;

    fn file(path: &str) -> Uri {
        Uri::file(path, PathConvention::Posix)
    }

    fn context(runtime: MemoryRuntime) -> LoadContext {
        LoadContext::new(Arc::new(runtime), Cancellation::new(), PathConvention::Posix)
    }

    #[test]
    fn test_format_by_extension() {
        assert_eq!(FileFormat::of(&file("/a.json")), Some(FileFormat::Json));
        assert_eq!(FileFormat::of(&file("/a.jsonc")), Some(FileFormat::Json));
        assert_eq!(FileFormat::of(&file("/a.json5")), Some(FileFormat::Json));
        assert_eq!(FileFormat::of(&file("/a.ncl")), Some(FileFormat::Ncl));
        assert_eq!(FileFormat::of(&file("/a.yaml")), None);
        assert_eq!(FileFormat::of(&file("/json")), None);
    }

    #[test]
    fn test_json_object() {
        let loaded = load_json(&file("/a.json"), "{\n  // c\n  \"x\": 1,\n}");
        assert!(loaded.diagnostics.is_empty());
        assert_eq!(loaded.value.unwrap(), from_json(&json!({"x": 1})));
    }

    #[test]
    fn test_json_parse_errors_have_ranges() {
        let loaded = load_json(&file("/a.json"), "{\r\n  \"x\": ,\r\n  \"y\" 2\r\n}");
        assert!(loaded.value.is_none());
        assert_eq!(loaded.diagnostics.len(), 2);
        let first = loaded.diagnostics[0].location.as_ref().unwrap();
        assert_eq!(first.range.start.row, 1);
        assert_eq!(first.range.start.column, 7);
        let second = loaded.diagnostics[1].location.as_ref().unwrap();
        assert_eq!(second.range.start.row, 2);
        assert!(
            loaded
                .diagnostics
                .iter()
                .all(|d| d.error_kind() == Some(ErrorKind::CannotParseFile))
        );
    }

    #[test]
    fn test_json_non_object() {
        let loaded = load_json(&file("/a.json"), "[1, 2]");
        assert!(loaded.value.is_none());
        assert_eq!(
            loaded.diagnostics[0].error_kind(),
            Some(ErrorKind::NonObjectImport)
        );
    }

    #[test]
    fn test_json_nested_imports_flat() {
        let text = r#"{"computed-settings.imports": ["b.json", 3], "x": 1}"#;
        let loaded = load_json(&file("/w/a.json"), text);
        assert_eq!(loaded.imports.len(), 1);
        let import = &loaded.imports[0];
        assert_eq!(import.reference, "b.json");
        assert_eq!(import.location.start_offset(), 31);
        assert_eq!(import.location.end_offset(), 39);
        assert_eq!(
            loaded.diagnostics[0].error_kind(),
            Some(ErrorKind::InvalidSetting)
        );
        assert_eq!(to_json(&loaded.value.unwrap()), json!({"x": 1}));
    }

    #[test]
    fn test_json_nested_imports_nested_form() {
        let text = r#"{"computed-settings": {"imports": ["b.json"], "other": true}}"#;
        let loaded = load_json(&file("/w/a.json"), text);
        assert_eq!(loaded.imports[0].reference, "b.json");
        assert_eq!(
            to_json(&loaded.value.unwrap()),
            json!({"computed-settings": {"other": true}})
        );

        let text = r#"{"computed-settings": {"imports": []}}"#;
        let loaded = load_json(&file("/w/a.json"), text);
        assert_eq!(to_json(&loaded.value.unwrap()), json!({}));
    }

    #[test]
    fn test_imports_must_be_an_array() {
        let loaded = load_json(&file("/w/a.json"), r#"{"computed-settings.imports": "b.json"}"#);
        assert!(loaded.imports.is_empty());
        assert_eq!(
            loaded.diagnostics[0].error_kind(),
            Some(ErrorKind::InvalidSetting)
        );
    }

    #[test]
    fn test_read_text_failures() {
        let rt = MemoryRuntime::new().with_file(file("/bad.json"), vec![b'{', 0xff, b'}']);
        let cancel = Cancellation::new();
        pollster::block_on(async {
            let err = read_text(&rt, &file("/bad.json"), &cancel).await.unwrap_err();
            assert!(matches!(
                err,
                ReadFailure::Failed { kind: ErrorKind::FileIsNotUtf8, .. }
            ));
            let err = read_text(&rt, &file("/missing.json"), &cancel).await.unwrap_err();
            assert!(matches!(
                err,
                ReadFailure::Failed { kind: ErrorKind::CannotReadFile, .. }
            ));
            cancel.cancel();
            let err = read_text(&rt, &file("/bad.json"), &cancel).await.unwrap_err();
            assert_eq!(err, ReadFailure::Cancelled);
        });
        assert_eq!(rt.read_count(&file("/bad.json")), 1);
    }

    #[test]
    fn test_read_text_keeps_bom() {
        let rt = MemoryRuntime::new().with_file(file("/a.json"), "\u{feff}{}");
        let text = pollster::block_on(read_text(&rt, &file("/a.json"), &Cancellation::new())).unwrap();
        assert!(text.starts_with('\u{feff}'));
        assert!(load_json(&file("/a.json"), &text).value.is_some());
    }

    #[test]
    fn test_read_table_reads_each_file_once() {
        let rt = Arc::new(MemoryRuntime::new().with_file(file("/a.json"), "{}"));
        let ctx = LoadContext::new(rt.clone(), Cancellation::new(), PathConvention::Posix);
        let other = ctx.clone();
        pollster::block_on(async {
            let path = file("/a.json");
            let (first, second) = futures::join!(ctx.read(&path), other.read(&path));
            assert_eq!(first.unwrap(), "{}");
            assert_eq!(second.unwrap(), "{}");
            let missing = ctx.read(&file("/missing.json")).await.unwrap_err();
            assert!(matches!(missing, ReadFailure::Failed { .. }));
        });
        assert_eq!(rt.read_count(&file("/a.json")), 1);
    }

    #[test]
    fn test_ncl_records_imports() {
        let rt = MemoryRuntime::new()
            .with_file(file("/w/base.ncl"), "{ size | default = 12 }")
            .with_file(file("/w/extra.json"), r#"{"font": "mono"}"#);
        let ctx = context(rt);
        let loader = NclLoader::new(Arc::new(NickelEvaluator));
        let text = r#"(import "base.ncl") & (import "extra.json") & { size = 14 }"#;
        let loaded = pollster::block_on(loader.load(&file("/w/main.ncl"), text, &ctx)).unwrap();

        assert!(loaded.diagnostics.is_empty(), "{:?}", loaded.diagnostics);
        assert_eq!(
            to_json(&loaded.value.unwrap()),
            json!({"size": 14, "font": "mono"})
        );
        let targets: Vec<_> = loaded.imports.iter().map(|i| i.target.clone().unwrap()).collect();
        assert_eq!(targets, vec![file("/w/base.ncl"), file("/w/extra.json")]);
        assert_eq!(loaded.dependencies.len(), 2);
    }

    #[test]
    fn test_ncl_rejects_non_file_imports() {
        let ctx = context(MemoryRuntime::new());
        let loader = NclLoader::new(Arc::new(NickelEvaluator));
        let text = r#"import "https://example.com/a.ncl""#;
        let loaded = pollster::block_on(loader.load(&file("/w/main.ncl"), text, &ctx)).unwrap();
        assert!(loaded.value.is_none());
        assert_eq!(loaded.diagnostics.len(), 1);
        assert_eq!(
            loaded.diagnostics[0].error_kind(),
            Some(ErrorKind::InvalidFileUri)
        );
    }

    #[test]
    fn test_ncl_missing_import_is_reported_at_the_import() {
        let ctx = context(MemoryRuntime::new());
        let loader = NclLoader::new(Arc::new(NickelEvaluator));
        let loaded =
            pollster::block_on(loader.load(&file("/w/main.ncl"), "import \"gone.ncl\"", &ctx))
                .unwrap();
        let diagnostic = &loaded.diagnostics[0];
        assert_eq!(diagnostic.error_kind(), Some(ErrorKind::CannotReadFile));
        assert_eq!(diagnostic.location.as_ref().unwrap().start_offset(), 0);
    }

    #[test]
    fn test_ncl_cancellation() {
        let rt = MemoryRuntime::new().with_file(file("/w/base.ncl"), "{}");
        let ctx = context(rt);
        ctx.cancel.cancel();
        let loader = NclLoader::new(Arc::new(NickelEvaluator));
        let result =
            pollster::block_on(loader.load(&file("/w/main.ncl"), "import \"base.ncl\"", &ctx));
        assert_eq!(result.unwrap_err(), Cancelled);
    }
}
