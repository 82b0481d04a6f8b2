//! Evaluation with the Nickel interpreter.
//!
//! Evaluation runs in two steps. Gathering walks the import graph through
//! the host, reading every reachable file once; this is the only part that
//! awaits. The gathered files are then staged in a private directory, with
//! every import literal rewritten to the staged copy of its target, and the
//! staged root is evaluated by `nickel-lang-core`. The interpreter therefore
//! only ever sees text the host handed out.

use crate::error::{EvalError, EvalResult};
use crate::host::{Evaluator, ImportHost, ReadFailure};
use crate::imports::{ImportSite, find_imports, rewrite_imports};
use async_trait::async_trait;
use computed_settings_config::{ConfigValue, from_json, to_json};
use computed_settings_error_reporting::ErrorKind;
use computed_settings_source_map::{FileInformation, SourceInfo, Uri};
use nickel_lang_core::eval::cache::CacheImpl;
use nickel_lang_core::program::Program;
use nickel_lang_core::serialize::{self, ExportFormat};
use std::collections::HashMap;
use std::ops::Range;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Evaluates `.ncl` programs with `nickel-lang-core`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NickelEvaluator;

#[async_trait]
impl Evaluator for NickelEvaluator {
    async fn evaluate(
        &self,
        uri: &Uri,
        text: &str,
        host: &dyn ImportHost,
    ) -> EvalResult<ConfigValue> {
        debug!(uri = %uri, "evaluating");
        let graph = ImportGraph::gather(uri, text, host).await?;
        graph.check_cycles()?;
        let value = graph.run()?;
        Ok(from_json(&value).with_source_info(SourceInfo::start_of(uri.clone())))
    }
}

fn is_json_import(uri: &Uri) -> bool {
    matches!(uri.extension(), Some("json" | "jsonc" | "json5"))
}

enum Body {
    /// Scanned for imports; `targets[i]` is the unit `sites[i]` refers to.
    Program {
        sites: Vec<ImportSite>,
        targets: Vec<usize>,
    },
    /// A JSON-family import, normalized to plain JSON.
    Json(serde_json::Value),
    /// Another format the interpreter reads by extension, such as TOML.
    Other(String),
}

struct Unit {
    uri: Uri,
    text: String,
    index: FileInformation,
    body: Body,
}

impl Unit {
    fn location(&self, span: &Range<usize>) -> SourceInfo {
        SourceInfo::from_index(
            self.uri.clone(),
            &self.index,
            &self.text,
            span.start,
            span.end,
        )
    }

    fn name(&self) -> &str {
        self.uri.file_name().unwrap_or(self.uri.as_str())
    }

    fn staged_name(&self, id: usize) -> String {
        match &self.body {
            Body::Program { .. } => format!("{id}.ncl"),
            Body::Json(_) => format!("{id}.json"),
            Body::Other(extension) => format!("{id}.{extension}"),
        }
    }
}

/// Every file reachable from the root; unit 0 is the root.
struct ImportGraph {
    units: Vec<Unit>,
    ids: HashMap<Uri, usize>,
}

impl ImportGraph {
    async fn gather(root: &Uri, text: &str, host: &dyn ImportHost) -> EvalResult<Self> {
        let mut graph = ImportGraph {
            units: Vec::new(),
            ids: HashMap::new(),
        };
        graph.add(root.clone(), text.to_string(), program(text));

        let mut pending = vec![0];
        while let Some(id) = pending.pop() {
            let sites = match &graph.units[id].body {
                Body::Program { sites, .. } => sites.clone(),
                Body::Json(_) | Body::Other(_) => continue,
            };

            let mut targets = Vec::with_capacity(sites.len());
            for site in &sites {
                let location = graph.units[id].location(&site.span);
                let target = host
                    .resolve(&site.path, &location)
                    .map_err(|message| EvalError::Failed {
                        kind: ErrorKind::InvalidFileUri,
                        message,
                        location: location.clone(),
                    })?;

                if let Some(&known) = graph.ids.get(&target) {
                    targets.push(known);
                    continue;
                }

                let text = match host.read(&target).await {
                    Ok(text) => text,
                    Err(ReadFailure::Cancelled) => return Err(EvalError::Cancelled),
                    Err(ReadFailure::Failed { kind, message }) => {
                        return Err(EvalError::Failed {
                            kind,
                            message,
                            location,
                        });
                    }
                };
                debug!(uri = %target, "loaded import");

                let body = if is_json_import(&target) {
                    Body::Json(parse_json(host, &target, &text, &location)?)
                } else {
                    match target.extension() {
                        None | Some("ncl") => program(&text),
                        Some(extension) => Body::Other(extension.to_string()),
                    }
                };
                let new_id = graph.add(target, text, body);
                targets.push(new_id);
                pending.push(new_id);
            }

            if let Body::Program { targets: slot, .. } = &mut graph.units[id].body {
                *slot = targets;
            }
        }
        Ok(graph)
    }

    fn add(&mut self, uri: Uri, text: String, body: Body) -> usize {
        let id = self.units.len();
        self.ids.insert(uri.clone(), id);
        self.units.push(Unit {
            index: FileInformation::new(&text),
            uri,
            text,
            body,
        });
        id
    }

    fn check_cycles(&self) -> EvalResult<()> {
        let mut done = vec![false; self.units.len()];
        self.visit(0, &mut Vec::new(), &mut done)
    }

    fn visit(&self, id: usize, stack: &mut Vec<usize>, done: &mut [bool]) -> EvalResult<()> {
        if done[id] {
            return Ok(());
        }
        stack.push(id);
        if let Body::Program { sites, targets } = &self.units[id].body {
            for (site, &target) in sites.iter().zip(targets) {
                if let Some(pos) = stack.iter().position(|&open| open == target) {
                    let chain = stack[pos..]
                        .iter()
                        .chain(std::iter::once(&target))
                        .map(|&unit| self.units[unit].name())
                        .collect::<Vec<_>>()
                        .join(" -> ");
                    return Err(EvalError::Failed {
                        kind: ErrorKind::ImportCycle,
                        message: format!("import cycle: {chain}"),
                        location: self.units[id].location(&site.span),
                    });
                }
                self.visit(target, stack, done)?;
            }
        }
        stack.pop();
        done[id] = true;
        Ok(())
    }

    /// Stage every unit and evaluate the root.
    fn run(&self) -> EvalResult<serde_json::Value> {
        let root = &self.units[0];
        let failed = |message: String| {
            EvalError::evaluation(message, SourceInfo::start_of(root.uri.clone()))
        };

        let dir = tempfile::Builder::new()
            .prefix("computed-settings-")
            .tempdir()
            .map_err(|err| failed(format!("cannot stage program: {err}")))?;
        let staged = self
            .stage(dir.path())
            .map_err(|err| failed(format!("cannot stage program: {err}")))?;

        export(&staged[0]).map_err(|message| {
            // Point the interpreter's report back at the real files.
            let message = staged
                .iter()
                .zip(&self.units)
                .fold(message, |message, (path, unit)| {
                    message.replace(&path.display().to_string(), unit.uri.as_str())
                });
            failed(message)
        })
    }

    fn stage(&self, dir: &Path) -> std::io::Result<Vec<PathBuf>> {
        let mut paths = Vec::with_capacity(self.units.len());
        for (id, unit) in self.units.iter().enumerate() {
            let path = dir.join(unit.staged_name(id));
            let contents = match &unit.body {
                Body::Program { sites, targets } => rewrite_imports(&unit.text, sites, |i, _| {
                    self.units[targets[i]].staged_name(targets[i])
                }),
                Body::Json(value) => value.to_string(),
                Body::Other(_) => unit.text.clone(),
            };
            trace!(uri = %unit.uri, path = %path.display(), "staged");
            std::fs::write(&path, contents)?;
            paths.push(path);
        }
        Ok(paths)
    }
}

fn program(text: &str) -> Body {
    Body::Program {
        sites: find_imports(text),
        targets: Vec::new(),
    }
}

/// Parse a JSON-family import, reporting each syntax error to the host.
fn parse_json(
    host: &dyn ImportHost,
    uri: &Uri,
    text: &str,
    imported_at: &SourceInfo,
) -> EvalResult<serde_json::Value> {
    let (value, output) = computed_settings_jsonc::parse_config(uri, text);
    match value {
        Some(value) if output.is_ok() => Ok(to_json(&value)),
        _ => {
            let index = FileInformation::new(text);
            for error in &output.errors {
                host.report(
                    ErrorKind::CannotParseFile
                        .diagnostic()
                        .problem(error.code.to_string())
                        .with_location(SourceInfo::from_index(
                            uri.clone(),
                            &index,
                            text,
                            error.offset,
                            error.end(),
                        ))
                        .build(),
                );
            }
            Err(EvalError::Failed {
                kind: ErrorKind::CannotParseFile,
                message: format!("cannot parse imported file `{uri}`"),
                location: imported_at.clone(),
            })
        }
    }
}

/// Evaluate a staged program fully and export it as JSON.
fn export(path: &Path) -> Result<serde_json::Value, String> {
    let mut program: Program<CacheImpl> =
        Program::new_from_file(path.as_os_str().to_owned(), std::io::sink())
            .map_err(|err| err.to_string())?;
    let term = program
        .eval_full_for_export()
        .map_err(|err| program.report_as_str(err))?;
    let json =
        serialize::to_string(ExportFormat::Json, &term).map_err(|err| format!("{err:?}"))?;
    serde_json::from_str(&json).map_err(|err| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use computed_settings_error_reporting::DiagnosticMessage;
    use computed_settings_source_map::PathConvention;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct TestHost {
        files: HashMap<String, String>,
        resolved: Mutex<Vec<(String, SourceInfo)>>,
        reports: Mutex<Vec<DiagnosticMessage>>,
        reads: Mutex<Vec<String>>,
        cancel: bool,
    }

    impl TestHost {
        fn with(files: &[(&str, &str)]) -> Self {
            TestHost {
                files: files
                    .iter()
                    .map(|(p, t)| (p.to_string(), t.to_string()))
                    .collect(),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl ImportHost for TestHost {
        fn resolve(&self, reference: &str, location: &SourceInfo) -> Result<Uri, String> {
            if reference.starts_with("https:") {
                return Err("cannot resolve import".to_string());
            }
            self.resolved
                .lock()
                .unwrap()
                .push((reference.to_string(), location.clone()));
            Ok(Uri::file(&format!("/cfg/{reference}"), PathConvention::Posix))
        }

        async fn read(&self, uri: &Uri) -> Result<String, ReadFailure> {
            if self.cancel {
                return Err(ReadFailure::Cancelled);
            }
            self.reads.lock().unwrap().push(uri.path().to_string());
            self.files
                .get(uri.path())
                .cloned()
                .ok_or_else(|| ReadFailure::Failed {
                    kind: ErrorKind::CannotReadFile,
                    message: format!("{uri} does not exist"),
                })
        }

        fn report(&self, diagnostic: DiagnosticMessage) {
            self.reports.lock().unwrap().push(diagnostic);
        }
    }

    fn root() -> Uri {
        Uri::file("/cfg/main.ncl", PathConvention::Posix)
    }

    fn run(host: &TestHost, text: &str) -> EvalResult<ConfigValue> {
        pollster::block_on(NickelEvaluator.evaluate(&root(), text, host))
    }

    fn failure_kind(err: EvalError) -> (ErrorKind, String) {
        match err {
            EvalError::Failed { kind, message, .. } => (kind, message),
            EvalError::Cancelled => panic!("unexpected cancellation"),
        }
    }

    #[test]
    fn test_records_and_literals() {
        let host = TestHost::default();
        let value = run(
            &host,
            "# settings\n{ a = 1, b.c = \"x\", b.d = [true, null], \"e f\" = 2.5 }",
        )
        .unwrap();
        assert_eq!(
            value,
            from_json(&json!({"a": 1, "b": {"c": "x", "d": [true, null]}, "e f": 2.5}))
        );
        assert_eq!(value.source_info.map(|info| info.uri), Some(root()));
    }

    #[test]
    fn test_functions_contracts_and_conditionals() {
        let host = TestHost::default();
        let value = run(&host, "let f = fun x => x in { a = f 1 }").unwrap();
        assert_eq!(value, from_json(&json!({"a": 1})));

        let value = run(&host, "{ a | Number = 1 }").unwrap();
        assert_eq!(value, from_json(&json!({"a": 1})));

        let value = run(&host, "{ a = if true then 1 else 2 }").unwrap();
        assert_eq!(value, from_json(&json!({"a": 1})));
    }

    #[test]
    fn test_conflicting_merge_fails() {
        let host = TestHost::default();
        let (kind, _) = failure_kind(run(&host, "{ a = 1 } & { a = 2 }").unwrap_err());
        assert_eq!(kind, ErrorKind::EvaluationFailed);
    }

    #[test]
    fn test_contract_violation_fails() {
        let host = TestHost::default();
        let (kind, _) = failure_kind(run(&host, "{ a | String = 1 }").unwrap_err());
        assert_eq!(kind, ErrorKind::EvaluationFailed);
    }

    #[test]
    fn test_default_priority_is_overridden() {
        let host = TestHost::default();
        let value = run(
            &host,
            "{ a = { x | default = 1, y = 2 } } & { a.x = 3 }",
        )
        .unwrap();
        assert_eq!(value, from_json(&json!({"a": {"x": 3, "y": 2}})));
    }

    #[test]
    fn test_imports_are_followed_and_recorded() {
        let host = TestHost::with(&[
            ("/cfg/base.ncl", "{ y | default = 3, z = 4 }"),
            ("/cfg/extra.json", "{ \"w\": [1, 2], // note\n }"),
        ]);
        let value = run(
            &host,
            "let b = import \"base.ncl\" in b & { y = 5, e = import \"extra.json\", again = (import \"base.ncl\").z }",
        )
        .unwrap();
        assert_eq!(
            value,
            from_json(&json!({"y": 5, "z": 4, "e": {"w": [1, 2]}, "again": 4}))
        );

        let resolved = host.resolved.lock().unwrap();
        assert_eq!(resolved.len(), 3);
        assert_eq!(resolved[0].0, "base.ncl");
        assert_eq!(resolved[0].1.uri, root());
        assert_eq!(resolved[0].1.range.start.column, 8);
        // base.ncl is read once even though it is imported twice
        assert_eq!(host.reads.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_nested_imports_resolve_from_importing_file() {
        let host = TestHost::with(&[
            ("/cfg/a.ncl", "{ inner = import \"b.ncl\" }"),
            ("/cfg/b.ncl", "{ deep = true }"),
        ]);
        let value = run(&host, "import \"a.ncl\"").unwrap();
        assert_eq!(value, from_json(&json!({"inner": {"deep": true}})));

        let resolved = host.resolved.lock().unwrap();
        assert_eq!(resolved[1].0, "b.ncl");
        assert_eq!(resolved[1].1.uri.path(), "/cfg/a.ncl");
    }

    #[test]
    fn test_syntax_error_is_evaluation_failure() {
        let host = TestHost::default();
        let err = run(&host, "{ a = }").unwrap_err();
        let EvalError::Failed { kind, location, .. } = err else {
            panic!("expected failure");
        };
        assert_eq!(kind, ErrorKind::EvaluationFailed);
        assert_eq!(location.uri, root());
    }

    #[test]
    fn test_import_cycle() {
        let host = TestHost::with(&[
            ("/cfg/a.ncl", "import \"b.ncl\""),
            ("/cfg/b.ncl", "{ x = import \"a.ncl\" }"),
        ]);
        let err = run(&host, "import \"a.ncl\"").unwrap_err();
        let EvalError::Failed {
            kind,
            message,
            location,
        } = err
        else {
            panic!("expected failure");
        };
        assert_eq!(kind, ErrorKind::ImportCycle);
        assert_eq!(message, "import cycle: a.ncl -> b.ncl -> a.ncl");
        assert_eq!(location.uri.path(), "/cfg/b.ncl");
        assert_eq!(location.start_offset(), 6);
    }

    #[test]
    fn test_read_failure_points_at_import() {
        let host = TestHost::default();
        let err = run(&host, "{ a = import \"gone.ncl\" }").unwrap_err();
        let EvalError::Failed { kind, location, .. } = err else {
            panic!("expected failure");
        };
        assert_eq!(kind, ErrorKind::CannotReadFile);
        assert_eq!(location.uri, root());
        assert_eq!(location.start_offset(), 6);
    }

    #[test]
    fn test_unresolvable_import() {
        let host = TestHost::default();
        let (kind, message) =
            failure_kind(run(&host, "import \"https://example.com/a.ncl\"").unwrap_err());
        assert_eq!(kind, ErrorKind::InvalidFileUri);
        assert_eq!(message, "cannot resolve import");
    }

    #[test]
    fn test_malformed_json_import_reports_each_error() {
        let host = TestHost::with(&[("/cfg/bad.json", "{\"a\" 1, \"b\": }")]);
        let (kind, _) = failure_kind(run(&host, "import \"bad.json\"").unwrap_err());
        assert_eq!(kind, ErrorKind::CannotParseFile);
        assert_eq!(host.reports.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_cancellation_aborts() {
        let host = TestHost {
            cancel: true,
            ..Default::default()
        };
        assert_eq!(run(&host, "import \"a.ncl\"").unwrap_err(), EvalError::Cancelled);
    }
}
