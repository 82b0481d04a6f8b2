//! End-to-end resolution passes over in-memory and on-disk workspaces.

use computed_settings_config::{PropertyPath, from_json, to_json};
use computed_settings_core::{
    Cancellation, ConfigScope, GraphBuilder, ImportDeclaration, LoadContext, PassError,
    PassOptions, ReparsingHost, ResolutionPass, ScopeLocation, ScopeSettings, SettingsService,
    WorkspaceLayout, patch_destination, region_value,
};
use computed_settings_error_reporting::ErrorKind;
use computed_settings_ncl::NickelEvaluator;
use computed_settings_runtime::{MemoryRuntime, NativeRuntime, SharedRuntime};
use computed_settings_source_map::{PathConvention, Uri};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn file(path: &str) -> Uri {
    Uri::file(path, PathConvention::Posix)
}

fn options() -> PassOptions {
    PassOptions {
        convention: PathConvention::Posix,
        ..PassOptions::default()
    }
}

fn resolution_pass(runtime: SharedRuntime, options: PassOptions) -> ResolutionPass {
    ResolutionPass::new(
        runtime.clone(),
        Arc::new(NickelEvaluator),
        Arc::new(ReparsingHost::new(runtime)),
        options,
    )
}

fn builder(runtime: &Arc<MemoryRuntime>, cancel: &Cancellation) -> GraphBuilder {
    GraphBuilder::new(
        LoadContext::new(runtime.clone(), cancel.clone(), PathConvention::Posix),
        Arc::new(NickelEvaluator),
    )
}

fn declarations(references: &[&str]) -> Vec<ImportDeclaration> {
    references
        .iter()
        .map(|reference| ImportDeclaration::new(*reference, None))
        .collect()
}

/// The workspace scope of `/w`, read from the runtime.
fn workspace_scope(runtime: &MemoryRuntime) -> Vec<ScopeSettings> {
    let location = ScopeLocation {
        scope: ConfigScope::Workspace,
        settings_file: file("/w/.vscode/settings.json"),
        settings_property: PropertyPath::root(),
        base: Some(file("/w/")),
    };
    let text = runtime.contents(&location.settings_file);
    vec![ScopeSettings::parse(location, text, PathConvention::Posix)]
}

#[tokio::test]
async fn test_json_and_ncl_imports_merge_in_declared_order() {
    let runtime = Arc::new(
        MemoryRuntime::new()
            .with_file(file("/w/a.json"), r#"{"x": 1, "y": 2}"#)
            .with_file(file("/w/b.ncl"), "{ y = 3, z = 4 }"),
    );
    let outcome = builder(&runtime, &Cancellation::new())
        .build(&declarations(&["a.json", "b.ncl"]), Some(&file("/w/")))
        .await
        .unwrap();
    let (merged, diagnostics) = outcome.merge();
    assert!(outcome.diagnostics.is_empty());
    assert!(diagnostics.is_empty());
    assert_eq!(to_json(&merged), json!({"x": 1, "y": 3, "z": 4}));
}

#[tokio::test]
async fn test_completion_order_does_not_change_the_result() {
    let mut results = Vec::new();
    for slow in ["/w/a.json", "/w/b.json"] {
        let runtime = Arc::new(
            MemoryRuntime::new()
                .with_file(file("/w/a.json"), r#"{"k": "a", "only_a": true}"#)
                .with_file(file("/w/b.json"), r#"{"k": "b", "nested": {"n": 1}}"#),
        );
        runtime.set_delay(file(slow), Duration::from_millis(30));

        let outcome = builder(&runtime, &Cancellation::new())
            .build(&declarations(&["a.json", "b.json"]), Some(&file("/w/")))
            .await
            .unwrap();
        results.push(outcome.merge().0);
    }
    assert_eq!(results[0], results[1]);
    assert_eq!(
        to_json(&results[0]),
        json!({"k": "b", "only_a": true, "nested": {"n": 1}})
    );
}

#[tokio::test]
async fn test_in_flight_loads_are_shared() {
    let runtime = Arc::new(
        MemoryRuntime::new()
            .with_file(
                file("/w/a.json"),
                r#"{"computed-settings.imports": ["shared.json"], "a": 1}"#,
            )
            .with_file(
                file("/w/b.json"),
                r#"{"computed-settings.imports": ["shared.json"], "b": 1}"#,
            )
            .with_file(file("/w/shared.json"), r#"{"s": 1}"#),
    );
    runtime.set_delay(file("/w/shared.json"), Duration::from_millis(20));

    let outcome = builder(&runtime, &Cancellation::new())
        .build(
            &declarations(&["a.json", "b.json", "shared.json"]),
            Some(&file("/w/")),
        )
        .await
        .unwrap();
    assert_eq!(runtime.read_count(&file("/w/shared.json")), 1);
    assert_eq!(outcome.graph.len(), 3);
    assert_eq!(to_json(&outcome.merge().0), json!({"s": 1, "a": 1, "b": 1}));
}

#[tokio::test]
async fn test_targets_of_one_pass_share_loads() {
    let runtime = Arc::new(
        MemoryRuntime::new()
            .with_file(
                file("/w/.vscode/settings.json"),
                r#"{"computed-settings.importInto": [
                    {"file": "one.json", "imports": ["common.json"]},
                    {"file": "two.json", "imports": ["common.json"]}
                ]}"#,
            )
            .with_file(file("/w/common.json"), r#"{"c": true}"#),
    );
    let scopes = workspace_scope(&runtime);
    let report = resolution_pass(runtime.clone(), options())
        .run(&scopes, &Cancellation::new())
        .await
        .unwrap();
    assert!(report.targets.iter().all(|t| t.written));
    assert_eq!(runtime.read_count(&file("/w/common.json")), 1);
}

#[tokio::test]
async fn test_cycle_does_not_stop_other_branches() {
    let runtime = Arc::new(
        MemoryRuntime::new()
            .with_file(
                file("/w/a.json"),
                r#"{"computed-settings.imports": ["b.json"], "a": 1}"#,
            )
            .with_file(
                file("/w/b.json"),
                r#"{"computed-settings.imports": ["a.json"], "b": 1}"#,
            )
            .with_file(file("/w/c.json"), r#"{"c": 1}"#),
    );
    let outcome = builder(&runtime, &Cancellation::new())
        .build(&declarations(&["a.json", "c.json"]), Some(&file("/w/")))
        .await
        .unwrap();
    let cycles = outcome
        .diagnostics
        .iter()
        .filter(|d| d.error_kind() == Some(ErrorKind::ImportCycle))
        .count();
    assert_eq!(cycles, 1);
    assert_eq!(to_json(&outcome.merge().0), json!({"b": 1, "a": 1, "c": 1}));
}

#[test]
fn test_rewrite_touches_only_the_region() {
    let before = "{\n  // hand-written\n  \"editor.tabSize\": 4,\n  // #region computed-settings\n  \"x\": 1,\n  // #endregion computed-settings\n  \"files.eol\": \"\\n\"\n}\n";
    let value = from_json(&json!({"x": 2, "w": 3}));
    let after = patch_destination(before, &PropertyPath::root(), &value, "  ").unwrap();

    let open = "  // #region computed-settings\n";
    let close = "  // #endregion computed-settings\n";
    let prefix = &before[..before.find(open).unwrap()];
    let suffix = &before[before.find(close).unwrap() + close.len()..];
    assert!(after.starts_with(prefix));
    assert!(after.ends_with(suffix));

    let uri = file("/w/settings.json");
    let region = region_value(&uri, &after, &PropertyPath::root()).unwrap().unwrap();
    assert_eq!(region, value);

    // Patching again with the same value is a no-op
    let again = patch_destination(&after, &PropertyPath::root(), &value, "  ").unwrap();
    assert_eq!(again, after);
}

#[test]
fn test_round_trip_through_the_region() {
    let value = from_json(&json!({
        "s": "quote \" and \\ backslash",
        "n": -1.5e3,
        "list": [1, [2, {"deep": null}], "x"],
        "obj": {"inner": {"flag": false}},
        "dotted.key": "kept"
    }));
    let text = patch_destination("", &PropertyPath::new(["settings"]), &value, "\t").unwrap();
    let uri = file("/w/all.code-workspace");
    let back = region_value(&uri, &text, &PropertyPath::new(["settings"]))
        .unwrap()
        .unwrap();
    assert_eq!(back, value);
}

#[tokio::test]
async fn test_write_failure_is_limited_to_its_file() {
    let runtime = Arc::new(
        MemoryRuntime::new()
            .with_file(
                file("/w/.vscode/settings.json"),
                r#"{"computed-settings.importInto": [
                    {"file": "locked.json", "imports": ["a.json"]},
                    {"file": "open.json", "imports": ["a.json"]}
                ]}"#,
            )
            .with_file(file("/w/a.json"), r#"{"x": 1}"#),
    );
    runtime.set_read_only(file("/w/locked.json"));

    let scopes = workspace_scope(&runtime);
    let report = resolution_pass(runtime.clone(), options())
        .run(&scopes, &Cancellation::new())
        .await
        .unwrap();

    let locked = &report.targets[0];
    assert!(!locked.written);
    assert_eq!(
        locked.diagnostics[0].error_kind(),
        Some(ErrorKind::CannotWriteFile)
    );
    assert!(report.targets[1].written);
    assert!(runtime.contents(&file("/w/open.json")).is_some());
    assert!(report.has_errors());
}

#[tokio::test]
async fn test_cancellation_during_loads_writes_nothing() {
    let runtime = Arc::new(
        MemoryRuntime::new()
            .with_file(
                file("/w/.vscode/settings.json"),
                r#"{"computed-settings.importInto": [
                    {"file": "fast.json", "imports": ["fast-source.json"]},
                    {"file": "slow.json", "imports": ["slow-source.json"]}
                ]}"#,
            )
            .with_file(file("/w/fast-source.json"), r#"{"f": 1}"#)
            .with_file(file("/w/slow-source.json"), r#"{"s": 1}"#),
    );
    runtime.set_delay(file("/w/slow-source.json"), Duration::from_millis(200));

    let scopes = workspace_scope(&runtime);
    let pass = resolution_pass(runtime.clone(), options());
    let cancel = Cancellation::new();
    let (result, ()) = tokio::join!(pass.run(&scopes, &cancel), async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        cancel.cancel();
    });

    assert_eq!(result.unwrap_err(), PassError::Cancelled(computed_settings_core::Cancelled));
    assert!(runtime.writes().is_empty());
}

#[tokio::test]
async fn test_service_on_disk_workspace() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    std::fs::create_dir_all(root.join(".vscode")).unwrap();
    std::fs::write(
        root.join(".vscode/settings.json"),
        "{\n    \"editor.tabSize\": 4,\n    \"computed-settings.imports\": [\"shared/base.json\", \"local.ncl\"]\n}\n",
    )
    .unwrap();
    std::fs::create_dir_all(root.join("shared")).unwrap();
    std::fs::write(root.join("shared/base.json"), r#"{"a": 1, "b": {"c": 2}}"#).unwrap();
    std::fs::write(root.join("local.ncl"), "let base = import \"shared/base.json\" in base & { b.d = 3 }").unwrap();

    let runtime: SharedRuntime = Arc::new(NativeRuntime::new());
    let pass = resolution_pass(runtime.clone(), PassOptions::default());
    let layout = WorkspaceLayout {
        folders: vec![Uri::from_path(root)],
        trusted: true,
        ..WorkspaceLayout::default()
    };
    let service = SettingsService::new(runtime, pass, layout);

    let report = service.run_pass(&Cancellation::new()).await.unwrap();
    assert!(!report.has_errors(), "{}", report.to_text(false));
    assert!(report.targets[0].written);
    assert_eq!(
        to_json(&report.targets[0].value),
        json!({"a": 1, "b": {"c": 2, "d": 3}})
    );

    let written = std::fs::read_to_string(root.join(".vscode/settings.json")).unwrap();
    assert!(written.starts_with("{\n    \"editor.tabSize\": 4,\n"));
    assert!(written.contains("    // #region computed-settings\n    \"a\": 1,\n"));

    // The next pass sees the file it wrote and leaves it alone
    service.invalidate().await;
    let report = service.run_pass(&Cancellation::new()).await.unwrap();
    assert!(!report.targets[0].changed);
    assert_eq!(
        std::fs::read_to_string(root.join(".vscode/settings.json")).unwrap(),
        written
    );
}
