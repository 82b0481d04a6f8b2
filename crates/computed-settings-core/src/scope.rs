/*
 * scope.rs
 * Copyright (c) 2026 computed-settings contributors
 *
 * Configuration scopes and their import settings.
 */

//! Configuration scopes and the import settings they declare.
//!
//! Every scope (global, workspace, each folder of a multi-root workspace)
//! has its own settings file. Two keys in it drive a pass:
//!
//! - `computed-settings.imports`: files merged into the scope's own
//!   settings object
//! - `computed-settings.importInto`: `{ "file", "property"?, "imports" }`
//!   entries merging files into an object of another file

use crate::graph::ImportDeclaration;
use crate::resolver::resolve;
use computed_settings_config::{ConfigValue, PropertyPath, lookup_setting};
use computed_settings_error_reporting::{DiagnosticMessage, ErrorKind};
use computed_settings_jsonc::{parse, to_config_value};
use computed_settings_runtime::SystemRuntime;
use computed_settings_source_map::{FileInformation, PathConvention, SourceInfo, Uri};
use std::fmt;
use tracing::{debug, warn};

pub const IMPORTS_SETTING: &str = "computed-settings.imports";
pub const IMPORT_INTO_SETTING: &str = "computed-settings.importInto";

/// Where a setting was declared, in precedence order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConfigScope {
    Global,
    Workspace,
    /// One folder of a multi-root workspace
    Folder(String),
}

impl fmt::Display for ConfigScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigScope::Global => f.write_str("global"),
            ConfigScope::Workspace => f.write_str("workspace"),
            ConfigScope::Folder(name) => write!(f, "folder `{name}`"),
        }
    }
}

/// The files making up the current workspace.
#[derive(Debug, Clone, Default)]
pub struct WorkspaceLayout {
    /// The user's own settings file
    pub user_settings: Option<Uri>,
    /// A `.code-workspace` file
    pub workspace_file: Option<Uri>,
    pub folders: Vec<Uri>,
    /// Untrusted workspaces only get the global scope
    pub trusted: bool,
}

/// Where one scope keeps its settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeLocation {
    pub scope: ConfigScope,
    pub settings_file: Uri,
    /// Path of the settings object inside the file
    pub settings_property: PropertyPath,
    /// Directory relative references are resolved against
    pub base: Option<Uri>,
}

fn folder_settings(folder: &Uri) -> Option<Uri> {
    match folder.join_segments(&[".vscode", "settings.json"]) {
        Ok(uri) => Some(uri),
        Err(error) => {
            warn!(folder = %folder, %error, "cannot locate folder settings");
            None
        }
    }
}

fn folder_name(folder: &Uri) -> String {
    folder
        .as_directory()
        .path()
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|name| !name.is_empty())
        .unwrap_or(folder.as_str())
        .to_string()
}

/// The scopes of `layout`, in precedence order.
///
/// A workspace file makes a workspace scope; without one, a single folder
/// is the workspace scope and several folders are folder scopes each.
pub fn discover_scopes(layout: &WorkspaceLayout) -> Vec<ScopeLocation> {
    let mut scopes = Vec::new();

    if let Some(user) = &layout.user_settings {
        scopes.push(ScopeLocation {
            scope: ConfigScope::Global,
            settings_file: user.clone(),
            settings_property: PropertyPath::root(),
            base: None,
        });
    }
    if !layout.trusted {
        debug!("workspace is not trusted; only global settings are used");
        return scopes;
    }

    if let Some(workspace) = &layout.workspace_file {
        scopes.push(ScopeLocation {
            scope: ConfigScope::Workspace,
            settings_file: workspace.clone(),
            settings_property: PropertyPath::new(["settings"]),
            base: workspace.directory().ok(),
        });
    } else if let [folder] = layout.folders.as_slice() {
        if let Some(settings_file) = folder_settings(folder) {
            scopes.push(ScopeLocation {
                scope: ConfigScope::Workspace,
                settings_file,
                settings_property: PropertyPath::root(),
                base: Some(folder.as_directory()),
            });
        }
    } else {
        for folder in &layout.folders {
            if let Some(settings_file) = folder_settings(folder) {
                scopes.push(ScopeLocation {
                    scope: ConfigScope::Folder(folder_name(folder)),
                    settings_file,
                    settings_property: PropertyPath::root(),
                    base: Some(folder.as_directory()),
                });
            }
        }
    }
    scopes
}

/// One destination object and the imports merged into it.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportTarget {
    pub destination: Uri,
    pub property: PropertyPath,
    pub declarations: Vec<ImportDeclaration>,
    /// Directory relative imports are resolved against
    pub base: Option<Uri>,
    /// The setting that declared this target
    pub declared_at: Option<SourceInfo>,
}

/// The import settings of one scope.
#[derive(Debug, Clone)]
pub struct ScopeSettings {
    pub location: ScopeLocation,
    /// `None` when the key is absent
    pub imports: Option<Vec<ImportDeclaration>>,
    pub import_into: Option<Vec<ImportTarget>>,
    /// Problems with the settings themselves
    pub diagnostics: Vec<DiagnosticMessage>,
    /// Text of the settings file, if it exists
    pub text: Option<String>,
}

impl ScopeSettings {
    /// The scope's targets: its own `imports` first, then every `importInto`
    /// entry in order.
    pub fn targets(&self) -> Vec<ImportTarget> {
        let own = self.imports.as_ref().map(|declarations| ImportTarget {
            destination: self.location.settings_file.clone(),
            property: self.location.settings_property.clone(),
            declarations: declarations.clone(),
            base: self.location.base.clone(),
            declared_at: declarations.first().and_then(|d| d.declared_at.clone()),
        });
        own.into_iter()
            .chain(self.import_into.iter().flatten().cloned())
            .collect()
    }

    /// Read the settings of `location` from its file.
    pub async fn read(
        runtime: &dyn SystemRuntime,
        location: ScopeLocation,
        convention: PathConvention,
    ) -> ScopeSettings {
        let text = match runtime.file_read(&location.settings_file).await {
            Ok(bytes) => match String::from_utf8(bytes) {
                Ok(text) => Some(text),
                Err(_) => {
                    let diagnostic = ErrorKind::FileIsNotUtf8
                        .diagnostic()
                        .with_location(SourceInfo::start_of(location.settings_file.clone()))
                        .build();
                    let mut settings = ScopeSettings::parse(location, None, convention);
                    settings.diagnostics.push(diagnostic);
                    return settings;
                }
            },
            Err(error) if error.is_not_found() => None,
            Err(error) => {
                let diagnostic = ErrorKind::CannotReadFile
                    .diagnostic()
                    .problem(error.to_string())
                    .with_location(SourceInfo::start_of(location.settings_file.clone()))
                    .build();
                let mut settings = ScopeSettings::parse(location, None, convention);
                settings.diagnostics.push(diagnostic);
                return settings;
            }
        };
        ScopeSettings::parse(location, text, convention)
    }

    /// Extract the import settings from the text of the settings file.
    pub fn parse(
        location: ScopeLocation,
        text: Option<String>,
        convention: PathConvention,
    ) -> ScopeSettings {
        let mut settings = ScopeSettings {
            location,
            imports: None,
            import_into: None,
            diagnostics: Vec::new(),
            text: None,
        };
        let Some(text) = text else {
            return settings;
        };

        let uri = settings.location.settings_file.clone();
        let output = parse(&text);
        if !output.errors.is_empty() {
            let index = FileInformation::new(&text);
            for error in &output.errors {
                settings.diagnostics.push(
                    ErrorKind::CannotParseFile
                        .diagnostic()
                        .problem(error.code.to_string())
                        .with_location(SourceInfo::from_index(
                            uri.clone(),
                            &index,
                            &text,
                            error.offset,
                            error.end(),
                        ))
                        .build(),
                );
            }
            settings.text = Some(text);
            return settings;
        }

        let object = output
            .root
            .as_ref()
            .and_then(|root| root.find_path(settings.location.settings_property.segments()))
            .filter(|node| node.is_object())
            .map(|node| to_config_value(node, &uri, &text));
        if let Some(object) = object {
            let mut reader = SettingsReader {
                location: &settings.location,
                convention,
                diagnostics: Vec::new(),
            };
            settings.imports = lookup_setting(&object, IMPORTS_SETTING)
                .and_then(|value| reader.declarations(IMPORTS_SETTING, value));
            settings.import_into = lookup_setting(&object, IMPORT_INTO_SETTING)
                .and_then(|value| reader.targets(value));
            settings.diagnostics = reader.diagnostics;
        }
        settings.text = Some(text);
        settings
    }
}

struct SettingsReader<'a> {
    location: &'a ScopeLocation,
    convention: PathConvention,
    diagnostics: Vec<DiagnosticMessage>,
}

impl SettingsReader<'_> {
    fn invalid(&mut self, problem: String, value: &ConfigValue) {
        self.diagnostics.push(
            ErrorKind::InvalidSetting
                .diagnostic()
                .problem(problem)
                .with_optional_location(value.source_info.clone())
                .build(),
        );
    }

    /// A list of import references. Non-string entries are reported and
    /// skipped; a value that is not a list is reported and ignored.
    fn declarations(&mut self, key: &str, value: &ConfigValue) -> Option<Vec<ImportDeclaration>> {
        let Some(items) = value.as_array() else {
            self.invalid(format!("`{key}` must be an array of strings"), value);
            return None;
        };
        let mut declarations = Vec::with_capacity(items.len());
        for item in items {
            match item.as_str() {
                Some(reference) => declarations.push(ImportDeclaration::new(
                    reference,
                    item.source_info.clone(),
                )),
                None => self.invalid(
                    format!("entries of `{key}` must be strings, found a {}", item.type_name()),
                    item,
                ),
            }
        }
        Some(declarations)
    }

    fn targets(&mut self, value: &ConfigValue) -> Option<Vec<ImportTarget>> {
        let Some(items) = value.as_array() else {
            self.invalid(
                format!("`{IMPORT_INTO_SETTING}` must be an array of objects"),
                value,
            );
            return None;
        };
        Some(items.iter().filter_map(|item| self.target(item)).collect())
    }

    fn target(&mut self, item: &ConfigValue) -> Option<ImportTarget> {
        if !item.is_object() {
            self.invalid(
                format!("entries of `{IMPORT_INTO_SETTING}` must be objects, found a {}", item.type_name()),
                item,
            );
            return None;
        }

        let Some(file) = item.get("file").and_then(ConfigValue::as_str) else {
            self.invalid(
                format!("entries of `{IMPORT_INTO_SETTING}` need a `file` string"),
                item,
            );
            return None;
        };
        let destination = match resolve(file, self.location.base.as_ref(), self.convention) {
            Ok(uri) => uri,
            Err(error) => {
                let location = item.get("file").and_then(|f| f.source_info.clone());
                self.diagnostics.push(
                    ErrorKind::InvalidFileUri
                        .diagnostic()
                        .problem(error.to_string())
                        .with_optional_location(location)
                        .build(),
                );
                return None;
            }
        };

        let property = match item.get("property") {
            None => PropertyPath::root(),
            Some(value) => match property_path(value) {
                Some(path) => path,
                None => {
                    self.invalid(
                        "`property` must be a string or an array of strings".to_string(),
                        value,
                    );
                    return None;
                }
            },
        };

        let declarations = match item.get("imports") {
            Some(imports) => self.declarations("imports", imports)?,
            None => Vec::new(),
        };

        Some(ImportTarget {
            destination,
            property,
            declarations,
            base: self.location.base.clone(),
            declared_at: item.source_info.clone(),
        })
    }
}

fn property_path(value: &ConfigValue) -> Option<PropertyPath> {
    if let Some(segment) = value.as_str() {
        return Some(PropertyPath::new([segment]));
    }
    let segments = value
        .as_array()?
        .iter()
        .map(|segment| segment.as_str().map(str::to_string))
        .collect::<Option<Vec<_>>>()?;
    Some(PropertyPath::new(segments))
}
