//! Command implementations.
//!
//! Every command builds the same [`SettingsService`] from the workspace
//! arguments and delegates the work to `computed-settings-core`.

pub mod apply;
pub mod check;
pub mod show;
pub mod watch;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use computed_settings_core::{
    PassOptions, ReparsingHost, ResolutionPass, SettingsService, WorkspaceLayout, parse_uri,
};
use computed_settings_ncl::NickelEvaluator;
use computed_settings_runtime::{NativeRuntime, SharedRuntime};
use computed_settings_source_map::{PathConvention, Uri};
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PathStyle {
    Posix,
    Windows,
}

impl From<PathStyle> for PathConvention {
    fn from(style: PathStyle) -> Self {
        match style {
            PathStyle::Posix => PathConvention::Posix,
            PathStyle::Windows => PathConvention::Windows,
        }
    }
}

/// Where the settings live.
#[derive(Debug, Clone, Args)]
pub struct WorkspaceArgs {
    /// The user settings file (global scope)
    #[arg(long, global = true, value_name = "PATH")]
    pub user_settings: Option<String>,

    /// A `.code-workspace` file (workspace scope)
    #[arg(long, global = true, value_name = "PATH")]
    pub workspace_file: Option<String>,

    /// A workspace folder (can be specified multiple times)
    #[arg(long = "folder", global = true, value_name = "PATH")]
    pub folders: Vec<String>,

    /// Only use the global scope, as for an untrusted workspace
    #[arg(long, global = true)]
    pub untrusted: bool,

    /// Path syntax of import references (defaults to the platform's)
    #[arg(long, global = true, value_enum)]
    pub path_style: Option<PathStyle>,
}

impl WorkspaceArgs {
    pub fn convention(&self) -> PathConvention {
        self.path_style.map_or_else(PathConvention::native, Into::into)
    }

    /// The workspace layout; with no scope given, the current directory is
    /// the only folder.
    pub fn layout(&self) -> Result<WorkspaceLayout> {
        let convention = self.convention();
        let to_uri = |value: &String| location(value, convention);

        let mut folders = self.folders.iter().map(to_uri).collect::<Result<Vec<_>>>()?;
        if folders.is_empty() && self.user_settings.is_none() && self.workspace_file.is_none() {
            let cwd = std::env::current_dir().context("Failed to get current directory")?;
            folders.push(Uri::from_path(&cwd));
        }

        Ok(WorkspaceLayout {
            user_settings: self.user_settings.as_ref().map(to_uri).transpose()?,
            workspace_file: self.workspace_file.as_ref().map(to_uri).transpose()?,
            folders,
            trusted: !self.untrusted,
        })
    }

    pub fn service(&self, dry_run: bool) -> Result<SettingsService> {
        let runtime: SharedRuntime = Arc::new(NativeRuntime::new());
        let options = PassOptions {
            convention: self.convention(),
            dry_run,
            ..PassOptions::default()
        };
        let pass = ResolutionPass::new(
            runtime.clone(),
            Arc::new(NickelEvaluator),
            Arc::new(ReparsingHost::new(runtime.clone())),
            options,
        );
        Ok(SettingsService::new(runtime, pass, self.layout()?))
    }
}

/// A path (absolute or relative to the current directory) or a URI.
fn location(value: &str, convention: PathConvention) -> Result<Uri> {
    if let Ok(uri) = parse_uri(value, convention) {
        return Ok(uri);
    }
    let absolute = std::path::absolute(Path::new(value))
        .with_context(|| format!("Failed to resolve path `{value}`"))?;
    parse_uri(&absolute.to_string_lossy(), convention)
        .with_context(|| format!("Invalid location `{value}`"))
}
