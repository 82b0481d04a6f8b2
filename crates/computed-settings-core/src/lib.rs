//! Import resolution, merging and region patching for computed settings.
//!
//! A resolution pass reads the import settings of every configuration
//! scope, loads the imported files (JSON with comments or the richer
//! configuration language) into one import graph, merges each target's
//! root values in declaration order and writes the result into a generated
//! region of the destination file:
//!
//! ```text
//! {
//!   "editor.fontSize": 14,
//!   // #region computed-settings
//!   "x": 1,
//!   "y": 3,
//!   // #endregion computed-settings
//! }
//! ```
//!
//! Everything outside the region is left byte-identical. After writing, the
//! host's own view of the destination is compared with the computed value.
//!
//! The main entry points are [`ResolutionPass`] for a single pass and
//! [`SettingsService`] for a long-lived process.

pub mod cancel;
pub mod checker;
pub mod graph;
pub mod loader;
pub mod pass;
pub mod patch;
pub mod resolver;
pub mod scope;
pub mod service;

pub use cancel::{Cancellation, Cancelled};
pub use checker::{HostConfiguration, ReparsingHost, check};
pub use graph::{GraphBuilder, GraphNode, GraphOutcome, ImportDeclaration, ImportGraph, RootValue};
pub use loader::{
    FileFormat, FormatLoader, JsonLoader, LoadContext, Loaded, NclLoader, NestedImport, ReadTable,
};
pub use pass::{PassError, PassOptions, PassReport, ResolutionPass, TargetReport};
pub use patch::{
    GeneratedRegion, PatchError, REGION_END, REGION_START, comma_insertion_offset, locate,
    patch_destination, region_value, replace_region,
};
pub use resolver::{ResolveError, join_mixed, parse_uri, resolve, resolve_from_file};
pub use scope::{
    ConfigScope, IMPORT_INTO_SETTING, IMPORTS_SETTING, ImportTarget, ScopeLocation, ScopeSettings,
    WorkspaceLayout, discover_scopes,
};
pub use service::SettingsService;
