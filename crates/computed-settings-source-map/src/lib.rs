//! Source locations for computed settings.
//!
//! This crate provides the location vocabulary shared by every other crate
//! in the workspace: scheme-tagged URIs for files, byte-offset ranges with
//! row/column information, and a context that keeps file text around so
//! diagnostics can be rendered with source snippets.
//!
//! # Overview
//!
//! The core types are:
//! - [`Uri`]: An absolute, scheme-tagged location (`file:`, `vscode-userdata:`, ...)
//! - [`SourceInfo`]: A range inside the file identified by a [`Uri`]
//! - [`FileInformation`]: A line index that understands all three line-ending conventions
//! - [`SourceContext`]: Registered file contents, used for rendering
//!
//! # Example
//!
//! ```rust
//! use computed_settings_source_map::*;
//!
//! let uri = Uri::file("/home/me/settings.json", PathConvention::Posix);
//! let text = "{\n  \"a\": 1\n}";
//! let info = SourceInfo::from_offsets(uri.clone(), text, 4, 7);
//!
//! assert_eq!(info.range.start.row, 1);
//! assert_eq!(info.range.start.column, 2);
//! assert_eq!(info.uri, uri);
//! ```

pub mod context;
pub mod file_info;
pub mod source_info;
pub mod types;
pub mod uri;
pub mod utils;

// Re-export main types
pub use context::{SourceContext, SourceFile};
pub use file_info::FileInformation;
pub use source_info::SourceInfo;
pub use types::{Location, Range};
pub use uri::{PathConvention, Uri, UriError};
pub use utils::{offset_to_location, range_from_offsets};
