//! Error reporting and diagnostic messages for computed settings.
//!
//! User-facing problems are never Rust errors: loaders, the import graph, the
//! region patcher and the consistency checker all produce
//! [`DiagnosticMessage`]s. Each carries a stable code from the
//! [`CATALOG`], a title equal to the fixed message of its
//! [`ErrorKind`], and optionally a location.
//!
//! # Example
//!
//! ```
//! use computed_settings_error_reporting::ErrorKind;
//! use computed_settings_source_map::{PathConvention, SourceInfo, Uri};
//!
//! let uri = Uri::file("/home/me/a.json", PathConvention::Posix);
//! let error = ErrorKind::CannotParseFile
//!     .diagnostic()
//!     .problem("Value expected")
//!     .with_location(SourceInfo::from_offsets(uri, "{\"a\": }", 6, 7))
//!     .build();
//!
//! assert!(error.to_text(None).contains("[CS-1-3]"));
//! ```

pub mod builder;
pub mod catalog;
pub mod collector;
pub mod diagnostic;
pub mod kind;

pub use builder::DiagnosticMessageBuilder;
pub use catalog::{CATALOG, CatalogEntry, lookup, subsystem_of};
pub use collector::DiagnosticCollector;
pub use diagnostic::{DetailItem, DetailKind, DiagnosticKind, DiagnosticMessage, MessageContent};
pub use kind::ErrorKind;
