//! Configuration values and merging with source tracking.
//!
//! Every file format the system reads is loaded into the same
//! [`ConfigValue`] shape, so merging never depends on where a value came
//! from. Each node optionally carries the [`SourceInfo`] it was read from.
//!
//! # Key Features
//!
//! - **Source location preservation**: values keep their `SourceInfo` through merging
//! - **Fixed precedence**: later layers win; objects merge key by key,
//!   scalars and arrays are replaced whole
//! - **Lazy evaluation**: [`MergedConfig`] borrows its layers
//! - **Associativity**: `merge([a, b, c]) == merge([merge([a, b]), c])`
//! - **Deterministic output**: [`to_pretty_string`] depends only on the value
//!
//! # Example
//!
//! ```rust
//! use computed_settings_config::{from_json, merge, to_json};
//! use serde_json::json;
//!
//! let a = from_json(&json!({"x": 1, "y": 2}));
//! let b = from_json(&json!({"y": 3, "z": 4}));
//!
//! let merged = merge(&[a, b]).unwrap();
//! assert_eq!(to_json(&merged), json!({"x": 1, "y": 3, "z": 4}));
//! ```

mod convert;
mod diff;
mod materialize;
mod merged;
mod path;
mod serialize;
mod types;

pub use types::{ConfigError, ConfigValue, ConfigValueKind, Scalar};

pub use convert::{from_json, scalar_to_json, to_json};

pub use diff::{Difference, DifferenceKind, diff};

pub use merged::{MergedConfig, MergedCursor, MergedLeaf, MergedObject, MergedValue};

pub use materialize::{MaterializeOptions, MergeLayer, merge, merge_with_diagnostics};

pub use path::{PropertyPath, lookup_setting};

pub use serialize::{member_text, quote_key, to_pretty_string};

// Re-export for convenience
pub use computed_settings_source_map::SourceInfo;
