//! Error code catalog.
//!
//! `error_catalog.json` is embedded at compile time and maps each code
//! (`CS-<subsystem>-<number>`) to its subsystem, title and explanation.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CatalogEntry {
    /// "load", "graph", "patch", "check" or "internal"
    pub subsystem: String,

    /// Equal to the fixed message of the matching error kind.
    pub title: String,

    /// Default problem statement.
    #[serde(rename = "message_template")]
    pub explanation: String,

    pub since_version: String,
}

/// Every known code.
///
/// # Panics
///
/// On first access if the embedded JSON does not parse.
pub static CATALOG: Lazy<HashMap<String, CatalogEntry>> = Lazy::new(|| {
    serde_json::from_str(include_str!("../error_catalog.json"))
        .expect("error_catalog.json must be valid")
});

/// ```
/// use computed_settings_error_reporting::catalog::lookup;
///
/// assert_eq!(lookup("CS-1-1").unwrap().title, "cannot read file");
/// assert!(lookup("CS-9-9").is_none());
/// ```
pub fn lookup(code: &str) -> Option<&'static CatalogEntry> {
    CATALOG.get(code)
}

pub fn subsystem_of(code: &str) -> Option<&'static str> {
    lookup(code).map(|entry| entry.subsystem.as_str())
}
