/*
 * resolver.rs
 * Copyright (c) 2026 computed-settings contributors
 *
 * Import reference resolution.
 */

//! Turning import references into absolute locations.
//!
//! A reference is an absolute platform path, an absolute URI with a scheme,
//! or a path relative to the directory of the place it was written.
//! Nothing here touches the file system.

use computed_settings_source_map::{PathConvention, Uri, UriError};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Uri(#[from] UriError),

    /// A relative reference was written where there is no directory to
    /// resolve it against (the global scope).
    #[error("relative import `{0}` needs a workspace; use an absolute path")]
    NoBase(String),

    /// The reference resolved to something that is not a local file.
    #[error("cannot resolve import `{uri}`: only local files can be imported")]
    NotAFile { uri: Uri },
}

/// Whether `value` starts with a URI scheme (`^[a-z]+:`).
fn has_scheme(value: &str) -> bool {
    let scheme_len = value.bytes().take_while(u8::is_ascii_lowercase).count();
    scheme_len > 0 && value.as_bytes().get(scheme_len) == Some(&b':')
}

/// Parse a value that is either an absolute platform path or a URI.
///
/// ```
/// use computed_settings_core::parse_uri;
/// use computed_settings_source_map::PathConvention;
///
/// let uri = parse_uri("C:\\Users\\me\\a.json", PathConvention::Windows).unwrap();
/// assert_eq!(uri.as_str(), "file:///C:/Users/me/a.json");
/// ```
pub fn parse_uri(value: &str, convention: PathConvention) -> Result<Uri, ResolveError> {
    if convention.is_absolute_path(value) {
        return Ok(Uri::file(value, convention));
    }
    Ok(Uri::parse(value)?)
}

/// Join `segments` onto `base`.
///
/// An absolute path or URI among the segments restarts the join from that
/// location; the remaining segments are joined as relative paths with `.`
/// and `..` normalized. `base` is treated as a directory, so joining `..`
/// onto a file URI names the file's own directory.
pub fn join_mixed(
    base: &Uri,
    segments: &[&str],
    convention: PathConvention,
) -> Result<Uri, ResolveError> {
    let mut current = base.clone();
    let mut relative: Vec<String> = Vec::new();

    for segment in segments {
        if convention.is_absolute_path(segment) {
            current = Uri::file(segment, convention);
            relative.clear();
        } else if has_scheme(segment) {
            current = Uri::parse(segment)?;
            relative.clear();
        } else {
            relative.push(convention.normalize_separators(segment));
        }
    }

    if relative.is_empty() {
        return Ok(current);
    }
    let relative: Vec<&str> = relative.iter().map(String::as_str).collect();
    Ok(current.join_segments(&relative)?)
}

/// Resolve `reference` relative to `directory`.
///
/// Without a directory only absolute references can be resolved. The result
/// must be a `file` URI: imports are read from the local file system.
pub fn resolve(
    reference: &str,
    directory: Option<&Uri>,
    convention: PathConvention,
) -> Result<Uri, ResolveError> {
    let uri = match directory {
        Some(directory) => join_mixed(&directory.as_directory(), &[reference], convention)?,
        None if convention.is_absolute_path(reference) || has_scheme(reference) => {
            parse_uri(reference, convention)?
        }
        None => return Err(ResolveError::NoBase(reference.to_string())),
    };

    if !uri.is_file() {
        return Err(ResolveError::NotAFile { uri });
    }
    Ok(uri)
}

/// Resolve `reference` written inside the file `importer`.
pub fn resolve_from_file(
    reference: &str,
    importer: &Uri,
    convention: PathConvention,
) -> Result<Uri, ResolveError> {
    let uri = join_mixed(importer, &["..", reference], convention)?;
    if !uri.is_file() {
        return Err(ResolveError::NotAFile { uri });
    }
    Ok(uri)
}
