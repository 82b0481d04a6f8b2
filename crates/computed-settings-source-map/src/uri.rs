//! Scheme-tagged absolute locations.
//!
//! A [`Uri`] names a file the way the host editor does: `file:///home/me/a.json`,
//! `vscode-userdata:/User/settings.json`, ... Construction and joining are pure
//! string manipulation; nothing here touches the file system.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;
use url::Url;

/// Platform path syntax used to recognise absolute file paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PathConvention {
    /// Only a leading `/` marks an absolute path.
    Posix,
    /// A leading `/`, `\` or drive letter (`C:`) marks an absolute path.
    Windows,
}

impl PathConvention {
    /// The convention of the platform this binary was compiled for.
    pub fn native() -> Self {
        if cfg!(windows) {
            PathConvention::Windows
        } else {
            PathConvention::Posix
        }
    }

    /// Whether `value` looks like an absolute path in this convention.
    pub fn is_absolute_path(&self, value: &str) -> bool {
        match self {
            PathConvention::Posix => value.starts_with('/'),
            PathConvention::Windows => {
                let bytes = value.as_bytes();
                matches!(bytes.first(), Some(b'/') | Some(b'\\'))
                    || (bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':')
            }
        }
    }

    /// Rewrite path separators to `/`.
    pub fn normalize_separators(&self, value: &str) -> String {
        match self {
            PathConvention::Posix => value.to_string(),
            PathConvention::Windows => value.replace('\\', "/"),
        }
    }
}

/// Errors produced when building a [`Uri`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UriError {
    /// The text is not a valid absolute URI
    #[error("invalid uri {value:?}: {message}")]
    Invalid { value: String, message: String },
    /// The URI cannot be used as a base for relative references
    #[error("uri {0:?} cannot be a base")]
    CannotBeABase(String),
}

/// An absolute, scheme-tagged location.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Uri(Url);

impl Uri {
    /// Parse an absolute URI with an explicit scheme.
    pub fn parse(value: &str) -> Result<Self, UriError> {
        Url::parse(value).map(Uri).map_err(|e| UriError::Invalid {
            value: value.to_string(),
            message: e.to_string(),
        })
    }

    /// Build a `file` URI from an absolute path in the given convention.
    ///
    /// Windows drive paths become `file:///C:/...`; UNC paths
    /// (`\\server\share`) carry the server as the URI host.
    pub fn file(path: &str, convention: PathConvention) -> Self {
        let mut path = convention.normalize_separators(path);
        let mut host = None;

        if convention == PathConvention::Windows {
            if let Some(rest) = path.strip_prefix("//") {
                let (server, remainder) = rest.split_once('/').unwrap_or((rest, ""));
                host = Some(server.to_string());
                path = format!("/{remainder}");
            } else if !path.starts_with('/') {
                path = format!("/{path}");
            }
        }

        let mut url = Url::parse("file:///").expect("static file url is valid");
        url.set_path(&path);
        if let Some(host) = host {
            // An unparsable host leaves the URI host-less, which still names the path
            let _ = url.set_host(Some(&host));
        }
        Uri(url)
    }

    /// Build a `file` URI from a native path.
    pub fn from_path(path: &std::path::Path) -> Self {
        Uri::file(&path.to_string_lossy(), PathConvention::native())
    }

    /// The scheme (`file`, `vscode-userdata`, ...).
    pub fn scheme(&self) -> &str {
        self.0.scheme()
    }

    /// Whether the URI names a locally readable file.
    pub fn is_file(&self) -> bool {
        self.0.scheme() == "file"
    }

    /// The percent-encoded path component.
    pub fn path(&self) -> &str {
        self.0.path()
    }

    /// The full URI text.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// The last path segment, if any.
    pub fn file_name(&self) -> Option<&str> {
        self.0
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|name| !name.is_empty())
    }

    /// The extension of the last path segment, without the dot.
    pub fn extension(&self) -> Option<&str> {
        let name = self.file_name()?;
        let (stem, extension) = name.rsplit_once('.')?;
        if stem.is_empty() { None } else { Some(extension) }
    }

    /// Local file-system path for `file` URIs.
    pub fn to_file_path(&self) -> Option<PathBuf> {
        if !self.is_file() {
            return None;
        }
        self.0.to_file_path().ok()
    }

    /// The directory containing this URI, with a trailing slash.
    ///
    /// A URI that already ends with `/` is its own directory.
    pub fn directory(&self) -> Result<Uri, UriError> {
        self.0
            .join(".")
            .map(Uri)
            .map_err(|_| UriError::CannotBeABase(self.0.to_string()))
    }

    /// This URI treated as a directory (a trailing slash is added if missing).
    pub fn as_directory(&self) -> Uri {
        if self.0.path().ends_with('/') || self.0.cannot_be_a_base() {
            return self.clone();
        }
        let mut url = self.0.clone();
        let path = format!("{}/", url.path());
        url.set_path(&path);
        Uri(url)
    }

    /// Join relative path segments onto this directory URI.
    ///
    /// `.` and `..` segments are normalized; `..` never climbs above the root.
    /// Characters that would start a query or fragment are escaped so they
    /// stay part of the path.
    pub fn join_segments(&self, segments: &[&str]) -> Result<Uri, UriError> {
        let mut current = self.as_directory();
        let last = segments.len().saturating_sub(1);

        for (i, segment) in segments.iter().enumerate() {
            let escaped = segment
                .replace('%', "%25")
                .replace('?', "%3F")
                .replace('#', "%23");
            let relative = if i < last && !escaped.ends_with('/') {
                format!("{escaped}/")
            } else {
                escaped
            };
            current = Uri(current
                .0
                .join(&relative)
                .map_err(|e| UriError::Invalid {
                    value: segment.to_string(),
                    message: e.to_string(),
                })?);
        }

        Ok(current)
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl From<Url> for Uri {
    fn from(url: Url) -> Self {
        Uri(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = Uri::parse("not a uri").unwrap_err();
        assert!(matches!(err, UriError::Invalid { .. }));
        assert!(err.to_string().starts_with("invalid uri \"not a uri\": "));

        let err = Uri::parse("mailto:me").unwrap().directory().unwrap_err();
        let err: Box<dyn std::error::Error> = Box::new(err);
        assert_eq!(err.to_string(), "uri \"mailto:me\" cannot be a base");
    }

    #[test]
    fn test_posix_absolute_detection() {
        let posix = PathConvention::Posix;
        assert!(posix.is_absolute_path("/etc/settings.json"));
        assert!(!posix.is_absolute_path("C:/settings.json"));
        assert!(!posix.is_absolute_path("\\server\\share"));
        assert!(!posix.is_absolute_path("relative/a.json"));
    }

    #[test]
    fn test_windows_absolute_detection() {
        let windows = PathConvention::Windows;
        assert!(windows.is_absolute_path("/etc/settings.json"));
        assert!(windows.is_absolute_path("\\Users\\me"));
        assert!(windows.is_absolute_path("C:\\Users\\me"));
        assert!(windows.is_absolute_path("d:/x"));
        assert!(!windows.is_absolute_path("relative\\a.json"));
    }

    #[test]
    fn test_file_uri_posix() {
        let uri = Uri::file("/home/me/my settings.json", PathConvention::Posix);
        assert_eq!(uri.as_str(), "file:///home/me/my%20settings.json");
        assert!(uri.is_file());
        assert_eq!(uri.file_name(), Some("my%20settings.json"));
        assert_eq!(uri.extension(), Some("json"));
    }

    #[test]
    fn test_file_uri_windows_drive() {
        let uri = Uri::file("C:\\Users\\me\\a.jsonc", PathConvention::Windows);
        assert_eq!(uri.as_str(), "file:///C:/Users/me/a.jsonc");
        assert_eq!(uri.extension(), Some("jsonc"));
    }

    #[test]
    fn test_file_uri_windows_unc() {
        let uri = Uri::file("\\\\server\\share\\a.json", PathConvention::Windows);
        assert_eq!(uri.as_str(), "file://server/share/a.json");
    }

    #[test]
    fn test_directory() {
        let uri = Uri::parse("file:///a/b/settings.json").unwrap();
        assert_eq!(uri.directory().unwrap().as_str(), "file:///a/b/");

        let dir = Uri::parse("file:///a/b/").unwrap();
        assert_eq!(dir.directory().unwrap().as_str(), "file:///a/b/");
    }

    #[test]
    fn test_join_segments_normalizes() {
        let base = Uri::parse("file:///a/b").unwrap();
        let joined = base.join_segments(&["..", "c", "./d.json"]).unwrap();
        assert_eq!(joined.as_str(), "file:///a/c/d.json");
    }

    #[test]
    fn test_join_segments_escapes_fragment_characters() {
        let base = Uri::parse("file:///a/").unwrap();
        let joined = base.join_segments(&["x#1.json"]).unwrap();
        assert_eq!(joined.as_str(), "file:///a/x%231.json");
    }

    #[test]
    fn test_other_scheme() {
        let uri = Uri::parse("vscode-userdata:/User/settings.json").unwrap();
        assert!(!uri.is_file());
        assert_eq!(uri.scheme(), "vscode-userdata");
        assert!(uri.to_file_path().is_none());
        let sibling = uri.directory().unwrap().join_segments(&["b.json"]).unwrap();
        assert_eq!(sibling.as_str(), "vscode-userdata:/User/b.json");
    }

    #[test]
    fn test_extension_requires_stem() {
        let uri = Uri::parse("file:///a/.json").unwrap();
        assert_eq!(uri.extension(), None);
    }
}
