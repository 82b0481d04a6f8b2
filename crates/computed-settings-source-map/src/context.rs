//! Source context for managing files

use crate::file_info::FileInformation;
use crate::types::Location;
use crate::uri::Uri;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Registry of file contents keyed by [`Uri`].
///
/// Loaders register every text they parse so that diagnostics can later be
/// rendered with source snippets without touching the file system again.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceContext {
    files: BTreeMap<Uri, SourceFile>,
}

/// A registered source file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFile {
    /// Location the content was read from
    pub uri: Uri,
    /// File content
    pub content: String,
    /// Line index for location lookups
    #[serde(skip)]
    file_info: Option<FileInformation>,
}

impl SourceFile {
    /// Create a source file, indexing its lines eagerly.
    pub fn new(uri: Uri, content: String) -> Self {
        let file_info = Some(FileInformation::new(&content));
        SourceFile {
            uri,
            content,
            file_info,
        }
    }

    /// Line index of the content, rebuilt lazily after deserialization.
    pub fn file_info(&self) -> FileInformation {
        match &self.file_info {
            Some(info) => info.clone(),
            None => FileInformation::new(&self.content),
        }
    }

    /// Convert a byte offset inside this file to a location.
    pub fn offset_to_location(&self, offset: usize) -> Option<Location> {
        match &self.file_info {
            Some(info) => info.offset_to_location(&self.content, offset),
            None => FileInformation::new(&self.content).offset_to_location(&self.content, offset),
        }
    }
}

impl SourceContext {
    /// Create a new empty source context
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the content of a file, replacing earlier content for the same uri.
    pub fn add_file(&mut self, uri: Uri, content: impl Into<String>) {
        let file = SourceFile::new(uri.clone(), content.into());
        self.files.insert(uri, file);
    }

    /// Look up a registered file.
    pub fn get_file(&self, uri: &Uri) -> Option<&SourceFile> {
        self.files.get(uri)
    }

    /// Iterate over all registered files in uri order.
    pub fn files(&self) -> impl Iterator<Item = &SourceFile> {
        self.files.values()
    }

    /// Number of registered files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether no file is registered.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Copy every file of `other` into this context.
    pub fn extend(&mut self, other: &SourceContext) {
        for (uri, file) in &other.files {
            self.files.insert(uri.clone(), file.clone());
        }
    }
}
