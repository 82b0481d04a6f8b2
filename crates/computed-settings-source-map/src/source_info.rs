//! Source information: a range inside an identified file

use crate::file_info::FileInformation;
use crate::types::Range;
use crate::uri::Uri;
use crate::utils::range_from_offsets;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A range inside the file identified by `uri`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceInfo {
    /// The file the range refers to
    pub uri: Uri,
    /// The range in the file's text
    pub range: Range,
}

impl SourceInfo {
    pub fn new(uri: Uri, range: Range) -> Self {
        SourceInfo { uri, range }
    }

    /// Source info covering `start..end` of `text`.
    ///
    /// Offsets past the end of `text` are clamped; row and column are
    /// computed with all three line-ending conventions.
    pub fn from_offsets(uri: Uri, text: &str, start: usize, end: usize) -> Self {
        SourceInfo {
            uri,
            range: range_from_offsets(text, start, end),
        }
    }

    /// Like [`SourceInfo::from_offsets`], reusing an existing line index.
    pub fn from_index(
        uri: Uri,
        info: &FileInformation,
        text: &str,
        start: usize,
        end: usize,
    ) -> Self {
        let end = end.min(text.len());
        let start = start.min(end);
        let range = match (
            info.offset_to_location(text, start),
            info.offset_to_location(text, end),
        ) {
            (Some(start), Some(end)) => Range::new(start, end),
            _ => range_from_offsets(text, start, end),
        };
        SourceInfo { uri, range }
    }

    /// Zero-width source info at the start of a file.
    pub fn start_of(uri: Uri) -> Self {
        SourceInfo {
            uri,
            range: Range::default(),
        }
    }

    pub fn start_offset(&self) -> usize {
        self.range.start.offset
    }

    pub fn end_offset(&self) -> usize {
        self.range.end.offset
    }
}

impl fmt::Display for SourceInfo {
    /// Renders `uri:row:column` with 1-based row and column.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.uri,
            self.range.start.row + 1,
            self.range.start.column + 1
        )
    }
}
