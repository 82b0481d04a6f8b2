//! Efficient file information for location lookups

use crate::types::Location;
use serde::{Deserialize, Serialize};

/// Line index for a file's content.
///
/// Stores the byte offset at which each line starts so that conversion from
/// byte offsets to `(row, column)` positions is a binary search. Lines may be
/// terminated by `\n`, `\r\n` or a lone `\r`; a `\r\n` pair counts as a
/// single line break.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileInformation {
    /// Byte offset of the first character of each line (always starts with 0)
    line_starts: Vec<usize>,

    /// Total length of the file in bytes
    total_length: usize,
}

impl FileInformation {
    /// Create file information by analyzing content
    ///
    /// # Example
    ///
    /// ```
    /// use computed_settings_source_map::FileInformation;
    ///
    /// let info = FileInformation::new("line 1\r\nline 2\rline 3");
    /// assert_eq!(info.line_count(), 3);
    /// ```
    pub fn new(content: &str) -> Self {
        let bytes = content.as_bytes();
        let mut line_starts = vec![0];
        let mut i = 0;

        while i < bytes.len() {
            match bytes[i] {
                b'\n' => line_starts.push(i + 1),
                b'\r' => {
                    if bytes.get(i + 1) == Some(&b'\n') {
                        i += 1;
                    }
                    line_starts.push(i + 1);
                }
                _ => {}
            }
            i += 1;
        }

        FileInformation {
            line_starts,
            total_length: content.len(),
        }
    }

    /// Convert a byte offset to a Location with row and column
    ///
    /// `content` must be the text this index was built from. Columns are
    /// counted in UTF-16 code units and never include line terminators.
    ///
    /// Returns None if the offset is out of bounds or not on a character
    /// boundary.
    ///
    /// # Example
    ///
    /// ```
    /// use computed_settings_source_map::FileInformation;
    ///
    /// let text = "hello\nworld";
    /// let info = FileInformation::new(text);
    /// let loc = info.offset_to_location(text, 6).unwrap();
    /// assert_eq!(loc.row, 1);
    /// assert_eq!(loc.column, 0);
    /// ```
    pub fn offset_to_location(&self, content: &str, offset: usize) -> Option<Location> {
        if offset > self.total_length {
            return None;
        }

        let row = match self.line_starts.binary_search(&offset) {
            Ok(idx) => idx,
            Err(idx) => idx - 1,
        };
        let line_start = self.line_starts[row];
        let column = content
            .get(line_start..offset)?
            .chars()
            .filter(|ch| *ch != '\r' && *ch != '\n')
            .map(char::len_utf16)
            .sum();

        Some(Location {
            offset,
            row,
            column,
        })
    }

    /// Byte offset at which the given row starts.
    pub fn line_start(&self, row: usize) -> Option<usize> {
        self.line_starts.get(row).copied()
    }

    /// Get the total length of the file in bytes
    pub fn total_length(&self) -> usize {
        self.total_length
    }

    /// Get the number of lines in the file
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}
