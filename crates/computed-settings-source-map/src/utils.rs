//! Utility functions for working with source positions

use crate::file_info::FileInformation;
use crate::types::{Location, Range};

/// Convert a byte offset to a Location with line and column info
///
/// Returns None if the offset is out of bounds or inside a multi-byte
/// character. Prefer [`FileInformation`] when converting many offsets of the
/// same text.
pub fn offset_to_location(source: &str, offset: usize) -> Option<Location> {
    FileInformation::new(source).offset_to_location(source, offset)
}

/// Build a Range from two byte offsets.
///
/// Offsets are clamped to the text and moved back to the nearest character
/// boundary, so the result is always valid for `source`.
pub fn range_from_offsets(source: &str, start: usize, end: usize) -> Range {
    let info = FileInformation::new(source);
    let end = floor_char_boundary(source, end.min(source.len()));
    let start = floor_char_boundary(source, start.min(end));

    let locate = |offset| info.offset_to_location(source, offset).unwrap_or_default();
    Range::new(locate(start), locate(end))
}

fn floor_char_boundary(source: &str, mut offset: usize) -> usize {
    while offset > 0 && !source.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}
