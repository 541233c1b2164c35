//! # Error Reporting Utilities
//!
//! Renders diagnostics against the text of the file they point into. ABL tokens carry
//! line/column positions rather than byte offsets, so positions are mapped to byte
//! ranges before being handed to ariadne.

use std::ops::Range;

use crate::{Diagnostic, Location};
use ariadne::{Label, Report, Source};

/// Map a 1-based line/column pair to a byte offset in `source`.
///
/// Positions past the end of a line clamp to the line end, positions past the last
/// line clamp to the end of the source.
pub fn byte_offset(source: &str, line: u32, column: u32) -> usize {
    let mut offset = 0;
    for (index, text) in source.split_inclusive('\n').enumerate() {
        if index + 1 == line as usize {
            let content = text.trim_end_matches(['\n', '\r']);
            let skip = column.saturating_sub(1) as usize;
            return offset
                + content
                    .char_indices()
                    .nth(skip)
                    .map_or(content.len(), |(i, _)| i);
        }
        offset += text.len();
    }
    source.len()
}

/// Byte range covered by a location; an empty range is widened to one character.
pub fn byte_range(source: &str, location: &Location) -> Range<usize> {
    let start = byte_offset(source, location.line, location.column);
    let end = byte_offset(source, location.end_line, location.end_column).max(start);
    if end > start {
        return start..end;
    }
    let next = source[start..].chars().next().map_or(0, char::len_utf8);
    start..start + next
}

/// Build a formatted message for a diagnostic
pub fn build_diagnostic_message(source: &str, diagnostic: &Diagnostic, with_color: bool) -> String {
    let mut write_buffer = Vec::new();
    let code_u32: u32 = diagnostic.code.into();
    let range = byte_range(source, &diagnostic.location);
    let mut report = Report::build(diagnostic.severity.into(), ((), range.clone()))
        .with_config(
            ariadne::Config::new()
                .with_index_type(ariadne::IndexType::Byte)
                .with_color(with_color),
        )
        .with_code(code_u32)
        .with_message(&diagnostic.message)
        .with_label(Label::new(((), range)).with_message(&diagnostic.message));
    for (location, message) in &diagnostic.related_locations {
        // Related locations in other include files cannot be drawn against this source.
        if location.file_index == diagnostic.location.file_index {
            report = report
                .with_label(Label::new(((), byte_range(source, location))).with_message(message));
        }
    }
    report
        .finish()
        .write(Source::from(source), &mut write_buffer)
        .expect("writing to an in-memory buffer cannot fail");
    String::from_utf8_lossy(&write_buffer).to_string()
}
