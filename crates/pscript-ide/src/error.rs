//! Error types for the analysis core.
//!
//! Resolution misses are not errors; lookups return empty vectors instead.

use std::io;
use std::path::PathBuf;

use derive_more::{Display, Error};

/// An editor position or byte offset that does not exist in the snapshot.
///
/// Never clamped: applying a clamped edit would corrupt the document.
#[derive(Clone, Debug, Display, Error, PartialEq, Eq)]
pub enum RangeError {
    #[display("line {line} out of range (document has {line_count} lines)")]
    LineOutOfRange { line: u32, line_count: usize },

    #[display("character {character} out of range on line {line} (line has {len} UTF-16 units)")]
    Utf16OffsetOutOfRange { line: u32, character: u32, len: u32 },

    #[display("UTF-16 offset {character} on line {line} splits a surrogate pair")]
    InsideSurrogatePair { line: u32, character: u32 },

    #[display("byte offset {offset} out of range (length {len})")]
    ByteOffsetOutOfRange { offset: usize, len: usize },

    #[display("byte offset {offset} is not on a character boundary")]
    NotCharBoundary { offset: usize },

    #[display("range start {start_line}:{start_character} is after end {end_line}:{end_character}")]
    InvertedRange {
        start_line: u32,
        start_character: u32,
        end_line: u32,
        end_character: u32,
    },
}

/// A single file that could not be indexed. Logged and skipped by scans.
#[derive(Debug, Display, Error)]
pub enum IndexError {
    #[display("failed to read {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },

    #[display("failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },
}
