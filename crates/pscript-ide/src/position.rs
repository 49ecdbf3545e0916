//! Conversions between the three position systems in play.
//!
//! - compiler positions: 1-based `(line, col)`, column in UTF-16 units
//!   ([`CompilerPosition`], produced by the parser)
//! - editor positions: 0-based `(line, character)` in UTF-16 units
//!   ([`lsp_types::Position`])
//! - byte offsets into the UTF-8 document text
//!
//! Every fallible conversion reports a [`RangeError`] instead of clamping.

use lsp_types::{Position, Range};
use pscript_syntax::{Pos, Span};

use crate::error::RangeError;

pub type CompilerPosition = Pos;

/// Compiler position to editor position. Line or column 0 clamps to 0.
pub fn to_editor_position(pos: CompilerPosition) -> Position {
    Position::new(pos.line.saturating_sub(1), pos.col.saturating_sub(1))
}

pub fn to_compiler_position(pos: Position) -> CompilerPosition {
    Pos::new(pos.line.saturating_add(1), pos.character.saturating_add(1))
}

pub fn span_to_range(span: Span) -> Range {
    Range::new(to_editor_position(span.start), to_editor_position(span.end))
}

/// Byte offset within `line` of the given UTF-16 offset.
///
/// The offset equal to the line's UTF-16 length is the end of the line.
/// Error variants carry line 0; [`LineIndex`] fills in the real line.
pub fn utf16_offset_to_byte_offset(line: &str, utf16_offset: u32) -> Result<usize, RangeError> {
    let mut units = 0u32;
    for (byte, c) in line.char_indices() {
        if units == utf16_offset {
            return Ok(byte);
        }
        let width = c.len_utf16() as u32;
        if units + width > utf16_offset {
            return Err(RangeError::InsideSurrogatePair {
                line: 0,
                character: utf16_offset,
            });
        }
        units += width;
    }
    if units == utf16_offset {
        Ok(line.len())
    } else {
        Err(RangeError::Utf16OffsetOutOfRange {
            line: 0,
            character: utf16_offset,
            len: units,
        })
    }
}

/// UTF-16 offset within `line` of the given byte offset.
pub fn byte_offset_to_utf16_offset(line: &str, byte_offset: usize) -> Result<u32, RangeError> {
    if byte_offset > line.len() {
        return Err(RangeError::ByteOffsetOutOfRange {
            offset: byte_offset,
            len: line.len(),
        });
    }
    if !line.is_char_boundary(byte_offset) {
        return Err(RangeError::NotCharBoundary {
            offset: byte_offset,
        });
    }
    Ok(line[..byte_offset].chars().map(|c| c.len_utf16() as u32).sum())
}

impl RangeError {
    fn on_line(self, actual: u32) -> Self {
        match self {
            RangeError::Utf16OffsetOutOfRange { character, len, .. } => {
                RangeError::Utf16OffsetOutOfRange {
                    line: actual,
                    character,
                    len,
                }
            }
            RangeError::InsideSurrogatePair { character, .. } => RangeError::InsideSurrogatePair {
                line: actual,
                character,
            },
            other => other,
        }
    }
}

/// Line starts of a document, for offset/position conversion.
///
/// Lines are split on `\n`; a `\r` before it stays part of the line text.
pub struct LineIndex<'t> {
    text: &'t str,
    line_starts: Vec<usize>,
}

impl<'t> LineIndex<'t> {
    pub fn new(text: &'t str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            text.bytes()
                .enumerate()
                .filter(|&(_, b)| b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self { text, line_starts }
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Text of `line` without its terminating `\n`.
    pub fn line_text(&self, line: u32) -> Option<&'t str> {
        let start = *self.line_starts.get(line as usize)?;
        let end = match self.line_starts.get(line as usize + 1) {
            Some(&next) => next - 1,
            None => self.text.len(),
        };
        Some(&self.text[start..end])
    }

    /// Byte offset of an editor position.
    pub fn offset(&self, pos: Position) -> Result<usize, RangeError> {
        let line_text = self.line_text(pos.line).ok_or(RangeError::LineOutOfRange {
            line: pos.line,
            line_count: self.line_count(),
        })?;
        let in_line = utf16_offset_to_byte_offset(line_text, pos.character)
            .map_err(|e| e.on_line(pos.line))?;
        Ok(self.line_starts[pos.line as usize] + in_line)
    }

    /// Editor position of a byte offset. The text length itself is valid and
    /// maps to the end of the last line.
    pub fn position(&self, offset: usize) -> Result<Position, RangeError> {
        if offset > self.text.len() {
            return Err(RangeError::ByteOffsetOutOfRange {
                offset,
                len: self.text.len(),
            });
        }
        let line = self
            .line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);
        let line_start = self.line_starts[line];
        let character = byte_offset_to_utf16_offset(&self.text[line_start..], offset - line_start)
            .map_err(|_| RangeError::NotCharBoundary { offset })?;
        Ok(Position::new(line as u32, character))
    }

    /// Byte range of an editor range; start must not come after end.
    pub fn offsets(&self, range: Range) -> Result<std::ops::Range<usize>, RangeError> {
        if (range.start.line, range.start.character) > (range.end.line, range.end.character) {
            return Err(RangeError::InvertedRange {
                start_line: range.start.line,
                start_character: range.start.character,
                end_line: range.end.line,
                end_character: range.end.character,
            });
        }
        Ok(self.offset(range.start)?..self.offset(range.end)?)
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// The identifier touching `pos`, with its editor range.
///
/// A cursor just after the last character of a word still selects it.
pub fn word_at(text: &str, pos: Position) -> Option<(&str, Range)> {
    let index = LineIndex::new(text);
    let line = index.line_text(pos.line)?;
    let at = utf16_offset_to_byte_offset(line, pos.character).ok()?;

    let start = line[..at]
        .char_indices()
        .rev()
        .take_while(|&(_, c)| is_ident_char(c))
        .last()
        .map_or(at, |(i, _)| i);
    let end = line[at..]
        .char_indices()
        .find(|&(_, c)| !is_ident_char(c))
        .map_or(line.len(), |(i, _)| at + i);
    if start == end {
        return None;
    }
    let word = &line[start..end];
    if word.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    let start_char = byte_offset_to_utf16_offset(line, start).ok()?;
    let end_char = byte_offset_to_utf16_offset(line, end).ok()?;
    Some((
        word,
        Range::new(
            Position::new(pos.line, start_char),
            Position::new(pos.line, end_char),
        ),
    ))
}
