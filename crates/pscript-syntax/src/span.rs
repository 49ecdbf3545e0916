//! Source positions as reported by the front end.
//!
//! Lines and columns are 1-based. Columns count UTF-16 code units so that
//! editor positions are a plain ±1 away.

use std::fmt;

/// A 1-based (line, column) position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pos {
    pub line: u32,
    pub col: u32,
}

impl Pos {
    pub const fn new(line: u32, col: u32) -> Self {
        Self { line, col }
    }

    /// Line 0 or column 0 never comes out of the parser; such positions mark
    /// synthesized nodes.
    pub fn is_valid(&self) -> bool {
        self.line > 0 && self.col > 0
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

/// Half-open source range, `end` points just past the last character.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: Pos,
    pub end: Pos,
}

impl Span {
    pub const fn new(start: Pos, end: Pos) -> Self {
        Self { start, end }
    }

    pub fn is_valid(&self) -> bool {
        self.start.is_valid() && self.end.is_valid() && self.start <= self.end
    }

    /// Whether `pos` lies inside the span, both ends inclusive.
    ///
    /// The end is inclusive so a cursor placed right after the last
    /// character still counts as inside.
    pub fn contains(&self, pos: Pos) -> bool {
        self.start <= pos && pos <= self.end
    }

    pub fn encloses(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Ordering key: a span with fewer lines, then fewer columns, is smaller.
    pub fn extent(&self) -> (u32, u32) {
        let lines = self.end.line.saturating_sub(self.start.line);
        let cols = if lines == 0 {
            self.end.col.saturating_sub(self.start.col)
        } else {
            self.end.col
        };
        (lines, cols)
    }

    pub fn to(self, other: Span) -> Span {
        Span::new(self.start, other.end)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Maps byte offsets of a source text onto [`Pos`].
pub(crate) struct LineMap<'src> {
    source: &'src str,
    line_starts: Vec<usize>,
}

impl<'src> LineMap<'src> {
    pub(crate) fn new(source: &'src str) -> Self {
        let mut line_starts = vec![0];
        for (i, b) in source.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Self {
            source,
            line_starts,
        }
    }

    pub(crate) fn pos(&self, offset: usize) -> Pos {
        let offset = offset.min(self.source.len());
        let line = self
            .line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);
        let line_start = self.line_starts[line];
        let col: usize = self.source[line_start..offset]
            .chars()
            .map(char::len_utf16)
            .sum();
        Pos::new(line as u32 + 1, col as u32 + 1)
    }

    pub(crate) fn span(&self, range: std::ops::Range<usize>) -> Span {
        Span::new(self.pos(range.start), self.pos(range.end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_map_counts_utf16_columns() {
        let map = LineMap::new("a😀b\nxy");
        assert_eq!(map.pos(0), Pos::new(1, 1));
        assert_eq!(map.pos(1), Pos::new(1, 2));
        // The emoji is four bytes and two UTF-16 units.
        assert_eq!(map.pos(5), Pos::new(1, 4));
        assert_eq!(map.pos(7), Pos::new(2, 1));
        assert_eq!(map.pos(9), Pos::new(2, 3));
    }

    #[test]
    fn test_span_contains_is_inclusive() {
        let span = Span::new(Pos::new(2, 3), Pos::new(4, 1));
        assert!(span.contains(Pos::new(2, 3)));
        assert!(span.contains(Pos::new(3, 100)));
        assert!(span.contains(Pos::new(4, 1)));
        assert!(!span.contains(Pos::new(4, 2)));
        assert!(!span.contains(Pos::new(1, 9)));
    }

    #[test]
    fn test_extent_orders_nested_spans() {
        let outer = Span::new(Pos::new(1, 1), Pos::new(10, 4));
        let inner = Span::new(Pos::new(3, 1), Pos::new(5, 4));
        assert!(inner.extent() < outer.extent());
    }
}
