//! Source location tracking
//!
//! Positions are byte offsets into one specific source text, decorated with
//! 1-based line and column numbers. Every scanner in the crate produces them,
//! and every diagnostic is located by a [`Span`] of two of them.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// A position in source text with line, column, and byte offset.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct Position {
    /// Byte offset from start of input (0-based)
    pub offset: usize,
    /// Line number (1-based)
    pub line: u32,
    /// Column number (1-based)
    pub column: u32,
}

impl Position {
    pub fn new(offset: usize, line: u32, column: u32) -> Self {
        Self {
            offset,
            line,
            column,
        }
    }

    /// Offset 0, line 1, column 1
    pub fn start() -> Self {
        Self {
            offset: 0,
            line: 1,
            column: 1,
        }
    }

    /// Advance position by one character
    pub fn advance(self, ch: char) -> Self {
        match ch {
            '\n' => Self {
                offset: self.offset + 1,
                line: self.line + 1,
                column: 1,
            },
            '\t' => Self {
                offset: self.offset + 1,
                line: self.line,
                column: self.column + 4 - ((self.column - 1) % 4),
            },
            _ => Self {
                offset: self.offset + ch.len_utf8(),
                line: self.line,
                column: self.column + 1,
            },
        }
    }

    pub fn advance_str(self, s: &str) -> Self {
        s.chars().fold(self, |pos, ch| pos.advance(ch))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A half-open span of source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    /// Start position (inclusive)
    pub start: Position,
    /// End position (exclusive)
    pub end: Position,
}

impl Span {
    pub fn new(start: Position, end: Position) -> Self {
        debug_assert!(
            start.offset <= end.offset,
            "Span start must not be after end"
        );
        Self { start, end }
    }

    /// Zero-width span at a position
    pub fn point(pos: Position) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }

    /// Merge two spans into one covering both
    pub fn merge(self, other: Self) -> Self {
        let start = if self.start.offset < other.start.offset {
            self.start
        } else {
            other.start
        };

        let end = if self.end.offset > other.end.offset {
            self.end
        } else {
            other.end
        };

        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.offset - self.start.offset
    }

    pub fn is_empty(&self) -> bool {
        self.start.offset == self.end.offset
    }

    pub fn contains_offset(&self, offset: usize) -> bool {
        offset >= self.start.offset && offset < self.end.offset
    }

    /// Get the source text for this span from the input
    pub fn slice<'a>(&self, input: &'a str) -> &'a str {
        input
            .get(self.start.offset..self.end.offset)
            .unwrap_or_default()
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start.line == self.end.line {
            write!(
                f,
                "{}:{}-{}",
                self.start.line, self.start.column, self.end.column
            )
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

/// Line-start index over one source text, used to turn raw offsets back
/// into line/column positions and to pull out whole lines for snippets.
#[derive(Debug, Clone)]
pub struct LineIndex {
    source: Arc<str>,
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(source: Arc<str>) -> Self {
        let mut line_starts = vec![0];
        for (offset, ch) in source.char_indices() {
            if ch == '\n' {
                line_starts.push(offset + 1);
            }
        }
        Self {
            source,
            line_starts,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Line and column for a byte offset; offsets past the end clamp to the end
    pub fn position_at(&self, offset: usize) -> Position {
        let mut offset = offset.min(self.source.len());
        while !self.source.is_char_boundary(offset) {
            offset -= 1;
        }

        let line = self
            .line_starts
            .binary_search(&offset)
            .unwrap_or_else(|i| i - 1);

        let line_start = self.line_starts[line];
        Position::new(line_start, (line + 1) as u32, 1)
            .advance_str(&self.source[line_start..offset])
    }

    /// Span covering two byte offsets
    pub fn span(&self, start: usize, end: usize) -> Span {
        let start = self.position_at(start);
        let end = self.position_at(end.max(start.offset));
        Span::new(start, end)
    }

    /// Byte offset where a 1-based line starts
    pub fn line_start(&self, line_num: u32) -> Option<usize> {
        if line_num == 0 {
            return None;
        }
        self.line_starts.get((line_num - 1) as usize).copied()
    }

    /// Get a line of text by line number (1-based), without its line break
    pub fn get_line(&self, line_num: u32) -> Option<&str> {
        let start = self.line_start(line_num)?;
        let end = self
            .line_starts
            .get(line_num as usize)
            .map(|next| next - 1)
            .unwrap_or(self.source.len());

        Some(self.source[start..end].trim_end_matches('\r'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_advance_tracks_lines() {
        let pos = Position::start().advance_str("ab\ncd");
        assert_eq!(pos, Position::new(5, 2, 3));
    }

    #[test]
    fn test_tab_advances_to_next_stop() {
        let pos = Position::start().advance('\t');
        assert_eq!(pos.column, 5);
        assert_eq!(pos.offset, 1);
    }

    #[test]
    fn test_line_index_positions() {
        let index = LineIndex::new(Arc::from("Shader \"S\" {\n  Pass\n}"));
        assert_eq!(index.line_count(), 3);

        let pos = index.position_at(15);
        assert_eq!((pos.line, pos.column), (2, 3));
        assert_eq!(index.get_line(2), Some("  Pass"));
        assert_eq!(index.get_line(4), None);

        // Clamped to the end of the text
        assert_eq!(index.position_at(1000).offset, 21);
    }

    #[test]
    fn test_span_display_and_merge() {
        let a = Span::new(Position::new(0, 1, 1), Position::new(3, 1, 4));
        let b = Span::new(Position::new(5, 1, 6), Position::new(7, 1, 8));
        let merged = a.merge(b);

        assert_eq!(merged.len(), 7);
        assert_eq!(merged.to_string(), "1:1-8");
        assert!(merged.contains_offset(6));
        assert!(!merged.contains_offset(7));
    }
}
