//! Source position tracking and text editing for weapp-pack.
//!
//! This crate provides byte spans into markup sources, a line index for
//! turning offsets into human-readable positions, and an edit buffer that
//! applies non-overlapping replacements in ascending offset order.

use std::ops::Range;

/// A span in the source code, representing a half-open range [start, end).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Span {
    /// Start offset (inclusive)
    pub start: u32,
    /// End offset (exclusive)
    pub end: u32,
}

impl Span {
    /// Create a new span from start and end offsets.
    #[inline]
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Create a span from `usize` offsets as produced by a byte cursor.
    #[inline]
    pub fn from_offsets(start: usize, end: usize) -> Self {
        Self {
            start: start as u32,
            end: end as u32,
        }
    }

    /// Get the length of the span.
    #[inline]
    pub const fn len(&self) -> u32 {
        self.end - self.start
    }

    /// Check if the span is empty.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Check if this span contains another span.
    #[inline]
    pub const fn contains(&self, other: Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Check if this span contains an offset.
    #[inline]
    pub const fn contains_offset(&self, offset: u32) -> bool {
        self.start <= offset && offset < self.end
    }

    /// Convert to a Range<usize>.
    #[inline]
    pub fn to_range(self) -> Range<usize> {
        self.start as usize..self.end as usize
    }

    /// Slice `source` with this span.
    ///
    /// Returns `None` when the span does not fall on valid boundaries of
    /// `source`, which only happens if the span came from a different string.
    #[inline]
    pub fn slice(self, source: &str) -> Option<&str> {
        source.get(self.to_range())
    }
}

impl From<Range<usize>> for Span {
    fn from(range: Range<usize>) -> Self {
        Self::from_offsets(range.start, range.end)
    }
}

impl From<Span> for Range<usize> {
    fn from(span: Span) -> Self {
        span.to_range()
    }
}

/// A line index for converting byte offsets to line/column positions.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Byte offsets of the start of each line.
    line_starts: Vec<u32>,
    /// Total length of the source.
    len: u32,
}

impl LineIndex {
    /// Create a new line index from source text.
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            text.bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(i, _)| (i + 1) as u32),
        );
        Self {
            line_starts,
            len: text.len() as u32,
        }
    }

    /// Get the 0-indexed line and column for a byte offset.
    ///
    /// Offsets past the end are clamped to the end of the source.
    pub fn line_col(&self, offset: u32) -> LineCol {
        let offset = offset.min(self.len);
        let line = self
            .line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);
        LineCol {
            line: line as u32,
            col: offset - self.line_starts[line],
        }
    }

    /// Get the number of lines.
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

/// A line and column position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LineCol {
    /// 0-indexed line number.
    pub line: u32,
    /// 0-indexed column (byte offset within line).
    pub col: u32,
}

impl LineCol {
    /// Create a new line/column position.
    #[inline]
    pub const fn new(line: u32, col: u32) -> Self {
        Self { line, col }
    }

    /// Convert to 1-indexed for display.
    #[inline]
    pub const fn to_display(self) -> (u32, u32) {
        (self.line + 1, self.col + 1)
    }
}

impl std::fmt::Display for LineCol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (line, col) = self.to_display();
        write!(f, "{}:{}", line, col)
    }
}

/// A single replacement of a source span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    /// The replaced span in the original source.
    pub span: Span,
    /// Replacement text; empty for a deletion.
    pub text: String,
}

/// Collects edits against one source string and applies them in a single
/// ascending pass.
///
/// Edits may be pushed in any order. An edit whose span starts inside a
/// span already consumed by an earlier (outer) edit is dropped, so a removal
/// range swallows every edit nested inside it.
#[derive(Debug)]
pub struct EditBuffer<'a> {
    source: &'a str,
    edits: Vec<TextEdit>,
}

impl<'a> EditBuffer<'a> {
    /// Create an empty buffer for `source`.
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            edits: Vec::new(),
        }
    }

    /// Replace `span` with `text`.
    pub fn replace(&mut self, span: Span, text: impl Into<String>) {
        self.edits.push(TextEdit {
            span,
            text: text.into(),
        });
    }

    /// Delete `span`.
    pub fn remove(&mut self, span: Span) {
        self.replace(span, String::new());
    }

    /// Number of pending edits.
    pub fn len(&self) -> usize {
        self.edits.len()
    }

    /// Check whether no edits are pending.
    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Apply all edits and return the rewritten text.
    pub fn apply(mut self) -> String {
        if self.edits.is_empty() {
            return self.source.to_string();
        }
        // Outer spans sort before the spans they contain.
        self.edits
            .sort_by(|a, b| a.span.start.cmp(&b.span.start).then(b.span.end.cmp(&a.span.end)));

        let mut out = String::with_capacity(self.source.len());
        let mut cursor = 0usize;
        for edit in &self.edits {
            let range = edit.span.to_range();
            if range.start < cursor || range.end > self.source.len() {
                continue;
            }
            out.push_str(&self.source[cursor..range.start]);
            out.push_str(&edit.text);
            cursor = range.end;
        }
        out.push_str(&self.source[cursor..]);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_span() {
        let span = Span::new(10, 20);
        assert_eq!(span.len(), 10);
        assert!(!span.is_empty());
        assert!(span.contains_offset(15));
        assert!(!span.contains_offset(20));
        assert!(span.contains(Span::new(12, 18)));
        assert!(!span.contains(Span::new(12, 21)));
    }

    #[test]
    fn test_span_slice() {
        let source = "<view>hi</view>";
        assert_eq!(Span::new(1, 5).slice(source), Some("view"));
        assert_eq!(Span::new(1, 99).slice(source), None);
    }

    #[test]
    fn test_line_index() {
        let index = LineIndex::new("hello\nworld\nfoo");
        assert_eq!(index.line_count(), 3);
        assert_eq!(index.line_col(0), LineCol::new(0, 0));
        assert_eq!(index.line_col(6), LineCol::new(1, 0));
        assert_eq!(index.line_col(13), LineCol::new(2, 1));
        assert_eq!(index.line_col(500), LineCol::new(2, 3));
        assert_eq!(index.line_col(6).to_string(), "2:1");
    }

    #[test]
    fn test_edit_buffer_applies_in_order() {
        let source = "a-b-c";
        let mut buffer = EditBuffer::new(source);
        buffer.replace(Span::new(4, 5), "C");
        buffer.replace(Span::new(0, 1), "A");
        assert_eq!(buffer.apply(), "A-b-C");
    }

    #[test]
    fn test_edit_buffer_drops_nested_edits() {
        let source = "keep [drop (inner) drop] keep";
        let mut buffer = EditBuffer::new(source);
        buffer.replace(Span::new(12, 17), "X");
        buffer.remove(Span::new(5, 24));
        assert_eq!(buffer.apply(), "keep  keep");
    }

    #[test]
    fn test_edit_buffer_same_start_prefers_outer() {
        let source = "0123456789";
        let mut buffer = EditBuffer::new(source);
        buffer.remove(Span::new(2, 4));
        buffer.remove(Span::new(2, 8));
        assert_eq!(buffer.apply(), "0189");
    }
}
