//! Offset ↔ line/column conversion.

use crate::ByteOffset;
use text_size::TextSize;

/// A line and column position (0-indexed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct LineCol {
    /// 0-indexed line number.
    pub line: u32,
    /// 0-indexed column.
    pub col: u32,
}

impl LineCol {
    /// Creates a new line/column position.
    #[inline]
    pub fn new(line: u32, col: u32) -> Self {
        Self { line, col }
    }
}

/// Line start table for a piece of text.
///
/// Byte columns are used for diagnostics; source maps count columns in UTF-16
/// code units, so [`LineIndex::line_col_utf16`] converts on demand.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// `line_starts[i]` is the byte offset where line `i` begins.
    line_starts: Vec<ByteOffset>,
}

impl LineIndex {
    /// Creates a new line index from source text.
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![TextSize::from(0)];
        line_starts.extend(
            text.match_indices('\n')
                .map(|(offset, _)| TextSize::from((offset + 1) as u32)),
        );
        Self { line_starts }
    }

    /// Returns the number of lines in the source.
    #[inline]
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Converts a byte offset to a line and byte column.
    pub fn line_col(&self, offset: ByteOffset) -> Option<LineCol> {
        let line = self.line_of(offset)?;
        let col = u32::from(offset) - u32::from(self.line_starts[line]);
        Some(LineCol::new(line as u32, col))
    }

    /// Converts a byte offset to a line and UTF-16 column.
    ///
    /// Returns `None` when the offset lies outside `text` or inside a
    /// multi-byte character.
    pub fn line_col_utf16(&self, offset: ByteOffset, text: &str) -> Option<LineCol> {
        let line = self.line_of(offset)?;
        let start = u32::from(self.line_starts[line]) as usize;
        let prefix = text.get(start..u32::from(offset) as usize)?;
        let col = prefix.chars().map(char::len_utf16).sum::<usize>();
        Some(LineCol::new(line as u32, col as u32))
    }

    /// Converts a line/column position to a byte offset.
    pub fn offset(&self, line_col: LineCol) -> Option<ByteOffset> {
        let line_start = *self.line_starts.get(line_col.line as usize)?;
        Some(line_start + TextSize::from(line_col.col))
    }

    /// Returns the byte offset where a line starts.
    pub fn line_start(&self, line: u32) -> Option<ByteOffset> {
        self.line_starts.get(line as usize).copied()
    }

    fn line_of(&self, offset: ByteOffset) -> Option<usize> {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(line) => line.checked_sub(1)?,
        };
        Some(line)
    }
}
