//! Offset ↔ line/column conversion, used when reporting positions to users.

use crate::ByteOffset;
use std::fmt;
use text_size::TextSize;

/// A line and column position (0-indexed, column in bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LineCol {
    /// 0-indexed line number.
    pub line: u32,
    /// 0-indexed byte column within the line.
    pub col: u32,
}

impl LineCol {
    /// Creates a new line/column position.
    #[inline]
    pub fn new(line: u32, col: u32) -> Self {
        Self { line, col }
    }
}

/// Displays as the 1-indexed `line:column` pair editors expect.
impl fmt::Display for LineCol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line + 1, self.col + 1)
    }
}

/// Start offsets of every line of a text, for O(log n) lookups.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// `line_starts[i]` is the offset where line `i` begins.
    line_starts: Vec<ByteOffset>,
    len: ByteOffset,
}

impl LineIndex {
    /// Creates a new line index from source text.
    pub fn new(text: &str) -> Self {
        let line_starts = std::iter::once(TextSize::from(0))
            .chain(
                text.match_indices('\n')
                    .map(|(offset, _)| TextSize::from(offset as u32 + 1)),
            )
            .collect();

        Self {
            line_starts,
            len: TextSize::from(text.len() as u32),
        }
    }

    /// Returns the number of lines in the source.
    #[inline]
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Converts a byte offset to a line/column position.
    ///
    /// Returns `None` if the offset is past the end of the text.
    pub fn line_col(&self, offset: ByteOffset) -> Option<LineCol> {
        if offset > self.len {
            return None;
        }
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(line) => line - 1,
        };
        let col = offset - self.line_starts[line];

        Some(LineCol::new(line as u32, col.into()))
    }

    /// Converts a line/column position back to a byte offset.
    ///
    /// Returns `None` if the line does not exist.
    pub fn offset(&self, line_col: LineCol) -> Option<ByteOffset> {
        let start = self.line_starts.get(line_col.line as usize)?;
        Some(*start + TextSize::from(line_col.col))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_col_across_lines() {
        let index = LineIndex::new("<script>\n\tlet a;\n</script>");
        assert_eq!(index.line_count(), 3);
        assert_eq!(index.line_col(TextSize::from(0)), Some(LineCol::new(0, 0)));
        assert_eq!(index.line_col(TextSize::from(8)), Some(LineCol::new(0, 8)));
        assert_eq!(index.line_col(TextSize::from(9)), Some(LineCol::new(1, 0)));
        assert_eq!(index.line_col(TextSize::from(13)), Some(LineCol::new(1, 4)));
        assert_eq!(index.line_col(TextSize::from(99)), None);
    }

    #[test]
    fn test_offset_roundtrip() {
        let text = "a\nbc\n\ndef";
        let index = LineIndex::new(text);
        for offset in 0..=text.len() as u32 {
            let offset = TextSize::from(offset);
            let line_col = index.line_col(offset).unwrap();
            assert_eq!(index.offset(line_col), Some(offset));
        }
    }

    #[test]
    fn test_display_is_one_indexed() {
        assert_eq!(LineCol::new(0, 0).to_string(), "1:1");
        assert_eq!(LineCol::new(4, 2).to_string(), "5:3");
    }
}
