//! Byte offsets and half-open spans into the original component text.

use text_size::{TextRange, TextSize};

/// A byte offset into a source string.
pub type ByteOffset = TextSize;

/// A half-open byte range `[start, end)` in source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Span {
    /// The start byte offset (inclusive).
    pub start: ByteOffset,
    /// The end byte offset (exclusive).
    pub end: ByteOffset,
}

impl Span {
    /// Creates a new span from start and end byte offsets.
    #[inline]
    pub fn new(start: impl Into<ByteOffset>, end: impl Into<ByteOffset>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }

    /// Creates a span from `usize` offsets, as produced by `str` searches.
    #[inline]
    pub fn from_usize(start: usize, end: usize) -> Self {
        Self::new(start as u32, end as u32)
    }

    /// Creates an empty span at the given offset.
    #[inline]
    pub fn empty(offset: impl Into<ByteOffset>) -> Self {
        let offset = offset.into();
        Self {
            start: offset,
            end: offset,
        }
    }

    /// Returns the length of this span in bytes.
    #[inline]
    pub fn len(&self) -> TextSize {
        self.end - self.start
    }

    /// Returns true if this span is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Returns true if this span contains the given offset.
    #[inline]
    pub fn contains(&self, offset: ByteOffset) -> bool {
        self.start <= offset && offset < self.end
    }

    /// Returns true if the offset lies strictly between `start` and `end`.
    #[inline]
    pub fn contains_inner(&self, offset: ByteOffset) -> bool {
        self.start < offset && offset < self.end
    }

    /// Returns true if this span contains the given span entirely.
    #[inline]
    pub fn contains_span(&self, other: Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Returns true if the two spans share at least one byte.
    #[inline]
    pub fn overlaps(&self, other: Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Returns this span moved forward by `delta` bytes.
    ///
    /// Used to lift spans that are relative to an embedded block (such as the
    /// script content) into document coordinates.
    #[inline]
    pub fn shifted(self, delta: impl Into<ByteOffset>) -> Span {
        let delta = delta.into();
        Span {
            start: self.start + delta,
            end: self.end + delta,
        }
    }

    /// Returns the text this span covers in `source`.
    ///
    /// Panics if the span is out of bounds, like slice indexing.
    #[inline]
    pub fn text(self, source: &str) -> &str {
        &source[self.start_usize()..self.end_usize()]
    }

    /// The start offset as `usize`.
    #[inline]
    pub fn start_usize(&self) -> usize {
        u32::from(self.start) as usize
    }

    /// The end offset as `usize`.
    #[inline]
    pub fn end_usize(&self) -> usize {
        u32::from(self.end) as usize
    }
}

impl From<TextRange> for Span {
    fn from(range: TextRange) -> Self {
        Self {
            start: range.start(),
            end: range.end(),
        }
    }
}

impl From<Span> for TextRange {
    fn from(span: Span) -> Self {
        TextRange::new(span.start, span.end)
    }
}
