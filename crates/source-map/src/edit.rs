//! Positional editing of the original component text.
//!
//! [`EditBuffer`] records edits against the *original* text and resolves them
//! in a single pass when [`EditBuffer::finish`] is called. Every offset handed
//! to an edit method is an original-text offset, no matter how many edits were
//! recorded before it, so independent passes never have to agree on shifted
//! coordinates.
//!
//! # Conflict policy
//!
//! Conflicting edits are rejected eagerly: the offending call returns an
//! [`EditError`] and the buffer is left unchanged. An edit conflicts when
//!
//! - it references an offset strictly inside a removed or overwritten range
//!   (inserts and move destinations),
//! - its range partially overlaps a removed, overwritten or moved range,
//! - it overwrites text that overlaps an earlier overwrite.
//!
//! Removing a range that is already removed (or that contains only removed
//! ranges) is allowed and idempotent.

use crate::{ByteOffset, SourceMap, SourceMapBuilder, Span};
use text_size::TextSize;
use thiserror::Error;

/// An edit that cannot be applied to an [`EditBuffer`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    /// An offset past the end of the original text.
    #[error("offset {offset} is out of bounds (text length is {len})")]
    OutOfBounds {
        /// The rejected offset.
        offset: u32,
        /// The original text length.
        len: u32,
    },

    /// An offset that splits a multi-byte character.
    #[error("offset {offset} is not on a character boundary")]
    NotCharBoundary {
        /// The rejected offset.
        offset: u32,
    },

    /// A range whose end precedes its start, or an empty overwrite.
    #[error("invalid range {start}..{end}")]
    InvalidRange {
        /// Range start.
        start: u32,
        /// Range end.
        end: u32,
    },

    /// A move whose destination lies inside the moved range.
    #[error("cannot move {start}..{end} to {dest}, which is inside the moved range")]
    MoveIntoSelf {
        /// Range start.
        start: u32,
        /// Range end.
        end: u32,
        /// The rejected destination.
        dest: u32,
    },

    /// An edit that overlaps an earlier edit incompatibly.
    #[error("edit at {start}..{end} conflicts with an earlier edit at {existing_start}..{existing_end}")]
    Conflict {
        /// Start of the rejected edit.
        start: u32,
        /// End of the rejected edit.
        end: u32,
        /// Start of the earlier edit.
        existing_start: u32,
        /// End of the earlier edit.
        existing_end: u32,
    },
}

impl EditError {
    fn conflict(span: Span, existing: Span) -> Self {
        EditError::Conflict {
            start: span.start.into(),
            end: span.end.into(),
            existing_start: existing.start.into(),
            existing_end: existing.end.into(),
        }
    }
}

/// The resolved output of an [`EditBuffer`].
#[derive(Debug, Clone)]
pub struct EditOutput {
    /// The edited text.
    pub code: String,
    /// Maps positions in `code` back to the original text.
    pub source_map: SourceMap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    /// Attached to the character starting at the offset.
    Before,
    /// Attached to the character ending at the offset.
    After,
}

#[derive(Debug, Clone)]
struct Insertion {
    offset: ByteOffset,
    side: Side,
    text: String,
}

#[derive(Debug, Clone)]
enum Replacement {
    Remove,
    Overwrite(String),
}

#[derive(Debug, Clone)]
struct RangeEdit {
    span: Span,
    replacement: Replacement,
}

#[derive(Debug, Clone, Copy)]
struct Move {
    span: Span,
    dest: ByteOffset,
}

/// A positionally editable view of an original source text.
///
/// ```
/// use source_map::EditBuffer;
///
/// let mut buffer = EditBuffer::new("let a = 1;");
/// buffer.overwrite(4u32, 5u32, "b").unwrap();
/// buffer.insert_before(0u32, "export ").unwrap();
/// let output = buffer.finish();
/// assert_eq!(output.code, "export let b = 1;");
/// ```
#[derive(Debug, Clone)]
pub struct EditBuffer {
    original: String,
    intro: String,
    outro: String,
    insertions: Vec<Insertion>,
    ranges: Vec<RangeEdit>,
    moves: Vec<Move>,
}

impl EditBuffer {
    /// Creates a buffer over the given original text.
    pub fn new(original: impl Into<String>) -> Self {
        Self {
            original: original.into(),
            intro: String::new(),
            outro: String::new(),
            insertions: Vec::new(),
            ranges: Vec::new(),
            moves: Vec::new(),
        }
    }

    /// Returns the original, unedited text.
    #[inline]
    pub fn original(&self) -> &str {
        &self.original
    }

    /// Returns the length of the original text.
    #[inline]
    pub fn len(&self) -> ByteOffset {
        TextSize::from(self.original.len() as u32)
    }

    /// Returns true if the original text is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.original.is_empty()
    }

    /// Returns true if no edit has been recorded yet.
    pub fn is_unchanged(&self) -> bool {
        self.intro.is_empty()
            && self.outro.is_empty()
            && self.insertions.is_empty()
            && self.ranges.is_empty()
            && self.moves.is_empty()
    }

    /// Puts `text` in front of everything, including earlier prepends.
    pub fn prepend(&mut self, text: &str) {
        self.intro.insert_str(0, text);
    }

    /// Puts `text` after everything, following earlier appends.
    pub fn append(&mut self, text: &str) {
        self.outro.push_str(text);
    }

    /// Inserts `text` immediately before the character at `offset`.
    ///
    /// The text stays attached to that character when it is moved. Several
    /// insertions at the same offset render in call order.
    pub fn insert_before(
        &mut self,
        offset: impl Into<ByteOffset>,
        text: &str,
    ) -> Result<(), EditError> {
        self.insert(offset.into(), Side::Before, text)
    }

    /// Inserts `text` immediately after the character ending at `offset`.
    ///
    /// The text stays attached to that character when it is moved. Several
    /// insertions at the same offset render in call order.
    pub fn insert_after(
        &mut self,
        offset: impl Into<ByteOffset>,
        text: &str,
    ) -> Result<(), EditError> {
        self.insert(offset.into(), Side::After, text)
    }

    fn insert(&mut self, offset: ByteOffset, side: Side, text: &str) -> Result<(), EditError> {
        self.check_offset(offset)?;
        if let Some(range) = self.ranges.iter().find(|r| r.span.contains_inner(offset)) {
            return Err(EditError::conflict(Span::empty(offset), range.span));
        }
        if !text.is_empty() {
            self.insertions.push(Insertion {
                offset,
                side,
                text: text.to_string(),
            });
        }
        Ok(())
    }

    /// Removes the half-open range `start..end`.
    pub fn remove(
        &mut self,
        start: impl Into<ByteOffset>,
        end: impl Into<ByteOffset>,
    ) -> Result<(), EditError> {
        let span = self.check_range(start.into(), end.into())?;
        if span.is_empty() {
            return Ok(());
        }

        let mut absorbed = Vec::new();
        for (idx, range) in self.ranges.iter().enumerate() {
            if !range.span.overlaps(span) {
                continue;
            }
            match range.replacement {
                Replacement::Remove if range.span.contains_span(span) => return Ok(()),
                Replacement::Remove if span.contains_span(range.span) => absorbed.push(idx),
                _ => return Err(EditError::conflict(span, range.span)),
            }
        }
        self.check_no_inner_references(span)?;
        if let Some(mv) = self.moves.iter().find(|m| crosses(m.span, span)) {
            return Err(EditError::conflict(span, mv.span));
        }

        for idx in absorbed.into_iter().rev() {
            self.ranges.remove(idx);
        }
        self.ranges.push(RangeEdit {
            span,
            replacement: Replacement::Remove,
        });
        Ok(())
    }

    /// Replaces the non-empty range `start..end` with `text`.
    ///
    /// Insertions at `start` and `end` are kept around the replacement. The
    /// generated text maps back onto the whole replaced range.
    pub fn overwrite(
        &mut self,
        start: impl Into<ByteOffset>,
        end: impl Into<ByteOffset>,
        text: &str,
    ) -> Result<(), EditError> {
        let span = self.check_range(start.into(), end.into())?;
        if span.is_empty() {
            return Err(EditError::InvalidRange {
                start: span.start.into(),
                end: span.end.into(),
            });
        }
        if let Some(range) = self.ranges.iter().find(|r| r.span.overlaps(span)) {
            return Err(EditError::conflict(span, range.span));
        }
        self.check_no_inner_references(span)?;
        if let Some(mv) = self
            .moves
            .iter()
            .find(|m| m.span.overlaps(span) && !m.span.contains_span(span))
        {
            return Err(EditError::conflict(span, mv.span));
        }

        self.ranges.push(RangeEdit {
            span,
            replacement: Replacement::Overwrite(text.to_string()),
        });
        Ok(())
    }

    /// Moves the rendered content of `start..end` (including insertions
    /// attached to it) so it appears immediately before the content at `dest`.
    ///
    /// The source map keeps pointing the moved text at its original location.
    pub fn move_range(
        &mut self,
        start: impl Into<ByteOffset>,
        end: impl Into<ByteOffset>,
        dest: impl Into<ByteOffset>,
    ) -> Result<(), EditError> {
        let span = self.check_range(start.into(), end.into())?;
        let dest = dest.into();
        self.check_offset(dest)?;
        if span.is_empty() || dest == span.start || dest == span.end {
            return Ok(());
        }
        if span.contains_inner(dest) {
            return Err(EditError::MoveIntoSelf {
                start: span.start.into(),
                end: span.end.into(),
                dest: dest.into(),
            });
        }
        if let Some(mv) = self.moves.iter().find(|m| m.span.overlaps(span)) {
            return Err(EditError::conflict(span, mv.span));
        }
        for range in &self.ranges {
            if range.span.contains_inner(dest) {
                return Err(EditError::conflict(Span::empty(dest), range.span));
            }
            if range.span.overlaps(span) && !span.contains_span(range.span) {
                return Err(EditError::conflict(span, range.span));
            }
        }

        self.moves.push(Move { span, dest });
        Ok(())
    }

    fn check_offset(&self, offset: ByteOffset) -> Result<(), EditError> {
        let value = u32::from(offset);
        if offset > self.len() {
            return Err(EditError::OutOfBounds {
                offset: value,
                len: self.len().into(),
            });
        }
        if !self.original.is_char_boundary(value as usize) {
            return Err(EditError::NotCharBoundary { offset: value });
        }
        Ok(())
    }

    fn check_range(&self, start: ByteOffset, end: ByteOffset) -> Result<Span, EditError> {
        self.check_offset(start)?;
        self.check_offset(end)?;
        if end < start {
            return Err(EditError::InvalidRange {
                start: start.into(),
                end: end.into(),
            });
        }
        Ok(Span::new(start, end))
    }

    /// Rejects a new replaced range that would swallow an insertion point or
    /// a move destination.
    fn check_no_inner_references(&self, span: Span) -> Result<(), EditError> {
        if let Some(insertion) = self
            .insertions
            .iter()
            .find(|i| span.contains_inner(i.offset))
        {
            return Err(EditError::conflict(span, Span::empty(insertion.offset)));
        }
        if let Some(mv) = self.moves.iter().find(|m| span.contains_inner(m.dest)) {
            return Err(EditError::conflict(span, Span::empty(mv.dest)));
        }
        Ok(())
    }

    /// Resolves all recorded edits into the final text and its source map.
    pub fn finish(self) -> EditOutput {
        let segments = self.segments();
        let segment_at = |offset: ByteOffset| {
            segments
                .binary_search_by(|s| s.start.cmp(&offset))
                .ok()
        };
        let segment_ending_at = |offset: ByteOffset| {
            segments
                .binary_search_by(|s| s.end.cmp(&offset))
                .ok()
        };

        let mut contents = vec![Content::Original; segments.len()];
        for range in &self.ranges {
            let mut first = true;
            for (idx, segment) in segments.iter().enumerate() {
                if !range.span.contains_span(*segment) {
                    continue;
                }
                contents[idx] = match &range.replacement {
                    Replacement::Overwrite(text) if first => Content::Replaced {
                        text: text.as_str(),
                        original: range.span,
                    },
                    _ => Content::Removed,
                };
                first = false;
            }
        }

        let mut before: Vec<Vec<&str>> = vec![Vec::new(); segments.len()];
        let mut after: Vec<Vec<&str>> = vec![Vec::new(); segments.len()];
        let mut head = Vec::new();
        let mut tail = Vec::new();
        for insertion in &self.insertions {
            let text = insertion.text.as_str();
            match insertion.side {
                Side::Before => match segment_at(insertion.offset) {
                    Some(idx) => before[idx].push(text),
                    None => tail.push(text),
                },
                Side::After => match segment_ending_at(insertion.offset) {
                    Some(idx) => after[idx].push(text),
                    None => head.push(text),
                },
            }
        }

        let mut order: Vec<usize> = (0..segments.len()).collect();
        for mv in &self.moves {
            let moved: Vec<usize> = order
                .iter()
                .copied()
                .filter(|&idx| mv.span.contains_span(segments[idx]))
                .collect();
            order.retain(|idx| !mv.span.contains_span(segments[*idx]));
            let at = segment_at(mv.dest)
                .and_then(|dest| order.iter().position(|&idx| idx == dest))
                .unwrap_or(order.len());
            let rest = order.split_off(at);
            order.extend(moved);
            order.extend(rest);
        }

        let mut out = Emitter::default();
        out.generated(&self.intro);
        head.iter().for_each(|text| out.generated(text));
        for idx in order {
            before[idx].iter().for_each(|text| out.generated(text));
            match contents[idx] {
                Content::Original => {
                    let segment = segments[idx];
                    out.source(segment.start, segment.text(&self.original));
                }
                Content::Replaced { text, original } => out.transformed(original, text),
                Content::Removed => {}
            }
            after[idx].iter().for_each(|text| out.generated(text));
        }
        tail.iter().for_each(|text| out.generated(text));
        out.generated(&self.outro);

        EditOutput {
            code: out.code,
            source_map: out.builder.build(),
        }
    }

    /// Splits the original text at every offset any edit refers to.
    fn segments(&self) -> Vec<Span> {
        let mut cuts = vec![TextSize::from(0), self.len()];
        cuts.extend(self.insertions.iter().map(|i| i.offset));
        for range in &self.ranges {
            cuts.extend([range.span.start, range.span.end]);
        }
        for mv in &self.moves {
            cuts.extend([mv.span.start, mv.span.end, mv.dest]);
        }
        cuts.sort_unstable();
        cuts.dedup();

        cuts.windows(2)
            .map(|pair| Span::new(pair[0], pair[1]))
            .filter(|span| !span.is_empty())
            .collect()
    }
}

/// True when the spans overlap without either containing the other.
fn crosses(a: Span, b: Span) -> bool {
    a.overlaps(b) && !a.contains_span(b) && !b.contains_span(a)
}

#[derive(Debug, Clone, Copy)]
enum Content<'a> {
    Original,
    Removed,
    Replaced { text: &'a str, original: Span },
}

#[derive(Default)]
struct Emitter {
    code: String,
    builder: SourceMapBuilder,
}

impl Emitter {
    fn generated(&mut self, text: &str) {
        self.code.push_str(text);
        self.builder.add_generated(text);
    }

    fn source(&mut self, start: ByteOffset, text: &str) {
        self.code.push_str(text);
        self.builder.add_source(start, text);
    }

    fn transformed(&mut self, original: Span, text: &str) {
        self.code.push_str(text);
        self.builder.add_transformed(original, text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn finish(buffer: EditBuffer) -> String {
        buffer.finish().code
    }

    #[test]
    fn test_unchanged_buffer_is_identity() {
        let buffer = EditBuffer::new("<div>hi</div>");
        assert!(buffer.is_unchanged());
        let output = buffer.finish();
        assert_eq!(output.code, "<div>hi</div>");
        assert_eq!(output.source_map.len(), 1);
    }

    #[test]
    fn test_insert_before_and_after() {
        let mut buffer = EditBuffer::new("abc");
        buffer.insert_before(1u32, "[").unwrap();
        buffer.insert_after(2u32, "]").unwrap();
        buffer.insert_before(1u32, "(").unwrap();
        assert_eq!(finish(buffer), "a[(b]c");
    }

    #[test]
    fn test_insert_after_precedes_insert_before_at_same_offset() {
        let mut buffer = EditBuffer::new("ab");
        buffer.insert_before(1u32, "B").unwrap();
        buffer.insert_after(1u32, "A").unwrap();
        assert_eq!(finish(buffer), "aABb");
    }

    #[test]
    fn test_insert_at_edges() {
        let mut buffer = EditBuffer::new("x");
        buffer.insert_after(0u32, "<").unwrap();
        buffer.insert_before(1u32, ">").unwrap();
        buffer.prepend("1");
        buffer.prepend("0");
        buffer.append("2");
        assert_eq!(finish(buffer), "01<x>2");
    }

    #[test]
    fn test_edits_on_empty_text() {
        let mut buffer = EditBuffer::new("");
        buffer.insert_before(0u32, "a").unwrap();
        buffer.append("b");
        assert_eq!(finish(buffer), "ab");
    }

    #[test]
    fn test_remove() {
        let mut buffer = EditBuffer::new("export let a;");
        buffer.remove(0u32, 7u32).unwrap();
        assert_eq!(finish(buffer), "let a;");
    }

    #[test]
    fn test_remove_is_idempotent_and_absorbs() {
        let mut buffer = EditBuffer::new("0123456789");
        buffer.remove(2u32, 4u32).unwrap();
        buffer.remove(2u32, 4u32).unwrap();
        buffer.remove(3u32, 4u32).unwrap();
        buffer.remove(1u32, 6u32).unwrap();
        assert_eq!(finish(buffer), "06789");
    }

    #[test]
    fn test_overwrite_keeps_boundary_inserts() {
        let mut buffer = EditBuffer::new("<script>x</script>");
        buffer.insert_before(0u32, "<>").unwrap();
        buffer.overwrite(0u32, 8u32, "{").unwrap();
        buffer.overwrite(9u32, 18u32, "}").unwrap();
        assert_eq!(finish(buffer), "<>{x}");
    }

    #[test]
    fn test_move_to_front() {
        let mut buffer = EditBuffer::new("<p/><script>a</script>");
        buffer.move_range(4u32, 22u32, 0u32).unwrap();
        assert_eq!(finish(buffer), "<script>a</script><p/>");
    }

    #[test]
    fn test_move_carries_edits_and_inserts() {
        let mut buffer = EditBuffer::new("<p/><s>ab</s>");
        buffer.prepend("<>");
        buffer.move_range(4u32, 13u32, 0u32).unwrap();
        buffer.overwrite(4u32, 7u32, "{").unwrap();
        buffer.overwrite(9u32, 13u32, "}").unwrap();
        buffer.insert_before(8u32, "!").unwrap();
        assert_eq!(finish(buffer), "<>{a!b}<p/>");
    }

    #[test]
    fn test_move_to_end() {
        let mut buffer = EditBuffer::new("abcdef");
        buffer.move_range(0u32, 2u32, 6u32).unwrap();
        buffer.append("!");
        assert_eq!(finish(buffer), "cdefab!");
    }

    #[test]
    fn test_move_no_op_destinations() {
        let mut buffer = EditBuffer::new("abcdef");
        buffer.move_range(2u32, 4u32, 2u32).unwrap();
        buffer.move_range(2u32, 4u32, 4u32).unwrap();
        assert!(buffer.is_unchanged());
        assert_eq!(finish(buffer), "abcdef");
    }

    #[test]
    fn test_move_into_self_is_rejected() {
        let mut buffer = EditBuffer::new("abcdef");
        assert_eq!(
            buffer.move_range(1u32, 4u32, 2u32),
            Err(EditError::MoveIntoSelf {
                start: 1,
                end: 4,
                dest: 2
            })
        );
    }

    #[test]
    fn test_insert_inside_removed_range_is_rejected() {
        let mut buffer = EditBuffer::new("abcdef");
        buffer.remove(1u32, 4u32).unwrap();
        assert!(matches!(
            buffer.insert_before(2u32, "x"),
            Err(EditError::Conflict { .. })
        ));
        // Boundaries are still addressable.
        buffer.insert_before(1u32, "[").unwrap();
        buffer.insert_after(4u32, "]").unwrap();
        assert_eq!(finish(buffer), "a[]ef");
    }

    #[test]
    fn test_remove_over_insert_is_rejected() {
        let mut buffer = EditBuffer::new("abcdef");
        buffer.insert_before(2u32, "x").unwrap();
        assert!(matches!(
            buffer.remove(1u32, 4u32),
            Err(EditError::Conflict { .. })
        ));
    }

    #[test]
    fn test_overlapping_overwrites_are_rejected() {
        let mut buffer = EditBuffer::new("abcdef");
        buffer.overwrite(1u32, 4u32, "X").unwrap();
        assert_eq!(
            buffer.overwrite(3u32, 5u32, "Y"),
            Err(EditError::Conflict {
                start: 3,
                end: 5,
                existing_start: 1,
                existing_end: 4
            })
        );
        assert!(buffer.remove(2u32, 3u32).is_err());
    }

    #[test]
    fn test_partial_overlap_with_move_is_rejected() {
        let mut buffer = EditBuffer::new("abcdefgh");
        buffer.move_range(2u32, 5u32, 0u32).unwrap();
        assert!(buffer.remove(4u32, 6u32).is_err());
        assert!(buffer.overwrite(1u32, 3u32, "X").is_err());
        buffer.remove(3u32, 4u32).unwrap();
        assert_eq!(finish(buffer), "ceabfgh");
    }

    #[test]
    fn test_invalid_offsets() {
        let mut buffer = EditBuffer::new("é");
        assert_eq!(
            buffer.insert_before(3u32, "x"),
            Err(EditError::OutOfBounds { offset: 3, len: 2 })
        );
        assert_eq!(
            buffer.insert_before(1u32, "x"),
            Err(EditError::NotCharBoundary { offset: 1 })
        );
        assert_eq!(
            buffer.remove(2u32, 0u32),
            Err(EditError::InvalidRange { start: 2, end: 0 })
        );
        assert!(buffer.overwrite(0u32, 0u32, "x").is_err());
    }

    #[test]
    fn test_source_map_follows_moved_text() {
        let source = "<p>{a}</p>\n<script>let a;</script>";
        let mut buffer = EditBuffer::new(source);
        let script_start = source.find("<script>").unwrap() as u32;
        buffer
            .move_range(script_start, source.len() as u32, 0u32)
            .unwrap();
        let output = buffer.finish();
        assert_eq!(output.code, "<script>let a;</script><p>{a}</p>\n");

        let generated = output.code.find("let a").unwrap() as u32;
        let original = source.find("let a").unwrap() as u32;
        assert_eq!(
            output.source_map.original_position(generated.into()),
            Some(original.into())
        );
        assert_eq!(
            output.source_map.generated_position(original.into()),
            Some(generated.into())
        );
        assert_eq!(
            output.source_map.original_position(TextSize::from(23)),
            Some(TextSize::from(0))
        );
    }

    #[test]
    fn test_removed_offsets_have_no_generated_position() {
        let mut buffer = EditBuffer::new("export let a;");
        buffer.remove(0u32, 7u32).unwrap();
        let map = buffer.finish().source_map;
        assert_eq!(map.generated_position(TextSize::from(3)), None);
        assert_eq!(
            map.generated_position(TextSize::from(7)),
            Some(TextSize::from(0))
        );
    }

    #[test]
    fn test_unmoved_offsets_map_monotonically() {
        let source = "let a = 1;\n$: b = a;\nexport let c;";
        let mut buffer = EditBuffer::new(source);
        buffer.remove(21u32, 28u32).unwrap();
        buffer.insert_before(11u32, ";let b; ").unwrap();
        buffer.prepend("function render() {\n");
        buffer.append("\n}");
        let map = buffer.finish().source_map;

        let removed = Span::new(21u32, 28u32);
        let mut previous = None;
        for offset in 0..source.len() as u32 {
            let offset = TextSize::from(offset);
            if removed.contains(offset) {
                assert_eq!(map.generated_position(offset), None);
                continue;
            }
            let generated = map.generated_position(offset).unwrap();
            if let Some(previous) = previous {
                assert!(generated > previous);
            }
            previous = Some(generated);
        }
    }
}
