//! Offset mapping table between generated output and original source.

use crate::{ByteOffset, Span};
use text_size::TextSize;

/// A single mapping from a generated span to an original span.
///
/// Verbatim copies have spans of equal length. Rewritten text (an overwrite)
/// maps a generated span of any length onto the original span it replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Mapping {
    /// The span in the generated output.
    pub generated: Span,
    /// The span in the original source.
    pub original: Span,
}

impl Mapping {
    /// Returns true if generated and original text have the same length.
    #[inline]
    pub fn is_verbatim(&self) -> bool {
        self.generated.len() == self.original.len()
    }
}

/// Maps positions in generated code back to the original Svelte source and
/// vice versa.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SourceMap {
    /// Mappings sorted by generated position. Generated spans never overlap.
    mappings: Vec<Mapping>,
}

impl SourceMap {
    /// Creates a new empty source map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a source map builder.
    pub fn builder() -> SourceMapBuilder {
        SourceMapBuilder::new()
    }

    /// Returns the number of mappings in this source map.
    #[inline]
    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    /// Returns true if this source map has no mappings.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// Returns an iterator over all mappings, in generated order.
    pub fn mappings(&self) -> impl Iterator<Item = &Mapping> {
        self.mappings.iter()
    }

    /// Finds the original position corresponding to a generated position.
    ///
    /// Returns `None` for synthesized text that has no original counterpart.
    pub fn original_position(&self, generated: ByteOffset) -> Option<ByteOffset> {
        let mapping = self.find_mapping_for_generated(generated)?;
        let offset_in_span = generated - mapping.generated.start;
        Some(mapping.original.start + offset_in_span.min(last_index(mapping.original)))
    }

    /// Finds the generated position corresponding to an original position.
    ///
    /// Returns `None` if the original byte was removed from the output.
    pub fn generated_position(&self, original: ByteOffset) -> Option<ByteOffset> {
        // Mappings are ordered by generated position, so a moved block may
        // appear before text that precedes it in the original.
        let mapping = self
            .mappings
            .iter()
            .find(|m| m.original.contains(original))?;
        let offset_in_span = original - mapping.original.start;
        Some(mapping.generated.start + offset_in_span.min(last_index(mapping.generated)))
    }

    /// Finds the mapping that contains the given generated position.
    fn find_mapping_for_generated(&self, generated: ByteOffset) -> Option<&Mapping> {
        let idx = match self
            .mappings
            .binary_search_by(|m| m.generated.start.cmp(&generated))
        {
            Ok(idx) => idx,
            Err(idx) => idx.checked_sub(1)?,
        };

        self.mappings
            .get(idx)
            .filter(|m| m.generated.contains(generated))
    }
}

/// The offset of the last byte of a non-empty span, relative to its start.
fn last_index(span: Span) -> TextSize {
    span.len().checked_sub(TextSize::from(1)).unwrap_or_default()
}

/// Accumulates mappings while generated text is emitted front to back.
#[derive(Debug, Default)]
pub struct SourceMapBuilder {
    mappings: Vec<Mapping>,
    /// Current position in the generated output.
    generated_offset: ByteOffset,
}

impl SourceMapBuilder {
    /// Creates a new source map builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current generated offset.
    #[inline]
    pub fn generated_offset(&self) -> ByteOffset {
        self.generated_offset
    }

    /// Adds verbatim source text, creating a 1:1 mapping.
    pub fn add_source(&mut self, original_start: ByteOffset, text: &str) {
        if text.is_empty() {
            return;
        }
        let len = TextSize::from(text.len() as u32);
        let original = Span::new(original_start, original_start + len);
        self.add_transformed(original, text);
    }

    /// Adds generated text without a corresponding original position.
    pub fn add_generated(&mut self, text: &str) {
        self.generated_offset += TextSize::from(text.len() as u32);
    }

    /// Adds text that replaces `original`, mapping the whole generated text
    /// back onto the replaced span even when the lengths differ.
    pub fn add_transformed(&mut self, original: Span, generated_text: &str) {
        let gen_len = TextSize::from(generated_text.len() as u32);
        if gen_len == TextSize::from(0) {
            return;
        }
        let generated = Span::new(self.generated_offset, self.generated_offset + gen_len);

        // Merge with the previous mapping when both sides continue it.
        if let Some(last) = self.mappings.last_mut() {
            if last.is_verbatim()
                && original.len() == gen_len
                && last.generated.end == generated.start
                && last.original.end == original.start
            {
                last.generated.end = generated.end;
                last.original.end = original.end;
                self.generated_offset = generated.end;
                return;
            }
        }

        self.mappings.push(Mapping {
            generated,
            original,
        });
        self.generated_offset = generated.end;
    }

    /// Builds the final source map.
    pub fn build(mut self) -> SourceMap {
        self.mappings.sort_by_key(|m| m.generated.start);
        SourceMap {
            mappings: self.mappings,
        }
    }
}
