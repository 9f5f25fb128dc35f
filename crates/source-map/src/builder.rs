//! Mapping collection while generated text is being written.

use crate::v3::SourceMapV3;
use crate::{ByteOffset, LineIndex, Span};
use text_size::TextSize;

/// A single mapping from generated position to original position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mapping {
    /// The span in the generated output.
    pub generated: Span,
    /// The span in the original source.
    pub original: Span,
}

impl Mapping {
    /// Returns true when the generated text is a verbatim copy of the original.
    #[inline]
    pub fn is_verbatim(&self) -> bool {
        self.generated.len() == self.original.len()
    }
}

/// Position mappings from generated code back to original source.
#[derive(Debug, Clone, Default)]
pub struct SourceMap {
    /// Sorted by generated position.
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

    /// Returns an iterator over all mappings.
    pub fn mappings(&self) -> impl Iterator<Item = &Mapping> {
        self.mappings.iter()
    }

    /// Finds the original position corresponding to a generated position.
    ///
    /// Inside a verbatim chunk the offset is carried over; inside rewritten
    /// text every position maps to the start of the original node.
    pub fn original_position(&self, generated: ByteOffset) -> Option<ByteOffset> {
        let mapping = self.find_mapping_for_generated(generated)?;
        if !mapping.is_verbatim() {
            return Some(mapping.original.start);
        }
        let offset_in_span = u32::from(generated) - u32::from(mapping.generated.start);
        Some(mapping.original.start + TextSize::from(offset_in_span))
    }

    /// Finds the generated position corresponding to an original position.
    pub fn generated_position(&self, original: ByteOffset) -> Option<ByteOffset> {
        let mapping = self
            .mappings
            .iter()
            .find(|m| m.original.contains(original))?;
        if !mapping.is_verbatim() {
            return Some(mapping.generated.start);
        }
        let offset_in_span = u32::from(original) - u32::from(mapping.original.start);
        Some(mapping.generated.start + TextSize::from(offset_in_span))
    }

    /// Encodes this map as a Source Map v3 document.
    ///
    /// `original` and `generated` are the full texts the spans refer to.
    pub fn to_v3(
        &self,
        original: &str,
        generated: &str,
        file: &str,
        source_name: &str,
    ) -> SourceMapV3 {
        let original_index = LineIndex::new(original);
        let generated_index = LineIndex::new(generated);
        SourceMapV3::encode(
            &self.mappings,
            (original, &original_index),
            (generated, &generated_index),
            file,
            source_name,
        )
    }

    fn find_mapping_for_generated(&self, generated: ByteOffset) -> Option<&Mapping> {
        let idx = match self
            .mappings
            .binary_search_by(|m| m.generated.start.cmp(&generated))
        {
            Ok(idx) => idx,
            Err(idx) => idx.saturating_sub(1),
        };

        self.mappings
            .get(idx)
            .filter(|m| m.generated.contains(generated))
    }
}

/// Records mappings while the caller appends text to its output buffer.
///
/// The builder does not own the output; every `add_*` call must mirror text
/// the caller writes, in the same order.
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
        let len = TextSize::from(text.len() as u32);
        self.push(Span::new(original_start, original_start + len), len);
    }

    /// Adds generated text without a corresponding original position.
    pub fn add_generated(&mut self, text: &str) {
        self.generated_offset += TextSize::from(text.len() as u32);
    }

    /// Adds generated text that replaces the original span.
    pub fn add_transformed(&mut self, original: Span, generated_text: &str) {
        self.push(original, TextSize::from(generated_text.len() as u32));
    }

    fn push(&mut self, original: Span, generated_len: TextSize) {
        if generated_len == TextSize::from(0) {
            return;
        }
        let start = self.generated_offset;
        self.generated_offset += generated_len;
        self.mappings.push(Mapping {
            generated: Span::new(start, self.generated_offset),
            original,
        });
    }

    /// Builds the final source map.
    pub fn build(mut self) -> SourceMap {
        self.mappings.sort_by_key(|m| m.generated.start);
        SourceMap {
            mappings: self.mappings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_source_map() {
        let map = SourceMap::new();
        assert!(map.is_empty());
        assert_eq!(map.len(), 0);
    }

    #[test]
    fn test_builder_add_source() {
        let mut builder = SourceMapBuilder::new();
        builder.add_source(TextSize::from(0), "hello");
        builder.add_generated(" ");
        builder.add_source(TextSize::from(10), "world");

        let map = builder.build();
        assert_eq!(map.len(), 2);
        assert_eq!(
            map.original_position(TextSize::from(4)),
            Some(TextSize::from(4))
        );
        // the synthetic space has no mapping
        assert_eq!(map.original_position(TextSize::from(5)), None);
        assert_eq!(
            map.original_position(TextSize::from(6)),
            Some(TextSize::from(10))
        );
    }

    #[test]
    fn test_transformed_maps_to_node_start() {
        let mut builder = SourceMapBuilder::new();
        builder.add_source(TextSize::from(0), "x = ");
        builder.add_transformed(Span::from_usize(4, 11), "jsx(\"a\", {})");

        let map = builder.build();
        assert_eq!(
            map.original_position(TextSize::from(9)),
            Some(TextSize::from(4))
        );
        assert_eq!(
            map.generated_position(TextSize::from(6)),
            Some(TextSize::from(4))
        );
    }

    #[test]
    fn test_empty_chunks_are_skipped() {
        let mut builder = SourceMapBuilder::new();
        builder.add_source(TextSize::from(0), "");
        builder.add_transformed(Span::from_usize(0, 3), "");
        assert!(builder.build().is_empty());
    }
}
