//! Source Map revision 3 serialization.

use crate::{vlq, LineCol, LineIndex, Mapping};
use serde::Serialize;
use text_size::TextSize;

/// A Source Map v3 document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMapV3 {
    /// Always `3`.
    pub version: u8,
    /// Name of the generated file.
    pub file: String,
    /// Original source names (a single entry for a transpiled file).
    pub sources: Vec<String>,
    /// Original source contents, parallel to `sources`.
    pub sources_content: Vec<String>,
    /// Symbol names; the transpiler never records any.
    pub names: Vec<String>,
    /// Base64 VLQ encoded segments.
    pub mappings: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Segment {
    generated: LineCol,
    original: LineCol,
}

impl SourceMapV3 {
    pub(crate) fn encode(
        mappings: &[Mapping],
        (original, original_index): (&str, &LineIndex),
        (generated, generated_index): (&str, &LineIndex),
        file: &str,
        source_name: &str,
    ) -> Self {
        let mut segments = Vec::with_capacity(mappings.len());

        for mapping in mappings {
            let gen_start = mapping.generated.start_usize();
            let gen_end = mapping.generated.end_usize();
            push_segment(
                &mut segments,
                mapping.generated.start,
                mapping.original.start,
                (original, original_index),
                (generated, generated_index),
            );

            if !mapping.is_verbatim() {
                continue;
            }
            // keep verbatim chunks aligned at every line they cover
            let Some(chunk) = generated.get(gen_start..gen_end) else {
                continue;
            };
            for (newline, _) in chunk.match_indices('\n') {
                let delta = newline + 1;
                if gen_start + delta >= gen_end {
                    break;
                }
                push_segment(
                    &mut segments,
                    mapping.generated.start + TextSize::from(delta as u32),
                    mapping.original.start + TextSize::from(delta as u32),
                    (original, original_index),
                    (generated, generated_index),
                );
            }
        }

        segments.sort();
        segments.dedup_by_key(|s| s.generated);

        Self {
            version: 3,
            file: file.to_string(),
            sources: vec![source_name.to_string()],
            sources_content: vec![original.to_string()],
            names: Vec::new(),
            mappings: encode_segments(&segments),
        }
    }

    /// Serializes the document to compact JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

fn push_segment(
    segments: &mut Vec<Segment>,
    generated_offset: TextSize,
    original_offset: TextSize,
    (original, original_index): (&str, &LineIndex),
    (generated, generated_index): (&str, &LineIndex),
) {
    let generated = generated_index.line_col_utf16(generated_offset, generated);
    let original = original_index.line_col_utf16(original_offset, original);
    if let (Some(generated), Some(original)) = (generated, original) {
        segments.push(Segment {
            generated,
            original,
        });
    }
}

fn encode_segments(segments: &[Segment]) -> String {
    let mut out = String::new();
    let mut line = 0u32;
    let mut prev_gen_col = 0i64;
    let mut prev_orig_line = 0i64;
    let mut prev_orig_col = 0i64;
    let mut first_in_line = true;

    for segment in segments {
        while line < segment.generated.line {
            out.push(';');
            line += 1;
            prev_gen_col = 0;
            first_in_line = true;
        }
        if !first_in_line {
            out.push(',');
        }
        first_in_line = false;

        let gen_col = i64::from(segment.generated.col);
        let orig_line = i64::from(segment.original.line);
        let orig_col = i64::from(segment.original.col);

        vlq::encode(gen_col - prev_gen_col, &mut out);
        // single source, index delta is always zero
        vlq::encode(0, &mut out);
        vlq::encode(orig_line - prev_orig_line, &mut out);
        vlq::encode(orig_col - prev_orig_col, &mut out);

        prev_gen_col = gen_col;
        prev_orig_line = orig_line;
        prev_orig_col = orig_col;
    }

    out
}
