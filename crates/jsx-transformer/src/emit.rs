//! Output assembly: splicing generated text into the source and building
//! the source map.

use crate::error::{TransformError, TransformErrorKind};
use crate::input::SourceFile;
use crate::TranspileOptions;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use source_map::{ByteOffset, SourceMap, SourceMapBuilder, Span};

/// A run of output text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Piece {
    /// Source text copied verbatim.
    Source(Span),
    /// Generated text standing in for `origin`.
    Generated { text: String, origin: Span },
}

/// Output text in order, before it is materialized.
#[derive(Debug, Default)]
pub(crate) struct Pieces(Vec<Piece>);

impl Pieces {
    pub(crate) fn source(&mut self, span: Span) {
        if span.is_empty() {
            return;
        }
        if let Some(Piece::Source(last)) = self.0.last_mut() {
            if last.end == span.start {
                last.end = span.end;
                return;
            }
        }
        self.0.push(Piece::Source(span));
    }

    pub(crate) fn text(&mut self, text: &str, origin: Span) {
        if text.is_empty() {
            return;
        }
        if let Some(Piece::Generated {
            text: last,
            origin: last_origin,
        }) = self.0.last_mut()
        {
            if *last_origin == origin {
                last.push_str(text);
                return;
            }
        }
        self.0.push(Piece::Generated {
            text: text.to_string(),
            origin,
        });
    }

    pub(crate) fn append(&mut self, other: Pieces) {
        for piece in other.0 {
            match piece {
                Piece::Source(span) => self.source(span),
                Piece::Generated { text, origin } => self.text(&text, origin),
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn as_slice(&self) -> &[Piece] {
        &self.0
    }
}

/// A replacement of a source range, or an insertion when `span` is empty.
#[derive(Debug)]
pub(crate) struct Edit {
    span: Span,
    /// Insertions sort before replacements starting at the same offset.
    order: u8,
    pieces: Pieces,
}

impl Edit {
    pub(crate) fn replace(span: Span, pieces: Pieces) -> Self {
        Self {
            span,
            order: 1,
            pieces,
        }
    }

    pub(crate) fn replace_text(span: Span, text: &str) -> Self {
        let mut pieces = Pieces::default();
        pieces.text(text, span);
        Self::replace(span, pieces)
    }

    pub(crate) fn insert(offset: ByteOffset, text: &str) -> Self {
        let span = Span::empty(offset);
        let mut pieces = Pieces::default();
        pieces.text(text, span);
        Self {
            span,
            order: 0,
            pieces,
        }
    }

    pub(crate) fn span(&self) -> Span {
        self.span
    }
}

/// Copies `range` from the source, substituting `edits`.
///
/// Edits must lie within `range`. An edit that starts inside an earlier one
/// is dropped.
pub(crate) fn splice(range: Span, mut edits: Vec<Edit>) -> Pieces {
    edits.sort_by_key(|edit| (edit.span.start, edit.order));
    let mut out = Pieces::default();
    let mut cursor = range.start;
    for edit in edits {
        if edit.span.start < cursor {
            continue;
        }
        out.source(Span::new(cursor, edit.span.start));
        out.append(edit.pieces);
        cursor = edit.span.end;
    }
    out.source(Span::new(cursor, range.end));
    out
}

/// Formatting of generated text.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Style {
    pub compact: bool,
    pub minified: bool,
}

impl Style {
    pub(crate) fn from_options(options: &TranspileOptions) -> Self {
        Self {
            compact: options.compact || options.minified,
            minified: options.minified,
        }
    }

    pub(crate) fn comma(self) -> &'static str {
        if self.compact {
            ","
        } else {
            ", "
        }
    }

    pub(crate) fn colon(self) -> &'static str {
        if self.compact {
            ":"
        } else {
            ": "
        }
    }

    pub(crate) fn arrow(self) -> &'static str {
        if self.compact {
            "()=>"
        } else {
            "() => "
        }
    }

    pub(crate) fn open_object(self) -> &'static str {
        if self.compact {
            "{"
        } else {
            "{ "
        }
    }

    pub(crate) fn close_object(self) -> &'static str {
        if self.compact {
            "}"
        } else {
            " }"
        }
    }

    /// Text before and after the returned expression of a getter.
    pub(crate) fn getter(self, key: &str) -> (String, &'static str) {
        if self.compact {
            (format!("get {key}(){{return "), ";}")
        } else {
            (format!("get {key}() {{ return "), "; }")
        }
    }

    pub(crate) fn import_declaration(self, names: &[&str], module: &str) -> String {
        let module = crate::text::quote(module);
        if self.minified {
            format!("import{{{}}}from{module};", names.join(","))
        } else {
            format!("import {{ {} }} from {module};\n", names.join(", "))
        }
    }
}

/// The result of a successful transform.
#[derive(Debug, Clone)]
pub struct TranspileOutput {
    /// The generated code.
    pub code: String,
    /// Source Map v3 JSON, when requested.
    pub map: Option<String>,
    /// Generated-to-original position mappings.
    pub source_map: SourceMap,
}

impl TranspileOutput {
    /// Returns the code with the map appended as a base64 data URL comment.
    ///
    /// Without a map the code is returned unchanged.
    pub fn code_with_inline_map(&self) -> String {
        let Some(map) = &self.map else {
            return self.code.clone();
        };
        let separator = if self.code.ends_with('\n') { "" } else { "\n" };
        format!(
            "{}{separator}//# sourceMappingURL=data:application/json;charset=utf-8;base64,{}\n",
            self.code,
            STANDARD.encode(map)
        )
    }
}

/// Materializes `pieces` into code and, if requested, a Source Map v3.
pub(crate) fn render(
    file: &SourceFile<'_>,
    pieces: Pieces,
    options: &TranspileOptions,
) -> Result<TranspileOutput, TransformError> {
    let mut code = String::with_capacity(file.text.len() + file.text.len() / 4);
    let mut builder = SourceMapBuilder::new();
    for piece in pieces.0 {
        match piece {
            Piece::Source(span) => {
                let text = file.slice(span);
                builder.add_source(span.start, text);
                code.push_str(text);
            }
            Piece::Generated { text, origin } => {
                builder.add_transformed(origin, &text);
                code.push_str(&text);
            }
        }
    }
    let source_map = builder.build();

    let map = if options.source_maps {
        let v3 = source_map.to_v3(file.text, &code, &options.output_file_name(), file.name);
        let json = v3.to_json().map_err(|err| {
            file.error(
                TransformErrorKind::SourceMap {
                    message: err.to_string(),
                },
                Span::default(),
            )
        })?;
        Some(json)
    } else {
        None
    };

    Ok(TranspileOutput {
        code,
        map,
        source_map,
    })
}
