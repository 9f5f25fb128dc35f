//! Source text, parsing, and position conversion.

use crate::error::{TransformError, TransformErrorKind};
use source_map::{LineIndex, Span};
use swc_common::{sync::Lrc, FileName, SourceMap, Spanned};
use swc_ecma_ast::Module;
use swc_ecma_parser::{EsSyntax, Parser, StringInput, Syntax, TsSyntax};

/// The file being transformed.
pub(crate) struct SourceFile<'a> {
    pub name: &'a str,
    pub text: &'a str,
    /// Position of the first byte in swc's source map.
    start: u32,
    index: LineIndex,
}

impl<'a> SourceFile<'a> {
    /// Parses `text` as a module. Any syntax error, including ones the parser
    /// recovered from, fails the transform.
    pub(crate) fn parse(name: &'a str, text: &'a str) -> Result<(Self, Module), TransformError> {
        let cm: Lrc<SourceMap> = Default::default();
        let fm = cm.new_source_file(
            Lrc::new(FileName::Custom(name.to_string())),
            text.to_string(),
        );
        let file = Self {
            name,
            text,
            start: fm.start_pos.0,
            index: LineIndex::new(text),
        };

        let mut parser = Parser::new(syntax_for(name), StringInput::from(&*fm), None);
        let parsed = parser.parse_module();
        let recovered = parser.take_errors();

        let module = parsed.map_err(|err| file.parse_error(&err))?;
        if let Some(err) = recovered.first() {
            return Err(file.parse_error(err));
        }
        Ok((file, module))
    }

    /// Converts an swc span to a byte span in `text`.
    pub(crate) fn span(&self, span: swc_common::Span) -> Span {
        Span::new(
            span.lo.0.saturating_sub(self.start),
            span.hi.0.saturating_sub(self.start),
        )
    }

    pub(crate) fn slice(&self, span: Span) -> &'a str {
        span.slice(self.text).unwrap_or_default()
    }

    pub(crate) fn error(&self, kind: TransformErrorKind, span: Span) -> TransformError {
        TransformError::new(kind, span, &self.index)
    }

    fn parse_error(&self, err: &swc_ecma_parser::error::Error) -> TransformError {
        self.error(
            TransformErrorKind::Parse {
                message: err.kind().msg().into_owned(),
            },
            self.span(err.span()),
        )
    }
}

/// Picks the parser dialect from the file extension.
pub(crate) fn syntax_for(name: &str) -> Syntax {
    let extension = name.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("");
    match extension {
        "ts" | "mts" | "cts" | "tsx" => Syntax::Typescript(TsSyntax {
            tsx: extension == "tsx",
            decorators: true,
            ..Default::default()
        }),
        _ => Syntax::Es(EsSyntax {
            jsx: true,
            decorators: true,
            ..Default::default()
        }),
    }
}
