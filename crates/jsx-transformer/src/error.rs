//! Transform error types.

use source_map::{LineIndex, Span};
use std::fmt;
use thiserror::Error;

/// A 1-based line and column in the original source.
///
/// Columns count bytes from the start of the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Location {
    /// Line number, starting at 1.
    pub line: u32,
    /// Column number, starting at 1.
    pub column: u32,
}

impl Location {
    /// Resolves the start of `span` against `index`.
    pub fn of(span: Span, index: &LineIndex) -> Self {
        index
            .line_col(span.start)
            .map(|lc| Self {
                line: lc.line + 1,
                column: lc.col + 1,
            })
            .unwrap_or(Self { line: 1, column: 1 })
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// An error that aborted a transform. No output is produced for the file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at {location}")]
pub struct TransformError {
    /// What went wrong.
    pub kind: TransformErrorKind,
    /// The offending source range.
    pub span: Span,
    /// Where `span` starts.
    pub location: Location,
}

impl TransformError {
    pub(crate) fn new(kind: TransformErrorKind, span: Span, index: &LineIndex) -> Self {
        Self {
            kind,
            span,
            location: Location::of(span, index),
        }
    }
}

/// The kind of transform error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformErrorKind {
    /// The source could not be parsed.
    #[error("syntax error: {message}")]
    Parse {
        /// The parser's description of the problem.
        message: String,
    },

    /// An `xmlns` attribute names a namespace that has no factory.
    #[error("unrecognized xmlns value \"{value}\"")]
    InvalidXmlns {
        /// The URI as written.
        value: String,
    },

    /// An `xmlns` attribute is not a string.
    #[error("xmlns attribute must be a string literal")]
    NonStringXmlns,

    /// A `key` attribute reads reactive state.
    #[error("key attribute must not be a reactive expression")]
    ReactiveKey,

    /// The source map could not be serialized.
    #[error("failed to encode source map: {message}")]
    SourceMap {
        /// The encoder's description of the problem.
        message: String,
    },
}
