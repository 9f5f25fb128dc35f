//! Output formatting.

use crate::cli::OutputFormat;
use camino::Utf8Path;
use jsx_transformer::{TransformError, TransformErrorKind};
use serde::Serialize;
use source_map::{LineCol, LineIndex};

/// A formatted error for output.
#[derive(Debug, Serialize)]
pub struct FormattedError {
    /// The file path.
    pub filename: String,
    /// The start position.
    pub start: Position,
    /// The end position.
    pub end: Position,
    /// The message.
    pub message: String,
    /// The error code.
    pub code: String,
}

/// A position in the source.
#[derive(Debug, Serialize)]
pub struct Position {
    /// 1-indexed line number.
    pub line: u32,
    /// 1-indexed column number.
    pub column: u32,
    /// Byte offset.
    pub offset: u32,
}

/// Stable code for each error kind.
pub fn error_code(kind: &TransformErrorKind) -> &'static str {
    match kind {
        TransformErrorKind::Parse { .. } => "parse-error",
        TransformErrorKind::InvalidXmlns { .. } => "invalid-xmlns",
        TransformErrorKind::NonStringXmlns => "non-string-xmlns",
        TransformErrorKind::ReactiveKey => "reactive-key",
        TransformErrorKind::SourceMap { .. } => "source-map",
    }
}

/// Formats transform errors for output.
pub struct Formatter {
    format: OutputFormat,
}

impl Formatter {
    /// Creates a new formatter.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats one file's error.
    pub fn format(&self, error: &TransformError, file_path: &Utf8Path, source: &str) -> String {
        match self.format {
            OutputFormat::Human => Self::format_human(error, file_path, source),
            OutputFormat::Json => {
                serde_json::to_string_pretty(&Self::format_json_error(error, file_path, source))
                    .unwrap_or_default()
            }
        }
    }

    /// Formats as human-readable output with a code snippet.
    fn format_human(error: &TransformError, file_path: &Utf8Path, source: &str) -> String {
        let mut output = format!(
            "{}:{}:{}\nError: {} ({})\n",
            file_path,
            error.location.line,
            error.location.column,
            error.kind,
            error_code(&error.kind)
        );

        let line_num = error.location.line.saturating_sub(1) as usize;
        if let Some(line) = source.lines().nth(line_num) {
            let gutter = (line_num + 1).to_string();
            output.push_str(&format!("  {} | {}\n", gutter, line));
            let padding = " ".repeat(error.location.column.saturating_sub(1) as usize);
            output.push_str(&format!("  {} | {}^\n", " ".repeat(gutter.len()), padding));
        }

        output.push('\n');
        output
    }

    /// Formats an error into a JSON-ready struct.
    pub fn format_json_error(
        error: &TransformError,
        file_path: &Utf8Path,
        source: &str,
    ) -> FormattedError {
        let line_index = LineIndex::new(source);
        let position = |offset| {
            let lc = line_index.line_col(offset).unwrap_or(LineCol::new(0, 0));
            Position {
                line: lc.line + 1,
                column: lc.col + 1,
                offset: u32::from(offset),
            }
        };

        FormattedError {
            filename: file_path.to_string(),
            start: position(error.span.start),
            end: position(error.span.end),
            message: error.kind.to_string(),
            code: error_code(&error.kind).to_string(),
        }
    }

    /// Formats a file that could not be read.
    pub fn format_read_error(&self, message: &str, file_path: &Utf8Path) -> String {
        match self.format {
            OutputFormat::Human => format!("{}\nError: {} (read-error)\n\n", file_path, message),
            OutputFormat::Json => {
                serde_json::to_string_pretty(&Self::read_error_json(message, file_path))
                    .unwrap_or_default()
            }
        }
    }

    /// A read failure as a JSON-ready struct.
    pub fn read_error_json(message: &str, file_path: &Utf8Path) -> FormattedError {
        let origin = || Position {
            line: 1,
            column: 1,
            offset: 0,
        };
        FormattedError {
            filename: file_path.to_string(),
            start: origin(),
            end: origin(),
            message: message.to_string(),
            code: "read-error".to_string(),
        }
    }
}

/// Summary of a transpile run.
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Number of files processed.
    pub file_count: usize,
    /// Number of files that failed.
    pub error_count: usize,
    /// Number of output files written.
    pub written_count: usize,
}

impl RunSummary {
    /// Formats the summary line.
    pub fn format(&self) -> String {
        let plural = |count: usize, word: &str| {
            if count == 1 {
                format!("{count} {word}")
            } else {
                format!("{count} {word}s")
            }
        };

        format!(
            "====================================\njsx-transpile processed {} with {} ({} written)",
            plural(self.file_count, "file"),
            plural(self.error_count, "error"),
            self.written_count
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsx_transformer::{transpile, TranspileOptions};

    fn invalid_xmlns() -> (TransformError, &'static str) {
        let source = "const a = 1;\nconst b = <div xmlns=\"urn:x\" />;\n";
        let error = transpile(source, &TranspileOptions::default()).unwrap_err();
        (error, source)
    }

    #[test]
    fn test_format_human() {
        let (error, source) = invalid_xmlns();
        let formatter = Formatter::new(OutputFormat::Human);
        let output = formatter.format(&error, Utf8Path::new("src/App.jsx"), source);
        assert!(output.starts_with("src/App.jsx:2:16\n"));
        assert!(output.contains("unrecognized xmlns value \"urn:x\""));
        assert!(output.contains("(invalid-xmlns)"));
        assert!(output.contains("  2 | const b = <div"));
    }

    #[test]
    fn test_format_json() {
        let (error, source) = invalid_xmlns();
        let formatted = Formatter::format_json_error(&error, Utf8Path::new("App.jsx"), source);
        assert_eq!(formatted.start.line, 2);
        assert_eq!(formatted.start.column, 16);
        assert_eq!(formatted.code, "invalid-xmlns");

        let output = Formatter::new(OutputFormat::Json).format(&error, Utf8Path::new("App.jsx"), source);
        assert!(output.contains("\"filename\": \"App.jsx\""));
    }

    #[test]
    fn test_summary() {
        let summary = RunSummary {
            file_count: 5,
            error_count: 1,
            written_count: 4,
        };

        let output = summary.format();
        assert!(output.contains("5 files"));
        assert!(output.contains("1 error "));
        assert!(output.contains("(4 written)"));
    }
}
