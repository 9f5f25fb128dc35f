//! The transform entry point and its options.

use crate::emit::{self, Style, TranspileOutput};
use crate::error::TransformError;
use crate::imports::ImportTable;
use crate::input::SourceFile;
use crate::rewrite::Rewriter;
use source_map::Span;
use std::time::Instant;
use tracing::debug;

/// The module generated code imports factories from.
pub const DEFAULT_RUNTIME_MODULE: &str = "jsx-signals/runtime";

/// Older specifiers rewritten to [`DEFAULT_RUNTIME_MODULE`].
pub const LEGACY_RUNTIME_MODULES: [&str; 2] =
    ["jsx-signals/jsx-runtime", "jsx-signals/jsx-dev-runtime"];

/// File name used in maps and for syntax selection when none is given.
const DEFAULT_FILE_NAME: &str = "input.jsx";

/// Options for transformation.
#[derive(Debug, Clone)]
pub struct TranspileOptions {
    /// Remove optional whitespace from generated code, including the newline
    /// after an injected import. Implies `compact`.
    pub minified: bool,
    /// Remove optional whitespace inside generated factory calls.
    pub compact: bool,
    /// Produce a Source Map v3 document.
    pub source_maps: bool,
    /// The source file name, recorded in the map. Its extension selects
    /// the TypeScript or ECMAScript parser.
    pub source_file_name: Option<String>,
    /// Extension appended to relative specifiers that have none.
    pub default_ext: Option<String>,
    /// The module factories are imported from.
    pub runtime_module: String,
    /// Specifiers rewritten to `runtime_module`.
    pub legacy_modules: Vec<String>,
    /// Reject `key` attributes whose value is reactive. On by default.
    pub strict_keys: bool,
}

impl Default for TranspileOptions {
    fn default() -> Self {
        Self {
            minified: false,
            compact: false,
            source_maps: false,
            source_file_name: None,
            default_ext: None,
            runtime_module: DEFAULT_RUNTIME_MODULE.to_string(),
            legacy_modules: LEGACY_RUNTIME_MODULES.map(String::from).to_vec(),
            strict_keys: true,
        }
    }
}

impl TranspileOptions {
    pub fn with_source_maps(mut self, source_maps: bool) -> Self {
        self.source_maps = source_maps;
        self
    }

    pub fn with_source_file_name(mut self, name: impl Into<String>) -> Self {
        self.source_file_name = Some(name.into());
        self
    }

    pub fn with_compact(mut self, compact: bool) -> Self {
        self.compact = compact;
        self
    }

    pub fn with_minified(mut self, minified: bool) -> Self {
        self.minified = minified;
        self
    }

    /// Accepts `js` or `.js`.
    pub fn with_default_ext(mut self, ext: impl Into<String>) -> Self {
        let ext = ext.into();
        self.default_ext = Some(ext.trim_start_matches('.').to_string());
        self
    }

    pub fn with_runtime_module(mut self, module: impl Into<String>) -> Self {
        self.runtime_module = module.into();
        self
    }

    pub fn with_strict_keys(mut self, strict: bool) -> Self {
        self.strict_keys = strict;
        self
    }

    pub(crate) fn file_name(&self) -> &str {
        self.source_file_name.as_deref().unwrap_or(DEFAULT_FILE_NAME)
    }

    /// The `file` entry of the map: the source name with a `.js` extension.
    pub(crate) fn output_file_name(&self) -> String {
        let name = self.file_name();
        let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
        match base.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => format!("{stem}.js"),
            _ => format!("{base}.js"),
        }
    }

    /// The specifier that replaces `specifier` in the output, if any.
    pub(crate) fn rewrite_specifier(&self, specifier: &str) -> Option<String> {
        if self.legacy_modules.iter().any(|legacy| legacy == specifier) {
            return Some(self.runtime_module.clone());
        }
        let ext = self.default_ext.as_deref().filter(|ext| !ext.is_empty())?;
        if is_relative(specifier) && !has_extension(specifier) {
            return Some(format!("{specifier}.{ext}"));
        }
        None
    }
}

fn is_relative(specifier: &str) -> bool {
    specifier.starts_with("./") || specifier.starts_with("../")
}

fn has_extension(specifier: &str) -> bool {
    let last = specifier.rsplit('/').next().unwrap_or(specifier);
    // `./dir/` and `..` name directories
    last.is_empty() || last == "." || last == ".." || last.contains('.')
}

/// Rewrites every JSX element and fragment in `source` into factory calls.
///
/// # Errors
///
/// Fails on any syntax error and on invalid `xmlns` attributes. No partial
/// output is produced.
pub fn transpile(
    source: &str,
    options: &TranspileOptions,
) -> Result<TranspileOutput, TransformError> {
    let started = Instant::now();
    let (file, module) = SourceFile::parse(options.file_name(), source)?;
    let style = Style::from_options(options);
    let range = Span::from_usize(0, source.len());

    let mut imports = ImportTable::scan(&module, &file, options);
    let mut rewriter = Rewriter::new(&file, options, &mut imports, style);
    let mut edits = rewriter.rewrite_module(&module)?;
    let elements = rewriter.rewritten();

    edits.extend(imports.rewrites_within(range));
    edits.extend(imports.finish(style));
    let output = emit::render(&file, emit::splice(range, edits), options)?;

    debug!(
        file = file.name,
        elements,
        bytes = output.code.len(),
        elapsed_us = started.elapsed().as_micros() as u64,
        "transpiled"
    );
    Ok(output)
}
