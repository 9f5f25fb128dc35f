//! CLI argument parsing.

use camino::Utf8PathBuf;
use clap::{Parser, ValueEnum};
use serde::Deserialize;

/// Transpiles JSX into factory calls for a signals runtime.
#[derive(Debug, Parser)]
#[command(name = "jsx-transpile")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Files or directories to transpile
    #[arg(default_value = ".")]
    pub inputs: Vec<Utf8PathBuf>,

    /// Directory for generated files (printed to stdout when omitted)
    #[arg(long = "out-dir")]
    pub out_dir: Option<Utf8PathBuf>,

    /// Source map output
    #[arg(long = "source-maps", value_enum)]
    pub source_maps: Option<SourceMapMode>,

    /// Remove all optional whitespace from generated code
    #[arg(long)]
    pub minified: bool,

    /// Remove optional whitespace inside generated factory calls
    #[arg(long)]
    pub compact: bool,

    /// Extension appended to relative imports that have none (e.g. js)
    #[arg(long = "default-ext")]
    pub default_ext: Option<String>,

    /// Module the factories are imported from
    #[arg(long = "runtime-module")]
    pub runtime_module: Option<String>,

    /// Pass reactive `key` attributes through instead of rejecting them
    #[arg(long = "allow-reactive-keys")]
    pub allow_reactive_keys: bool,

    /// Glob patterns to ignore
    #[arg(long)]
    pub ignore: Vec<String>,

    /// Output format for errors
    #[arg(long, value_enum, default_value = "human")]
    pub output: OutputFormat,

    /// Path to jsx-transpile.json
    #[arg(long)]
    pub config: Option<Utf8PathBuf>,
}

/// Where source maps go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceMapMode {
    /// No source maps (default)
    #[default]
    None,
    /// Appended to the code as a base64 data URL
    Inline,
    /// Written next to the code as `<file>.map`
    File,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable output (default)
    #[default]
    Human,
    /// JSON output
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_args() {
        let args = Args::parse_from(["jsx-transpile"]);
        assert_eq!(args.inputs, vec![Utf8PathBuf::from(".")]);
        assert_eq!(args.output, OutputFormat::Human);
        assert_eq!(args.source_maps, None);
        assert!(args.out_dir.is_none());
        assert!(!args.minified);
    }

    #[test]
    fn test_inputs_and_out_dir() {
        let args = Args::parse_from([
            "jsx-transpile",
            "src",
            "extra/App.tsx",
            "--out-dir",
            "dist",
        ]);
        assert_eq!(
            args.inputs,
            vec![Utf8PathBuf::from("src"), Utf8PathBuf::from("extra/App.tsx")]
        );
        assert_eq!(args.out_dir.as_deref().map(|p| p.as_str()), Some("dist"));
    }

    #[test]
    fn test_transform_flags() {
        let args = Args::parse_from([
            "jsx-transpile",
            "--source-maps",
            "inline",
            "--minified",
            "--default-ext",
            "js",
            "--runtime-module",
            "@app/runtime",
            "--allow-reactive-keys",
        ]);
        assert_eq!(args.source_maps, Some(SourceMapMode::Inline));
        assert!(args.minified);
        assert_eq!(args.default_ext.as_deref(), Some("js"));
        assert_eq!(args.runtime_module.as_deref(), Some("@app/runtime"));
        assert!(args.allow_reactive_keys);
    }

    #[test]
    fn test_output_formats() {
        let args = Args::parse_from(["jsx-transpile", "--output", "json"]);
        assert_eq!(args.output, OutputFormat::Json);
    }
}
