//! Configuration loading.

use crate::cli::{Args, SourceMapMode};
use camino::{Utf8Path, Utf8PathBuf};
use jsx_transformer::TranspileOptions;
use serde::Deserialize;
use std::fs;
use thiserror::Error;

/// File name looked up in the working directory.
pub const CONFIG_FILE: &str = "jsx-transpile.json";

/// Extensions processed when the config names none.
const DEFAULT_EXTENSIONS: [&str; 2] = [".jsx", ".tsx"];

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the config file.
    #[error("failed to read {path}: {source}")]
    Read {
        path: Utf8PathBuf,
        source: std::io::Error,
    },

    /// The config file is not valid JSON for [`TranspileConfig`].
    #[error("invalid config {path}: {source}")]
    Parse {
        path: Utf8PathBuf,
        source: serde_json::Error,
    },
}

/// Project configuration from `jsx-transpile.json`.
///
/// Comments are allowed. Command-line flags take precedence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TranspileConfig {
    /// File extensions to process, with the leading dot.
    pub extensions: Vec<String>,
    /// Glob patterns to ignore.
    pub ignore: Vec<String>,
    /// Directory for generated files.
    pub out_dir: Option<Utf8PathBuf>,
    /// Source map output.
    pub source_maps: Option<SourceMapMode>,
    pub minified: bool,
    pub compact: bool,
    pub default_ext: Option<String>,
    pub runtime_module: Option<String>,
    pub allow_reactive_keys: bool,
}

impl TranspileConfig {
    /// Loads configuration from a file.
    pub fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        serde_json::from_str(&remove_json_comments(&content)).map_err(|source| {
            ConfigError::Parse {
                path: path.to_owned(),
                source,
            }
        })
    }

    /// Finds and loads `jsx-transpile.json` from a directory.
    pub fn find(dir: &Utf8Path) -> Result<Option<(Utf8PathBuf, Self)>, ConfigError> {
        let path = dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(None);
        }
        Self::load(&path).map(|config| Some((path, config)))
    }

    /// Returns the file extensions to process.
    pub fn file_extensions(&self) -> Vec<&str> {
        if self.extensions.is_empty() {
            DEFAULT_EXTENSIONS.to_vec()
        } else {
            self.extensions.iter().map(String::as_str).collect()
        }
    }
}

/// Settings for one run: the config with command-line flags applied.
#[derive(Debug, Clone)]
pub struct Settings {
    pub extensions: Vec<String>,
    pub ignore: Vec<String>,
    pub out_dir: Option<Utf8PathBuf>,
    pub source_maps: SourceMapMode,
    pub options: TranspileOptions,
}

impl Settings {
    /// Merges `args` over `config`.
    pub fn resolve(args: &Args, config: TranspileConfig) -> Self {
        let extensions = config
            .file_extensions()
            .into_iter()
            .map(str::to_string)
            .collect();
        let source_maps = args
            .source_maps
            .or(config.source_maps)
            .unwrap_or_default();

        let mut options = TranspileOptions::default()
            .with_minified(args.minified || config.minified)
            .with_compact(args.compact || config.compact)
            .with_strict_keys(!(args.allow_reactive_keys || config.allow_reactive_keys))
            .with_source_maps(source_maps != SourceMapMode::None);
        if let Some(ext) = args.default_ext.clone().or(config.default_ext) {
            options = options.with_default_ext(ext);
        }
        if let Some(module) = args.runtime_module.clone().or(config.runtime_module) {
            options = options.with_runtime_module(module);
        }

        let mut ignore = config.ignore;
        ignore.extend(args.ignore.iter().cloned());

        Self {
            extensions,
            ignore,
            out_dir: args.out_dir.clone().or(config.out_dir),
            source_maps,
            options,
        }
    }
}

/// Removes single-line and multi-line comments from JSON.
fn remove_json_comments(json: &str) -> String {
    let mut result = String::with_capacity(json.len());
    let mut chars = json.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            result.push(c);
            if c == '"' {
                in_string = false;
            } else if c == '\\' {
                if let Some(next) = chars.next() {
                    result.push(next);
                }
            }
            continue;
        }
        match (c, chars.peek()) {
            ('"', _) => {
                result.push(c);
                in_string = true;
            }
            ('/', Some('/')) => {
                while chars.peek().is_some_and(|next| *next != '\n') {
                    chars.next();
                }
            }
            ('/', Some('*')) => {
                chars.next();
                while let Some(next) = chars.next() {
                    if next == '*' && chars.peek() == Some(&'/') {
                        chars.next();
                        break;
                    }
                }
            }
            _ => result.push(c),
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_config_with_comments() {
        let json = r#"{
            // project settings
            "extensions": [".jsx"],
            "sourceMaps": "file", /* written next to output */
            "runtimeModule": "@app/runtime",
            "ignore": ["**/*.test.jsx"]
        }"#;
        let config: TranspileConfig = serde_json::from_str(&remove_json_comments(json)).unwrap();
        assert_eq!(config.extensions, vec![".jsx"]);
        assert_eq!(config.source_maps, Some(SourceMapMode::File));
        assert_eq!(config.runtime_module.as_deref(), Some("@app/runtime"));
        assert_eq!(config.ignore, vec!["**/*.test.jsx"]);
        assert!(!config.minified);
    }

    #[test]
    fn test_comment_markers_inside_strings_are_kept() {
        let json = r#"{"runtimeModule": "https://cdn.example/rt/*.js"}"#;
        assert_eq!(remove_json_comments(json), json);
    }

    #[test]
    fn test_default_extensions() {
        assert_eq!(
            TranspileConfig::default().file_extensions(),
            vec![".jsx", ".tsx"]
        );
    }

    #[test]
    fn test_flags_override_config() {
        let config = TranspileConfig {
            source_maps: Some(SourceMapMode::File),
            runtime_module: Some("@app/runtime".to_string()),
            ignore: vec!["a/**".to_string()],
            compact: true,
            ..Default::default()
        };
        let args = Args::parse_from([
            "jsx-transpile",
            "--source-maps",
            "inline",
            "--ignore",
            "b/**",
            "--default-ext",
            ".js",
        ]);
        let settings = Settings::resolve(&args, config);
        assert_eq!(settings.source_maps, SourceMapMode::Inline);
        assert_eq!(settings.ignore, vec!["a/**", "b/**"]);
        assert!(settings.options.source_maps);
        assert!(settings.options.compact);
        assert_eq!(settings.options.runtime_module, "@app/runtime");
        assert_eq!(settings.options.default_ext.as_deref(), Some("js"));
    }

    #[test]
    fn test_reactive_keys_rejected_unless_allowed() {
        let args = Args::parse_from(["jsx-transpile"]);
        assert!(Settings::resolve(&args, TranspileConfig::default()).options.strict_keys);

        let config: TranspileConfig =
            serde_json::from_str(r#"{"allowReactiveKeys": true}"#).unwrap();
        assert!(!Settings::resolve(&args, config).options.strict_keys);
    }

    #[test]
    fn test_missing_config_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let dir = Utf8Path::from_path(dir.path()).unwrap();
        assert!(TranspileConfig::find(dir).unwrap().is_none());
    }
}
