//! Main orchestration logic.

use crate::cli::{Args, OutputFormat, SourceMapMode};
use crate::config::{ConfigError, Settings, TranspileConfig};
use crate::output::{FormattedError, Formatter, RunSummary};
use camino::{Utf8Path, Utf8PathBuf};
use globset::{Glob, GlobSet, GlobSetBuilder};
use jsx_transformer::{transpile, TransformError, TranspileOutput};
use rayon::prelude::*;
use std::fs;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Orchestration errors.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Failed to load configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Invalid glob pattern.
    #[error("invalid glob pattern: {0}")]
    InvalidGlob(String),

    /// An input path does not exist.
    #[error("input not found: {0}")]
    MissingInput(Utf8PathBuf),

    /// The working directory is not valid UTF-8 or is inaccessible.
    #[error("invalid working directory: {0}")]
    WorkingDirectory(String),

    /// Failed to write an output file.
    #[error("failed to write {path}: {source}")]
    WriteFailed {
        path: Utf8PathBuf,
        source: std::io::Error,
    },
}

/// A file selected for transpilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    pub path: Utf8PathBuf,
    /// Path below the input it was found in; mirrored under the out dir.
    pub relative: Utf8PathBuf,
}

enum Outcome {
    Transpiled(TranspileOutput),
    Failed(TransformError),
    Unreadable(String),
}

struct FileResult {
    file: InputFile,
    source: String,
    outcome: Outcome,
}

/// Runs the transpiler over every input.
pub fn run(args: &Args) -> Result<RunSummary, OrchestratorError> {
    let cwd = std::env::current_dir()
        .map_err(|e| OrchestratorError::WorkingDirectory(e.to_string()))
        .and_then(|dir| {
            Utf8PathBuf::try_from(dir)
                .map_err(|e| OrchestratorError::WorkingDirectory(e.to_string()))
        })?;

    let config = match &args.config {
        Some(path) => TranspileConfig::load(&cwd.join(path))?,
        None => match TranspileConfig::find(&cwd)? {
            Some((path, config)) => {
                debug!(%path, "loaded config");
                config
            }
            None => TranspileConfig::default(),
        },
    };
    let settings = Settings::resolve(args, config);
    run_with_settings(&cwd, &args.inputs, &settings, args.output)
}

/// Runs with already resolved settings. Relative paths resolve against `cwd`.
pub fn run_with_settings(
    cwd: &Utf8Path,
    inputs: &[Utf8PathBuf],
    settings: &Settings,
    format: OutputFormat,
) -> Result<RunSummary, OrchestratorError> {
    let scan_start = Instant::now();
    let ignore_set = build_ignore_set(&settings.ignore)?;
    let files = collect_files(cwd, inputs, &settings.extensions, &ignore_set)?;
    debug!(
        files = files.len(),
        elapsed_ms = scan_start.elapsed().as_millis() as u64,
        "scanned inputs"
    );

    let transpile_start = Instant::now();
    let results: Vec<FileResult> = files
        .into_par_iter()
        .map(|file| transpile_file(file, settings))
        .collect();
    info!(
        files = results.len(),
        elapsed_ms = transpile_start.elapsed().as_millis() as u64,
        "transpiled"
    );

    let out_dir = settings.out_dir.as_ref().map(|dir| cwd.join(dir));
    let formatter = Formatter::new(format);
    let mut summary = RunSummary {
        file_count: results.len(),
        ..Default::default()
    };
    let mut json_output: Vec<FormattedError> = Vec::new();

    for result in results {
        let display = display_path(cwd, &result.file.path);
        match result.outcome {
            Outcome::Transpiled(output) => match &out_dir {
                Some(out_dir) => {
                    summary.written_count +=
                        write_output(out_dir, &result.file, &output, settings.source_maps)?;
                }
                None => print_output(&display, &output, settings.source_maps),
            },
            Outcome::Failed(error) => {
                summary.error_count += 1;
                match format {
                    OutputFormat::Json => json_output.push(Formatter::format_json_error(
                        &error,
                        &display,
                        &result.source,
                    )),
                    OutputFormat::Human => {
                        eprint!("{}", formatter.format(&error, &display, &result.source))
                    }
                }
            }
            Outcome::Unreadable(message) => {
                summary.error_count += 1;
                match format {
                    OutputFormat::Json => {
                        json_output.push(Formatter::read_error_json(&message, &display))
                    }
                    OutputFormat::Human => eprint!("{}", formatter.format_read_error(&message, &display)),
                }
            }
        }
    }

    match format {
        OutputFormat::Json => {
            eprintln!(
                "{}",
                serde_json::to_string_pretty(&json_output).unwrap_or_default()
            );
        }
        OutputFormat::Human => {
            if summary.error_count > 0 || out_dir.is_some() {
                eprintln!("{}", summary.format());
            }
        }
    }

    Ok(summary)
}

fn transpile_file(file: InputFile, settings: &Settings) -> FileResult {
    let source = match fs::read_to_string(&file.path) {
        Ok(source) => source,
        Err(e) => {
            warn!(path = %file.path, error = %e, "skipping unreadable file");
            return FileResult {
                file,
                source: String::new(),
                outcome: Outcome::Unreadable(format!("failed to read file: {e}")),
            };
        }
    };

    let options = settings
        .options
        .clone()
        .with_source_file_name(file.relative.as_str());
    let outcome = match transpile(&source, &options) {
        Ok(output) => Outcome::Transpiled(output),
        Err(error) => Outcome::Failed(error),
    };
    FileResult {
        file,
        source,
        outcome,
    }
}

fn build_ignore_set(patterns: &[String]) -> Result<GlobSet, OrchestratorError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| OrchestratorError::InvalidGlob(e.to_string()))?;
        builder.add(glob);
    }

    // Add default ignores
    for pattern in ["**/node_modules/**", "**/.git/**"] {
        if let Ok(glob) = Glob::new(pattern) {
            builder.add(glob);
        }
    }

    builder
        .build()
        .map_err(|e| OrchestratorError::InvalidGlob(e.to_string()))
}

/// Expands `inputs` into the files to transpile, sorted by path.
///
/// Files named directly are always included; directories are walked for
/// files with a matching extension that no ignore pattern excludes.
pub fn collect_files(
    cwd: &Utf8Path,
    inputs: &[Utf8PathBuf],
    extensions: &[String],
    ignore_set: &GlobSet,
) -> Result<Vec<InputFile>, OrchestratorError> {
    let mut files = Vec::new();
    for input in inputs {
        let root = cwd.join(input);
        if root.is_file() {
            let relative = Utf8PathBuf::from(root.file_name().unwrap_or(root.as_str()));
            files.push(InputFile {
                path: root,
                relative,
            });
            continue;
        }
        if !root.is_dir() {
            return Err(OrchestratorError::MissingInput(input.clone()));
        }

        let found = WalkDir::new(&root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| Utf8PathBuf::try_from(e.into_path()).ok())
            .filter(|p| {
                let file_name = p.file_name().unwrap_or("");
                extensions.iter().any(|ext| file_name.ends_with(ext.as_str()))
            })
            .filter_map(|path| {
                let relative = path.strip_prefix(&root).ok()?.to_owned();
                (!ignore_set.is_match(relative.as_str())).then_some(InputFile { path, relative })
            });
        files.extend(found);
    }
    files.sort_by(|a, b| a.path.cmp(&b.path));
    files.dedup_by(|a, b| a.path == b.path);
    Ok(files)
}

/// Where the code for `relative` goes under `out_dir`.
pub fn output_path(out_dir: &Utf8Path, relative: &Utf8Path) -> Utf8PathBuf {
    out_dir.join(relative).with_extension("js")
}

/// Writes the code (and map) for one file. Returns the number of files
/// written.
fn write_output(
    out_dir: &Utf8Path,
    file: &InputFile,
    output: &TranspileOutput,
    source_maps: SourceMapMode,
) -> Result<usize, OrchestratorError> {
    let code_path = output_path(out_dir, &file.relative);
    let write = |path: &Utf8Path, contents: &str| {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| OrchestratorError::WriteFailed {
                path: parent.to_owned(),
                source,
            })?;
        }
        fs::write(path, contents).map_err(|source| OrchestratorError::WriteFailed {
            path: path.to_owned(),
            source,
        })
    };

    match (source_maps, &output.map) {
        (SourceMapMode::File, Some(map)) => {
            let map_path = Utf8PathBuf::from(format!("{code_path}.map"));
            let map_name = map_path.file_name().unwrap_or(map_path.as_str());
            let separator = if output.code.ends_with('\n') { "" } else { "\n" };
            let code = format!("{}{separator}//# sourceMappingURL={map_name}\n", output.code);
            write(&code_path, &code)?;
            write(&map_path, map)?;
            debug!(path = %code_path, "wrote code and map");
            Ok(2)
        }
        (SourceMapMode::Inline, _) => {
            write(&code_path, &output.code_with_inline_map())?;
            Ok(1)
        }
        _ => {
            write(&code_path, &output.code)?;
            Ok(1)
        }
    }
}

fn print_output(display: &Utf8Path, output: &TranspileOutput, source_maps: SourceMapMode) {
    let code = match source_maps {
        SourceMapMode::Inline => output.code_with_inline_map(),
        SourceMapMode::None | SourceMapMode::File => output.code.clone(),
    };
    println!("// {display}");
    print!("{code}");
    if !code.ends_with('\n') {
        println!();
    }
}

fn display_path(cwd: &Utf8Path, path: &Utf8Path) -> Utf8PathBuf {
    path.strip_prefix(cwd).unwrap_or(path).to_owned()
}
