//! jsx-transpile: JSX to factory-call transpiler for signal-based runtimes.

mod cli;
mod config;
mod orchestrator;
mod output;

use clap::Parser;
use cli::Args;
use miette::{IntoDiagnostic, Result};
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter.
const LOG_ENV: &str = "JSX_TRANSPILE_LOG";

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let summary = orchestrator::run(&args).into_diagnostic()?;
    if summary.error_count > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}
