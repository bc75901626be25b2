//! # kb-validate entry point
//!
//! Parses command-line arguments, sets up logging on stderr, and runs the
//! knowledge base validation with the report on stdout.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use kb_cli::orchestrator::EXIT_CONFIG_ERROR;
use kb_cli::validate::{run_validate, ValidateArgs};

/// Validate knowledge base JSON files against their schemas.
///
/// Checks every knowledge base document against its JSON Schema, prints a
/// per-file report and a summary, and exits 0 when nothing failed, 1 when
/// something did, 2 when the knowledge base root is missing.
#[derive(Parser, Debug)]
#[command(name = "kb-validate", version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(flatten)]
    args: ValidateArgs,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("kb-validate v{} starting", env!("CARGO_PKG_VERSION"));

    match run_validate(&cli.args, std::io::stdout().lock()) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(EXIT_CONFIG_ERROR)
        }
    }
}
