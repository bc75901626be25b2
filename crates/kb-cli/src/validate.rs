//! # Validate Command
//!
//! Command-line arguments for `kb-validate` and the handler that wires them
//! into an [`Orchestrator`] with the production [`JsonSchemaCheck`].

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};

use kb_schema::JsonSchemaCheck;

use crate::artifact::DEFAULT_ROOT;
use crate::orchestrator::{Orchestrator, RunError, ValidationConfig};
use crate::report::{ConsoleReport, JsonReport};

/// Output format of the report.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    /// Human-readable text.
    Text,
    /// A single JSON document.
    Json,
}

/// Arguments for knowledge base validation.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Validate only the artifact with this key (e.g. `system_config`) or
    /// display name.
    #[arg(short, long, value_name = "NAME")]
    pub file: Option<String>,

    /// Knowledge base root directory.
    #[arg(long, value_name = "DIR", default_value = DEFAULT_ROOT)]
    pub root: PathBuf,

    /// Report format.
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

impl ValidateArgs {
    /// The validation config these arguments describe.
    pub fn config(&self) -> ValidationConfig {
        ValidationConfig::knowledge_base(&self.root).with_filter(self.file.as_deref())
    }
}

/// Execute validation, writing the report to `out`.
///
/// Returns exit code: 0 on success, 1 on validation failure, 2 when the
/// knowledge base root is missing.
///
/// # Errors
///
/// Fails only if the report cannot be written.
pub fn run_validate<W: Write>(args: &ValidateArgs, out: W) -> Result<u8> {
    let config = args.config();
    let checker = JsonSchemaCheck::new().with_schema_dir(config.schema_dir());
    tracing::debug!(
        root = %config.root.display(),
        artifacts = config.artifacts.len(),
        "starting knowledge base validation"
    );
    let orchestrator = Orchestrator::new(config, checker);

    let result = match args.format {
        ReportFormat::Text => orchestrator.run(&mut ConsoleReport::new(out)),
        ReportFormat::Json => orchestrator.run(&mut JsonReport::new(out)),
    };

    match result {
        Ok(report) => Ok(report.exit_code()),
        Err(e @ RunError::RootMissing { .. }) => Ok(e.exit_code()),
        Err(e) => Err(e).context("knowledge base validation aborted"),
    }
}
