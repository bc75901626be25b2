//! # Validation Orchestrator
//!
//! Walks the artifact list in order, classifies each artifact as PASS,
//! FAIL, or SKIP, reports each outcome as soon as it is known, and
//! aggregates everything into a [`SummaryReport`] and an exit code.
//!
//! ## Classification
//!
//! For each artifact, first match wins:
//!
//! 1. data file absent → SKIP (not produced yet; never an error, even if
//!    the schema is missing too),
//! 2. schema file absent → FAIL `Schema file not found`,
//! 3. schema fails to load → FAIL,
//! 4. data fails to load → FAIL,
//! 5. validator reports violations → FAIL with the violation path,
//! 6. validator itself fails → FAIL `Unexpected error: ...`,
//! 7. otherwise → PASS.
//!
//! No per-artifact failure escapes [`Orchestrator::run`]; only a missing
//! knowledge base root aborts the run, before any artifact is touched.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;

use kb_schema::{load_document, Conformance, ConformanceCheck, ValidationViolations};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::artifact::{self, ArtifactSpec, SCHEMA_SUBDIR};
use crate::report::ReportSink;

/// Exit code when every evaluated artifact passed or was skipped.
pub const EXIT_VALID: u8 = 0;
/// Exit code when at least one artifact failed.
pub const EXIT_INVALID: u8 = 1;
/// Exit code when the run could not be carried out at all.
pub const EXIT_CONFIG_ERROR: u8 = 2;

/// Message for a SKIP outcome.
pub const DATA_NOT_FOUND_MESSAGE: &str = "data file not found";
/// Message for the missing-schema pre-check.
pub const SCHEMA_NOT_FOUND_MESSAGE: &str = "Schema file not found";
/// Message for a PASS outcome.
pub const VALID_MESSAGE: &str = "Valid";

/// Classified result of one artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    /// Data conformed to its schema.
    Pass,
    /// Schema missing or malformed, data malformed or non-conformant.
    Fail,
    /// Data does not exist yet.
    Skip,
}

impl Status {
    /// Returns the status tag used in reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
            Self::Skip => "SKIP",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why an artifact ended up with its status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    /// Data conformed.
    Valid,
    /// Data file absent.
    DataNotFound,
    /// Schema file absent.
    SchemaNotFound,
    /// Schema file present but unreadable or malformed.
    SchemaLoadError,
    /// Data file present but unreadable or malformed.
    DataLoadError,
    /// Data violates the schema.
    SchemaNonconformance,
    /// The validator failed to run.
    ValidatorError,
}

impl OutcomeKind {
    /// Returns the status this kind is classified as.
    pub fn status(&self) -> Status {
        match self {
            Self::Valid => Status::Pass,
            Self::DataNotFound => Status::Skip,
            Self::SchemaNotFound
            | Self::SchemaLoadError
            | Self::DataLoadError
            | Self::SchemaNonconformance
            | Self::ValidatorError => Status::Fail,
        }
    }
}

/// Status and message for one artifact. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    status: Status,
    kind: OutcomeKind,
    message: String,
}

impl Outcome {
    /// Create an outcome; the status follows from `kind`.
    pub fn new(kind: OutcomeKind, message: impl Into<String>) -> Self {
        Self {
            status: kind.status(),
            kind,
            message: message.into(),
        }
    }

    /// PASS with the standard message.
    pub fn valid() -> Self {
        Self::new(OutcomeKind::Valid, VALID_MESSAGE)
    }

    /// SKIP with the standard message.
    pub fn data_not_found() -> Self {
        Self::new(OutcomeKind::DataNotFound, DATA_NOT_FOUND_MESSAGE)
    }

    /// FAIL from the missing-schema pre-check.
    pub fn schema_not_found() -> Self {
        Self::new(OutcomeKind::SchemaNotFound, SCHEMA_NOT_FOUND_MESSAGE)
    }

    /// FAIL describing the primary violation and where it occurred.
    pub fn nonconformant(violations: &ValidationViolations) -> Self {
        let primary = violations.primary();
        let mut message = format!(
            "Validation error: {}\nPath: {}",
            primary.message, primary.instance_path
        );
        let more = violations.count() - 1;
        if more > 0 {
            message.push_str(&format!("\n({more} more violation(s) not shown)"));
        }
        Self::new(OutcomeKind::SchemaNonconformance, message)
    }

    /// FAIL for a validator that could not run.
    pub fn validator_error(reason: impl fmt::Display) -> Self {
        Self::new(OutcomeKind::ValidatorError, format!("Unexpected error: {reason}"))
    }

    /// Returns the classified status.
    pub fn status(&self) -> Status {
        self.status
    }

    /// Returns the reason for the status.
    pub fn kind(&self) -> OutcomeKind {
        self.kind
    }

    /// Returns the human-readable message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// An outcome together with the artifact it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactOutcome {
    /// Artifact display name.
    pub name: String,
    /// Data document location.
    pub data_path: PathBuf,
    /// Schema location.
    pub schema_path: PathBuf,
    /// Classified result.
    pub outcome: Outcome,
}

impl ArtifactOutcome {
    fn new(spec: &ArtifactSpec, outcome: Outcome) -> Self {
        Self {
            name: spec.name.clone(),
            data_path: spec.data_path.clone(),
            schema_path: spec.schema_path.clone(),
            outcome,
        }
    }
}

/// Aggregate counts over all outcomes of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SummaryReport {
    /// Number of artifacts evaluated.
    pub total: usize,
    /// Number of PASS outcomes.
    pub passed: usize,
    /// Number of FAIL outcomes.
    pub failed: usize,
    /// Number of SKIP outcomes.
    pub skipped: usize,
    /// True iff no outcome is FAIL. Skips do not count against validity.
    pub all_valid: bool,
}

impl SummaryReport {
    /// Tally `outcomes`.
    pub fn from_outcomes<'a>(outcomes: impl IntoIterator<Item = &'a Outcome>) -> Self {
        let mut summary = Self::default();
        for outcome in outcomes {
            summary.total += 1;
            match outcome.status() {
                Status::Pass => summary.passed += 1,
                Status::Fail => summary.failed += 1,
                Status::Skip => summary.skipped += 1,
            }
        }
        summary.all_valid = summary.failed == 0;
        summary
    }

    /// 0 if all valid, 1 otherwise.
    pub fn exit_code(&self) -> u8 {
        if self.all_valid {
            EXIT_VALID
        } else {
            EXIT_INVALID
        }
    }
}

/// Everything a completed run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// One outcome per artifact, in artifact-list order.
    pub outcomes: Vec<ArtifactOutcome>,
    /// Aggregate over `outcomes`.
    pub summary: SummaryReport,
}

impl RunReport {
    /// Process exit code for this run.
    pub fn exit_code(&self) -> u8 {
        self.summary.exit_code()
    }
}

/// Conditions that stop a run as a whole.
#[derive(Error, Debug)]
pub enum RunError {
    /// The knowledge base root directory does not exist.
    #[error("knowledge base root not found: {}", root.display())]
    RootMissing {
        /// Root that was expected.
        root: PathBuf,
    },

    /// The report could not be written.
    #[error("failed to write report: {0}")]
    Report(#[from] std::io::Error),
}

impl RunError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        EXIT_CONFIG_ERROR
    }
}

/// What to validate: a root directory and the artifacts under it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationConfig {
    /// Knowledge base root; must exist for a run to start.
    pub root: PathBuf,
    /// Artifacts to evaluate, in report order.
    pub artifacts: Vec<ArtifactSpec>,
}

impl ValidationConfig {
    /// Create a config with an explicit artifact list.
    pub fn new(root: impl Into<PathBuf>, artifacts: Vec<ArtifactSpec>) -> Self {
        Self {
            root: root.into(),
            artifacts,
        }
    }

    /// The standard knowledge base artifact list under `root`.
    pub fn knowledge_base(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let artifacts = artifact::knowledge_base_artifacts(&root);
        Self::new(root, artifacts)
    }

    /// Keep only the artifacts matching `filter` (see [`artifact::select`]).
    pub fn with_filter(mut self, filter: Option<&str>) -> Self {
        self.artifacts = artifact::select(self.artifacts, filter);
        if let Some(filter) = filter {
            if self.artifacts.is_empty() {
                tracing::warn!(filter, "no artifact matches filter; nothing to validate");
            }
        }
        self
    }

    /// Directory holding the schemas, used to resolve cross-schema `$ref`s.
    pub fn schema_dir(&self) -> PathBuf {
        self.root.join(SCHEMA_SUBDIR)
    }
}

/// Runs the validation pipeline over a [`ValidationConfig`].
#[derive(Debug)]
pub struct Orchestrator<C> {
    config: ValidationConfig,
    checker: C,
}

impl<C: ConformanceCheck> Orchestrator<C> {
    /// Create an orchestrator validating through `checker`.
    pub fn new(config: ValidationConfig, checker: C) -> Self {
        Self { config, checker }
    }

    /// Validate every configured artifact, reporting to `sink` as it goes.
    ///
    /// # Errors
    ///
    /// - [`RunError::RootMissing`] if the knowledge base root does not
    ///   exist. No artifact is evaluated; the sink is told about the abort.
    /// - [`RunError::Report`] if the sink fails to write.
    pub fn run<S: ReportSink + ?Sized>(&self, sink: &mut S) -> Result<RunReport, RunError> {
        if !self.config.root.exists() {
            let err = RunError::RootMissing {
                root: self.config.root.clone(),
            };
            tracing::warn!(root = %self.config.root.display(), "knowledge base root missing; aborting");
            sink.abort(&err)?;
            return Err(err);
        }

        sink.begin()?;

        let mut outcomes = Vec::with_capacity(self.config.artifacts.len());
        for spec in &self.config.artifacts {
            let outcome = ArtifactOutcome::new(spec, self.assess(spec));
            tracing::info!(
                artifact = %spec.name,
                status = %outcome.outcome.status(),
                "artifact evaluated"
            );
            sink.outcome(&outcome)?;
            outcomes.push(outcome);
        }

        let summary = SummaryReport::from_outcomes(outcomes.iter().map(|o| &o.outcome));
        tracing::info!(
            total = summary.total,
            passed = summary.passed,
            failed = summary.failed,
            skipped = summary.skipped,
            "validation finished"
        );
        sink.summary(&summary)?;

        Ok(RunReport { outcomes, summary })
    }

    /// Classify one artifact: the missing-schema pre-check, then
    /// [`evaluate`](Self::evaluate).
    ///
    /// A missing data file still wins over a missing schema.
    pub fn assess(&self, spec: &ArtifactSpec) -> Outcome {
        if spec.data_path.exists() && !spec.schema_path.exists() {
            return Outcome::schema_not_found();
        }
        self.evaluate(spec)
    }

    /// Load, validate, and classify one artifact. Never fails; every
    /// problem becomes a FAIL or SKIP outcome.
    pub fn evaluate(&self, spec: &ArtifactSpec) -> Outcome {
        if !spec.data_path.exists() {
            tracing::debug!(path = %spec.data_path.display(), "data file absent");
            return Outcome::data_not_found();
        }

        let schema = match load_document(&spec.schema_path) {
            Ok(schema) => schema,
            Err(e) => {
                return Outcome::new(
                    OutcomeKind::SchemaLoadError,
                    format!("Failed to load schema: {e}"),
                )
            }
        };
        tracing::debug!(path = %spec.schema_path.display(), "schema loaded");

        let data = match load_document(&spec.data_path) {
            Ok(data) => data,
            Err(e) => {
                return Outcome::new(
                    OutcomeKind::DataLoadError,
                    format!("Failed to load data file: {e}"),
                )
            }
        };
        tracing::debug!(path = %spec.data_path.display(), "data loaded");

        match self.check_conformance(&schema, &data) {
            Conformance::Conforms => Outcome::valid(),
            Conformance::Violated(violations) => Outcome::nonconformant(&violations),
            Conformance::Unexpected(reason) => Outcome::validator_error(reason),
        }
    }

    /// Call the checker, turning a panic into [`Conformance::Unexpected`].
    fn check_conformance(&self, schema: &Value, data: &Value) -> Conformance {
        panic::catch_unwind(AssertUnwindSafe(|| self.checker.check(schema, data))).unwrap_or_else(
            |payload| {
                let reason = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "validator panicked".to_string());
                tracing::error!(%reason, "validator panicked");
                Conformance::Unexpected(reason)
            },
        )
    }
}
