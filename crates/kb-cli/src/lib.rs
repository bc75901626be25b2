//! # kb-cli — Knowledge Base Validation
//!
//! Validates the fixed set of knowledge base documents against their JSON
//! Schemas and reports the result:
//!
//! ```bash
//! kb-validate                       # all artifacts
//! kb-validate --file system_config  # one artifact, by key or display name
//! kb-validate --format json         # machine-readable report
//! ```
//!
//! ## Modules
//!
//! - `artifact` — the artifact table and filename conventions.
//! - `orchestrator` — per-artifact classification (PASS / FAIL / SKIP),
//!   the summary, and the exit code.
//! - `report` — console and JSON report sinks.
//! - `validate` — command-line arguments and the entry point used by the
//!   binary.
//!
//! ## Exit Codes
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0 | every evaluated artifact passed or was skipped |
//! | 1 | at least one artifact failed |
//! | 2 | knowledge base root missing, or the report could not be written |

pub mod artifact;
pub mod orchestrator;
pub mod report;
pub mod validate;

pub use artifact::{knowledge_base_artifacts, ArtifactSpec, DEFAULT_ROOT};
pub use orchestrator::{
    ArtifactOutcome, Orchestrator, Outcome, OutcomeKind, RunError, RunReport, Status,
    SummaryReport, ValidationConfig,
};
pub use report::{ConsoleReport, JsonReport, ReportSink};
