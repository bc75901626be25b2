//! # Report Sinks
//!
//! The orchestrator pushes events into a [`ReportSink`] as the run
//! progresses. Two sinks are provided:
//!
//! - [`ConsoleReport`] — human-readable text, one block per artifact as soon
//!   as it is classified, then a summary block.
//! - [`JsonReport`] — a single JSON document written once the summary is
//!   known.

use std::io::{self, Write};

use serde::Serialize;

use crate::orchestrator::{ArtifactOutcome, OutcomeKind, RunError, Status, SummaryReport};

const BANNER_WIDTH: usize = 60;

/// Receives run events from the orchestrator.
pub trait ReportSink {
    /// The run is starting; the precondition check has passed.
    fn begin(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// One artifact has been classified.
    fn outcome(&mut self, outcome: &ArtifactOutcome) -> io::Result<()>;

    /// Every artifact has been classified.
    fn summary(&mut self, summary: &SummaryReport) -> io::Result<()>;

    /// The run was aborted before any artifact was evaluated.
    fn abort(&mut self, error: &RunError) -> io::Result<()>;
}

/// Plain-text report.
#[derive(Debug)]
pub struct ConsoleReport<W> {
    out: W,
}

impl<W: Write> ConsoleReport<W> {
    /// Report to `out`.
    pub fn new(out: W) -> Self {
        Self { out }
    }

    fn heading(&mut self, title: &str) -> io::Result<()> {
        let banner = "=".repeat(BANNER_WIDTH);
        writeln!(self.out, "{banner}")?;
        writeln!(self.out, "{title}")?;
        writeln!(self.out, "{banner}")?;
        writeln!(self.out)
    }
}

impl<W: Write> ReportSink for ConsoleReport<W> {
    fn begin(&mut self) -> io::Result<()> {
        self.heading("Knowledge Base Validation")
    }

    fn outcome(&mut self, artifact: &ArtifactOutcome) -> io::Result<()> {
        writeln!(self.out, "Validating {}...", artifact.name)?;
        writeln!(self.out, "  Data: {}", artifact.data_path.display())?;
        writeln!(self.out, "  Schema: {}", artifact.schema_path.display())?;

        let outcome = &artifact.outcome;
        match outcome.kind() {
            OutcomeKind::DataNotFound => {
                writeln!(self.out, "  [SKIP] Data file not found (may not exist yet)")?;
            }
            OutcomeKind::SchemaNotFound => {
                writeln!(
                    self.out,
                    "  [FAIL] {}: {}",
                    outcome.message(),
                    artifact.schema_path.display()
                )?;
            }
            _ => {
                let tag = format!("  [{}] ", outcome.status());
                // Continuation lines align under the first line of the message.
                let indent = " ".repeat(tag.len());
                for (i, line) in outcome.message().lines().enumerate() {
                    if i == 0 {
                        writeln!(self.out, "{tag}{line}")?;
                    } else {
                        writeln!(self.out, "{indent}{line}")?;
                    }
                }
            }
        }
        writeln!(self.out)
    }

    fn summary(&mut self, summary: &SummaryReport) -> io::Result<()> {
        self.heading("Validation Summary")?;
        writeln!(self.out, "Total: {} files", summary.total)?;
        writeln!(self.out, "[{}] Passed: {}", Status::Pass, summary.passed)?;
        writeln!(self.out, "[{}] Failed: {}", Status::Fail, summary.failed)?;
        writeln!(self.out, "[{}] Skipped: {}", Status::Skip, summary.skipped)?;
        writeln!(self.out)?;
        if summary.all_valid {
            writeln!(self.out, "[SUCCESS] All knowledge base files are valid!")?;
        } else {
            writeln!(self.out, "[WARNING] Some validations failed. Please fix errors above.")?;
        }
        self.out.flush()
    }

    fn abort(&mut self, error: &RunError) -> io::Result<()> {
        match error {
            RunError::RootMissing { root } => {
                writeln!(self.out, "[ERROR] Please run from project root directory")?;
                writeln!(
                    self.out,
                    "        Current directory should contain '{}/' folder",
                    root.display()
                )?;
            }
            other => writeln!(self.out, "[ERROR] {other}")?,
        }
        self.out.flush()
    }
}

#[derive(Serialize)]
struct JsonDocument<'a> {
    artifacts: &'a [ArtifactOutcome],
    summary: &'a SummaryReport,
}

#[derive(Serialize)]
struct JsonAbort {
    error: String,
    exit_code: u8,
}

/// Machine-readable report, written in one piece at the end of the run.
#[derive(Debug)]
pub struct JsonReport<W> {
    out: W,
    artifacts: Vec<ArtifactOutcome>,
}

impl<W: Write> JsonReport<W> {
    /// Report to `out`.
    pub fn new(out: W) -> Self {
        Self {
            out,
            artifacts: Vec::new(),
        }
    }

    fn write_value<T: Serialize>(&mut self, value: &T) -> io::Result<()> {
        serde_json::to_writer_pretty(&mut self.out, value)?;
        writeln!(self.out)?;
        self.out.flush()
    }
}

impl<W: Write> ReportSink for JsonReport<W> {
    fn outcome(&mut self, outcome: &ArtifactOutcome) -> io::Result<()> {
        self.artifacts.push(outcome.clone());
        Ok(())
    }

    fn summary(&mut self, summary: &SummaryReport) -> io::Result<()> {
        let artifacts = std::mem::take(&mut self.artifacts);
        self.write_value(&JsonDocument {
            artifacts: &artifacts,
            summary,
        })
    }

    fn abort(&mut self, error: &RunError) -> io::Result<()> {
        self.write_value(&JsonAbort {
            error: error.to_string(),
            exit_code: error.exit_code(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::Outcome;
    use std::path::PathBuf;

    fn artifact(outcome: Outcome) -> ArtifactOutcome {
        ArtifactOutcome {
            name: "Design Decisions".to_string(),
            data_path: PathBuf::from("knowledge_base/design_decisions.json"),
            schema_path: PathBuf::from("knowledge_base/schemas/design_decisions.schema.json"),
            outcome,
        }
    }

    fn console_text(f: impl FnOnce(&mut ConsoleReport<&mut Vec<u8>>) -> io::Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut ConsoleReport::new(&mut buf)).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn console_pass_block() {
        let text = console_text(|r| r.outcome(&artifact(Outcome::valid())));
        assert_eq!(
            text,
            "Validating Design Decisions...\n\
             \x20 Data: knowledge_base/design_decisions.json\n\
             \x20 Schema: knowledge_base/schemas/design_decisions.schema.json\n\
             \x20 [PASS] Valid\n\n"
        );
    }

    #[test]
    fn console_skip_notes_file_may_not_exist_yet() {
        let text = console_text(|r| r.outcome(&artifact(Outcome::data_not_found())));
        assert!(text.contains("  [SKIP] Data file not found (may not exist yet)\n"));
    }

    #[test]
    fn console_missing_schema_names_location() {
        let text = console_text(|r| r.outcome(&artifact(Outcome::schema_not_found())));
        assert!(text.contains(
            "  [FAIL] Schema file not found: knowledge_base/schemas/design_decisions.schema.json\n"
        ));
    }

    #[test]
    fn console_multiline_message_is_aligned() {
        let outcome = Outcome::new(
            OutcomeKind::SchemaNonconformance,
            "Validation error: bad\nPath: decisions -> 0 -> status",
        );
        let text = console_text(|r| r.outcome(&artifact(outcome)));
        assert!(text.contains("  [FAIL] Validation error: bad\n         Path: decisions -> 0 -> status\n"));
    }

    #[test]
    fn console_summary_success() {
        let summary = SummaryReport::from_outcomes(&[Outcome::valid(), Outcome::data_not_found()]);
        let text = console_text(|r| r.summary(&summary));
        assert!(text.starts_with(&"=".repeat(BANNER_WIDTH)));
        assert!(text.contains("Validation Summary\n"));
        assert!(text.contains("Total: 2 files\n"));
        assert!(text.contains("[PASS] Passed: 1\n"));
        assert!(text.contains("[FAIL] Failed: 0\n"));
        assert!(text.contains("[SKIP] Skipped: 1\n"));
        assert!(text.ends_with("[SUCCESS] All knowledge base files are valid!\n"));
    }

    #[test]
    fn console_summary_warning() {
        let summary = SummaryReport::from_outcomes(&[Outcome::schema_not_found()]);
        let text = console_text(|r| r.summary(&summary));
        assert!(text.ends_with("[WARNING] Some validations failed. Please fix errors above.\n"));
    }

    #[test]
    fn console_abort_for_missing_root() {
        let err = RunError::RootMissing {
            root: PathBuf::from("knowledge_base"),
        };
        let text = console_text(|r| r.abort(&err));
        assert_eq!(
            text,
            "[ERROR] Please run from project root directory\n\
             \x20       Current directory should contain 'knowledge_base/' folder\n"
        );
    }

    #[test]
    fn json_report_is_written_once_at_summary() {
        let mut buf = Vec::new();
        let mut report = JsonReport::new(&mut buf);
        let outcomes = [artifact(Outcome::valid()), artifact(Outcome::data_not_found())];
        for o in &outcomes {
            report.outcome(o).unwrap();
        }
        assert!(report.out.is_empty());

        let summary = SummaryReport::from_outcomes(outcomes.iter().map(|o| &o.outcome));
        report.summary(&summary).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();

        assert_eq!(value["artifacts"].as_array().unwrap().len(), 2);
        assert_eq!(value["artifacts"][0]["name"], "Design Decisions");
        assert_eq!(value["artifacts"][0]["outcome"]["status"], "PASS");
        assert_eq!(value["artifacts"][1]["outcome"]["status"], "SKIP");
        assert_eq!(value["summary"]["total"], 2);
        assert_eq!(value["summary"]["all_valid"], true);
    }

    #[test]
    fn json_abort_carries_exit_code() {
        let mut buf = Vec::new();
        let err = RunError::RootMissing {
            root: PathBuf::from("kb"),
        };
        JsonReport::new(&mut buf).abort(&err).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value["exit_code"], 2);
        assert_eq!(value["error"], "knowledge base root not found: kb");
    }
}
