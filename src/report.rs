#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Panel, Style, object::{Columns, Rows}},
};

use crate::{
    capture::CapturedOutput,
    check::{CheckOutcome, CheckSpec},
    config::Settings,
    constants::{EXIT_FAILED, EXIT_MISCONFIGURED, EXIT_PASSED},
    render::Transcript,
};

/// One row of the summary table.
#[derive(Tabled)]
struct SummaryRow {
    /// Name of the check.
    #[tabled(rename = "Check")]
    name:      String,
    /// Passed, failed or misconfigured.
    #[tabled(rename = "Result")]
    result:    String,
    /// Number of successes.
    #[tabled(rename = "Successes")]
    successes: String,
    /// Number of infos.
    #[tabled(rename = "Infos")]
    infos:     String,
    /// Number of warnings.
    #[tabled(rename = "Warnings")]
    warnings:  String,
    /// Number of failures.
    #[tabled(rename = "Failures")]
    failures:  String,
    /// Number of crashes.
    #[tabled(rename = "Crashes")]
    crashes:   String,
}

impl From<&CheckOutcome> for SummaryRow {
    fn from(outcome: &CheckOutcome) -> Self {
        match outcome {
            CheckOutcome::Graded(graded) => {
                let statistics = graded.statistics();
                Self {
                    name:      graded.name.clone(),
                    result:    if graded.passed() { "passed" } else { "failed" }.to_string(),
                    successes: statistics.successes.to_string(),
                    infos:     statistics.infos.to_string(),
                    warnings:  statistics.warnings.to_string(),
                    failures:  statistics.failures.to_string(),
                    crashes:   statistics.crashes.to_string(),
                }
            }
            CheckOutcome::Misconfigured { name, .. } => Self {
                name:      name.clone(),
                result:    "misconfigured".to_string(),
                successes: "-".to_string(),
                infos:     "-".to_string(),
                warnings:  "-".to_string(),
                failures:  "-".to_string(),
                crashes:   "-".to_string(),
            },
        }
    }
}

/// The outcome of every check run against one captured output.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    /// Outcomes, in the order the checks were given.
    pub outcomes: Vec<CheckOutcome>,
}

impl Report {
    /// Runs every check against `output`.
    pub fn run(checks: &[CheckSpec], output: &CapturedOutput, settings: &Settings) -> Self {
        Self {
            outcomes: checks
                .iter()
                .map(|check| check.run(output, settings))
                .collect(),
        }
    }

    /// Whether every check ran and passed.
    pub fn passed(&self) -> bool {
        self.outcomes.iter().all(CheckOutcome::passed)
    }

    /// Process exit code: misconfiguration trumps failure.
    pub fn exit_code(&self) -> i32 {
        if self.outcomes.iter().any(CheckOutcome::is_misconfigured) {
            EXIT_MISCONFIGURED
        } else if self.passed() {
            EXIT_PASSED
        } else {
            EXIT_FAILED
        }
    }

    /// A table with one row per check.
    pub fn summary_table(&self) -> String {
        let rows: Vec<SummaryRow> = self.outcomes.iter().map(SummaryRow::from).collect();
        let passed = self.outcomes.iter().filter(|o| o.passed()).count();
        Table::new(rows)
            .with(Modify::new(Columns::new(2..)).with(Alignment::right()))
            .with(Panel::footer(format!(
                "{passed} of {} checks passed",
                self.outcomes.len()
            )))
            .with(Modify::new(Rows::last()).with(Alignment::center()))
            .with(Style::modern())
            .to_string()
    }

    /// Every check's annotated output, followed by the summary table.
    pub fn render(&self, color: bool) -> String {
        let mut sections = Vec::new();

        for outcome in &self.outcomes {
            let title = format!("== {} ==", outcome.name());
            sections.push(if color {
                title.bold().to_string()
            } else {
                title
            });

            match outcome {
                CheckOutcome::Graded(graded) => {
                    for transcript in &graded.analysis.transcripts {
                        sections.push(transcript.render(color));
                    }
                    if !graded.status.is_empty() {
                        let status = Transcript {
                            tail: graded.status.clone(),
                            ..Default::default()
                        };
                        sections.push(status.render(color));
                    }
                    sections.push(format!("Result: {}", graded.statistics()));
                }
                CheckOutcome::Misconfigured { error, .. } => {
                    let message = format!("This check is misconfigured: {error}");
                    sections.push(if color {
                        message.magenta().to_string()
                    } else {
                        message
                    });
                }
            }
            sections.push(String::new());
        }

        sections.push(self.summary_table());
        sections.join("\n")
    }

    /// The report as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Could not serialize report to JSON")
    }
}
