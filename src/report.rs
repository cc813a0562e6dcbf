//! Execution report in CTRF shape.
//!
//! Every attempted stack yields exactly one outcome; the summary is derived
//! from the recorded outcomes, never tracked separately. The report file is
//! written once, after the full pass, and is the single source of truth for
//! per-stack results.

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

const TOOL_NAME: &str = "portside";

/// Outcome status of one stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Passed,
    Failed,
}

/// Recorded result of attempting one desired stack.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackOutcome {
    pub name: String,
    pub status: Status,
    /// Elapsed wall-clock milliseconds for this stack.
    pub duration: u64,
    pub message: String,
}

impl StackOutcome {
    pub fn passed(name: &str, message: &str, duration: u64) -> Self {
        Self {
            name: name.to_string(),
            status: Status::Passed,
            duration,
            message: message.to_string(),
        }
    }

    pub fn failed(name: &str, message: String, duration: u64) -> Self {
        Self {
            name: name.to_string(),
            status: Status::Failed,
            duration,
            message,
        }
    }

    pub fn is_passed(&self) -> bool {
        self.status == Status::Passed
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tool {
    pub name: String,
}

/// Aggregated counts plus run timestamps (epoch milliseconds).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Summary {
    pub tests: usize,
    pub passed: usize,
    pub failed: usize,
    pub pending: usize,
    pub skipped: usize,
    pub other: usize,
    pub start: i64,
    pub stop: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Results {
    pub tool: Tool,
    pub summary: Summary,
    pub tests: Vec<StackOutcome>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub results: Results,
}

impl Report {
    /// Whether the whole run succeeded (no failed stack).
    pub fn is_success(&self) -> bool {
        self.results.summary.failed == 0
    }

    /// Persist the report, exactly once per run.
    pub fn write(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)
            .with_context(|| format!("Could not write report to {}", path.display()))?;
        Ok(())
    }
}

/// Builds the report across a deploy pass.
///
/// Construct before the pass, `record` once per attempted stack, `finish`
/// after the last one.
#[derive(Debug)]
pub struct ReportBuilder {
    started_at: i64,
    outcomes: Vec<StackOutcome>,
}

impl ReportBuilder {
    /// Start the clock for a new run.
    pub fn start() -> Self {
        Self {
            started_at: Utc::now().timestamp_millis(),
            outcomes: Vec::new(),
        }
    }

    /// Append the outcome of one attempted stack.
    pub fn record(&mut self, outcome: StackOutcome) {
        self.outcomes.push(outcome);
    }

    /// Stop the clock and assemble the report.
    pub fn finish(self) -> Report {
        let passed = self.outcomes.iter().filter(|o| o.is_passed()).count();
        let failed = self.outcomes.len() - passed;

        Report {
            results: Results {
                tool: Tool {
                    name: TOOL_NAME.to_string(),
                },
                summary: Summary {
                    tests: self.outcomes.len(),
                    passed,
                    failed,
                    pending: 0,
                    skipped: 0,
                    other: 0,
                    start: self.started_at,
                    stop: Utc::now().timestamp_millis(),
                },
                tests: self.outcomes,
            },
        }
    }
}
