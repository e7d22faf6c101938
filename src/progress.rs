//! Batch progress events and the summary built from them.

use serde::Serialize;
use std::fmt;

use crate::executor::{JobResult, JobStatus};

/// Message shown once every job has been accounted for.
pub const COMPLETE_MESSAGE: &str = "Extraction complete";

/// What the batch engine tells its caller while it runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BatchEvent {
    /// The job list was read; `total` jobs will each produce one `JobFinished`.
    Started { total: usize, skipped_rows: usize },
    /// One progress tick, whatever the job's outcome.
    JobFinished { result: JobResult },
    /// Follows the `JobFinished` of any job that did not simply succeed.
    Diagnostic(Diagnostic),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub row: usize,
    pub output_name: String,
    pub message: String,
}

impl Diagnostic {
    pub fn from_result(result: &JobResult) -> Option<Self> {
        result.diagnostic().map(|message| Diagnostic {
            row: result.row,
            output_name: result.output_name.clone(),
            message,
        })
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row {}: {}", self.row, self.message)
    }
}

/// Folds batch events into a running percentage and, at the end, a summary.
#[derive(Debug, Default)]
pub struct Reporter {
    total: usize,
    skipped_rows: usize,
    results: Vec<JobResult>,
    diagnostics: Vec<Diagnostic>,
}

impl Reporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, event: &BatchEvent) {
        match event {
            BatchEvent::Started {
                total,
                skipped_rows,
            } => {
                self.total = *total;
                self.skipped_rows = *skipped_rows;
            }
            BatchEvent::JobFinished { result } => self.results.push(result.clone()),
            BatchEvent::Diagnostic(diagnostic) => self.diagnostics.push(diagnostic.clone()),
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn completed(&self) -> usize {
        self.results.len()
    }

    /// Completed jobs as a percentage of the total; an empty batch is 100%.
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        (self.completed().min(self.total) as f64 / self.total as f64) * 100.0
    }

    pub fn is_complete(&self) -> bool {
        self.completed() >= self.total
    }

    /// The most recently received diagnostic.
    pub fn latest_diagnostic(&self) -> Option<&Diagnostic> {
        self.diagnostics.last()
    }

    pub fn finish(self) -> BatchSummary {
        let mut summary = BatchSummary {
            total: self.total,
            skipped_rows: self.skipped_rows,
            last_diagnostic: self.diagnostics.last().cloned(),
            ..Default::default()
        };

        for result in &self.results {
            match result.status {
                JobStatus::Success => summary.succeeded += 1,
                JobStatus::EmptyMatch => summary.empty += 1,
                JobStatus::Error { .. } => summary.failed += 1,
                JobStatus::Cancelled => summary.cancelled += 1,
            }
            summary.pages_extracted += result.pages_extracted;
        }

        summary.results = self.results;
        summary.results.sort_by_key(|r| r.row);
        summary.diagnostics = self.diagnostics;
        summary.diagnostics.sort_by_key(|d| d.row);
        summary
    }
}

/// End-of-batch report. Results and diagnostics are in job-list order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub skipped_rows: usize,
    pub succeeded: usize,
    pub empty: usize,
    pub failed: usize,
    pub cancelled: usize,
    pub pages_extracted: usize,
    pub results: Vec<JobResult>,
    pub diagnostics: Vec<Diagnostic>,
    /// Diagnostic that arrived last, regardless of row order
    pub last_diagnostic: Option<Diagnostic>,
}

impl BatchSummary {
    pub fn terminal_message(&self) -> String {
        match self.diagnostics.len() {
            0 => COMPLETE_MESSAGE.to_string(),
            n => format!("{} ({} diagnostic(s))", COMPLETE_MESSAGE, n),
        }
    }

    pub fn last_diagnostic(&self) -> Option<&Diagnostic> {
        self.last_diagnostic.as_ref()
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.terminal_message())?;
        write!(
            f,
            "{} job(s): {} written, {} empty, {} failed",
            self.total, self.succeeded, self.empty, self.failed
        )?;
        if self.cancelled > 0 {
            write!(f, ", {} cancelled", self.cancelled)?;
        }
        if self.skipped_rows > 0 {
            write!(f, "; {} malformed row(s) skipped", self.skipped_rows)?;
        }
        for diagnostic in &self.diagnostics {
            write!(f, "\n  {}", diagnostic)?;
        }
        Ok(())
    }
}
