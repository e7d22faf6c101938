use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::pages::PageListError;

/// Which of the three batch inputs a validation failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    JobList,
    SourceDocument,
    OutputDir,
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputKind::JobList => f.write_str("Job list file not found"),
            InputKind::SourceDocument => f.write_str("PDF file not found"),
            InputKind::OutputDir => f.write_str("Output folder does not exist"),
        }
    }
}

/// Failures that stop a whole batch before (or instead of) running jobs.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("{kind}: {}", path.display())]
    InputNotFound { kind: InputKind, path: PathBuf },

    #[error("Cannot access {}: {source}", path.display())]
    InputNotAccessible {
        kind: InputKind,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read job list {}: {source}", path.display())]
    JobList {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("Malformed job list row {row}: {reason}")]
    MalformedRow { row: usize, reason: String },

    #[error("Malformed page list in job list row {row}: {source}")]
    MalformedPageList {
        row: usize,
        #[source]
        source: PageListError,
    },

    #[error("Batch worker failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Failures scoped to a single job; never abort sibling jobs.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("failed to open source document: {0:#}")]
    Open(anyhow::Error),

    #[error("failed to read text of page {page}: {source:#}")]
    PageText {
        page: u32,
        #[source]
        source: anyhow::Error,
    },

    #[error("invalid output name {0:?}")]
    InvalidName(String),

    #[error("invalid match pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("failed to build output document: {0:#}")]
    Build(anyhow::Error),

    #[error("failed to write {}: {source:#}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("cancelled")]
    Cancelled,
}
