//! Running one job against the source document.

use serde::Serialize;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::config::{ExtractConfig, TextEngine};
use crate::error::JobError;
use crate::joblist::Job;
use crate::matcher::{match_pages, TokenPattern};
use crate::pdf::SourceDocument;

/// How jobs reach the source document.
pub enum SourceAccess {
    /// One parsed document shared read-only by every job
    Shared(Arc<SourceDocument>),
    /// Each job opens its own handle to the same path
    PerJob { path: PathBuf, engine: TextEngine },
}

impl SourceAccess {
    /// Open the source for a batch. If sharing is enabled but the document
    /// cannot be opened, falls back to per-job handles so that each job
    /// reports the failure itself.
    pub fn open(path: &Path, config: &ExtractConfig) -> Self {
        if config.share_source {
            match SourceDocument::open(path, config.text_engine) {
                Ok(doc) => {
                    debug!(pages = doc.page_count(), "opened shared source document");
                    return SourceAccess::Shared(Arc::new(doc));
                }
                Err(e) => warn!(error = %format!("{:#}", e), "falling back to per-job source handles"),
            }
        }
        SourceAccess::PerJob {
            path: path.to_path_buf(),
            engine: config.text_engine,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobStatus {
    Success,
    EmptyMatch,
    Error { message: String },
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobResult {
    pub row: usize,
    pub output_name: String,
    pub search_token: String,
    pub pages_extracted: usize,
    pub output_path: Option<PathBuf>,
    #[serde(flatten)]
    pub status: JobStatus,
}

impl JobResult {
    pub fn for_job(job: &Job, status: JobStatus) -> Self {
        JobResult {
            row: job.row,
            output_name: job.output_name.clone(),
            search_token: job.search_token.clone(),
            pages_extracted: 0,
            output_path: None,
            status,
        }
    }

    /// Human-readable line for anything other than a plain success.
    pub fn diagnostic(&self) -> Option<String> {
        match &self.status {
            JobStatus::Success => None,
            JobStatus::EmptyMatch => Some(format!(
                "No pages found with token {:?} for {}",
                self.search_token, self.output_name
            )),
            JobStatus::Error { message } => Some(format!(
                "Error processing {:?} for {}: {}",
                self.search_token, self.output_name, message
            )),
            JobStatus::Cancelled => Some(format!("Cancelled before finishing {}", self.output_name)),
        }
    }
}

/// `{output_dir}/{name}.{extension}`
pub fn output_path(output_dir: &Path, name: &str, extension: &str) -> PathBuf {
    output_dir.join(format!("{}.{}", name, extension))
}

/// Output names are file stems: no directories, no parent references.
fn check_output_name(name: &str) -> Result<(), JobError> {
    // "a/" parses as the single component "a"
    if name.contains('/') || name.contains(std::path::MAIN_SEPARATOR) {
        return Err(JobError::InvalidName(name.to_string()));
    }
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(JobError::InvalidName(name.to_string())),
    }
}

/// Run one job. Never fails: every error becomes `JobStatus::Error`.
pub fn run_job(
    source: &SourceAccess,
    job: &Job,
    output_dir: &Path,
    config: &ExtractConfig,
    cancel: &CancellationToken,
) -> JobResult {
    let mut result = JobResult::for_job(job, JobStatus::Success);

    match execute(source, job, output_dir, config, cancel) {
        Ok(Some((pages, path))) => {
            debug!(job = %job.output_name, pages, path = %path.display(), "wrote output");
            result.pages_extracted = pages;
            result.output_path = Some(path);
        }
        Ok(None) => {
            debug!(job = %job.output_name, "no pages matched");
            result.status = JobStatus::EmptyMatch;
        }
        Err(JobError::Cancelled) => result.status = JobStatus::Cancelled,
        Err(e) => {
            error!(job = %job.output_name, row = job.row, error = %e, "job failed");
            result.status = JobStatus::Error {
                message: e.to_string(),
            };
        }
    }
    result
}

fn execute(
    source: &SourceAccess,
    job: &Job,
    output_dir: &Path,
    config: &ExtractConfig,
    cancel: &CancellationToken,
) -> Result<Option<(usize, PathBuf)>, JobError> {
    if cancel.is_cancelled() {
        return Err(JobError::Cancelled);
    }
    check_output_name(&job.output_name)?;
    let pattern = TokenPattern::compile(&job.search_token, config.token_mode)?;

    let opened;
    let doc: &SourceDocument = match source {
        SourceAccess::Shared(doc) => doc.as_ref(),
        SourceAccess::PerJob { path, engine } => {
            opened = SourceDocument::open(path, *engine).map_err(JobError::Open)?;
            &opened
        }
    };

    let pages = match_pages(doc, &pattern, &job.explicit_pages, cancel)?;
    if pages.is_empty() {
        return Ok(None);
    }

    let mut new_doc = doc.extract_pages(&pages).map_err(JobError::Build)?;
    if cancel.is_cancelled() {
        return Err(JobError::Cancelled);
    }

    let path = output_path(output_dir, &job.output_name, &config.extension);
    SourceDocument::save_atomic(&mut new_doc, &path).map_err(|source| JobError::Write {
        path: path.clone(),
        source,
    })?;
    Ok(Some((pages.len(), path)))
}
