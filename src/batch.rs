//! Batch coordination: validate inputs, read the job list, and run every job
//! on a bounded pool of workers against one source document.
//!
//! ```text
//! validate_inputs ─► read_job_list ─► open source ─┬─► worker ─┐
//!                                                  ├─► worker ─┼─► events ─► Reporter ─► BatchSummary
//!                                                  └─► worker ─┘
//! ```
//!
//! Jobs may finish, and write their files, in any order. Two jobs with the
//! same output name race: whichever finishes last owns the file.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::ExtractConfig;
use crate::error::{BatchError, InputKind};
use crate::executor::{run_job, JobResult, JobStatus, SourceAccess};
use crate::joblist::{read_job_list, Job};
use crate::progress::{BatchEvent, BatchSummary, Diagnostic, Reporter};

/// The three paths a batch needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchPaths {
    pub job_list: PathBuf,
    pub source: PathBuf,
    pub output_dir: PathBuf,
}

impl BatchPaths {
    pub fn new(
        job_list: impl Into<PathBuf>,
        source: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        BatchPaths {
            job_list: job_list.into(),
            source: source.into(),
            output_dir: output_dir.into(),
        }
    }
}

/// Check that the job list and source exist as readable files and the
/// output directory exists and is writable, in that order.
pub fn validate_inputs(paths: &BatchPaths) -> Result<(), BatchError> {
    let checks: [(InputKind, &Path, fn(&Path) -> bool); 3] = [
        (InputKind::JobList, &paths.job_list, Path::is_file),
        (InputKind::SourceDocument, &paths.source, Path::is_file),
        (InputKind::OutputDir, &paths.output_dir, Path::is_dir),
    ];
    for (kind, path, exists) in checks {
        if !exists(path) {
            return Err(BatchError::InputNotFound {
                kind,
                path: path.to_path_buf(),
            });
        }
        check_access(kind, path).map_err(|source| BatchError::InputNotAccessible {
            kind,
            path: path.to_path_buf(),
            source,
        })?;
    }
    Ok(())
}

fn check_access(kind: InputKind, path: &Path) -> io::Result<()> {
    match kind {
        InputKind::OutputDir => {
            if fs::metadata(path)?.permissions().readonly() {
                return Err(io::Error::new(
                    io::ErrorKind::PermissionDenied,
                    "directory is read-only",
                ));
            }
            Ok(())
        }
        InputKind::JobList | InputKind::SourceDocument => File::open(path).map(drop),
    }
}

/// A running batch.
pub struct BatchHandle {
    events: mpsc::UnboundedReceiver<BatchEvent>,
    cancel: CancellationToken,
    task: JoinHandle<Result<BatchSummary, BatchError>>,
}

impl BatchHandle {
    /// Next progress event; `None` once the batch has finished.
    pub async fn next_event(&mut self) -> Option<BatchEvent> {
        self.events.recv().await
    }

    /// Stop starting new jobs and ask running ones to stop early. Every job
    /// still reports a result, so progress always reaches 100%.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Wait for the batch and return its summary. Unread events are dropped.
    pub async fn wait(self) -> Result<BatchSummary, BatchError> {
        drop(self.events);
        self.task.await?
    }
}

/// Validate inputs and start a batch on the current Tokio runtime.
///
/// Fails immediately, without extracting anything, if an input is missing.
pub fn start_batch(paths: BatchPaths, config: ExtractConfig) -> Result<BatchHandle, BatchError> {
    validate_inputs(&paths)?;

    let (tx, rx) = mpsc::unbounded_channel();
    let cancel = CancellationToken::new();
    let task = tokio::spawn(run_batch(paths, config, tx, cancel.clone()));

    Ok(BatchHandle {
        events: rx,
        cancel,
        task,
    })
}

/// Run a whole batch, sending progress to `events`.
///
/// Only a missing input or an unreadable job list fails the batch; every
/// per-job problem is reported through that job's result instead.
pub async fn run_batch(
    paths: BatchPaths,
    config: ExtractConfig,
    events: mpsc::UnboundedSender<BatchEvent>,
    cancel: CancellationToken,
) -> Result<BatchSummary, BatchError> {
    validate_inputs(&paths)?;
    let config = config.normalized();

    let job_list_path = paths.job_list.clone();
    let leniency = config.leniency;
    let list =
        tokio::task::spawn_blocking(move || read_job_list(&job_list_path, leniency)).await??;

    let total = list.jobs.len();
    info!(
        jobs = total,
        skipped = list.skipped_rows,
        workers = config.workers,
        source = %paths.source.display(),
        "starting batch"
    );
    warn_duplicate_names(&list.jobs);

    let mut reporter = Reporter::new();
    emit(
        &mut reporter,
        &events,
        BatchEvent::Started {
            total,
            skipped_rows: list.skipped_rows,
        },
    );

    if total > 0 {
        let source_path = paths.source.clone();
        let open_config = config.clone();
        let source = Arc::new(
            tokio::task::spawn_blocking(move || SourceAccess::open(&source_path, &open_config))
                .await?,
        );

        let config = Arc::new(config);
        let output_dir: Arc<Path> = Arc::from(paths.output_dir.as_path());
        let semaphore = Arc::new(Semaphore::new(config.workers));
        let mut workers = JoinSet::new();

        for job in list.jobs {
            workers.spawn(run_pooled(
                job,
                source.clone(),
                output_dir.clone(),
                config.clone(),
                semaphore.clone(),
                cancel.clone(),
            ));
        }

        while let Some(joined) = workers.join_next().await {
            let result = joined?;
            let diagnostic = Diagnostic::from_result(&result);
            emit(&mut reporter, &events, BatchEvent::JobFinished { result });
            if let Some(diagnostic) = diagnostic {
                emit(&mut reporter, &events, BatchEvent::Diagnostic(diagnostic));
            }
        }
        // last reference to the shared source goes here
        drop(source);
    }

    let summary = reporter.finish();
    info!(
        written = summary.succeeded,
        empty = summary.empty,
        failed = summary.failed,
        cancelled = summary.cancelled,
        "{}",
        summary.terminal_message()
    );
    Ok(summary)
}

fn emit(reporter: &mut Reporter, events: &mpsc::UnboundedSender<BatchEvent>, event: BatchEvent) {
    reporter.record(&event);
    // a caller that stopped listening still gets the summary
    let _ = events.send(event);
}

/// Wait for a pool slot, then run the job on the blocking thread pool.
async fn run_pooled(
    job: Job,
    source: Arc<SourceAccess>,
    output_dir: Arc<Path>,
    config: Arc<ExtractConfig>,
    semaphore: Arc<Semaphore>,
    cancel: CancellationToken,
) -> JobResult {
    let permit = tokio::select! {
        _ = cancel.cancelled() => None,
        permit = semaphore.acquire_owned() => permit.ok(),
    };
    let Some(_permit) = permit else {
        return JobResult::for_job(&job, JobStatus::Cancelled);
    };

    debug!(job = %job.output_name, row = job.row, "job started");
    let fallback = JobResult::for_job(&job, JobStatus::Success);
    let outcome = tokio::task::spawn_blocking(move || {
        run_job(&source, &job, &output_dir, &config, &cancel)
    })
    .await;

    match outcome {
        Ok(result) => result,
        Err(e) => JobResult {
            status: JobStatus::Error {
                message: format!("worker failed: {}", e),
            },
            ..fallback
        },
    }
}

fn warn_duplicate_names(jobs: &[Job]) {
    let mut seen = HashSet::new();
    for job in jobs {
        if !seen.insert(job.output_name.as_str()) {
            warn!(
                job = %job.output_name,
                row = job.row,
                "duplicate output name; the last job to finish wins"
            );
        }
    }
}
