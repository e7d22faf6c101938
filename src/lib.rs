//! Batch page extraction: copy the pages of one source PDF that match each
//! row of a job list into a separately named output PDF per row.

pub mod batch;
pub mod config;
pub mod error;
pub mod executor;
pub mod joblist;
pub mod matcher;
pub mod pages;
pub mod pdf;
pub mod progress;

pub use batch::{run_batch, start_batch, validate_inputs, BatchHandle, BatchPaths};
pub use config::ExtractConfig;
pub use error::{BatchError, JobError};
pub use executor::{JobResult, JobStatus};
pub use progress::{BatchEvent, BatchSummary, Reporter};
