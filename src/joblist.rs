//! Reading the batch job list.
//!
//! The job list is a table with a header row followed by one row per job.
//! Only the first three columns matter, in this order: output name, match
//! token, explicit pages. Workbooks (`.xlsx`, `.xlsm`, `.xlsb`, `.xls`,
//! `.ods`) are read from their first sheet; `.csv` files are read as-is.

use anyhow::{anyhow, Context};
use calamine::{open_workbook_auto, Data, Range, Reader};
use std::path::Path;
use tracing::{debug, warn};

use crate::config::LeniencyPolicy;
use crate::error::BatchError;
use crate::pages::{resolve_page_list, PageSet};

/// One extraction request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    /// 1-based row in the job list, header included
    pub row: usize,
    /// File stem of the output document; should be unique per batch
    pub output_name: String,
    pub search_token: String,
    pub explicit_pages: PageSet,
}

#[derive(Debug, Clone, Default)]
pub struct JobList {
    pub jobs: Vec<Job>,
    /// Rows dropped as malformed (lenient mode only)
    pub skipped_rows: usize,
}

/// A single cell, before it is coerced into a job field.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
    /// Booleans, dates, error cells: kept only by their display form
    Other(String),
}

impl Field {
    /// Text of a name or token cell. Whole numbers lose their ".0".
    fn as_text(&self) -> String {
        match self {
            Field::Empty => String::new(),
            Field::Text(s) | Field::Other(s) => s.clone(),
            Field::Int(n) => n.to_string(),
            Field::Float(f) => format_float(*f),
        }
    }

    /// Text of a pages cell. Only strings and whole numbers carry pages.
    fn as_pages(&self) -> String {
        match self {
            Field::Text(s) => s.clone(),
            Field::Int(n) => n.to_string(),
            Field::Float(f) if f.fract() == 0.0 && f.is_finite() => format!("{}", *f as i64),
            _ => String::new(),
        }
    }
}

impl From<&Data> for Field {
    fn from(cell: &Data) -> Self {
        match cell {
            Data::Empty => Field::Empty,
            Data::String(s) if s.is_empty() => Field::Empty,
            Data::String(s) => Field::Text(s.clone()),
            Data::Int(n) => Field::Int(*n),
            Data::Float(f) => Field::Float(*f),
            other => Field::Other(other.to_string()),
        }
    }
}

fn format_float(f: f64) -> String {
    if f.fract() == 0.0 && f.is_finite() && f.abs() < i64::MAX as f64 {
        format!("{}", f as i64)
    } else {
        f.to_string()
    }
}

/// Read and parse a job list from disk.
pub fn read_job_list<P: AsRef<Path>>(path: P, policy: LeniencyPolicy) -> Result<JobList, BatchError> {
    let path = path.as_ref();
    let rows = read_rows(path).map_err(|source| BatchError::JobList {
        path: path.to_path_buf(),
        source,
    })?;
    let list = jobs_from_rows(rows, policy)?;
    debug!(
        path = %path.display(),
        jobs = list.jobs.len(),
        skipped = list.skipped_rows,
        "read job list"
    );
    Ok(list)
}

/// Data rows (header already dropped), paired with their 1-based row number.
fn read_rows(path: &Path) -> anyhow::Result<Vec<(usize, Vec<Field>)>> {
    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));

    if is_csv {
        read_csv_rows(path)
    } else {
        read_workbook_rows(path)
    }
}

fn read_csv_rows(path: &Path) -> anyhow::Result<Vec<(usize, Vec<Field>)>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open CSV: {}", path.display()))?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(rows.len() + 2);
        let fields = record
            .iter()
            .map(|f| {
                if f.is_empty() {
                    Field::Empty
                } else {
                    Field::Text(f.to_string())
                }
            })
            .collect();
        rows.push((row, fields));
    }
    Ok(rows)
}

fn read_workbook_rows(path: &Path) -> anyhow::Result<Vec<(usize, Vec<Field>)>> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("Failed to open workbook: {}", path.display()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| anyhow!("Workbook has no sheets"))??;

    Ok(rows_from_range(&range))
}

/// Rows of a sheet, keyed by their 1-based sheet row. Sheet row 1 is the
/// header wherever the used range starts.
fn rows_from_range(range: &Range<Data>) -> Vec<(usize, Vec<Field>)> {
    // The range starts at the first used cell; pad so column A is always index 0.
    let (first_row, lead_cols) = range
        .start()
        .map(|(r, c)| (r as usize, c as usize))
        .unwrap_or((0, 0));

    range
        .rows()
        .enumerate()
        .map(|(i, cells)| (first_row + i, cells))
        .filter(|(row, _)| *row > 0)
        .map(|(row, cells)| {
            let fields = std::iter::repeat(Field::Empty)
                .take(lead_cols)
                .chain(cells.iter().map(Field::from))
                .collect();
            (row + 1, fields)
        })
        .collect()
}

/// Turn raw data rows into jobs.
///
/// A row is malformed when it has fewer than three fields or an empty output
/// name. Fully blank rows are always ignored. Lenient mode skips malformed
/// rows and drops unparseable page lists; strict mode rejects the list.
pub fn jobs_from_rows<I>(rows: I, policy: LeniencyPolicy) -> Result<JobList, BatchError>
where
    I: IntoIterator<Item = (usize, Vec<Field>)>,
{
    let mut list = JobList::default();

    for (row, fields) in rows {
        if fields.iter().all(|f| *f == Field::Empty) {
            continue;
        }

        let reason = if fields.len() < 3 {
            Some(format!("expected 3 columns, found {}", fields.len()))
        } else if fields[0].as_text().is_empty() {
            Some("empty output name".to_string())
        } else {
            None
        };
        if let Some(reason) = reason {
            match policy {
                LeniencyPolicy::Lenient => {
                    warn!(row, %reason, "skipping job list row");
                    list.skipped_rows += 1;
                    continue;
                }
                LeniencyPolicy::Strict => return Err(BatchError::MalformedRow { row, reason }),
            }
        }

        let explicit_pages = resolve_page_list(&fields[2].as_pages(), policy)
            .map_err(|source| BatchError::MalformedPageList { row, source })?;

        list.jobs.push(Job {
            row,
            output_name: fields[0].as_text(),
            search_token: fields[1].as_text(),
            explicit_pages,
        });
    }

    Ok(list)
}
