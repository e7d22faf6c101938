mod common;

use common::{read_pages, write_jobs, write_pdf};
use pdfsift::config::{ExtractConfig, TokenMode};
use pdfsift::{start_batch, BatchEvent, BatchPaths, JobStatus};
use tempfile::TempDir;

const SOURCE_PAGES: [&str; 5] = [
    "page one",
    "page two ABC123",
    "page three",
    "page four ABC123",
    "page five",
];

struct Workspace {
    input: TempDir,
    output: TempDir,
}

impl Workspace {
    fn new(rows: &[Vec<&str>]) -> Self {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        write_pdf(&input.path().join("source.pdf"), &SOURCE_PAGES);
        write_jobs(&input.path().join("jobs.csv"), rows);
        Workspace { input, output }
    }

    fn paths(&self) -> BatchPaths {
        BatchPaths::new(
            self.input.path().join("jobs.csv"),
            self.input.path().join("source.pdf"),
            self.output.path(),
        )
    }

    fn output_pages(&self, name: &str) -> Vec<String> {
        read_pages(&self.output.path().join(format!("{}.pdf", name)))
    }

    fn output_files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.output.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

fn scenario_rows() -> Vec<Vec<&'static str>> {
    vec![
        vec!["partA", "ABC123", ""],
        vec!["partB", "", "1,3,3"],
        vec!["partC", "ZZZ", ""],
        vec!["malformed", "ABC123"],
        vec!["partD", "ABC123", "5,1"],
    ]
}

#[tokio::test]
async fn extracts_each_job_in_source_order() {
    let ws = Workspace::new(&scenario_rows());
    let mut handle = start_batch(ws.paths(), ExtractConfig::default()).unwrap();

    let mut ticks = 0;
    let mut last_percent = 0.0;
    let mut reporter = pdfsift::Reporter::new();
    while let Some(event) = handle.next_event().await {
        reporter.record(&event);
        if let BatchEvent::JobFinished { .. } = event {
            ticks += 1;
            last_percent = reporter.percent();
        }
    }
    let summary = handle.wait().await.unwrap();

    // the two-column row is not a job
    assert_eq!(summary.total, 4);
    assert_eq!(summary.skipped_rows, 1);
    assert_eq!(ticks, 4);
    assert_eq!(last_percent, 100.0);

    assert_eq!(
        ws.output_pages("partA"),
        vec!["page two ABC123", "page four ABC123"]
    );
    assert_eq!(ws.output_pages("partB"), vec!["page one", "page three"]);
    assert_eq!(
        ws.output_pages("partD"),
        vec!["page one", "page two ABC123", "page four ABC123", "page five"]
    );
    assert_eq!(ws.output_files(), vec!["partA.pdf", "partB.pdf", "partD.pdf"]);

    let part_c = summary
        .results
        .iter()
        .find(|r| r.output_name == "partC")
        .unwrap();
    assert_eq!(part_c.status, JobStatus::EmptyMatch);
    assert_eq!(summary.diagnostics.len(), 1);
    assert!(summary.diagnostics[0].message.contains("ZZZ"));
    assert_eq!(
        summary.terminal_message(),
        "Extraction complete (1 diagnostic(s))"
    );
}

#[tokio::test]
async fn per_job_handles_match_shared_source() {
    for (share_source, workers) in [(true, 1), (false, 4), (false, 1)] {
        let ws = Workspace::new(&scenario_rows());
        let config = ExtractConfig {
            share_source,
            workers,
            ..Default::default()
        };
        let summary = start_batch(ws.paths(), config)
            .unwrap()
            .wait()
            .await
            .unwrap();

        assert_eq!(summary.succeeded, 3, "share_source={}", share_source);
        assert_eq!(
            ws.output_pages("partA"),
            vec!["page two ABC123", "page four ABC123"]
        );
        assert_eq!(ws.output_pages("partB"), vec!["page one", "page three"]);
    }
}

#[tokio::test]
async fn duplicate_names_leave_one_complete_file() {
    let ws = Workspace::new(&[
        vec!["same", "ABC123", ""],
        vec!["same", "", "1,3,5"],
        vec!["same", "page", ""],
    ]);
    let summary = start_batch(ws.paths(), ExtractConfig::default())
        .unwrap()
        .wait()
        .await
        .unwrap();
    assert_eq!(summary.succeeded, 3);

    // no temporary files left behind, and the survivor is one job's whole output
    assert_eq!(ws.output_files(), vec!["same.pdf"]);
    let pages = ws.output_pages("same").len();
    assert!([2, 3, 5].contains(&pages), "unexpected page count {}", pages);
}

#[tokio::test]
async fn regex_tokens_unless_literal() {
    let rows = vec![
        vec!["dotted", "ABC.23", ""],
        vec!["alternation", "page t(wo|hree)", ""],
    ];

    let ws = Workspace::new(&rows);
    start_batch(ws.paths(), ExtractConfig::default())
        .unwrap()
        .wait()
        .await
        .unwrap();
    assert_eq!(ws.output_pages("dotted").len(), 2);
    assert_eq!(
        ws.output_pages("alternation"),
        vec!["page two ABC123", "page three"]
    );

    let ws = Workspace::new(&rows);
    let config = ExtractConfig {
        token_mode: TokenMode::Literal,
        ..Default::default()
    };
    let summary = start_batch(ws.paths(), config)
        .unwrap()
        .wait()
        .await
        .unwrap();
    assert_eq!(summary.empty, 2);
    assert!(ws.output_files().is_empty());
}

#[tokio::test]
async fn missing_output_dir_fails_before_any_job() {
    let ws = Workspace::new(&scenario_rows());
    let mut paths = ws.paths();
    paths.output_dir = ws.input.path().join("missing");

    let err = start_batch(paths, ExtractConfig::default()).err().unwrap();
    assert!(err.to_string().starts_with("Output folder does not exist"));
}
