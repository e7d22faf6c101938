use anyhow::Result;
use pdfsift::{start_batch, BatchEvent, BatchPaths, ExtractConfig, JobStatus, Reporter};
use tracing::warn;

pub async fn run(paths: BatchPaths, config: ExtractConfig, json: bool) -> Result<()> {
    let mut handle = start_batch(paths, config)?;

    let cancel = handle.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted; cancelling remaining jobs");
            cancel.cancel();
        }
    });

    let mut reporter = Reporter::new();
    while let Some(event) = handle.next_event().await {
        reporter.record(&event);

        if json {
            println!("{}", serde_json::to_string(&event)?);
            continue;
        }
        match &event {
            BatchEvent::Started { total, .. } => println!("Processing {} job(s)...", total),
            BatchEvent::JobFinished { result } => {
                let outcome = match &result.status {
                    JobStatus::Success => format!("{} page(s)", result.pages_extracted),
                    JobStatus::EmptyMatch => "no pages".to_string(),
                    JobStatus::Error { .. } => "failed".to_string(),
                    JobStatus::Cancelled => "cancelled".to_string(),
                };
                println!(
                    "[{:>3.0}%] {}: {}",
                    reporter.percent(),
                    result.output_name,
                    outcome
                );
            }
            BatchEvent::Diagnostic(_) => {}
        }
    }

    let summary = handle.wait().await?;
    if json {
        println!("{}", serde_json::to_string(&summary)?);
    } else {
        println!();
        println!("{}", summary);
    }

    Ok(())
}
