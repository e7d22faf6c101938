use anyhow::Result;
use pdfsift::joblist::read_job_list;
use pdfsift::{validate_inputs, BatchPaths, ExtractConfig};

pub fn run(paths: &BatchPaths, config: &ExtractConfig) -> Result<()> {
    validate_inputs(paths)?;
    let list = read_job_list(&paths.job_list, config.leniency)?;

    println!("Job list: {}", paths.job_list.display());
    println!("Source: {}", paths.source.display());
    println!("Output folder: {}", paths.output_dir.display());
    println!("Jobs: {}", list.jobs.len());
    if list.skipped_rows > 0 {
        println!("Malformed rows skipped: {}", list.skipped_rows);
    }

    Ok(())
}
