mod cli;
mod commands;
mod logging;
mod mcp;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use pdfsift::BatchPaths;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match cli.command {
        Commands::Mcp => {
            mcp::run_server().await?;
        }
        Commands::Batch {
            job_list,
            source,
            output_dir,
            json,
            config,
        } => {
            let paths = BatchPaths::new(job_list, source, output_dir);
            commands::batch::run(paths, config.resolve()?, json).await?;
        }
        Commands::Validate {
            job_list,
            source,
            output_dir,
            config,
        } => {
            let paths = BatchPaths::new(job_list, source, output_dir);
            commands::validate::run(&paths, &config.resolve()?)?;
        }
        Commands::Preview {
            source,
            token,
            pages,
            config,
        } => {
            commands::preview::run(&source, &token, &pages, &config.resolve()?)?;
        }
    }

    Ok(())
}
