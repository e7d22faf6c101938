use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use pdfsift::config::{ExtractConfig, LeniencyPolicy, TextEngine, TokenMode};

#[derive(Parser)]
#[command(name = "pdfsift")]
#[command(about = "Extract pages from a PDF into named documents, driven by a job list")]
#[command(version)]
pub struct Cli {
    /// Log per-job detail (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run every job in a job list against one source PDF
    #[command(alias = "extract")]
    Batch {
        /// Job list (.xlsx, .xls, .ods or .csv): name, token, pages
        job_list: PathBuf,

        /// PDF file to extract from
        source: PathBuf,

        /// Existing directory to write documents into
        #[arg(short, long)]
        output_dir: PathBuf,

        /// Print events and the summary as JSON lines
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        config: ConfigArgs,
    },

    /// Check that batch inputs exist and the job list parses
    Validate {
        /// Job list file
        job_list: PathBuf,

        /// PDF file to extract from
        source: PathBuf,

        /// Output directory
        output_dir: PathBuf,

        #[command(flatten)]
        config: ConfigArgs,
    },

    /// Show which pages a token and page list would select, without writing
    Preview {
        /// PDF file to inspect
        source: PathBuf,

        /// Match token (a regex unless --literal)
        #[arg(short, long, default_value = "")]
        token: String,

        /// Explicit pages (e.g., "1,3,7")
        #[arg(short, long, default_value = "")]
        pages: String,

        #[command(flatten)]
        config: ConfigArgs,
    },

    /// Run as MCP server
    Mcp,
}

#[derive(Args, Debug, Default)]
pub struct ConfigArgs {
    /// TOML config file; flags below override it
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Number of jobs run at once
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Reject malformed rows and page lists instead of skipping them
    #[arg(long)]
    pub strict: bool,

    /// Match tokens as plain text rather than regular expressions
    #[arg(long)]
    pub literal: bool,

    /// Open the source PDF once per job instead of sharing one copy
    #[arg(long)]
    pub per_job_source: bool,

    /// Text extraction backend
    #[arg(long, value_enum)]
    pub text_engine: Option<TextEngine>,
}

impl ConfigArgs {
    pub fn resolve(&self) -> Result<ExtractConfig> {
        let mut config = match &self.config {
            Some(path) => ExtractConfig::from_file(path)?,
            None => ExtractConfig::default(),
        };

        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if self.strict {
            config.leniency = LeniencyPolicy::Strict;
        }
        if self.literal {
            config.token_mode = TokenMode::Literal;
        }
        if self.per_job_source {
            config.share_source = false;
        }
        if let Some(engine) = self.text_engine {
            config.text_engine = engine;
        }
        Ok(config.normalized())
    }
}
