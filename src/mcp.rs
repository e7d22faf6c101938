use anyhow::Result;
use rmcp::{
    ServerHandler, ServiceExt,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{ServerCapabilities, ServerInfo},
    schemars, tool, tool_router,
};
use serde::{Deserialize, Serialize};

use crate::commands::preview::selected_pages;
use pdfsift::config::{LeniencyPolicy, TokenMode};
use pdfsift::joblist::read_job_list;
use pdfsift::{start_batch, validate_inputs, BatchPaths, ExtractConfig};

// Request structs for tools

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct BatchInputsRequest {
    #[schemars(description = "Path to the job list (.xlsx, .xls, .ods or .csv)")]
    pub job_list: String,
    #[schemars(description = "Path to the source PDF file")]
    pub source: String,
    #[schemars(description = "Existing directory to write output PDFs into")]
    pub output_dir: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct BatchExtractRequest {
    #[schemars(description = "Path to the job list (.xlsx, .xls, .ods or .csv)")]
    pub job_list: String,
    #[schemars(description = "Path to the source PDF file")]
    pub source: String,
    #[schemars(description = "Existing directory to write output PDFs into")]
    pub output_dir: String,
    #[schemars(description = "Number of jobs run at once (default: 4)")]
    #[serde(default)]
    pub workers: Option<usize>,
    #[schemars(description = "Reject malformed rows and page lists (default: false)")]
    #[serde(default)]
    pub strict: bool,
    #[schemars(description = "Match tokens as plain text rather than regex (default: false)")]
    #[serde(default)]
    pub literal: bool,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PreviewJobRequest {
    #[schemars(description = "Path to the source PDF file")]
    pub source: String,
    #[schemars(description = "Match token; a regular expression unless literal is set")]
    #[serde(default)]
    pub token: String,
    #[schemars(description = "Comma-separated 1-based page numbers (e.g., '1,3,7')")]
    #[serde(default)]
    pub pages: String,
    #[schemars(description = "Match the token as plain text (default: false)")]
    #[serde(default)]
    pub literal: bool,
}

#[derive(Debug, Clone)]
pub struct PdfServer {
    #[allow(dead_code)]
    tool_router: ToolRouter<Self>,
}

impl PdfServer {
    pub fn new() -> Self {
        Self {
            tool_router: Self::tool_router(),
        }
    }
}

impl Default for PdfServer {
    fn default() -> Self {
        Self::new()
    }
}

fn token_mode(literal: bool) -> TokenMode {
    if literal {
        TokenMode::Literal
    } else {
        TokenMode::Regex
    }
}

#[tool_router]
impl PdfServer {
    #[tool(description = "Check that a job list, source PDF, and output directory exist, and count the jobs in the job list")]
    fn pdf_validate_inputs(&self, Parameters(req): Parameters<BatchInputsRequest>) -> String {
        let paths = BatchPaths::new(req.job_list, req.source, req.output_dir);
        if let Err(e) = validate_inputs(&paths) {
            return format!("Error: {}", e);
        }

        match read_job_list(&paths.job_list, LeniencyPolicy::Lenient) {
            Ok(list) => {
                let result = ValidateResult {
                    jobs: list.jobs.len(),
                    skipped_rows: list.skipped_rows,
                };
                serde_json::to_string_pretty(&result).unwrap_or_else(|e| format!("Error: {}", e))
            }
            Err(e) => format!("Error: {}", e),
        }
    }

    #[tool(description = "Show which pages of a PDF a match token and explicit page list would select, without writing anything")]
    fn pdf_preview_job(&self, Parameters(req): Parameters<PreviewJobRequest>) -> String {
        let config = ExtractConfig {
            token_mode: token_mode(req.literal),
            ..Default::default()
        };

        match selected_pages(&req.source, &req.token, &req.pages, &config) {
            Ok(pages) => {
                let result = PreviewResult { pages };
                serde_json::to_string_pretty(&result).unwrap_or_else(|e| format!("Error: {}", e))
            }
            Err(e) => format!("Error: {:#}", e),
        }
    }

    #[tool(description = "Run every row of a job list (name, token, pages) against a source PDF, writing one PDF per row with matching pages. Returns a summary with one result per job.")]
    async fn pdf_batch_extract(&self, Parameters(req): Parameters<BatchExtractRequest>) -> String {
        let mut config = ExtractConfig {
            token_mode: token_mode(req.literal),
            ..Default::default()
        };
        if let Some(workers) = req.workers {
            config.workers = workers;
        }
        if req.strict {
            config.leniency = LeniencyPolicy::Strict;
        }

        let paths = BatchPaths::new(req.job_list, req.source, req.output_dir);
        let handle = match start_batch(paths, config.normalized()) {
            Ok(h) => h,
            Err(e) => return format!("Error: {}", e),
        };

        match handle.wait().await {
            Ok(summary) => {
                serde_json::to_string_pretty(&summary).unwrap_or_else(|e| format!("Error: {}", e))
            }
            Err(e) => format!("Error: {}", e),
        }
    }
}

// Result types for MCP tools

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ValidateResult {
    pub jobs: usize,
    pub skipped_rows: usize,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct PreviewResult {
    pub pages: Vec<u32>,
}

impl ServerHandler for PdfServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Batch PDF page extraction. Use pdf_validate_inputs to check a job list, \
                 pdf_preview_job to see which pages a token and page list select, and \
                 pdf_batch_extract to write one PDF per job list row."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

pub async fn run_server() -> Result<()> {
    let server = PdfServer::new();

    // Serve using stdin/stdout as a tuple
    let service = server.serve((tokio::io::stdin(), tokio::io::stdout())).await?;

    service.waiting().await?;

    Ok(())
}
