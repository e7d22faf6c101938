use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default worker-pool width.
pub const DEFAULT_WORKERS: usize = 4;

/// How dirty job-list input is treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LeniencyPolicy {
    /// Skip malformed rows and treat unparseable page lists as "no explicit pages"
    #[default]
    Lenient,
    /// Reject the whole job list on the first malformed row or page list
    Strict,
}

/// How a job's match token is turned into a pattern.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TokenMode {
    /// The token is a regular expression; metacharacters keep their regex meaning
    #[default]
    Regex,
    /// The token is escaped and matched as a plain substring
    Literal,
}

/// Which library pulls plain text out of a page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum TextEngine {
    /// lopdf content-stream extraction, one page at a time
    #[default]
    Lopdf,
    /// pdf-extract over the whole document, split per page
    PdfExtract,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExtractConfig {
    pub workers: usize,
    pub leniency: LeniencyPolicy,
    pub token_mode: TokenMode,
    /// Open the source once and share it across jobs instead of once per job
    pub share_source: bool,
    pub text_engine: TextEngine,
    /// Extension of written documents, without the dot
    pub extension: String,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        ExtractConfig {
            workers: DEFAULT_WORKERS,
            leniency: LeniencyPolicy::Lenient,
            token_mode: TokenMode::Regex,
            share_source: true,
            text_engine: TextEngine::Lopdf,
            extension: "pdf".to_string(),
        }
    }
}

impl ExtractConfig {
    /// Load a TOML config file; missing keys fall back to defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        Self::from_toml(&raw).with_context(|| format!("Invalid config: {}", path.display()))
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        let config: ExtractConfig = toml::from_str(raw)?;
        Ok(config.normalized())
    }

    /// Clamp values that would make the batch unable to run.
    pub fn normalized(mut self) -> Self {
        if self.workers == 0 {
            self.workers = 1;
        }
        let ext = self.extension.trim().trim_start_matches('.');
        self.extension = if ext.is_empty() {
            "pdf".to_string()
        } else {
            ext.to_string()
        };
        self
    }
}
