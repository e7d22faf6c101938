use anyhow::Result;
use pdfsift::matcher::{match_pages, TokenPattern};
use pdfsift::pages::resolve_page_list;
use pdfsift::pdf::SourceDocument;
use pdfsift::ExtractConfig;
use std::path::Path;
use tokio_util::sync::CancellationToken;

/// Pages a job with this token and page list would copy, in output order.
pub fn selected_pages<P: AsRef<Path>>(
    source: P,
    token: &str,
    pages: &str,
    config: &ExtractConfig,
) -> Result<Vec<u32>> {
    let doc = SourceDocument::open(&source, config.text_engine)?;
    let pattern = TokenPattern::compile(token, config.token_mode)?;
    let explicit = resolve_page_list(pages, config.leniency)?;
    Ok(match_pages(&doc, &pattern, &explicit, &CancellationToken::new())?)
}

pub fn run<P: AsRef<Path>>(source: P, token: &str, pages: &str, config: &ExtractConfig) -> Result<()> {
    let selected = selected_pages(&source, token, pages, config)?;

    if selected.is_empty() {
        println!("No pages matched.");
        return Ok(());
    }

    let list: Vec<String> = selected.iter().map(|p| p.to_string()).collect();
    println!("Pages: {}", list.join(", "));
    println!("\n{} page(s) selected.", selected.len());

    Ok(())
}
