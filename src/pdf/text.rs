use anyhow::{Context, Result};
use lopdf::Document;
use std::path::Path;

/// Extract the plain text of one 1-based page from its content streams.
pub fn extract_page_text(doc: &Document, page: u32) -> Result<String> {
    doc.extract_text(&[page])
        .with_context(|| format!("Failed to extract text from page {}", page))
}

/// Extract text from every page of a PDF with pdf-extract, one entry per page.
pub fn extract_all_pages_text<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read PDF: {}", path.display()))?;

    pdf_extract::extract_text_from_mem_by_pages(&bytes)
        .with_context(|| format!("Failed to extract text from PDF: {}", path.display()))
}
