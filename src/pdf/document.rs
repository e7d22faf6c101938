use anyhow::{Context, Result};
use lopdf::{Document, ObjectId};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use super::text;
use crate::config::TextEngine;
use crate::matcher::PageTextSource;

/// A read-only source PDF plus a lazily filled page-text cache.
///
/// The cache is filled at most once per page and lives as long as the
/// document, so sharing one `SourceDocument` across a batch extracts each
/// page's text once rather than once per job.
pub struct SourceDocument {
    pub doc: Document,
    pub path: PathBuf,
    pages: Vec<(u32, ObjectId)>,
    engine: TextEngine,
    page_texts: Vec<OnceLock<String>>,
    /// Whole-document split used by `TextEngine::PdfExtract`
    split_texts: OnceLock<Vec<String>>,
}

impl SourceDocument {
    pub fn open<P: AsRef<Path>>(path: P, engine: TextEngine) -> Result<Self> {
        let path = path.as_ref();
        let doc = Document::load(path)
            .with_context(|| format!("Failed to open PDF: {}", path.display()))?;
        Ok(Self::from_document(doc, path, engine))
    }

    pub fn from_document<P: AsRef<Path>>(doc: Document, path: P, engine: TextEngine) -> Self {
        // get_pages is keyed by page number, so this is already ascending
        let pages: Vec<(u32, ObjectId)> = doc.get_pages().into_iter().collect();
        let page_texts = (0..pages.len()).map(|_| OnceLock::new()).collect();
        SourceDocument {
            doc,
            path: path.as_ref().to_path_buf(),
            pages,
            engine,
            page_texts,
            split_texts: OnceLock::new(),
        }
    }

    pub fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    /// Plain text of a 1-based page, extracted on first use.
    pub fn page_text(&self, page: u32) -> Result<&str> {
        let total = self.page_count();
        if page == 0 || page > total {
            anyhow::bail!("Page {} is out of range (1-{})", page, total);
        }
        let slot = &self.page_texts[(page - 1) as usize];
        if let Some(cached) = slot.get() {
            return Ok(cached);
        }

        let extracted = match self.engine {
            TextEngine::Lopdf => text::extract_page_text(&self.doc, page)?,
            TextEngine::PdfExtract => self
                .split_texts()?
                .get((page - 1) as usize)
                .cloned()
                .unwrap_or_default(),
        };
        Ok(slot.get_or_init(|| extracted))
    }

    fn split_texts(&self) -> Result<&[String]> {
        if let Some(pages) = self.split_texts.get() {
            return Ok(pages);
        }
        let pages = text::extract_all_pages_text(&self.path)?;
        Ok(self.split_texts.get_or_init(|| pages))
    }

    /// Copy the given pages, in source order, into a new document.
    /// `pages` must be ascending, as the matcher returns them.
    ///
    /// Page objects and everything they reference are copied verbatim; pages
    /// not listed are dropped along with any objects only they used.
    pub fn extract_pages(&self, pages: &[u32]) -> Result<Document> {
        let mut new_doc = self.doc.clone();
        let total = self.page_count();

        // Validate page numbers
        for &page in pages {
            if page == 0 || page > total {
                anyhow::bail!("Page {} is out of range (1-{})", page, total);
            }
        }

        let pages_to_delete: Vec<u32> = self
            .pages
            .iter()
            .map(|(num, _)| *num)
            .filter(|num| pages.binary_search(num).is_err())
            .collect();

        if !pages_to_delete.is_empty() {
            new_doc.delete_pages(&pages_to_delete);
            new_doc.prune_objects();
        }

        Ok(new_doc)
    }

    /// Save to `path` via a temporary file in the same directory, so a
    /// reader (or a concurrent writer of the same name) never sees a
    /// half-written document.
    pub fn save_atomic(doc: &mut Document, path: &Path) -> Result<()> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir)
            .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
        doc.save_to(&mut tmp)
            .with_context(|| format!("Failed to save PDF: {}", path.display()))?;
        tmp.persist(path)
            .map_err(|e| e.error)
            .with_context(|| format!("Failed to save PDF: {}", path.display()))?;
        Ok(())
    }
}

impl PageTextSource for SourceDocument {
    fn page_count(&self) -> u32 {
        SourceDocument::page_count(self)
    }

    fn page_text(&self, page: u32) -> Result<&str> {
        SourceDocument::page_text(self, page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::fixture::build_pdf;

    fn source(texts: &[&str]) -> SourceDocument {
        SourceDocument::from_document(build_pdf(texts).unwrap(), "fixture.pdf", TextEngine::Lopdf)
    }

    #[test]
    fn test_page_count_and_text() {
        let src = source(&["alpha", "beta", "gamma"]);
        assert_eq!(src.page_count(), 3);
        assert!(src.page_text(2).unwrap().contains("beta"));
        assert!(src.page_text(0).is_err());
        assert!(src.page_text(4).is_err());
    }

    #[test]
    fn test_page_text_is_cached() {
        let src = source(&["alpha"]);
        let first = src.page_text(1).unwrap().as_ptr();
        let second = src.page_text(1).unwrap().as_ptr();
        assert_eq!(first, second);
    }

    #[test]
    fn test_extract_pages_keeps_source_order() {
        let src = source(&["one", "two", "three", "four", "five"]);
        let out = src.extract_pages(&[2, 4]).unwrap();
        let out = SourceDocument::from_document(out, "out.pdf", TextEngine::Lopdf);
        assert_eq!(out.page_count(), 2);
        assert!(out.page_text(1).unwrap().contains("two"));
        assert!(out.page_text(2).unwrap().contains("four"));
    }

    #[test]
    fn test_extract_pages_out_of_range() {
        let src = source(&["one"]);
        assert!(src.extract_pages(&[2]).is_err());
    }

    #[test]
    fn test_save_atomic_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let src = source(&["one", "two"]);
        let mut out = src.extract_pages(&[1]).unwrap();
        let path = dir.path().join("part.pdf");
        SourceDocument::save_atomic(&mut out, &path).unwrap();

        let reopened = SourceDocument::open(&path, TextEngine::Lopdf).unwrap();
        assert_eq!(reopened.page_count(), 1);
        // only the final file is left behind
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
