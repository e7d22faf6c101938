//! Page selection: which source pages a job copies.
//!
//! A page is selected when its text matches the job's token or its 1-based
//! number is listed explicitly. The result is always ascending and free of
//! duplicates, whatever order the job listed things in.
//!
//! In [`TokenMode::Regex`] (the default) the token is a regular expression,
//! so a token like `A.1*` matches more than the literal string `A.1*`.
//! Callers that want plain substring search should use [`TokenMode::Literal`].

use regex::Regex;
use std::borrow::Cow;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::config::TokenMode;
use crate::error::JobError;
use crate::pages::PageSet;

/// Anything that can hand out the plain text of its pages.
pub trait PageTextSource {
    fn page_count(&self) -> u32;

    /// Text of a 1-based page.
    fn page_text(&self, page: u32) -> anyhow::Result<&str>;
}

/// A job's match token, compiled once per job.
#[derive(Debug, Clone)]
pub struct TokenPattern(Option<Regex>);

impl TokenPattern {
    /// An empty token matches no page (rather than every page, as an empty
    /// regex would).
    pub fn compile(token: &str, mode: TokenMode) -> Result<Self, regex::Error> {
        if token.is_empty() {
            return Ok(TokenPattern(None));
        }
        let pattern = match mode {
            TokenMode::Regex => Cow::Borrowed(token),
            TokenMode::Literal => Cow::Owned(regex::escape(token)),
        };
        Ok(TokenPattern(Some(Regex::new(&pattern)?)))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.0.as_ref().is_some_and(|re| re.is_match(text))
    }
}

/// Select the pages of `source` matched by `pattern` or listed in `explicit`.
///
/// Visits each page at most once, in ascending order. Page text is only
/// extracted for pages not already selected by number.
pub fn match_pages<S>(
    source: &S,
    pattern: &TokenPattern,
    explicit: &PageSet,
    cancel: &CancellationToken,
) -> Result<Vec<u32>, JobError>
where
    S: PageTextSource + ?Sized,
{
    let total = source.page_count();

    if pattern.is_empty() {
        return Ok(explicit.within(total));
    }

    let mut selected = Vec::new();
    for page in 1..=total {
        if cancel.is_cancelled() {
            return Err(JobError::Cancelled);
        }

        if explicit.contains(page) {
            selected.push(page);
            continue;
        }

        let text = source
            .page_text(page)
            .map_err(|source| JobError::PageText { page, source })?;
        if pattern.is_match(text) {
            trace!(page, "token matched");
            selected.push(page);
        }
    }

    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::parse_page_list;

    struct TextPages(Vec<&'static str>);

    impl PageTextSource for TextPages {
        fn page_count(&self) -> u32 {
            self.0.len() as u32
        }

        fn page_text(&self, page: u32) -> anyhow::Result<&str> {
            self.0
                .get((page as usize).wrapping_sub(1))
                .copied()
                .ok_or_else(|| anyhow::anyhow!("no page {}", page))
        }
    }

    /// Fails on every page, to prove text is never read when it isn't needed.
    struct Unreadable(u32);

    impl PageTextSource for Unreadable {
        fn page_count(&self) -> u32 {
            self.0
        }

        fn page_text(&self, page: u32) -> anyhow::Result<&str> {
            anyhow::bail!("page {} is unreadable", page)
        }
    }

    fn five_pages() -> TextPages {
        TextPages(vec![
            "intro",
            "part ABC123 rev 1",
            "nothing here",
            "see ABC123",
            "appendix",
        ])
    }

    fn run(source: &dyn PageTextSource, token: &str, pages: &str, mode: TokenMode) -> Vec<u32> {
        let pattern = TokenPattern::compile(token, mode).unwrap();
        let explicit = parse_page_list(pages).unwrap();
        match_pages(source, &pattern, &explicit, &CancellationToken::new()).unwrap()
    }

    #[test]
    fn test_token_only() {
        assert_eq!(run(&five_pages(), "ABC123", "", TokenMode::Regex), vec![2, 4]);
    }

    #[test]
    fn test_explicit_only_dedups() {
        assert_eq!(run(&five_pages(), "", "1,3,3", TokenMode::Regex), vec![1, 3]);
    }

    #[test]
    fn test_explicit_only_clips_to_page_count() {
        assert_eq!(run(&five_pages(), "", "9,5,2", TokenMode::Regex), vec![2, 5]);
    }

    #[test]
    fn test_union_in_source_order() {
        assert_eq!(run(&five_pages(), "ABC123", "5,2,1", TokenMode::Regex), vec![1, 2, 4, 5]);
    }

    #[test]
    fn test_no_match() {
        assert!(run(&five_pages(), "ZZZ", "", TokenMode::Regex).is_empty());
    }

    #[test]
    fn test_nothing_to_match() {
        assert!(run(&five_pages(), "", "", TokenMode::Regex).is_empty());
    }

    #[test]
    fn test_case_sensitive() {
        assert!(run(&five_pages(), "abc123", "", TokenMode::Regex).is_empty());
    }

    #[test]
    fn test_regex_metacharacters_are_live() {
        // "." matches any character, so "ABC.23" still finds "ABC123"
        assert_eq!(run(&five_pages(), "ABC.23", "", TokenMode::Regex), vec![2, 4]);
        assert_eq!(run(&five_pages(), "^see", "", TokenMode::Regex), vec![4]);
    }

    #[test]
    fn test_literal_mode_escapes() {
        assert!(run(&five_pages(), "ABC.23", "", TokenMode::Literal).is_empty());
        let pages = TextPages(vec!["price (1.5*)", "price 105"]);
        assert_eq!(run(&pages, "(1.5*)", "", TokenMode::Literal), vec![1]);
    }

    #[test]
    fn test_invalid_regex() {
        assert!(TokenPattern::compile("ABC(", TokenMode::Regex).is_err());
        assert!(TokenPattern::compile("ABC(", TokenMode::Literal).is_ok());
    }

    #[test]
    fn test_explicit_pages_skip_text_extraction() {
        let cancel = CancellationToken::new();
        let explicit = parse_page_list("2").unwrap();

        let no_token = TokenPattern::compile("", TokenMode::Regex).unwrap();
        let pages = match_pages(&Unreadable(3), &no_token, &explicit, &cancel);
        assert_eq!(pages.unwrap(), vec![2]);

        let token = TokenPattern::compile("x", TokenMode::Regex).unwrap();
        let every_page = parse_page_list("3,2,1").unwrap();
        let pages = match_pages(&Unreadable(3), &token, &every_page, &cancel);
        assert_eq!(pages.unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_page_text_failure_is_job_error() {
        let pattern = TokenPattern::compile("x", TokenMode::Regex).unwrap();
        let err = match_pages(&Unreadable(3), &pattern, &PageSet::new(), &CancellationToken::new())
            .unwrap_err();
        assert!(matches!(err, JobError::PageText { page: 1, .. }));
    }

    #[test]
    fn test_cancelled() {
        let pattern = TokenPattern::compile("ABC", TokenMode::Regex).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = match_pages(&five_pages(), &pattern, &PageSet::new(), &cancel).unwrap_err();
        assert!(matches!(err, JobError::Cancelled));
    }
}
