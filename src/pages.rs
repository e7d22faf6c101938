use std::collections::BTreeSet;
use thiserror::Error;
use tracing::warn;

use crate::config::LeniencyPolicy;

/// Ascending, deduplicated set of 1-based page numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageSet(BTreeSet<u32>);

impl PageSet {
    pub fn new() -> Self {
        PageSet(BTreeSet::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, page: u32) -> bool {
        self.0.contains(&page)
    }

    pub fn insert(&mut self, page: u32) -> bool {
        self.0.insert(page)
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.iter().copied()
    }

    /// Pages that exist in a document of `total_pages` pages.
    pub fn within(&self, total_pages: u32) -> Vec<u32> {
        if total_pages == 0 {
            return Vec::new();
        }
        self.0.range(1..=total_pages).copied().collect()
    }
}

impl FromIterator<u32> for PageSet {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        PageSet(iter.into_iter().collect())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PageListError {
    #[error("invalid page number: {token:?}")]
    InvalidNumber { token: String },
}

/// Parse one comma-separated token. Integers that cannot name a page
/// (zero, negatives, beyond u32) are valid input but select nothing.
fn parse_page_number(token: &str) -> Result<Option<u32>, PageListError> {
    let trimmed = token.trim();
    let n: i64 = trimmed.parse().map_err(|_| PageListError::InvalidNumber {
        token: trimmed.to_string(),
    })?;
    Ok(u32::try_from(n).ok().filter(|&n| n >= 1))
}

/// Parse a comma-separated list of 1-based page numbers like "1,3,3" or "7".
///
/// An empty string yields an empty set. Any non-integer token fails the
/// whole list.
pub fn parse_page_list(s: &str) -> Result<PageSet, PageListError> {
    let s = s.trim();
    if s.is_empty() {
        return Ok(PageSet::new());
    }

    let mut pages = PageSet::new();
    for token in s.split(',') {
        if let Some(page) = parse_page_number(token)? {
            pages.insert(page);
        }
    }
    Ok(pages)
}

/// Parse a page list, applying `policy` to malformed input: lenient mode
/// degrades to "no explicit pages", strict mode returns the error.
pub fn resolve_page_list(s: &str, policy: LeniencyPolicy) -> Result<PageSet, PageListError> {
    match parse_page_list(s) {
        Ok(pages) => Ok(pages),
        Err(e) if policy == LeniencyPolicy::Lenient => {
            warn!(pages = s, error = %e, "ignoring malformed page list");
            Ok(PageSet::new())
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_page() {
        let pages = parse_page_list("5").unwrap();
        assert_eq!(pages.iter().collect::<Vec<_>>(), vec![5]);
    }

    #[test]
    fn test_dedup_and_sort() {
        let pages = parse_page_list("3,1,3").unwrap();
        assert_eq!(pages.iter().collect::<Vec<_>>(), vec![1, 3]);
    }

    #[test]
    fn test_whitespace_around_numbers() {
        let pages = parse_page_list(" 2 , 4,+6 ").unwrap();
        assert_eq!(pages.iter().collect::<Vec<_>>(), vec![2, 4, 6]);
    }

    #[test]
    fn test_empty_is_no_pages() {
        assert!(parse_page_list("").unwrap().is_empty());
        assert!(parse_page_list("   ").unwrap().is_empty());
    }

    #[test]
    fn test_zero_and_negative_select_nothing() {
        let pages = parse_page_list("0,-2,4").unwrap();
        assert_eq!(pages.iter().collect::<Vec<_>>(), vec![4]);
    }

    #[test]
    fn test_non_integer_is_error() {
        assert_eq!(
            parse_page_list("1,two,3"),
            Err(PageListError::InvalidNumber {
                token: "two".to_string()
            })
        );
        // ranges are not page numbers
        assert!(parse_page_list("1-3").is_err());
        // trailing comma leaves an empty token
        assert!(parse_page_list("1,2,").is_err());
    }

    #[test]
    fn test_lenient_degrades_whole_list() {
        let pages = resolve_page_list("1,x,3", LeniencyPolicy::Lenient).unwrap();
        assert!(pages.is_empty());
    }

    #[test]
    fn test_strict_rejects() {
        assert!(resolve_page_list("1,x,3", LeniencyPolicy::Strict).is_err());
        let pages = resolve_page_list("1,3", LeniencyPolicy::Strict).unwrap();
        assert_eq!(pages.len(), 2);
    }

    #[test]
    fn test_within_clips_to_page_count() {
        let pages = parse_page_list("1,3,9").unwrap();
        assert_eq!(pages.within(5), vec![1, 3]);
        assert!(pages.within(0).is_empty());
    }
}
