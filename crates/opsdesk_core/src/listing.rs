//! Client-side search, status filtering and pagination for table views.
//!
//! # Invariants
//! - Search is a pure function of the term and rows, returning a subset in
//!   the original order.
//! - Pages `1..=total_pages` are disjoint and together cover every row once.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Normalized free-text search input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchTerm {
    normalized: String,
}

impl SearchTerm {
    /// Trims, lowercases and collapses inner whitespace.
    pub fn new(raw: &str) -> Self {
        let collapsed = WHITESPACE_RE.replace_all(raw.trim(), " ");
        Self {
            normalized: collapsed.to_lowercase(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.normalized.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.normalized
    }

    /// Case-insensitive substring match against any field.
    pub fn matches_any<'a>(&self, fields: impl IntoIterator<Item = &'a str>) -> bool {
        if self.is_empty() {
            return true;
        }
        fields.into_iter().any(|field| {
            WHITESPACE_RE
                .replace_all(field, " ")
                .to_lowercase()
                .contains(self.normalized.as_str())
        })
    }
}

/// Rows that expose text for the search box.
pub trait Searchable {
    fn search_fields(&self) -> Vec<&str>;
}

/// Returns the rows matching `term`, preserving order.
pub fn apply_search<T>(rows: Vec<T>, term: &SearchTerm) -> Vec<T>
where
    T: Searchable,
{
    if term.is_empty() {
        return rows;
    }
    rows.into_iter()
        .filter(|row| term.matches_any(row.search_fields()))
        .collect()
}

/// Keeps rows accepted by `predicate`, preserving order.
pub fn filter_rows<T>(rows: Vec<T>, predicate: impl Fn(&T) -> bool) -> Vec<T> {
    rows.into_iter().filter(|row| predicate(row)).collect()
}

/// Normalized 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    /// Page `0` becomes `1`; page size `0` becomes the default and is
    /// clamped to `MAX_PAGE_SIZE`.
    pub fn new(page: u32, page_size: u32) -> Self {
        let page_size = match page_size {
            0 => DEFAULT_PAGE_SIZE,
            size => size.min(MAX_PAGE_SIZE),
        };
        Self {
            page: page.max(1),
            page_size,
        }
    }

    pub fn first(page_size: u32) -> Self {
        Self::new(1, page_size)
    }

    fn offset(&self) -> usize {
        (self.page as usize - 1) * self.page_size as usize
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, DEFAULT_PAGE_SIZE)
    }
}

/// One slice of a filtered row set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub page_size: u32,
    pub total_items: usize,
    /// At least `1`, even for an empty row set.
    pub total_pages: u32,
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }
}

/// Slices `rows` into the requested page. Pages past the end are empty.
pub fn paginate<T>(rows: Vec<T>, request: PageRequest) -> Page<T> {
    let total_items = rows.len();
    let page_size = request.page_size as usize;
    let total_pages = total_items.div_ceil(page_size).max(1);
    let items = rows
        .into_iter()
        .skip(request.offset())
        .take(page_size)
        .collect();

    Page {
        items,
        page: request.page,
        page_size: request.page_size,
        total_items,
        total_pages: u32::try_from(total_pages).unwrap_or(u32::MAX),
    }
}

#[cfg(test)]
mod tests {
    use super::{apply_search, paginate, PageRequest, SearchTerm, Searchable};

    struct Row(&'static str, &'static str);

    impl Searchable for Row {
        fn search_fields(&self) -> Vec<&str> {
            vec![self.0, self.1]
        }
    }

    #[test]
    fn page_request_normalizes_inputs() {
        assert_eq!(PageRequest::new(0, 0), PageRequest::new(1, 10));
        assert_eq!(PageRequest::new(3, 500).page_size, 100);
    }

    #[test]
    fn search_is_case_and_whitespace_insensitive() {
        let rows = vec![Row("Deep  Cleaning", "Asha"), Row("Pest control", "Ravi")];
        let hits = apply_search(rows, &SearchTerm::new("  deep   CLEAN "));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].1, "Asha");
    }

    #[test]
    fn empty_rows_have_one_empty_page() {
        let page = paginate(Vec::<u8>::new(), PageRequest::default());
        assert_eq!(page.total_pages, 1);
        assert!(page.items.is_empty());
        assert!(!page.has_next());
    }
}
