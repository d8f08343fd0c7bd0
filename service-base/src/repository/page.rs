//! Paged retrieval
//!
//! [`Page<T>`] is both the request and the response of
//! `get_many_paged`. Callers set the page number and size; the repository
//! fills in the rows and the total row count of the filtered set.
//!
//! # Example
//!
//! ```rust
//! use service_base::repository::Page;
//!
//! let page: Page<()> = Page::new(3, 15);
//! assert_eq!(page.skip_count(), 30);
//!
//! // Zero means "use the default"
//! let defaulted: Page<()> = Page::new(0, 0);
//! assert_eq!((defaulted.page_number(), defaulted.page_size()), (1, 10));
//! ```

use serde::Serialize;

/// Page number used when the caller passes zero
pub const DEFAULT_PAGE_NUMBER: u32 = 1;

/// Page size used when the caller passes zero
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// A one-based page request and, once filled, its result
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    page_number: u32,
    page_size: u32,
    rows: Vec<T>,
    total_rows: u64,
}

impl<T> Page<T> {
    /// Request page `page_number` of `page_size` rows
    ///
    /// Zero for either argument is replaced by its default.
    pub fn new(page_number: u32, page_size: u32) -> Self {
        Self {
            page_number: if page_number == 0 {
                DEFAULT_PAGE_NUMBER
            } else {
                page_number
            },
            page_size: if page_size == 0 {
                DEFAULT_PAGE_SIZE
            } else {
                page_size
            },
            rows: Vec::new(),
            total_rows: 0,
        }
    }

    /// Rows to skip before this page starts
    pub fn skip_count(&self) -> u64 {
        u64::from(self.page_number - 1) * u64::from(self.page_size)
    }

    /// One-based page number
    pub fn page_number(&self) -> u32 {
        self.page_number
    }

    /// Rows per page
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Rows on this page
    pub fn rows(&self) -> &[T] {
        &self.rows
    }

    /// Consume the page, yielding its rows
    pub fn into_rows(self) -> Vec<T> {
        self.rows
    }

    /// Rows in the whole filtered set
    pub fn total_rows(&self) -> u64 {
        self.total_rows
    }

    /// Number of pages needed for `total_rows`
    pub fn total_pages(&self) -> u64 {
        self.total_rows.div_ceil(u64::from(self.page_size))
    }

    /// Whether a later page holds rows
    pub fn has_next(&self) -> bool {
        u64::from(self.page_number) < self.total_pages()
    }

    /// Whether this is not the first page
    pub fn has_previous(&self) -> bool {
        self.page_number > 1
    }

    pub(crate) fn filled<U>(&self, rows: Vec<U>, total_rows: u64) -> Page<U> {
        Page {
            page_number: self.page_number,
            page_size: self.page_size,
            rows,
            total_rows,
        }
    }
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_NUMBER, DEFAULT_PAGE_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_substitutes_defaults() {
        let page: Page<()> = Page::new(0, 0);
        assert_eq!(page.page_number(), 1);
        assert_eq!(page.page_size(), 10);
        assert_eq!(page.skip_count(), 0);

        let page: Page<()> = Page::new(4, 0);
        assert_eq!((page.page_number(), page.page_size()), (4, 10));
    }

    #[test]
    fn test_skip_count() {
        let page: Page<()> = Page::new(3, 15);
        assert_eq!(page.skip_count(), 30);
    }

    #[test]
    fn test_skip_count_does_not_overflow_u32() {
        let page: Page<()> = Page::new(u32::MAX, u32::MAX);
        assert_eq!(
            page.skip_count(),
            u64::from(u32::MAX - 1) * u64::from(u32::MAX)
        );
    }

    #[test]
    fn test_default_page() {
        let page: Page<()> = Page::default();
        assert_eq!((page.page_number(), page.page_size()), (1, 10));
        assert!(page.rows().is_empty());
    }

    #[test]
    fn test_navigation_helpers() {
        let request: Page<u8> = Page::new(2, 15);
        let page = request.filled(vec![1, 2, 3], 100);
        assert_eq!(page.total_pages(), 7);
        assert!(page.has_next());
        assert!(page.has_previous());
        assert_eq!(page.rows(), &[1, 2, 3]);

        let last = Page::<u8>::new(7, 15).filled(Vec::<u8>::new(), 100);
        assert!(!last.has_next());

        let empty = Page::<u8>::new(1, 15).filled(Vec::<u8>::new(), 0);
        assert_eq!(empty.total_pages(), 0);
        assert!(!empty.has_next());
        assert!(!empty.has_previous());
    }

    #[test]
    fn test_serializes_for_output() {
        let page = Page::<u8>::new(1, 2).filled(vec![7, 8], 5);
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["page_number"], 1);
        assert_eq!(json["total_rows"], 5);
        assert_eq!(json["rows"], serde_json::json!([7, 8]));
    }
}
