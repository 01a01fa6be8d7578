//! # Pagination
//!
//! Page arithmetic shared by every paged endpoint.
//!
//! ## Page Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  total_count = 10, page_size = 4                                        │
//! │                                                                         │
//! │   page 0        page 1        page 2       page 3+                      │
//! │  ┌─┬─┬─┬─┐     ┌─┬─┬─┬─┐     ┌─┬─┐        (empty, not an error)         │
//! │  │1│2│3│4│     │5│6│7│8│     │9│10│                                     │
//! │  └─┴─┴─┴─┘     └─┴─┴─┴─┘     └─┴─┘                                      │
//! │  offset 0      offset 4      offset 8                                   │
//! │                                                                         │
//! │  total_pages = ceil(10 / 4) = 3                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;

/// Page index used when the route omits it.
pub const DEFAULT_PAGE: u32 = 0;

/// Page size used when the route omits it.
pub const DEFAULT_PAGE_SIZE: u32 = 4;

// =============================================================================
// Page Request
// =============================================================================

/// A validated page index + page size.
///
/// `page_size` is never zero, so page math never divides by zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    page_size: u32,
}

impl PageRequest {
    /// Creates a page request.
    ///
    /// ## Errors
    /// `ValidationError` when `page_size` is zero.
    pub fn new(page: u32, page_size: u32) -> Result<Self, ValidationError> {
        if page_size == 0 {
            return Err(ValidationError::TooSmall {
                field: "pageSize".to_string(),
                min: 1,
            });
        }
        Ok(PageRequest { page, page_size })
    }

    #[inline]
    pub fn page(&self) -> u32 {
        self.page
    }

    #[inline]
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Number of rows to skip.
    #[inline]
    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.page_size)
    }

    /// `ceil(total_count / page_size)`.
    pub fn total_pages(&self, total_count: u64) -> u64 {
        total_count.div_ceil(u64::from(self.page_size))
    }

    /// How many items this page holds out of `total_count`.
    pub fn expected_len(&self, total_count: u64) -> u64 {
        total_count
            .saturating_sub(self.offset())
            .min(u64::from(self.page_size))
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        PageRequest {
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

// =============================================================================
// Pagination Set
// =============================================================================

/// One page of results plus totals.
///
/// ## Serialization
/// ```json
/// { "page": 0, "count": 4, "totalCount": 10, "totalPages": 3, "items": [...] }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PaginationSet<T> {
    pub page: u32,
    /// Number of items on this page.
    pub count: usize,
    #[ts(type = "number")]
    pub total_count: u64,
    #[ts(type = "number")]
    pub total_pages: u64,
    pub items: Vec<T>,
}

impl<T> PaginationSet<T> {
    /// Builds a page from its items and the filtered total.
    pub fn new(request: PageRequest, total_count: u64, items: Vec<T>) -> Self {
        PaginationSet {
            page: request.page(),
            count: items.len(),
            total_count,
            total_pages: request.total_pages(total_count),
            items,
        }
    }

    /// Transforms every item, keeping the totals.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PaginationSet<U> {
        PaginationSet {
            page: self.page,
            count: self.count,
            total_count: self.total_count,
            total_pages: self.total_pages,
            items: self.items.into_iter().map(f).collect(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
