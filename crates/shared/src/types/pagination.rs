//! Pagination types for derived result tables.

use serde::{Deserialize, Serialize};

/// Request parameters for a paginated view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Page number (1-indexed).
    #[serde(default = "default_page")]
    pub page: u32,
    /// Number of items per page.
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    10
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

impl PageRequest {
    /// Creates a page request.
    #[must_use]
    pub const fn new(page: u32, per_page: u32) -> Self {
        Self { page, per_page }
    }

    /// Returns true when the request can address a page at all.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.page >= 1 && self.per_page > 0
    }

    /// Index of the first row on this page.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.per_page)
    }

    /// Returns the page size.
    #[must_use]
    pub fn limit(&self) -> u64 {
        u64::from(self.per_page)
    }

    /// Returns the first page with the same page size.
    ///
    /// Callers use this whenever the filter changes.
    #[must_use]
    pub const fn first(&self) -> Self {
        Self {
            page: 1,
            per_page: self.per_page,
        }
    }
}

/// Response wrapper for paginated data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageResponse<T> {
    /// The items in the current page.
    pub data: Vec<T>,
    /// Pagination metadata.
    pub meta: PageMeta,
}

/// Pagination metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    /// Current page number.
    pub page: u32,
    /// Items per page.
    pub per_page: u32,
    /// Total number of items across all pages.
    pub total: u64,
    /// Total number of pages, `ceil(total / per_page)`.
    pub total_pages: u32,
}

impl<T> PageResponse<T> {
    /// Creates a new paginated response.
    #[must_use]
    pub fn new(data: Vec<T>, page: u32, per_page: u32, total: u64) -> Self {
        Self {
            data,
            meta: PageMeta {
                page,
                per_page,
                total,
                total_pages: total_pages(total, per_page),
            },
        }
    }

    /// Slices one page out of `rows` without touching the source list.
    ///
    /// Pages past the end (or page 0) come back empty.
    #[must_use]
    pub fn paginate(rows: &[T], request: PageRequest) -> Self
    where
        T: Clone,
    {
        let total = rows.len() as u64;
        let data = if request.is_valid() {
            let start = usize::try_from(request.offset()).unwrap_or(usize::MAX);
            let end = start.saturating_add(request.per_page as usize);
            rows.get(start..end.min(rows.len()))
                .map(<[T]>::to_vec)
                .unwrap_or_default()
        } else {
            Vec::new()
        };

        Self::new(data, request.page, request.per_page, total)
    }
}

fn total_pages(total: u64, per_page: u32) -> u32 {
    if per_page == 0 {
        return 0;
    }
    u32::try_from(total.div_ceil(u64::from(per_page))).unwrap_or(u32::MAX)
}
