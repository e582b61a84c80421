/// Pagination parameters and the list-response envelope
use serde::{Deserialize, Serialize};

/// Default page size when `per_page` is omitted
const DEFAULT_PER_PAGE: i64 = 20;

/// Hard cap on page size
const MAX_PER_PAGE: i64 = 100;

/// Pagination query parameters (`?page=2&per_page=50`)
///
/// Out-of-range values are clamped rather than rejected: page floors at 1,
/// per_page is capped at 100.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Pagination {
    /// 1-based page number
    #[serde(default = "default_page")]
    pub page: i64,

    /// Rows per page
    #[serde(default = "default_per_page")]
    pub per_page: i64,
}

fn default_page() -> i64 {
    1
}

fn default_per_page() -> i64 {
    DEFAULT_PER_PAGE
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

impl Pagination {
    /// Builds pagination from optional query parameters
    ///
    /// Route query structs keep `page`/`per_page` as plain optional fields
    /// and funnel them through here.
    pub fn from_parts(page: Option<i64>, per_page: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or_else(default_page),
            per_page: per_page.unwrap_or_else(default_per_page),
        }
    }

    /// SQL LIMIT for this page
    pub fn limit(&self) -> i64 {
        self.per_page.clamp(1, MAX_PER_PAGE)
    }

    /// SQL OFFSET for this page
    pub fn offset(&self) -> i64 {
        (self.page.max(1) - 1) * self.limit()
    }
}

/// One page of results plus the totals a client needs to render pagination
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    /// Rows on this page
    pub data: Vec<T>,

    /// Total matching rows across all pages
    pub total: i64,

    /// 1-based page number served
    pub page: i64,

    /// Page size used
    pub per_page: i64,

    /// Total number of pages
    pub total_pages: i64,
}

impl<T> Page<T> {
    /// Assembles a page envelope from query results and the original params
    pub fn new(data: Vec<T>, total: i64, pagination: Pagination) -> Self {
        let per_page = pagination.limit();
        let total_pages = if total == 0 {
            0
        } else {
            (total + per_page - 1) / per_page
        };

        Self {
            data,
            total,
            page: pagination.page.max(1),
            per_page,
            total_pages,
        }
    }
}
