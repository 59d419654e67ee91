use serde::Serialize;
use utoipa::ToSchema;

/// Page number and size resolved against a listing's limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    /// Page numbers start at 1; a zero or missing page means the first one.
    /// The size falls back to `default_size` and is clamped to `1..=max_size`.
    #[must_use]
    pub fn new(page: Option<u32>, page_size: Option<u32>, default_size: u32, max_size: u32) -> Self {
        let page = page.unwrap_or(1).max(1);
        let page_size = page_size.unwrap_or(default_size).clamp(1, max_size.max(1));
        Self { page, page_size }
    }

    /// Rows to skip, ready to bind as a query `START`.
    #[must_use]
    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.page_size)
    }

    /// Ready to bind as a query `LIMIT`.
    #[must_use]
    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }

    /// Wraps one page of results with its metadata.
    pub fn into_page<T>(self, count: u64, results: Vec<T>) -> Page<T> {
        Page { count, page: self.page, page_size: self.page_size, results }
    }
}

/// A page of a listing: `{count, page, page_size, results}`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Page<T> {
    /// Total number of matching items.
    pub count: u64,
    pub page: u32,
    pub page_size: u32,
    pub results: Vec<T>,
}
