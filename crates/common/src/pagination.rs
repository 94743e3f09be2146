//! Page/limit handling for list endpoints.

use serde::{Deserialize, Serialize};

/// Default page size.
pub const DEFAULT_LIMIT: u64 = 10;
/// Largest accepted page size.
pub const MAX_LIMIT: u64 = 50;

/// Raw pagination parameters as sent by the client.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    /// 1-based page number.
    #[serde(default)]
    pub page: Option<u64>,
    /// Items per page.
    #[serde(default)]
    pub limit: Option<u64>,
}

impl PageQuery {
    /// Build a query from explicit values.
    #[must_use]
    pub const fn new(page: u64, limit: u64) -> Self {
        Self {
            page: Some(page),
            limit: Some(limit),
        }
    }

    /// Page number, at least 1.
    #[must_use]
    pub fn page(&self) -> u64 {
        self.page.unwrap_or(1).max(1)
    }

    /// Page size, clamped to `1..=MAX_LIMIT`.
    #[must_use]
    pub fn limit(&self) -> u64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    /// Row offset of the first item on this page.
    #[must_use]
    pub fn offset(&self) -> u64 {
        (self.page() - 1).saturating_mul(self.limit())
    }
}

/// Pagination block returned alongside a page of items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[allow(missing_docs)]
pub struct PageMeta {
    pub current_page: u64,
    pub total_pages: u64,
    pub total_items: u64,
    pub per_page: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PageMeta {
    /// Compute metadata for `query` over `total_items` rows.
    #[must_use]
    pub fn new(query: &PageQuery, total_items: u64) -> Self {
        let page = query.page();
        let per_page = query.limit();
        let total_pages = total_items.div_ceil(per_page);

        Self {
            current_page: page,
            total_pages,
            total_items,
            per_page,
            has_next: page < total_pages,
            has_prev: page > 1,
        }
    }
}

/// A page of items plus its metadata.
#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T: Serialize> {
    /// Items on this page.
    pub items: Vec<T>,
    /// Page metadata.
    pub pagination: PageMeta,
}

impl<T: Serialize> Paginated<T> {
    /// Convert every item, keeping the metadata.
    pub fn map<U: Serialize>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            items: self.items.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }
}
