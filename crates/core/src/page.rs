//! Page-number pagination primitives.

use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, CatalogResult};

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 10;

/// A validated `(page, limit)` pair. Both are 1-based and at least 1.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    page: u64,
    limit: u64,
}

impl PageRequest {
    pub fn new(page: u64, limit: u64) -> CatalogResult<Self> {
        if page < 1 {
            return Err(CatalogError::validation("page must be a positive integer"));
        }
        if limit < 1 {
            return Err(CatalogError::validation("limit must be a positive integer"));
        }
        Ok(Self { page, limit })
    }

    /// Build from optional query values, falling back to the defaults.
    pub fn from_optional(page: Option<u64>, limit: Option<u64>) -> CatalogResult<Self> {
        Self::new(page.unwrap_or(DEFAULT_PAGE), limit.unwrap_or(DEFAULT_LIMIT))
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Number of records to skip before this page starts.
    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    pub fn meta(&self, total: u64) -> PageMeta {
        PageMeta {
            page: self.page,
            total,
            last_page: last_page(total, self.limit),
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

/// `ceil(total / limit)`; zero when there is nothing to page through.
pub fn last_page(total: u64, limit: u64) -> u64 {
    if limit == 0 {
        return 0;
    }
    total.div_ceil(limit)
}

/// Paging metadata returned with every listing: `{ page, total, lastPage }`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub page: u64,
    pub total: u64,
    pub last_page: u64,
}

/// One page of results plus the metadata needed to request the others.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}
