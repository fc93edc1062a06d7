//! This modules defines the common functionality for paging data.

use serde::Serialize;

use crate::Error;

/// The config for pagination
#[derive(Debug, Clone)]
pub struct PaginationConfig {
    /// The page number to default to when not specified in a request.
    pub default_page: u64,
    /// The number of items per page when not specified in a request.
    pub default_page_size: u64,
    /// The largest page size a client may request.
    pub max_page_size: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page: 1,
            default_page_size: 10,
            max_page_size: 100,
        }
    }
}

/// A validated page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// The 1-based page number.
    pub page: u64,
    /// The maximum number of items on the page.
    pub limit: u64,
}

impl PageRequest {
    /// Resolve the page and page size from a request, falling back to the defaults in `config`.
    ///
    /// # Errors
    /// Returns an [Error::Validation] if `page` is zero or so large that the
    /// offset overflows, or if `limit` is zero or larger than the configured maximum.
    pub fn resolve(
        page: Option<u64>,
        limit: Option<u64>,
        config: &PaginationConfig,
    ) -> Result<Self, Error> {
        let page = page.unwrap_or(config.default_page);
        let limit = limit.unwrap_or(config.default_page_size);

        if page == 0 {
            return Err(Error::Validation("page must be at least 1".to_owned()));
        }

        if limit == 0 || limit > config.max_page_size {
            return Err(Error::Validation(format!(
                "limit must be between 1 and {}",
                config.max_page_size
            )));
        }

        // The offset is bound to SQLite's signed 64-bit integers.
        let fits_in_sql = (page - 1)
            .checked_mul(limit)
            .is_some_and(|offset| i64::try_from(offset).is_ok());

        if !fits_in_sql {
            return Err(Error::Validation("page is too large".to_owned()));
        }

        Ok(Self { page, limit })
    }

    /// The number of items to skip before the first item on this page.
    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }
}

/// The pagination details sent alongside a page of items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pagination {
    /// The current page number.
    pub page: u64,
    /// The maximum number of items per page.
    pub limit: u64,
    /// The total number of items across all pages.
    pub total: u64,
    /// The number of pages.
    pub pages: u64,
}

impl Pagination {
    /// Describe the page `request` of a collection with `total` items.
    pub fn new(request: PageRequest, total: u64) -> Self {
        Self {
            page: request.page,
            limit: request.limit,
            total,
            pages: total.div_ceil(request.limit),
        }
    }
}
