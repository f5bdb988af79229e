//! Pagination types

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::{book::Book, loan::LoanDetails};
use crate::config::PaginationConfig;

/// Raw pagination query parameters
#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// Zero-based page index (default: 0)
    pub page: Option<i64>,
    /// Page size (default and maximum come from configuration)
    pub size: Option<i64>,
}

impl PageQuery {
    pub fn resolve(&self, config: &PaginationConfig) -> PageRequest {
        let size = self
            .size
            .unwrap_or(config.default_size)
            .clamp(1, config.max_size.max(1));
        PageRequest::new(self.page.unwrap_or(0), size)
    }
}

/// A bounded slice of a result set. Only built through [`PageRequest::new`],
/// so `size` is always at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: i64,
    size: i64,
}

impl PageRequest {
    pub fn new(page: i64, size: i64) -> Self {
        Self {
            page: page.max(0),
            size: size.max(1),
        }
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn size(&self) -> i64 {
        self.size
    }

    pub fn offset(&self) -> i64 {
        self.page.saturating_mul(self.size)
    }

    pub fn limit(&self) -> i64 {
        self.size
    }

    /// Slice an in-memory, already ordered result set
    pub fn slice<T: Clone>(&self, all: &[T]) -> Vec<T> {
        let offset = usize::try_from(self.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(self.limit()).unwrap_or(usize::MAX);
        all.iter().skip(offset).take(limit).cloned().collect()
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(0, 10)
    }
}

/// Paginated response wrapper
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[aliases(BookPage = Page<Book>, LoanPage = Page<LoanDetails>)]
pub struct Page<T> {
    /// Items of the requested page
    pub items: Vec<T>,
    /// Total number of matching items
    pub total: i64,
    /// Zero-based page index
    pub page: i64,
    /// Requested page size
    pub size: i64,
    pub total_pages: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, request: PageRequest) -> Self {
        let total_pages = if total == 0 {
            0
        } else {
            (total + request.size - 1) / request.size
        };
        Self {
            items,
            total,
            page: request.page,
            size: request.size,
            total_pages,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            size: self.size,
            total_pages: self.total_pages,
        }
    }
}
