//! Filters and pagination combined into the parameters of the next request

use crate::error::CoreResult;
use crate::filters::{AppliedFilters, FilterSchema, FilterState};
use crate::pagination::{PageSizes, Pagination};
use serde::Serialize;

/// Parameters of one page request: `{page, limit, ...applied filters}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageQuery {
    pub page: u32,
    pub limit: u32,
    #[serde(flatten)]
    pub filters: AppliedFilters,
}

impl PageQuery {
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page,
            limit,
            filters: AppliedFilters::default(),
        }
    }

    pub fn with_filters(mut self, filters: AppliedFilters) -> Self {
        self.filters = filters;
        self
    }

    /// Query-string pairs: page, limit, then filters in key order
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("page".to_string(), self.page.to_string()),
            ("limit".to_string(), self.limit.to_string()),
        ];
        pairs.extend(
            self.filters
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string())),
        );
        pairs
    }
}

/// Everything that decides which rows a list view shows
#[derive(Debug, Clone)]
pub struct QueryState {
    filters: FilterState,
    pagination: Pagination,
}

impl QueryState {
    pub fn new(schema: FilterSchema, sizes: PageSizes, default_limit: u32) -> Self {
        Self {
            filters: FilterState::new(schema),
            pagination: Pagination::new(sizes, default_limit),
        }
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn pagination(&self) -> &Pagination {
        &self.pagination
    }

    pub fn pagination_mut(&mut self) -> &mut Pagination {
        &mut self.pagination
    }

    pub fn set_draft(&mut self, key: &str, value: impl Into<String>) {
        self.filters.set_draft(key, value);
    }

    /// Apply the draft and go back to page 1. Nothing changes on error.
    pub fn commit(&mut self) -> CoreResult<()> {
        self.filters.commit()?;
        self.pagination.reset_page();
        Ok(())
    }

    /// Clear all filters and go back to page 1
    pub fn reset(&mut self) {
        self.filters.reset();
        self.pagination.reset_page();
    }

    pub fn go_to_page(&mut self, n: u32) -> bool {
        self.pagination.go_to_page(n)
    }

    pub fn set_limit(&mut self, limit: u32) {
        self.pagination.set_limit(limit);
    }

    /// The request the current state maps to
    pub fn to_page_query(&self) -> PageQuery {
        PageQuery::new(self.pagination.page(), self.pagination.limit())
            .with_filters(self.filters.applied().clone())
    }
}
