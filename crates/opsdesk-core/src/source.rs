//! The data-fetch boundary a list controller pulls pages through

use crate::error::CoreResult;
use crate::pagination::{PageMeta, PaginationMode};
use crate::query::PageQuery;
use async_trait::async_trait;

/// One page of rows, with metadata when the source provides it
#[derive(Debug, Clone)]
pub struct PageResponse<T> {
    pub items: Vec<T>,
    pub meta: Option<PageMeta>,
}

impl<T> PageResponse<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self { items, meta: None }
    }

    pub fn with_meta(mut self, meta: PageMeta) -> Self {
        self.meta = Some(meta);
        self
    }
}

/// Fetches pages for a list view
#[async_trait]
pub trait PageSource: Send + Sync {
    type Row: Clone + Send + Sync + 'static;

    /// Whether responses carry authoritative page counts
    fn pagination_mode(&self) -> PaginationMode;

    async fn fetch_page(&self, query: &PageQuery) -> CoreResult<PageResponse<Self::Row>>;
}
