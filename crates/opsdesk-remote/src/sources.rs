//! Page sources for the member, product and withdrawal lists

use crate::client::RemoteApi;
use async_trait::async_trait;
use opsdesk_core::{
    CoreResult, Member, PageQuery, PageResponse, PageSource, PaginationMode, Product, Withdrawal,
};
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::sync::Arc;

/// A list endpoint of the remote API
pub struct RemoteSource<R> {
    api: Arc<RemoteApi>,
    path: &'static str,
    mode: PaginationMode,
    _row: PhantomData<fn() -> R>,
}

impl<R> RemoteSource<R> {
    pub fn new(api: Arc<RemoteApi>, path: &'static str, mode: PaginationMode) -> Self {
        Self {
            api,
            path,
            mode,
            _row: PhantomData,
        }
    }
}

impl RemoteSource<Member> {
    /// `/user/getAll` returns bare pages without counts
    pub fn members(api: Arc<RemoteApi>) -> Self {
        Self::new(api, "/user/getAll", PaginationMode::Inferred)
    }
}

impl RemoteSource<Product> {
    /// `/product/getAllProduct` sends no counts either
    pub fn products(api: Arc<RemoteApi>) -> Self {
        Self::new(api, "/product/getAllProduct", PaginationMode::Inferred)
    }
}

impl RemoteSource<Withdrawal> {
    pub fn withdrawals(api: Arc<RemoteApi>) -> Self {
        Self::new(api, "/withdraw/getAll", PaginationMode::Inferred)
    }
}

#[async_trait]
impl<R> PageSource for RemoteSource<R>
where
    R: DeserializeOwned + Clone + Send + Sync + 'static,
{
    type Row = R;

    fn pagination_mode(&self) -> PaginationMode {
        self.mode
    }

    async fn fetch_page(&self, query: &PageQuery) -> CoreResult<PageResponse<R>> {
        let envelope = self.api.get::<Vec<R>>(self.path, &query.to_pairs()).await?;
        let meta = envelope.page_meta();
        let mut response = PageResponse::new(envelope.data.unwrap_or_default());
        if let Some(meta) = meta {
            response = response.with_meta(meta);
        }
        log::debug!(
            target: "opsdesk::remote",
            "{} page {} -> {} rows",
            self.path,
            query.page,
            response.items.len()
        );
        Ok(response)
    }
}
