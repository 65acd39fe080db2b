//! List routes - filters, table and pager for every mounted list
//!
//! Filter inputs only edit the draft. Search, reset, paging and page size
//! changes fetch and answer with the refreshed table partial. The table
//! region polls its own snapshot, so realtime refreshes done on the server
//! reach the browser without a fetch per poll.

pub mod api;
pub mod page;

pub use api::{
    api_list_snapshot, htmx_list_filter, htmx_list_limit, htmx_list_page, htmx_list_refresh,
    htmx_list_reset, htmx_list_search, htmx_list_table,
};
pub use page::page_list;
