//! List view controller
//!
//! Owns the query state of one list view and the rows it last displayed.
//! Every load is stamped with a sequence number; a response is applied only
//! if no newer load was issued while it was in flight. Failures never
//! escape: they are stored on the controller and show up in
//! [`ListController::snapshot`].

use crate::error::{CoreError, CoreResult, DefaultErrorLogger, ErrorContext, ErrorDetails, ErrorLogger};
use crate::filters::{AppliedFilters, FilterDraft, FilterSchema};
use crate::inferred::InferredPager;
use crate::pagination::{PageDescriptor, PageSizes, PaginationMode};
use crate::query::QueryState;
use crate::source::{PageResponse, PageSource};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// What happened to a load once its response came back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadOutcome {
    /// Rows and pagination were replaced
    Applied,
    /// The request failed; previous rows are still shown
    Failed,
    /// A newer load was issued meanwhile; the response was discarded
    Superseded,
}

/// Everything the presentation layer needs to draw a list view
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSnapshot<R> {
    pub name: String,
    pub items: Vec<R>,
    /// First load still in flight
    pub is_loading: bool,
    /// Any load in flight
    pub is_fetching: bool,
    pub error: Option<ErrorDetails>,
    pub validation_error: Option<ErrorDetails>,
    pub pagination: PageDescriptor,
    pub draft: FilterDraft,
    pub applied: AppliedFilters,
    pub page_sizes: Vec<u32>,
}

struct ListState<R> {
    query: QueryState,
    inferred: InferredPager,
    items: Vec<R>,
    descriptor: PageDescriptor,
    loaded_once: bool,
    latest_seq: u64,
    settled_seq: u64,
    fetch_error: Option<ErrorDetails>,
    validation_error: Option<ErrorDetails>,
}

pub struct ListController<S: PageSource> {
    name: String,
    source: Arc<S>,
    state: Mutex<ListState<S::Row>>,
    logger: Arc<dyn ErrorLogger>,
}

impl<S: PageSource> ListController<S> {
    pub fn new(
        name: &str,
        source: Arc<S>,
        schema: FilterSchema,
        sizes: PageSizes,
        default_limit: u32,
    ) -> Self {
        let query = QueryState::new(schema, sizes, default_limit);
        let limit = query.pagination().limit();
        Self {
            name: name.to_string(),
            source,
            state: Mutex::new(ListState {
                query,
                inferred: InferredPager::new(limit),
                items: Vec::new(),
                descriptor: PageDescriptor::empty(limit),
                loaded_once: false,
                latest_seq: 0,
                settled_seq: 0,
                fetch_error: None,
                validation_error: None,
            }),
            logger: Arc::new(DefaultErrorLogger),
        }
    }

    pub fn with_logger(mut self, logger: Arc<dyn ErrorLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> FilterSchema {
        self.lock().query.filters().schema().clone()
    }

    fn lock(&self) -> MutexGuard<'_, ListState<S::Row>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Keystroke in a filter input. Never fetches.
    pub fn on_filter_change(&self, key: &str, value: &str) {
        self.lock().query.set_draft(key, value);
    }

    /// Apply the draft filters and load page 1.
    ///
    /// Invalid input is stored as the validation error and returned; the
    /// applied filters and the displayed rows stay as they were.
    pub async fn on_search(&self) -> CoreResult<LoadOutcome> {
        {
            let mut state = self.lock();
            if let Err(e) = state.query.commit() {
                log::info!(target: "opsdesk::list", "[{}] search blocked: {}", self.name, e);
                state.validation_error = Some(e.to_details());
                return Err(e);
            }
            state.validation_error = None;
            let limit = state.query.pagination().limit();
            state.inferred.reset(limit);
            state.query.pagination_mut().set_total_pages(None);
        }
        Ok(self.load().await)
    }

    /// Clear all filters and load page 1
    pub async fn on_reset(&self) -> LoadOutcome {
        {
            let mut state = self.lock();
            state.query.reset();
            state.validation_error = None;
            let limit = state.query.pagination().limit();
            state.inferred.reset(limit);
            state.query.pagination_mut().set_total_pages(None);
        }
        self.load().await
    }

    /// Go to page `n`, clamped to the known page count.
    ///
    /// Returns `None` without fetching when that is the current page.
    pub async fn on_page_change(&self, n: u32) -> Option<LoadOutcome> {
        let moved = self.lock().query.go_to_page(n);
        if !moved {
            return None;
        }
        Some(self.load().await)
    }

    /// Change the page size and load page 1
    pub async fn on_page_size_change(&self, limit: u32) -> LoadOutcome {
        {
            let mut state = self.lock();
            state.query.set_limit(limit);
            let limit = state.query.pagination().limit();
            state.inferred.reset(limit);
            state.query.pagination_mut().set_total_pages(None);
        }
        self.load().await
    }

    /// Reload the current page with the current filters
    pub async fn refresh(&self) -> LoadOutcome {
        self.load().await
    }

    async fn load(&self) -> LoadOutcome {
        let (seq, query) = {
            let mut state = self.lock();
            state.latest_seq += 1;
            (state.latest_seq, state.query.to_page_query())
        };

        log::debug!(
            target: "opsdesk::list",
            "[{}] load #{} page={} limit={} filters={}",
            self.name,
            seq,
            query.page,
            query.limit,
            query.filters.len()
        );

        let result = self.source.fetch_page(&query).await;

        let mut state = self.lock();
        if seq != state.latest_seq {
            log::debug!(
                target: "opsdesk::list",
                "[{}] discarding superseded response #{} (latest #{})",
                self.name,
                seq,
                state.latest_seq
            );
            return LoadOutcome::Superseded;
        }
        state.settled_seq = seq;

        let described = result.and_then(|response| {
            let descriptor = self.describe(&mut state, &response, query.page)?;
            Ok((response, descriptor))
        });

        match described {
            Ok((response, descriptor)) => {
                state
                    .query
                    .pagination_mut()
                    .set_total_pages(Some(descriptor.total_pages));
                state.descriptor = descriptor;
                state.items = response.items;
                state.loaded_once = true;
                state.fetch_error = None;
                LoadOutcome::Applied
            }
            Err(e) => {
                let context = ErrorContext::new("fetch_page")
                    .with_list(&self.name)
                    .with_data("page", serde_json::json!(query.page))
                    .with_data("limit", serde_json::json!(query.limit));
                self.logger.log_error(&e, &context);
                state.fetch_error = Some(e.to_details());
                LoadOutcome::Failed
            }
        }
    }

    /// Page counts come from the source's declared mode, never from the
    /// response shape. An authoritative source without metadata is a
    /// broken response.
    fn describe(
        &self,
        state: &mut ListState<S::Row>,
        response: &PageResponse<S::Row>,
        page: u32,
    ) -> CoreResult<PageDescriptor> {
        let limit = state.query.pagination().limit();
        match (self.source.pagination_mode(), &response.meta) {
            (PaginationMode::Authoritative, Some(meta)) => {
                Ok(PageDescriptor::from_meta(meta, page, limit))
            }
            (PaginationMode::Authoritative, None) => Err(CoreError::Decode {
                message: "response carries no pagination metadata".to_string(),
            }),
            (PaginationMode::Inferred, _) => Ok(state.inferred.observe(page, response.items.len())),
        }
    }

    pub fn snapshot(&self) -> ListSnapshot<S::Row> {
        let state = self.lock();
        let is_fetching = state.settled_seq < state.latest_seq;
        ListSnapshot {
            name: self.name.clone(),
            items: state.items.clone(),
            is_loading: is_fetching && !state.loaded_once,
            is_fetching,
            error: state.fetch_error.clone(),
            validation_error: state.validation_error.clone(),
            pagination: state.descriptor,
            draft: state.query.filters().draft().clone(),
            applied: state.query.filters().applied().clone(),
            page_sizes: state.query.pagination().sizes().as_slice().to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::FilterField;
    use crate::pagination::PageMeta;
    use crate::query::PageQuery;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use tokio::sync::oneshot;

    type Responder = Box<dyn Fn(&PageQuery) -> CoreResult<PageResponse<String>> + Send + Sync>;

    /// Page source answering from a closure; selected calls wait on a gate
    struct ScriptedSource {
        mode: PaginationMode,
        calls: Mutex<Vec<PageQuery>>,
        gates: Mutex<HashMap<usize, oneshot::Receiver<()>>>,
        responder: Responder,
    }

    impl ScriptedSource {
        fn new(mode: PaginationMode, responder: Responder) -> Self {
            Self {
                mode,
                calls: Mutex::new(Vec::new()),
                gates: Mutex::new(HashMap::new()),
                responder,
            }
        }

        fn gate(&self, call: usize) -> oneshot::Sender<()> {
            let (tx, rx) = oneshot::channel();
            self.gates.lock().unwrap().insert(call, rx);
            tx
        }

        fn calls(&self) -> Vec<PageQuery> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PageSource for ScriptedSource {
        type Row = String;

        fn pagination_mode(&self) -> PaginationMode {
            self.mode
        }

        async fn fetch_page(&self, query: &PageQuery) -> CoreResult<PageResponse<String>> {
            let gate = {
                let mut calls = self.calls.lock().unwrap();
                let index = calls.len();
                calls.push(query.clone());
                self.gates.lock().unwrap().remove(&index)
            };
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            (self.responder)(query)
        }
    }

    fn schema() -> FilterSchema {
        FilterSchema::new(vec![
            FilterField::text("name", "Name"),
            FilterField::integer("userId", "User ID"),
            FilterField::decimal("minPrice", "Min price"),
            FilterField::decimal("maxPrice", "Max price"),
        ])
        .with_range("minPrice", "maxPrice")
    }

    /// One row per request naming the filter and page it answered
    fn echo(query: &PageQuery) -> CoreResult<PageResponse<String>> {
        let name = query.filters.get("name").unwrap_or("*");
        Ok(PageResponse::new(vec![format!("{}@{}", name, query.page)]))
    }

    /// Rows for a list of `total` items
    fn sized(total: usize) -> Responder {
        Box::new(move |query: &PageQuery| -> CoreResult<PageResponse<String>> {
            let start = (query.page as usize - 1) * query.limit as usize;
            let end = (start + query.limit as usize).min(total);
            let rows = (start..end.max(start)).map(|i| i.to_string()).collect();
            Ok(PageResponse::new(rows))
        })
    }

    fn controller(source: ScriptedSource) -> (Arc<ListController<ScriptedSource>>, Arc<ScriptedSource>) {
        let source = Arc::new(source);
        let controller = ListController::new(
            "members",
            Arc::clone(&source),
            schema(),
            PageSizes::default(),
            10,
        );
        (Arc::new(controller), source)
    }

    #[tokio::test]
    async fn test_filter_change_does_not_fetch() {
        let (list, source) = controller(ScriptedSource::new(
            PaginationMode::Inferred,
            Box::new(echo),
        ));
        list.on_filter_change("name", "kim");
        assert!(source.calls().is_empty());
        assert!(list.snapshot().applied.is_empty());
    }

    #[tokio::test]
    async fn test_search_sends_applied_filters_on_page_one() {
        let (list, source) = controller(ScriptedSource::new(
            PaginationMode::Inferred,
            Box::new(echo),
        ));
        list.refresh().await;
        list.on_page_change(2).await;

        list.on_filter_change("name", "kim");
        list.on_filter_change("userId", "");
        assert_eq!(list.on_search().await, Ok(LoadOutcome::Applied));

        let last = source.calls().pop().unwrap();
        assert_eq!(last.page, 1);
        assert_eq!(
            last.to_pairs(),
            vec![
                ("page".to_string(), "1".to_string()),
                ("limit".to_string(), "10".to_string()),
                ("name".to_string(), "kim".to_string()),
            ]
        );
        assert_eq!(list.snapshot().items, vec!["kim@1".to_string()]);
    }

    #[tokio::test]
    async fn test_validation_error_blocks_fetch() {
        let (list, source) = controller(ScriptedSource::new(
            PaginationMode::Inferred,
            Box::new(echo),
        ));
        list.on_filter_change("minPrice", "10");
        list.on_search().await.unwrap();
        let calls_before = source.calls().len();

        list.on_filter_change("minPrice", "100");
        list.on_filter_change("maxPrice", "50");
        let err = list.on_search().await.unwrap_err();
        assert!(matches!(err, CoreError::InvalidRange { .. }));

        assert_eq!(source.calls().len(), calls_before);
        let snapshot = list.snapshot();
        assert_eq!(snapshot.applied.get("minPrice"), Some("10"));
        assert!(!snapshot.applied.contains_key("maxPrice"));
        assert!(snapshot.validation_error.is_some());

        // fixing the input clears the inline error
        list.on_filter_change("maxPrice", "500");
        list.on_search().await.unwrap();
        assert!(list.snapshot().validation_error.is_none());
    }

    #[tokio::test]
    async fn test_stale_response_is_discarded() {
        let (list, source) = controller(ScriptedSource::new(
            PaginationMode::Inferred,
            Box::new(echo),
        ));
        let release_a = source.gate(0);

        list.on_filter_change("name", "x");
        let first = {
            let list = Arc::clone(&list);
            tokio::spawn(async move { list.on_search().await })
        };
        while source.calls().is_empty() {
            tokio::task::yield_now().await;
        }
        assert!(list.snapshot().is_loading);

        list.on_filter_change("name", "y");
        assert_eq!(list.on_search().await, Ok(LoadOutcome::Applied));
        assert_eq!(list.snapshot().items, vec!["y@1".to_string()]);

        release_a.send(()).unwrap();
        assert_eq!(first.await.unwrap(), Ok(LoadOutcome::Superseded));

        let snapshot = list.snapshot();
        assert_eq!(snapshot.items, vec!["y@1".to_string()]);
        assert!(!snapshot.is_fetching);
    }

    #[tokio::test]
    async fn test_first_load_failure_shows_no_rows() {
        let (list, _) = controller(ScriptedSource::new(
            PaginationMode::Inferred,
            Box::new(|_: &PageQuery| -> CoreResult<PageResponse<String>> {
                Err(CoreError::Transport {
                    message: "connection refused".to_string(),
                })
            }),
        ));
        assert_eq!(list.refresh().await, LoadOutcome::Failed);

        let snapshot = list.snapshot();
        assert!(snapshot.items.is_empty());
        assert!(!snapshot.is_loading);
        let error = snapshot.error.unwrap();
        assert!(error.retryable);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_stale_rows() {
        let fail = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let flag = Arc::clone(&fail);
        let (list, _) = controller(ScriptedSource::new(
            PaginationMode::Inferred,
            Box::new(move |query: &PageQuery| -> CoreResult<PageResponse<String>> {
                if flag.load(std::sync::atomic::Ordering::SeqCst) {
                    Err(CoreError::Status {
                        status: 502,
                        message: "bad gateway".to_string(),
                    })
                } else {
                    echo(query)
                }
            }),
        ));

        list.refresh().await;
        fail.store(true, std::sync::atomic::Ordering::SeqCst);
        assert_eq!(list.refresh().await, LoadOutcome::Failed);

        let snapshot = list.snapshot();
        assert_eq!(snapshot.items, vec!["*@1".to_string()]);
        assert!(snapshot.error.is_some());

        // a later success clears the error
        fail.store(false, std::sync::atomic::Ordering::SeqCst);
        list.refresh().await;
        assert!(list.snapshot().error.is_none());
    }

    #[tokio::test]
    async fn test_inferred_pagination_retracts() {
        let (list, _) = controller(ScriptedSource::new(PaginationMode::Inferred, sized(14)));

        list.refresh().await;
        let first = list.snapshot().pagination;
        assert!(first.total_pages >= 2);
        assert!(first.inferred);

        list.on_page_change(2).await;
        let second = list.snapshot().pagination;
        assert_eq!(second.total_pages, 2);
        assert_eq!(second.current_page, 2);
        assert_eq!(list.snapshot().items.len(), 4);

        // known end: page 3 clamps to 2 and does not fetch
        assert_eq!(list.on_page_change(3).await, None);
    }

    #[tokio::test]
    async fn test_authoritative_meta_used() {
        let (list, _) = controller(ScriptedSource::new(
            PaginationMode::Authoritative,
            Box::new(|query: &PageQuery| -> CoreResult<PageResponse<String>> {
                Ok(PageResponse::new(vec!["p".to_string()]).with_meta(PageMeta {
                    page: query.page,
                    limit: query.limit,
                    total: 95,
                    total_pages: 10,
                }))
            }),
        ));
        list.refresh().await;
        let pagination = list.snapshot().pagination;
        assert_eq!(pagination.total_pages, 10);
        assert_eq!(pagination.total_items, 95);
        assert!(!pagination.inferred);

        assert!(list.on_page_change(10).await.is_some());
        assert_eq!(list.snapshot().pagination.current_page, 10);
    }

    #[tokio::test]
    async fn test_authoritative_without_meta_is_an_error() {
        let (list, _) = controller(ScriptedSource::new(PaginationMode::Authoritative, sized(25)));
        assert_eq!(list.refresh().await, LoadOutcome::Failed);

        let snapshot = list.snapshot();
        assert!(snapshot.items.is_empty());
        assert_eq!(snapshot.error.map(|e| e.code), Some(crate::error::ErrorCode::DecodeError));
        assert_eq!(snapshot.pagination.total_pages, 1);
    }

    #[tokio::test]
    async fn test_new_search_forgets_previous_page_count() {
        let fail = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let flag = Arc::clone(&fail);
        let rows = sized(100);
        let (list, _) = controller(ScriptedSource::new(
            PaginationMode::Inferred,
            Box::new(move |query: &PageQuery| -> CoreResult<PageResponse<String>> {
                if flag.load(std::sync::atomic::Ordering::SeqCst) {
                    Err(CoreError::Transport {
                        message: "connection reset".to_string(),
                    })
                } else {
                    rows(query)
                }
            }),
        ));
        list.refresh().await;
        list.on_page_change(2).await;
        list.on_page_change(3).await;

        fail.store(true, std::sync::atomic::Ordering::SeqCst);
        list.on_filter_change("name", "kim");
        assert_eq!(list.on_search().await, Ok(LoadOutcome::Failed));

        // the unfiltered count of 4 pages no longer clamps navigation
        fail.store(false, std::sync::atomic::Ordering::SeqCst);
        assert!(list.on_page_change(6).await.is_some());
        assert_eq!(list.snapshot().pagination.current_page, 6);

        fail.store(true, std::sync::atomic::Ordering::SeqCst);
        list.on_reset().await;
        fail.store(false, std::sync::atomic::Ordering::SeqCst);
        assert!(list.on_page_change(9).await.is_some());
    }

    #[tokio::test]
    async fn test_page_size_change_resets_page() {
        let (list, source) = controller(ScriptedSource::new(PaginationMode::Inferred, sized(100)));
        list.refresh().await;
        list.on_page_change(2).await;
        list.on_page_change(3).await;

        list.on_page_size_change(20).await;
        let last = source.calls().pop().unwrap();
        assert_eq!((last.page, last.limit), (1, 20));
        assert_eq!(list.snapshot().pagination.limit, 20);
    }

    #[tokio::test]
    async fn test_same_page_does_not_fetch() {
        let (list, source) = controller(ScriptedSource::new(PaginationMode::Inferred, sized(100)));
        list.refresh().await;
        assert_eq!(list.on_page_change(1).await, None);
        assert_eq!(source.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_reset_clears_filters() {
        let (list, source) = controller(ScriptedSource::new(
            PaginationMode::Inferred,
            Box::new(echo),
        ));
        list.on_filter_change("name", "kim");
        list.on_search().await.unwrap();

        list.on_reset().await;
        let snapshot = list.snapshot();
        assert!(snapshot.draft.is_empty());
        assert!(snapshot.applied.is_empty());
        assert!(source.calls().pop().unwrap().filters.is_empty());
    }
}
