//! Mounted list views
//!
//! Mounting wires a [`ListController`] to the realtime channel through a
//! [`RealtimeBridge`] and performs the first load. Unmounting detaches the
//! bridge before anything else can fire against the view.

use crate::bridge::RealtimeBridge;
use crate::controller::{ListController, LoadOutcome};
use crate::debounce::Debouncer;
use crate::error::{CoreError, CoreResult, ErrorDetails};
use crate::filters::{AppliedFilters, FilterDraft, FilterSchema};
use crate::lists::ListKind;
use crate::models::{SummaryItem, TableRow};
use crate::pagination::PageDescriptor;
use crate::realtime::RealtimeChannel;
use crate::source::PageSource;
use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Render-ready view of a list: cells instead of typed rows
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSnapshot {
    pub kind: ListKind,
    pub title: &'static str,
    pub headers: Vec<&'static str>,
    pub rows: Vec<Vec<String>>,
    pub row_ids: Vec<String>,
    pub summary: Vec<SummaryItem>,
    pub pagination: PageDescriptor,
    pub page_sizes: Vec<u32>,
    pub is_loading: bool,
    pub is_fetching: bool,
    pub error: Option<ErrorDetails>,
    pub validation_error: Option<ErrorDetails>,
    pub draft: FilterDraft,
    pub applied: AppliedFilters,
    pub schema: FilterSchema,
}

/// Object-safe handle on a mounted list, whatever its row type
#[async_trait]
pub trait ListView: Send + Sync {
    fn kind(&self) -> ListKind;

    fn set_filter(&self, key: &str, value: &str);

    async fn search(&self) -> CoreResult<LoadOutcome>;

    async fn reset(&self) -> LoadOutcome;

    async fn go_to_page(&self, page: u32) -> Option<LoadOutcome>;

    async fn set_page_size(&self, limit: u32) -> LoadOutcome;

    async fn refresh(&self) -> LoadOutcome;

    fn table(&self) -> TableSnapshot;

    /// Snapshot with typed rows, for the JSON API
    fn to_json(&self) -> CoreResult<serde_json::Value>;

    fn unmount(&self);

    fn is_mounted(&self) -> bool;
}

pub struct MountedList<S: PageSource> {
    kind: ListKind,
    controller: Arc<ListController<S>>,
    bridge: RealtimeBridge,
}

impl<S> MountedList<S>
where
    S: PageSource + 'static,
{
    /// Subscribe to `events` and load the first page
    pub async fn mount(
        kind: ListKind,
        controller: Arc<ListController<S>>,
        channel: Arc<dyn RealtimeChannel>,
        events: &[String],
        debounce: Duration,
    ) -> Self {
        let target = Arc::clone(&controller);
        let debouncer = Debouncer::new(kind.as_str(), debounce, move || {
            let target = Arc::clone(&target);
            async move {
                target.refresh().await;
            }
        });
        let bridge = RealtimeBridge::attach(channel, events, debouncer);

        log::info!(
            target: "opsdesk::list",
            "[{}] mounted, listening to {:?}",
            kind,
            bridge.events()
        );

        controller.refresh().await;

        Self {
            kind,
            controller,
            bridge,
        }
    }

    pub fn controller(&self) -> &Arc<ListController<S>> {
        &self.controller
    }
}

#[async_trait]
impl<S> ListView for MountedList<S>
where
    S: PageSource + 'static,
    S::Row: TableRow + Serialize,
{
    fn kind(&self) -> ListKind {
        self.kind
    }

    fn set_filter(&self, key: &str, value: &str) {
        self.controller.on_filter_change(key, value);
    }

    async fn search(&self) -> CoreResult<LoadOutcome> {
        self.controller.on_search().await
    }

    async fn reset(&self) -> LoadOutcome {
        self.controller.on_reset().await
    }

    async fn go_to_page(&self, page: u32) -> Option<LoadOutcome> {
        self.controller.on_page_change(page).await
    }

    async fn set_page_size(&self, limit: u32) -> LoadOutcome {
        self.controller.on_page_size_change(limit).await
    }

    async fn refresh(&self) -> LoadOutcome {
        self.controller.refresh().await
    }

    fn table(&self) -> TableSnapshot {
        let snapshot = self.controller.snapshot();
        TableSnapshot {
            kind: self.kind,
            title: self.kind.title(),
            headers: <S::Row as TableRow>::headers().to_vec(),
            rows: snapshot.items.iter().map(TableRow::cells).collect(),
            row_ids: snapshot.items.iter().map(TableRow::row_id).collect(),
            summary: <S::Row as TableRow>::summarize(&snapshot.items),
            pagination: snapshot.pagination,
            page_sizes: snapshot.page_sizes,
            is_loading: snapshot.is_loading,
            is_fetching: snapshot.is_fetching,
            error: snapshot.error,
            validation_error: snapshot.validation_error,
            draft: snapshot.draft,
            applied: snapshot.applied,
            schema: self.controller.schema(),
        }
    }

    fn to_json(&self) -> CoreResult<serde_json::Value> {
        let snapshot = self.controller.snapshot();
        let summary = <S::Row as TableRow>::summarize(&snapshot.items);
        let mut value = serde_json::to_value(&snapshot).map_err(|e| CoreError::Internal {
            message: e.to_string(),
        })?;
        if !summary.is_empty() {
            value["summary"] = serde_json::to_value(&summary).map_err(|e| CoreError::Internal {
                message: e.to_string(),
            })?;
        }
        Ok(value)
    }

    fn unmount(&self) {
        if self.bridge.is_attached() {
            self.bridge.detach();
            log::info!(target: "opsdesk::list", "[{}] unmounted", self.kind);
        }
    }

    fn is_mounted(&self) -> bool {
        self.bridge.is_attached()
    }
}

/// The mounted list views of the application, by kind
#[derive(Default)]
pub struct ListRegistry {
    views: HashMap<ListKind, Arc<dyn ListView>>,
}

impl ListRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, view: Arc<dyn ListView>) {
        self.views.insert(view.kind(), view);
    }

    pub fn get(&self, kind: ListKind) -> CoreResult<Arc<dyn ListView>> {
        self.views
            .get(&kind)
            .cloned()
            .ok_or_else(|| CoreError::UnknownList {
                name: kind.to_string(),
            })
    }

    /// Look up by URL path segment
    pub fn resolve(&self, name: &str) -> CoreResult<Arc<dyn ListView>> {
        self.get(name.parse()?)
    }

    pub fn kinds(&self) -> Vec<ListKind> {
        let mut kinds: Vec<ListKind> = self.views.keys().copied().collect();
        kinds.sort();
        kinds
    }

    pub fn unmount_all(&self) {
        for view in self.views.values() {
            view.unmount();
        }
    }
}
