//! List API endpoints - JSON snapshots and HTMX partial responses

use super::page::{render_section, render_table};
use crate::{ApiError, AppState};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::{Form, Json};
use opsdesk_core::ListView;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct LimitForm {
    pub limit: u32,
}

fn table_html(state: &AppState, view: &Arc<dyn ListView>) -> Html<String> {
    Html(render_table(&view.table(), state.config.pagination.max_visible_pages))
}

/// Write submitted filter inputs into the draft
fn apply_draft(view: &Arc<dyn ListView>, fields: &HashMap<String, String>) {
    for (key, value) in fields {
        view.set_filter(key, value);
    }
}

/// Current list state as JSON (no fetch)
pub async fn api_list_snapshot(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let view = state.lists.resolve(&kind)?;
    Ok(Json(view.to_json()?))
}

/// HTMX: table region for the current snapshot (no fetch)
pub async fn htmx_list_table(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> Result<Html<String>, ApiError> {
    let view = state.lists.resolve(&kind)?;
    Ok(table_html(&state, &view))
}

/// HTMX: draft edit. Nothing is fetched and nothing is swapped.
pub async fn htmx_list_filter(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Form(fields): Form<HashMap<String, String>>,
) -> Result<StatusCode, ApiError> {
    let view = state.lists.resolve(&kind)?;
    apply_draft(&view, &fields);
    Ok(StatusCode::NO_CONTENT)
}

/// HTMX: commit the submitted filters and load page 1
pub async fn htmx_list_search(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Form(fields): Form<HashMap<String, String>>,
) -> Result<Html<String>, ApiError> {
    let view = state.lists.resolve(&kind)?;
    apply_draft(&view, &fields);
    // An invalid draft is kept on the snapshot and rendered above the table
    if let Err(e) = view.search().await {
        log::debug!(target: "opsdesk::list", "[{}] search rejected: {}", kind, e);
    }
    Ok(table_html(&state, &view))
}

/// HTMX: clear filters and re-render the whole section
pub async fn htmx_list_reset(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> Result<Html<String>, ApiError> {
    let view = state.lists.resolve(&kind)?;
    view.reset().await;
    Ok(Html(render_section(
        &view.table(),
        state.config.pagination.max_visible_pages,
    )))
}

pub async fn htmx_list_page(
    State(state): State<AppState>,
    Path((kind, page)): Path<(String, u32)>,
) -> Result<Html<String>, ApiError> {
    let view = state.lists.resolve(&kind)?;
    view.go_to_page(page).await;
    Ok(table_html(&state, &view))
}

pub async fn htmx_list_limit(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Form(form): Form<LimitForm>,
) -> Result<Html<String>, ApiError> {
    let view = state.lists.resolve(&kind)?;
    view.set_page_size(form.limit).await;
    Ok(table_html(&state, &view))
}

pub async fn htmx_list_refresh(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> Result<Html<String>, ApiError> {
    let view = state.lists.resolve(&kind)?;
    view.refresh().await;
    Ok(table_html(&state, &view))
}

#[cfg(test)]
mod tests {
    use crate::create_router;
    use crate::test_support::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use axum::Router;
    use serde_json::Value;
    use std::sync::atomic::Ordering;
    use tower::ServiceExt;

    fn form(uri: &str, body: &str) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header("hx-request", "true")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn snapshot(router: &Router) -> Value {
        let response = router
            .clone()
            .oneshot(Request::get("/api/lists/members").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        serde_json::from_str(&body_string(response).await).unwrap()
    }

    #[tokio::test]
    async fn test_snapshot_after_mount() {
        let (state, _, _) = state_with_members().await;
        let router = create_router(state);
        let json = snapshot(&router).await;
        assert_eq!(json["items"].as_array().unwrap().len(), 10);
        assert_eq!(json["pagination"]["currentPage"], 1);
        assert_eq!(json["pagination"]["totalPages"], 2);
        assert_eq!(json["pagination"]["inferred"], true);
    }

    #[tokio::test]
    async fn test_unknown_list_is_404() {
        let (state, _, _) = state_with_members().await;
        let response = create_router(state)
            .oneshot(Request::get("/api/lists/bonuses").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json: Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(json["error"]["code"], "UNKNOWN_LIST");
    }

    #[tokio::test]
    async fn test_filter_edit_does_not_fetch() {
        let (state, source, _) = state_with_members().await;
        let router = create_router(state);
        let before = source.calls.load(Ordering::SeqCst);

        let response = router
            .clone()
            .oneshot(form("/lists/members/filter", "userId=7"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(source.calls.load(Ordering::SeqCst), before);

        let json = snapshot(&router).await;
        assert_eq!(json["draft"]["userId"], "7");
        assert!(json["applied"].as_object().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_commits_and_renders() {
        let (state, source, _) = state_with_members().await;
        let router = create_router(state);
        let before = source.calls.load(Ordering::SeqCst);

        let response = router
            .clone()
            .oneshot(form("/lists/members/search", "userId=7&userType=all"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_string(response).await;
        assert!(html.contains("data-id='7'"));
        assert!(!html.contains("data-id='8'"));
        assert_eq!(source.calls.load(Ordering::SeqCst), before + 1);

        let json = snapshot(&router).await;
        assert_eq!(json["applied"]["userId"], "7");
        assert!(json["applied"].get("userType").is_none());
    }

    #[tokio::test]
    async fn test_invalid_search_renders_validation_error() {
        let (state, source, _) = state_with_members().await;
        let router = create_router(state);
        let before = source.calls.load(Ordering::SeqCst);

        let response = router
            .clone()
            .oneshot(form("/lists/members/search", "phoneLast4=12a"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_string(response).await;
        assert!(html.contains("VALIDATION_ERROR"));
        assert!(html.contains("exactly 4 digits"));
        // Previous rows stay visible
        assert!(html.contains("data-id='1'"));
        assert_eq!(source.calls.load(Ordering::SeqCst), before);
    }

    #[tokio::test]
    async fn test_paging_and_page_size() {
        let (state, _, _) = state_with_members().await;
        let router = create_router(state);

        let html = body_string(
            router
                .clone()
                .oneshot(form("/lists/members/page/2", ""))
                .await
                .unwrap(),
        )
        .await;
        assert!(html.contains("data-id='11'"));
        assert_eq!(snapshot(&router).await["pagination"]["currentPage"], 2);

        router
            .clone()
            .oneshot(form("/lists/members/limit", "limit=20"))
            .await
            .unwrap();
        let json = snapshot(&router).await;
        assert_eq!(json["pagination"]["currentPage"], 1);
        assert_eq!(json["pagination"]["limit"], 20);
        assert_eq!(json["items"].as_array().unwrap().len(), 20);
    }

    #[tokio::test]
    async fn test_reset_returns_whole_section() {
        let (state, _, _) = state_with_members().await;
        let router = create_router(state);
        router
            .clone()
            .oneshot(form("/lists/members/search", "userId=7"))
            .await
            .unwrap();

        let response = router
            .clone()
            .oneshot(form("/lists/members/reset", ""))
            .await
            .unwrap();
        let html = body_string(response).await;
        assert!(html.starts_with("<section id='list-members'>"));
        assert!(html.contains("data-id='8'"));
        assert!(snapshot(&router).await["applied"].as_object().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_full_page_and_fragment() {
        let (state, _, _) = state_with_members().await;
        let router = create_router(state);

        let response = router
            .clone()
            .oneshot(Request::get("/lists/members").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let html = body_string(response).await;
        assert!(html.contains("<title>Member List - Opsdesk</title>"));
        assert!(html.contains("id='table-members'"));

        let response = router
            .clone()
            .oneshot(Request::get("/lists/members/list").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let html = body_string(response).await;
        assert!(!html.contains("<section"));
        assert!(html.contains("<table"));
    }
}
