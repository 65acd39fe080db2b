//! HTTP server for the back office with HTMX support
//!
//! Routes are organized into modules:
//! - routes::lists: list pages, HTMX partials and JSON snapshots
//! - routes::events: realtime webhook and hub status
//! - routes::actions: operator actions on single rows
//! - routes::settings: configuration display

pub mod error;
pub mod routes;

use axum::{
    extract::State,
    http::HeaderMap,
    response::Html,
    routing::{get, post},
    Router,
};
use opsdesk_config::Config;
use opsdesk_core::{ListKind, ListRegistry, OperatorActions, RealtimeHub};
use opsdesk_utils::{escape_html, format_number};
use std::sync::Arc;
use tokio::net::TcpListener;

pub use error::ApiError;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub hub: Arc<RealtimeHub>,
    pub lists: Arc<ListRegistry>,
    pub actions: Arc<dyn OperatorActions>,
}

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    use routes::actions::{api_delete_product, api_member_action, api_withdrawal_action};
    use routes::events::{api_emit_event, api_realtime_status};
    use routes::lists::{
        api_list_snapshot, htmx_list_filter, htmx_list_limit, htmx_list_page, htmx_list_refresh,
        htmx_list_reset, htmx_list_search, htmx_list_table, page_list,
    };
    use routes::settings::{api_settings, page_settings};

    Router::new()
        // API endpoints
        .route("/api/health", get(health_check))
        .route("/api/settings", get(api_settings))
        .route("/api/lists/:kind", get(api_list_snapshot))
        .route("/api/realtime", get(api_realtime_status))
        .route("/api/events/:event", post(api_emit_event))
        .route("/api/members/:id/actions", post(api_member_action))
        .route("/api/withdrawals/:id/actions", post(api_withdrawal_action))
        .route("/api/products/:id/delete", post(api_delete_product))
        // HTMX page routes
        .route("/", get(index_page))
        .route("/lists/:kind", get(page_list))
        .route("/settings", get(page_settings))
        // HTMX partial routes
        .route("/lists/:kind/list", get(htmx_list_table))
        .route("/lists/:kind/filter", post(htmx_list_filter))
        .route("/lists/:kind/search", post(htmx_list_search))
        .route("/lists/:kind/reset", post(htmx_list_reset))
        .route("/lists/:kind/page/:page", post(htmx_list_page))
        .route("/lists/:kind/limit", post(htmx_list_limit))
        .route("/lists/:kind/refresh", post(htmx_list_refresh))
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

// ==================== Template Functions ====================

/// Base HTML template
pub fn base_html(title: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{} - Opsdesk</title>
    <script src="https://unpkg.com/htmx.org@1.9.10"></script>
    <script src="https://cdn.tailwindcss.com"></script>
    <style>
        .htmx-indicator {{ opacity: 0; transition: opacity 0.3s; }}
        .htmx-request .htmx-indicator {{ opacity: 1; }}
        .htmx-request.htmx-indicator {{ opacity: 1; }}
    </style>
</head>
<body class="bg-gray-50 text-gray-900">
    {}
</body>
</html>"#,
        escape_html(title),
        content
    )
}

/// Navigation sidebar
pub fn nav_sidebar(current_path: &str) -> String {
    let mut links: Vec<(String, &str)> = vec![("/".to_string(), "Dashboard")];
    for kind in ListKind::ALL {
        links.push((format!("/lists/{}", kind), kind.title()));
    }
    links.push(("/settings".to_string(), "Settings"));

    let mut nav = String::from("<div class='bg-white border-r h-screen flex flex-col'><div class='p-4 border-b'><h1 class='text-xl font-bold text-indigo-600'>Opsdesk</h1></div><ul class='flex-1 py-2 space-y-1 px-2'>");

    for (path, label) in &links {
        let is_active = if path == "/" {
            current_path == "/"
        } else {
            current_path.starts_with(path.as_str())
        };
        let active_class = if is_active { "bg-indigo-50 text-indigo-600" } else { "text-gray-600 hover:bg-gray-50" };
        nav.push_str(&format!(
            r#"<li><a href='{}' class='flex items-center gap-2 px-3 py-2 rounded-lg {}'><span>{}</span></a></li>"#,
            path, active_class, label
        ));
    }
    nav.push_str("</ul></div>");
    nav
}

/// Check if request is from HTMX (partial page update)
fn is_htmx_request(headers: &HeaderMap) -> bool {
    headers.get("hx-request").is_some()
}

/// Wrap content for full page or HTMX partial
pub fn page_response(headers: &HeaderMap, title: &str, current_path: &str, inner_content: &str) -> String {
    if is_htmx_request(headers) {
        format!("<main class='flex-1 overflow-auto bg-gray-50 p-6'>{}</main>", inner_content)
    } else {
        base_html(title, &format!(r#"<div class='flex flex-col h-screen'>
    <div class='flex flex-1 overflow-hidden'>
        <aside class='w-64 flex-shrink-0'>{}</aside>
        <main class='flex-1 overflow-auto bg-gray-50 p-6'>{}</main>
    </div>
</div>"#,
            nav_sidebar(current_path), inner_content))
    }
}

/// Index page: one card per mounted list plus the realtime state
async fn index_page(State(state): State<AppState>, headers: HeaderMap) -> Html<String> {
    let status = state.hub.status();
    let connection = match status.connected_at {
        Some(since) if status.connected => format!(
            "<span class='text-green-600'>Connected since {}</span>",
            since.format("%Y-%m-%d %H:%M:%S UTC")
        ),
        _ => "<span class='text-gray-500'>Disconnected; lists refresh on operator input only</span>".to_string(),
    };

    let cards: Vec<String> = state
        .lists
        .kinds()
        .into_iter()
        .filter_map(|kind| state.lists.get(kind).ok())
        .map(|view| {
            let table = view.table();
            let count = if table.pagination.inferred {
                format!("about {} items", format_number(table.pagination.total_items))
            } else {
                format!("{} items", format_number(table.pagination.total_items))
            };
            format!(
                r#"<a href='/lists/{}' class='block bg-white p-4 rounded-lg border hover:border-indigo-300'>
                    <p class='text-sm text-gray-500'>{}</p>
                    <p class='text-2xl font-bold'>{}</p>
                </a>"#,
                table.kind,
                table.title,
                count
            )
        })
        .collect();

    let inner_content = format!(
        r#"<div class='mb-6'><h2 class='text-2xl font-bold'>Dashboard</h2></div>
        <div class='grid grid-cols-1 md:grid-cols-3 gap-4 mb-6'>{}</div>
        <div class='bg-white rounded-xl shadow-sm p-6'>
            <h3 class='text-lg font-semibold mb-2'>Realtime</h3>
            <p class='text-sm'>{}</p>
        </div>"#,
        cards.join(""),
        connection
    );

    Html(page_response(&headers, "Dashboard", "/", &inner_content))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
    }
    log::info!("Shutdown requested");
}

/// Start the HTTP server
///
/// Serves until Ctrl-C, then unmounts every list (no refresh can fire
/// afterwards) and disconnects the realtime hub.
pub async fn start_server(state: AppState) -> anyhow::Result<()> {
    let addr = state.config.bind_address();
    let router = create_router(state.clone());

    let listener = TcpListener::bind(&addr).await?;
    log::info!("Starting opsdesk on http://{}", addr);
    for kind in state.lists.kinds() {
        log::info!("  - /lists/{} ({})", kind, kind.title());
    }

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.lists.unmount_all();
    state.hub.disconnect();
    log::info!("Server stopped gracefully");
    Ok(())
}
