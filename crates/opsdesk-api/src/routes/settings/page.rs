//! Settings page rendering - Full page endpoints

use crate::{page_response, AppState};
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Html;
use opsdesk_core::ListKind;
use opsdesk_utils::escape_html;

fn row(label: &str, value: &str) -> String {
    format!(
        "<div><p class='text-sm text-gray-500'>{}</p><p class='font-medium'>{}</p></div>",
        label,
        escape_html(value)
    )
}

pub async fn page_settings(State(state): State<AppState>, headers: HeaderMap) -> Html<String> {
    let config = &state.config;

    let events: String = ListKind::ALL
        .iter()
        .map(|kind| {
            let names = kind.realtime_events(&config.realtime);
            let value = if names.is_empty() { "none".to_string() } else { names.join(", ") };
            row(kind.title(), &value)
        })
        .collect();

    let page_sizes: Vec<String> = config.pagination.page_sizes.iter().map(u32::to_string).collect();

    let inner_content = format!(
        r#"<div class='mb-6'><h2 class='text-2xl font-bold'>Settings</h2></div>
        <div class='bg-white rounded-xl shadow-sm p-6 mb-6'>
            <h3 class='text-lg font-semibold mb-4'>Server</h3>
            <div class='grid grid-cols-2 gap-4 mb-4'>{}{}</div>
        </div>
        <div class='bg-white rounded-xl shadow-sm p-6 mb-6'>
            <h3 class='text-lg font-semibold mb-4'>Remote API</h3>
            <div class='grid grid-cols-2 gap-4 mb-4'>{}{}{}</div>
        </div>
        <div class='bg-white rounded-xl shadow-sm p-6 mb-6'>
            <h3 class='text-lg font-semibold mb-4'>Realtime</h3>
            <div class='grid grid-cols-2 gap-4 mb-4'>{}{}{}</div>
        </div>
        <div class='bg-white rounded-xl shadow-sm p-6'>
            <h3 class='text-lg font-semibold mb-4'>Pagination</h3>
            <div class='grid grid-cols-2 gap-4'>{}{}{}</div>
        </div>"#,
        row("Host", &config.server.host),
        row("Port", &config.server.port.to_string()),
        row("Base URL", &config.remote.base_url),
        row("Token", if config.remote.token.is_some() { "Set" } else { "Not set" }),
        row("Timeout", &format!("{}s", config.remote.timeout_secs)),
        row("Enabled", if config.realtime.enabled { "Yes" } else { "No" }),
        row("Debounce", &format!("{} ms", config.realtime.debounce_ms)),
        events,
        row("Page sizes", &page_sizes.join(", ")),
        row("Default page size", &config.pagination.default_limit.to_string()),
        row("Visible page buttons", &config.pagination.max_visible_pages.to_string())
    );

    Html(page_response(&headers, "Settings", "/settings", &inner_content))
}
