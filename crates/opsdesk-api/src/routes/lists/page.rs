//! List page rendering - full page and HTMX fragments

use crate::{page_response, AppState, ApiError};
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::Html;
use opsdesk_core::filters::ALL_SENTINEL;
use opsdesk_core::{page_window, ErrorDetails, FilterField, FilterKind, PageSlot, TableSnapshot};
use opsdesk_utils::{escape_html, format_money, format_number};

/// Filter form. Inputs post the whole form as draft edits; submit searches.
pub fn render_filters(table: &TableSnapshot) -> String {
    let kind = table.kind;
    let inputs: Vec<String> = table
        .schema
        .fields
        .iter()
        .map(|field| {
            let value = table.draft.get(field.key).map(String::as_str).unwrap_or("");
            format!(
                r#"<label class='flex flex-col text-sm'>
                    <span class='text-gray-600 mb-1'>{}</span>
                    {}
                </label>"#,
                escape_html(field.label),
                render_input(kind.as_str(), field, value)
            )
        })
        .collect();

    format!(
        r#"<form id='filters-{kind}' class='bg-white rounded-xl shadow-sm p-4 mb-4'
              hx-post='/lists/{kind}/search' hx-target='#table-{kind}' hx-swap='innerHTML'>
            <div class='grid grid-cols-2 md:grid-cols-4 lg:grid-cols-6 gap-3 items-end'>
                {inputs}
                <div class='flex gap-2'>
                    <button type='submit' class='px-4 py-2 bg-indigo-600 text-white text-sm rounded-lg hover:bg-indigo-700'>Search</button>
                    <button type='button' class='px-4 py-2 border text-sm rounded-lg hover:bg-gray-50'
                            hx-post='/lists/{kind}/reset' hx-target='#list-{kind}' hx-swap='outerHTML'>Reset</button>
                </div>
            </div>
        </form>"#,
        kind = kind,
        inputs = inputs.join("")
    )
}

fn render_input(kind: &str, field: &FilterField, value: &str) -> String {
    let draft_attrs = format!(
        "name='{}' hx-post='/lists/{}/filter' hx-trigger='change' hx-swap='none'",
        field.key, kind
    );
    match field.kind {
        FilterKind::Select => {
            let mut options = format!(
                "<option value='{}'{}>All</option>",
                ALL_SENTINEL,
                if value.is_empty() || value.eq_ignore_ascii_case(ALL_SENTINEL) { " selected" } else { "" }
            );
            for option in field.options {
                options.push_str(&format!(
                    "<option value='{0}'{1}>{0}</option>",
                    escape_html(option),
                    if value == *option { " selected" } else { "" }
                ));
            }
            format!(
                "<select {} class='px-2 py-1.5 border rounded-lg bg-white'>{}</select>",
                draft_attrs, options
            )
        }
        FilterKind::Digits(length) => format!(
            "<input type='text' inputmode='numeric' maxlength='{}' value='{}' {} class='px-2 py-1.5 border rounded-lg'>",
            length,
            escape_html(value),
            draft_attrs
        ),
        FilterKind::Integer | FilterKind::Decimal => format!(
            "<input type='text' inputmode='decimal' value='{}' {} class='px-2 py-1.5 border rounded-lg'>",
            escape_html(value),
            draft_attrs
        ),
        FilterKind::Text => format!(
            "<input type='text' value='{}' {} class='px-2 py-1.5 border rounded-lg'>",
            escape_html(value),
            draft_attrs
        ),
    }
}

fn render_error(details: &ErrorDetails, tone: &str) -> String {
    let field = details
        .field
        .as_deref()
        .map(|f| format!(" <span class='font-mono'>({})</span>", escape_html(f)))
        .unwrap_or_default();
    let suggestions: String = details
        .suggestions
        .iter()
        .map(|s| format!("<li>{}</li>", escape_html(s)))
        .collect();
    format!(
        r#"<div class='mb-3 p-3 rounded-lg border border-{tone}-200 bg-{tone}-50 text-{tone}-700 text-sm'>
            <span class='font-semibold'>{code}</span> {message}{field}
            <ul class='list-disc ml-5'>{suggestions}</ul>
        </div>"#,
        tone = tone,
        code = details.code,
        message = escape_html(&details.message),
        field = field,
        suggestions = suggestions
    )
}

/// Pager: previous/next, page window and page size selector
pub fn render_pager(table: &TableSnapshot, max_visible: u32) -> String {
    let kind = table.kind;
    let pagination = &table.pagination;
    let button = |page: u32, label: String, enabled: bool, active: bool| {
        let class = if active {
            "bg-indigo-600 text-white"
        } else if enabled {
            "border hover:bg-gray-50"
        } else {
            "border text-gray-300 cursor-not-allowed"
        };
        if enabled && !active {
            format!(
                "<button class='px-3 py-1 text-sm rounded {}' hx-post='/lists/{}/page/{}' hx-target='#table-{}'>{}</button>",
                class, kind, page, kind, label
            )
        } else {
            format!("<button class='px-3 py-1 text-sm rounded {}' disabled>{}</button>", class, label)
        }
    };

    let mut buttons = vec![button(
        pagination.current_page.saturating_sub(1),
        "&laquo;".to_string(),
        pagination.has_previous(),
        false,
    )];
    for slot in page_window(pagination.total_pages, pagination.current_page, max_visible) {
        match slot {
            PageSlot::Page(n) => buttons.push(button(n, n.to_string(), true, n == pagination.current_page)),
            PageSlot::Ellipsis => buttons.push("<span class='px-2 text-gray-400'>&hellip;</span>".to_string()),
        }
    }
    buttons.push(button(
        pagination.current_page + 1,
        "&raquo;".to_string(),
        pagination.has_next(),
        false,
    ));

    let sizes: String = table
        .page_sizes
        .iter()
        .map(|size| {
            format!(
                "<option value='{0}'{1}>{0} / page</option>",
                size,
                if *size == pagination.limit { " selected" } else { "" }
            )
        })
        .collect();

    let total = if pagination.inferred {
        format!("about {} items", format_number(pagination.total_items))
    } else {
        format!("{} items", format_number(pagination.total_items))
    };

    format!(
        r#"<div class='flex items-center justify-between mt-4'>
            <p class='text-sm text-gray-500'>Page {} of {} &middot; {}</p>
            <div class='flex items-center gap-1'>{}</div>
            <select name='limit' class='px-2 py-1 text-sm border rounded-lg bg-white'
                    hx-post='/lists/{}/limit' hx-target='#table-{}' hx-trigger='change'>{}</select>
        </div>"#,
        pagination.current_page,
        pagination.total_pages,
        total,
        buttons.join(""),
        kind,
        kind,
        sizes
    )
}

/// Table region: errors, summary, rows and pager
pub fn render_table(table: &TableSnapshot, max_visible: u32) -> String {
    let mut html = String::new();

    if let Some(details) = &table.validation_error {
        html.push_str(&render_error(details, "amber"));
    }
    if let Some(details) = &table.error {
        html.push_str(&render_error(details, "red"));
    }

    if !table.summary.is_empty() {
        html.push_str("<div class='grid grid-cols-1 md:grid-cols-3 gap-4 mb-4'>");
        for item in &table.summary {
            html.push_str(&format!(
                r#"<div class='bg-white p-4 rounded-lg border'>
                    <p class='text-sm text-gray-500'>{}</p>
                    <p class='text-xl font-bold'>{}</p>
                    <p class='text-xs text-gray-400'>{} requests</p>
                </div>"#,
                escape_html(&item.label),
                format_money(&item.amount),
                item.count
            ));
        }
        html.push_str("</div>");
    }

    let indicator = if table.is_fetching {
        "<span class='text-xs text-indigo-500'>Refreshing&hellip;</span>"
    } else {
        ""
    };

    let headers: String = table
        .headers
        .iter()
        .map(|h| format!("<th class='px-3 py-2 text-left font-medium'>{}</th>", escape_html(h)))
        .collect();

    let body = if table.rows.is_empty() {
        let message = if table.is_loading { "Loading&hellip;" } else { "No records found" };
        format!(
            "<tr><td colspan='{}' class='px-3 py-8 text-center text-gray-400'>{}</td></tr>",
            table.headers.len().max(1),
            message
        )
    } else {
        table
            .rows
            .iter()
            .zip(&table.row_ids)
            .map(|(cells, id)| {
                let cells: String = cells
                    .iter()
                    .map(|c| format!("<td class='px-3 py-2'>{}</td>", escape_html(c)))
                    .collect();
                format!("<tr class='border-t' data-id='{}'>{}</tr>", escape_html(id), cells)
            })
            .collect()
    };

    html.push_str(&format!(
        r#"<div class='bg-white rounded-xl shadow-sm p-4 overflow-x-auto'>
            <div class='flex justify-between items-center mb-2'>
                <div>{indicator}</div>
                <button class='text-sm text-indigo-600 hover:underline'
                        hx-post='/lists/{kind}/refresh' hx-target='#table-{kind}'>Refresh</button>
            </div>
            <table class='min-w-full text-sm'>
                <thead class='bg-gray-50'><tr>{headers}</tr></thead>
                <tbody>{body}</tbody>
            </table>
            {pager}
        </div>"#,
        indicator = indicator,
        kind = table.kind,
        headers = headers,
        body = body,
        pager = render_pager(table, max_visible)
    ));
    html
}

/// Whole list section: filters plus the polled table region
pub fn render_section(table: &TableSnapshot, max_visible: u32) -> String {
    format!(
        r#"<section id='list-{kind}'>
            {filters}
            <div id='table-{kind}' hx-get='/lists/{kind}/list' hx-trigger='every 5s' hx-swap='innerHTML'>{table}</div>
        </section>"#,
        kind = table.kind,
        filters = render_filters(table),
        table = render_table(table, max_visible)
    )
}

pub async fn page_list(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    headers: HeaderMap,
) -> Result<Html<String>, ApiError> {
    let view = state.lists.resolve(&kind)?;
    let table = view.table();
    let inner_content = format!(
        "<div class='mb-6'><h2 class='text-2xl font-bold'>{}</h2></div>{}",
        table.title,
        render_section(&table, state.config.pagination.max_visible_pages)
    );
    Ok(Html(page_response(
        &headers,
        table.title,
        &format!("/lists/{}", table.kind),
        &inner_content,
    )))
}
