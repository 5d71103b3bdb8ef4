// src/admin/calls.rs
// Execution log pages (read-only)

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    response::Html,
};
use serde::Deserialize;

use super::render::{self, attr, escape};
use crate::api::ApiResult;
use crate::state::AppState;
use crate::store::{CallRecord, ListQuery};

pub const CALLS_PER_PAGE: i64 = 100;
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f UTC";

fn status_cell(call: &CallRecord) -> String {
    format!(
        "<span class=\"status-{0}\">{0}</span>",
        call.status.as_str()
    )
}

/// 1-based page number of the call log.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub page: Option<i64>,
}

fn page_url(base: &str, query: &ListQuery, page: i64) -> String {
    let url = render::list_url(base, query.app_filter(), query.search());
    let sep = if url.contains('?') { '&' } else { '?' };
    format!("{url}{sep}page={page}")
}

/// "Showing 101-200 of 250 calls" plus links to the neighbouring pages.
fn paginator(base: &str, query: &ListQuery, page: i64, shown: usize, total: i64) -> String {
    let pages = ((total + CALLS_PER_PAGE - 1) / CALLS_PER_PAGE).max(1);
    let first = (page - 1) * CALLS_PER_PAGE;
    let mut html = String::from("<p class=\"paginator\">");
    if shown == 0 {
        html.push_str(&format!("0 of {total} calls"));
    } else {
        html.push_str(&format!(
            "Showing {}-{} of {} call{}",
            first + 1,
            first + shown as i64,
            total,
            if total == 1 { "" } else { "s" }
        ));
    }
    if page > 1 {
        html.push_str(&format!(" <a href=\"{}\">Newer</a>", attr(&page_url(base, query, page - 1))));
    }
    if page < pages {
        html.push_str(&format!(" <a href=\"{}\">Older</a>", attr(&page_url(base, query, page + 1))));
    }
    html.push_str("</p>");
    html
}

/// GET {prefix}/calls/
pub async fn call_list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
    Query(paging): Query<PageQuery>,
) -> ApiResult<Html<String>> {
    let total = state.calls.count_matching(&query).await?;
    let pages = ((total + CALLS_PER_PAGE - 1) / CALLS_PER_PAGE).max(1);
    let page = paging.page.unwrap_or(1).clamp(1, pages);
    let calls = state
        .calls
        .page(&query, CALLS_PER_PAGE, (page - 1) * CALLS_PER_PAGE)
        .await?;
    let apps = state.calls.apps().await?;
    let base = state.urls.call_list();

    let mut html = String::from("<h1>Calls</h1>");
    html.push_str(&render::search_form(&base, &query));
    html.push_str(
        "<table id=\"result_list\"><thead><tr><th>Call</th><th>App</th><th>Name</th>\
         <th>Status</th><th>Started at</th><th>Duration</th></tr></thead><tbody>",
    );
    for call in &calls {
        html.push_str(&format!(
            "<tr><td><a href=\"{}\">#{}</a></td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{} ms</td></tr>",
            attr(&state.urls.call_change(call.id)),
            call.id,
            escape(&call.app),
            escape(&call.name),
            status_cell(call),
            call.started_at.format(TIME_FORMAT),
            call.duration().num_milliseconds()
        ));
    }
    html.push_str("</tbody></table>");
    html.push_str(&paginator(&base, &query, page, calls.len(), total));

    let sidebar = render::app_filter(&base, &apps, &query);
    Ok(Html(render::page(&state.urls, "Calls", &html, Some(&sidebar))))
}

/// GET {prefix}/calls/{id}/change/
pub async fn call_detail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Html<String>> {
    let call = state.calls.require(id).await?;
    Ok(Html(render::page(
        &state.urls,
        &format!("Call #{}", call.id),
        &render_detail(&call),
        None,
    )))
}

fn render_detail(call: &CallRecord) -> String {
    let mut html = format!("<h1>{} #{}</h1><table class=\"readonly\">", escape(&call.name), call.id);
    let rows = [
        ("App", escape(&call.app).into_owned()),
        ("Name", escape(&call.name).into_owned()),
        ("Status", status_cell(call)),
        ("Started at", call.started_at.format(TIME_FORMAT).to_string()),
        ("Finished at", call.finished_at.format(TIME_FORMAT).to_string()),
        ("Duration", format!("{} ms", call.duration().num_milliseconds())),
    ];
    for (label, value) in rows {
        html.push_str(&format!("<tr><th>{label}</th><td>{value}</td></tr>"));
    }
    if let Some(error) = &call.error {
        html.push_str(&format!(
            "<tr><th>Error</th><td class=\"errornote\">{}</td></tr>",
            escape(error)
        ));
    }
    html.push_str("</table><h2>Stdout</h2>");
    html.push_str(&format!("<pre class=\"stdout\">{}</pre>", escape(&call.stdout)));
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::CallStatus;
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn test_paginator() {
        let query = ListQuery {
            app: Some("cache".into()),
            q: None,
        };
        let html = paginator("/admin/calls/", &query, 1, 100, 250);
        assert!(html.contains("Showing 1-100 of 250 calls"));
        assert!(html.contains("<a href=\"/admin/calls/?app=cache&amp;page=2\">Older</a>"));
        assert!(!html.contains("Newer"));

        let html = paginator("/admin/calls/", &ListQuery::default(), 3, 50, 250);
        assert!(html.contains("Showing 201-250 of 250 calls"));
        assert!(html.contains("<a href=\"/admin/calls/?page=2\">Newer</a>"));
        assert!(!html.contains("Older"));

        assert_eq!(
            paginator("/admin/calls/", &ListQuery::default(), 1, 0, 0),
            "<p class=\"paginator\">0 of 0 calls</p>"
        );
    }

    #[test]
    fn test_render_detail_escapes_output() {
        let started_at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let call = CallRecord {
            id: 5,
            app: "cache".into(),
            name: "clear_cache".into(),
            stdout: "<b>done</b>\n".into(),
            status: CallStatus::Failed,
            error: Some("exit 1".into()),
            started_at,
            finished_at: started_at + Duration::milliseconds(1500),
        };
        let html = render_detail(&call);
        assert!(html.contains("<pre class=\"stdout\">&lt;b&gt;done&lt;/b&gt;\n</pre>"));
        assert!(html.contains("2026-03-01 12:00:00.000 UTC"));
        assert!(html.contains("1500 ms"));
        assert!(html.contains("<span class=\"status-failed\">failed</span>"));
        assert!(html.contains("exit 1"));
    }
}
