// src/admin/render.rs
// HTML building blocks for the admin pages

use std::borrow::Cow;

use super::AdminUrls;
use crate::store::ListQuery;

const STYLE: &str = r#"
body { font-family: sans-serif; margin: 0; color: #333; }
header { background: #417690; color: #fff; padding: 10px 40px; }
header a { color: #f5dd5d; margin-right: 1em; text-decoration: none; }
main { padding: 20px 40px; display: flex; gap: 30px; }
#content { flex: 1; }
#changelist-filter { min-width: 180px; }
#changelist-filter li.selected a { font-weight: bold; }
table { border-collapse: collapse; width: 100%; }
th, td { border-bottom: 1px solid #eee; padding: 6px 10px; text-align: left; }
a.button, button, input[type=submit] { background: #79aec8; color: #fff; padding: 4px 12px; border: 0; border-radius: 4px; text-decoration: none; }
a.addlink { float: right; }
.deletelink { background: #ba2121; }
.errornote { color: #ba2121; }
.status-failed { color: #ba2121; font-weight: bold; }
pre.stdout { background: #f8f8f8; padding: 10px; white-space: pre-wrap; }
"#;

pub fn escape(text: &str) -> Cow<'_, str> {
    html_escape::encode_text(text)
}

pub fn attr(text: &str) -> Cow<'_, str> {
    html_escape::encode_double_quoted_attribute(text)
}

/// Complete document without navigation, used for error pages.
pub fn bare_page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>{}</title><style>{}</style></head>\n\
         <body><main><div id=\"content\">{}</div></main></body></html>",
        escape(title),
        STYLE,
        body
    )
}

/// Complete document with the admin header. `sidebar` is placed next to the
/// content when present.
pub fn page(urls: &AdminUrls, title: &str, content: &str, sidebar: Option<&str>) -> String {
    format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>{title} | Command admin</title>\
         <style>{STYLE}</style></head>\n<body>\n<header><strong>Command admin</strong> \
         <a href=\"{commands}\">Commands</a><a href=\"{calls}\">Calls</a></header>\n\
         <main><div id=\"content\">{content}</div>{sidebar}</main>\n</body></html>",
        title = escape(title),
        commands = attr(&urls.command_list()),
        calls = attr(&urls.call_list()),
        sidebar = sidebar.unwrap_or(""),
    )
}

/// Cosmetic invocation hint; `{name}` in the template is replaced.
pub fn shell_hint(template: &str, name: &str) -> String {
    format!("<code>{}</code>", escape(&template.replace("{name}", name)))
}

pub fn run_button(urls: &AdminUrls, name: &str) -> String {
    format!(
        "<a class=\"button\" href=\"{}\" target=\"_blank\">Run</a> ",
        attr(&urls.run(name))
    )
}

/// `base?app=..&q=..`, leaving out empty parts.
pub fn list_url(base: &str, app: Option<&str>, q: Option<&str>) -> String {
    let mut params = Vec::new();
    if let Some(app) = app {
        params.push(format!("app={}", urlencoding::encode(app)));
    }
    if let Some(q) = q {
        params.push(format!("q={}", urlencoding::encode(q)));
    }
    if params.is_empty() {
        base.to_string()
    } else {
        format!("{}?{}", base, params.join("&"))
    }
}

pub fn search_form(base: &str, query: &ListQuery) -> String {
    let hidden_app = query
        .app_filter()
        .map(|app| format!("<input type=\"hidden\" name=\"app\" value=\"{}\">", attr(app)))
        .unwrap_or_default();
    format!(
        "<form id=\"changelist-search\" method=\"get\" action=\"{}\">\
         <input type=\"text\" name=\"q\" value=\"{}\" placeholder=\"Search app or name\">{}\
         <input type=\"submit\" value=\"Search\"></form>",
        attr(base),
        attr(query.search().unwrap_or("")),
        hidden_app
    )
}

pub fn app_filter(base: &str, apps: &[String], query: &ListQuery) -> String {
    let selected = query.app_filter();
    let mut html = String::from("<div id=\"changelist-filter\"><h2>Filter</h2><h3>By app</h3><ul>");
    let all_class = if selected.is_none() { " class=\"selected\"" } else { "" };
    html.push_str(&format!(
        "<li{}><a href=\"{}\">All</a></li>",
        all_class,
        attr(&list_url(base, None, query.search()))
    ));
    for app in apps {
        let class = if selected == Some(app.as_str()) { " class=\"selected\"" } else { "" };
        html.push_str(&format!(
            "<li{}><a href=\"{}\">{}</a></li>",
            class,
            attr(&list_url(base, Some(app), query.search())),
            escape(app)
        ));
    }
    html.push_str("</ul></div>");
    html
}

pub fn error_list(errors: &[String]) -> String {
    if errors.is_empty() {
        return String::new();
    }
    let items: String = errors
        .iter()
        .map(|e| format!("<li>{}</li>", escape(e)))
        .collect();
    format!("<ul class=\"errornote\">{items}</ul>")
}
