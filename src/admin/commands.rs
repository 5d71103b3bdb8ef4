// src/admin/commands.rs
// Command list with sync, filter and search; add/change/delete when allowed

use std::sync::Arc;

use axum::{
    Form,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;

use super::render::{self, attr, escape};
use super::{AdminUrls, found};
use crate::api::ApiResult;
use crate::config::AdminSettings;
use crate::error::AdminError;
use crate::permissions::Permissions;
use crate::reconcile::reconcile;
use crate::registry::{CommandRegistry, is_valid_name};
use crate::state::AppState;
use crate::store::{CommandEntry, ListQuery};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommandForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub app: String,
}

impl CommandForm {
    fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.name.trim().is_empty() {
            errors.push("Name: this field is required.".to_string());
        } else if !is_valid_name(self.name.trim()) {
            errors.push("Name: use only letters, numbers, underscores or hyphens.".to_string());
        }
        if self.app.trim().is_empty() {
            errors.push("App: this field is required.".to_string());
        }
        errors
    }
}

/// GET {prefix}/commands/
pub async fn command_list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Html<String>> {
    let settings = state.settings.current();
    if settings.sync {
        reconcile(&state.commands, &state.registry.commands(), &settings.prefix).await?;
    }
    let perms = Permissions::from_settings(&settings);

    let entries = state.commands.list(&query).await?;
    let apps = state.commands.apps().await?;

    let base = state.urls.command_list();
    let content = render_list(
        &state.urls,
        &settings,
        perms,
        state.registry.as_ref(),
        &entries,
        &query,
    );
    let sidebar = render::app_filter(&base, &apps, &query);
    Ok(Html(render::page(&state.urls, "Commands", &content, Some(&sidebar))))
}

fn render_list(
    urls: &AdminUrls,
    settings: &AdminSettings,
    perms: Permissions,
    registry: &dyn CommandRegistry,
    entries: &[CommandEntry],
    query: &ListQuery,
) -> String {
    let mut html = String::new();
    if perms.has_add_permission() {
        html.push_str(&format!(
            "<a class=\"button addlink\" href=\"{}\">Add command</a>",
            attr(&urls.command_add())
        ));
    }
    html.push_str("<h1>Select command to run</h1>");
    html.push_str(&render::search_form(&urls.command_list(), query));
    html.push_str(
        "<table id=\"result_list\"><thead><tr><th>App</th><th>Name</th><th>Shell</th><th></th></tr></thead><tbody>",
    );

    // Rows only link somewhere when there is something to do on the change page.
    let linkable = perms.has_change_permission() || perms.has_delete_permission();
    for entry in entries {
        let name = if linkable {
            format!(
                "<a href=\"{}\">{}</a>",
                attr(&urls.command_change(entry.id)),
                escape(&entry.name)
            )
        } else {
            escape(&entry.name).into_owned()
        };
        let title = registry
            .help(&entry.name)
            .map(|help| format!(" title=\"{}\"", attr(&help)))
            .unwrap_or_default();
        html.push_str(&format!(
            "<tr><td class=\"field-app\">{}</td><td class=\"field-name\"{}>{}</td>\
             <td class=\"field-shell\">{}</td><td class=\"field-buttons\">{}</td></tr>",
            escape(&entry.app),
            title,
            name,
            render::shell_hint(&settings.shell_template, &entry.name),
            render::run_button(urls, &entry.name)
        ));
    }
    html.push_str("</tbody></table>");
    html.push_str(&format!(
        "<p class=\"paginator\">{} command{}</p>",
        entries.len(),
        if entries.len() == 1 { "" } else { "s" }
    ));
    html
}

fn render_form(
    urls: &AdminUrls,
    action: &str,
    form: &CommandForm,
    errors: &[String],
    editable: bool,
    delete_id: Option<i64>,
) -> String {
    let readonly = if editable { "" } else { " readonly" };
    let mut html = render::error_list(errors);
    html.push_str(&format!(
        "<form method=\"post\" action=\"{}\">\
         <p><label for=\"id_name\">Name:</label> <input id=\"id_name\" type=\"text\" name=\"name\" value=\"{}\"{readonly}></p>\
         <p><label for=\"id_app\">App:</label> <input id=\"id_app\" type=\"text\" name=\"app\" value=\"{}\"{readonly}></p>",
        attr(action),
        attr(&form.name),
        attr(&form.app),
    ));
    if editable {
        html.push_str("<input type=\"submit\" value=\"Save\">");
    }
    html.push_str("</form>");
    if let Some(id) = delete_id {
        html.push_str(&format!(
            "<form method=\"post\" action=\"{}\"><input class=\"deletelink\" type=\"submit\" value=\"Delete\"></form>",
            attr(&urls.command_delete(id))
        ));
    }
    html.push_str(&format!(
        "<p><a href=\"{}\">Back to commands</a></p>",
        attr(&urls.command_list())
    ));
    html
}

fn permissions(state: &AppState) -> Permissions {
    Permissions::from_settings(&state.settings.current())
}

/// GET {prefix}/commands/add/
pub async fn add_form(State(state): State<Arc<AppState>>) -> ApiResult<Html<String>> {
    permissions(&state).require_add()?;
    let content = format!(
        "<h1>Add command</h1>{}",
        render_form(&state.urls, &state.urls.command_add(), &CommandForm::default(), &[], true, None)
    );
    Ok(Html(render::page(&state.urls, "Add command", &content, None)))
}

/// POST {prefix}/commands/add/
pub async fn add_command(
    State(state): State<Arc<AppState>>,
    Form(form): Form<CommandForm>,
) -> ApiResult<Response> {
    permissions(&state).require_add()?;

    let mut errors = form.validate();
    if errors.is_empty() {
        match state.commands.create(form.name.trim(), form.app.trim()).await {
            Ok(_) => return Ok(found(&state.urls.command_list())),
            Err(AdminError::Duplicate(name)) => {
                errors.push(format!("Command with this name already exists: {name}"))
            }
            Err(e) => return Err(e.into()),
        }
    }

    let content = format!(
        "<h1>Add command</h1>{}",
        render_form(&state.urls, &state.urls.command_add(), &form, &errors, true, None)
    );
    Ok((
        StatusCode::BAD_REQUEST,
        Html(render::page(&state.urls, "Add command", &content, None)),
    )
        .into_response())
}

async fn load_entry(state: &AppState, id: i64) -> Result<CommandEntry, AdminError> {
    state
        .commands
        .get(id)
        .await?
        .ok_or_else(|| AdminError::not_found("Command", id))
}

/// GET {prefix}/commands/{id}/change/
///
/// Read-only without change permission; the delete button only appears with
/// delete permission.
pub async fn change_form(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Html<String>> {
    let perms = permissions(&state);
    let entry = load_entry(&state, id).await?;
    let form = CommandForm {
        name: entry.name.clone(),
        app: entry.app.clone(),
    };

    let heading = if perms.has_change_permission() { "Change command" } else { "View command" };
    let content = format!(
        "<h1>{}</h1>{}",
        heading,
        render_form(
            &state.urls,
            &state.urls.command_change(id),
            &form,
            &[],
            perms.has_change_permission(),
            perms.has_delete_permission().then_some(id),
        )
    );
    Ok(Html(render::page(&state.urls, &entry.name, &content, None)))
}

/// POST {prefix}/commands/{id}/change/
pub async fn change_command(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Form(form): Form<CommandForm>,
) -> ApiResult<Response> {
    let perms = permissions(&state);
    perms.require_change()?;
    load_entry(&state, id).await?;

    let mut errors = form.validate();
    if errors.is_empty() {
        match state.commands.update(id, form.name.trim(), form.app.trim()).await {
            Ok(_) => return Ok(found(&state.urls.command_list())),
            Err(AdminError::Duplicate(name)) => {
                errors.push(format!("Command with this name already exists: {name}"))
            }
            Err(e) => return Err(e.into()),
        }
    }

    let content = format!(
        "<h1>Change command</h1>{}",
        render_form(
            &state.urls,
            &state.urls.command_change(id),
            &form,
            &errors,
            true,
            perms.has_delete_permission().then_some(id),
        )
    );
    Ok((
        StatusCode::BAD_REQUEST,
        Html(render::page(&state.urls, "Change command", &content, None)),
    )
        .into_response())
}

/// POST {prefix}/commands/{id}/delete/
pub async fn delete_command(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Response> {
    permissions(&state).require_delete()?;
    if !state.commands.delete(id).await? {
        return Err(AdminError::not_found("Command", id).into());
    }
    Ok(found(&state.urls.command_list()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{Command, StaticRegistry};

    struct ClearCache;

    impl Command for ClearCache {
        fn app(&self) -> &str {
            "cache"
        }

        fn help(&self) -> &str {
            "Drop <all> cached pages"
        }

        fn run(&self) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_form_validation() {
        let ok = CommandForm {
            name: "clear_cache".into(),
            app: "cache".into(),
        };
        assert!(ok.validate().is_empty());

        let blank = CommandForm::default();
        assert_eq!(blank.validate().len(), 2);

        let bad = CommandForm {
            name: "rm -rf".into(),
            app: "x".into(),
        };
        assert_eq!(bad.validate().len(), 1);
    }

    #[test]
    fn test_render_list_affordances() {
        let urls = AdminUrls::new("/admin");
        let settings = AdminSettings::default();
        let entries = vec![CommandEntry {
            id: 1,
            name: "clear_cache".into(),
            app: "cache".into(),
        }];

        let empty = StaticRegistry::new();

        let locked = render_list(
            &urls,
            &settings,
            Permissions::default(),
            &empty,
            &entries,
            &ListQuery::default(),
        );
        assert!(!locked.contains("Add command"));
        assert!(!locked.contains("/admin/commands/1/change/"));
        assert!(locked.contains("<code>command-admin run clear_cache</code>"));
        assert!(locked.contains("/admin/django_command_admin/clear_cache"));
        assert!(locked.contains("1 command</p>"));
        assert!(locked.contains("<td class=\"field-name\">clear_cache</td>"));

        let open = Permissions {
            add: true,
            change: true,
            delete: false,
        };
        let mut registry = StaticRegistry::new();
        registry.register("clear_cache", ClearCache);
        let html = render_list(&urls, &settings, open, &registry, &entries, &ListQuery::default());
        assert!(html.contains("<td class=\"field-name\" title=\"Drop &lt;all&gt; cached pages\">"));
        assert!(html.contains("Add command"));
        assert!(html.contains("/admin/commands/1/change/"));
    }

    #[test]
    fn test_render_form_readonly_and_delete() {
        let urls = AdminUrls::new("/admin");
        let form = CommandForm {
            name: "a".into(),
            app: "b".into(),
        };
        let html = render_form(&urls, "/x", &form, &[], false, None);
        assert!(html.contains("readonly"));
        assert!(!html.contains("value=\"Save\""));
        assert!(!html.contains("Delete"));

        let html = render_form(&urls, "/x", &form, &[], true, Some(3));
        assert!(!html.contains("readonly"));
        assert!(html.contains("value=\"Save\""));
        assert!(html.contains("/admin/commands/3/delete/"));
    }
}
