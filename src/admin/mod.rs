// src/admin/mod.rs
// Admin panel: command list, add/change/delete, run endpoint, call log

pub mod calls;
pub mod commands;
pub mod render;
pub mod run;

use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};

use crate::config::normalize_prefix;
use crate::state::AppState;

/// Path segment of the run endpoint, kept for links people already have.
pub const RUN_SEGMENT: &str = "django_command_admin";

/// URL layout under the configured prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminUrls {
    prefix: String,
}

impl AdminUrls {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: normalize_prefix(prefix),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn index(&self) -> String {
        format!("{}/", self.prefix)
    }

    pub fn command_list(&self) -> String {
        format!("{}/commands/", self.prefix)
    }

    pub fn command_add(&self) -> String {
        format!("{}/commands/add/", self.prefix)
    }

    pub fn command_change(&self, id: i64) -> String {
        format!("{}/commands/{}/change/", self.prefix, id)
    }

    pub fn command_delete(&self, id: i64) -> String {
        format!("{}/commands/{}/delete/", self.prefix, id)
    }

    pub fn run(&self, name: &str) -> String {
        format!("{}/{}/{}", self.prefix, RUN_SEGMENT, urlencoding::encode(name))
    }

    pub fn call_list(&self) -> String {
        format!("{}/calls/", self.prefix)
    }

    pub fn call_change(&self, id: i64) -> String {
        format!("{}/calls/{}/change/", self.prefix, id)
    }
}

/// 302 Found to `location`.
pub fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

async fn index(State(state): State<Arc<AppState>>) -> Response {
    found(&state.urls.command_list())
}

/// Routes for the admin panel, mounted at the state's URL prefix.
pub fn admin_router(state: Arc<AppState>) -> Router {
    let p = state.urls.prefix().to_string();

    let mut router = Router::new().route(&format!("{p}/"), get(index));
    if !p.is_empty() {
        router = router.route(&p, get(index));
    }

    router
        // Commands
        .route(&format!("{p}/commands/"), get(commands::command_list))
        .route(
            &format!("{p}/commands/add/"),
            get(commands::add_form).post(commands::add_command),
        )
        .route(
            &format!("{p}/commands/{{id}}/change/"),
            get(commands::change_form).post(commands::change_command),
        )
        .route(&format!("{p}/commands/{{id}}/delete/"), post(commands::delete_command))
        // Run
        .route(&format!("{p}/{RUN_SEGMENT}/{{name}}"), get(run::run_command))
        // Calls
        .route(&format!("{p}/calls/"), get(calls::call_list))
        .route(&format!("{p}/calls/{{id}}/change/"), get(calls::call_detail))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls_with_prefix() {
        let urls = AdminUrls::new("admin/");
        assert_eq!(urls.index(), "/admin/");
        assert_eq!(urls.command_list(), "/admin/commands/");
        assert_eq!(urls.command_change(4), "/admin/commands/4/change/");
        assert_eq!(urls.command_delete(4), "/admin/commands/4/delete/");
        assert_eq!(urls.run("clear_cache"), "/admin/django_command_admin/clear_cache");
        assert_eq!(urls.call_change(9), "/admin/calls/9/change/");
    }

    #[test]
    fn test_urls_without_prefix() {
        let urls = AdminUrls::new("");
        assert_eq!(urls.index(), "/");
        assert_eq!(urls.call_list(), "/calls/");
    }

    #[test]
    fn test_found_sets_location() {
        let response = found("/admin/calls/1/change/");
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "/admin/calls/1/change/");
    }
}
