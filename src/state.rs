// src/state.rs
// Shared state handed to every request handler

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::admin::AdminUrls;
use crate::config::SettingsSource;
use crate::invoke::Invoker;
use crate::registry::CommandRegistry;
use crate::store::{CallStore, CommandStore};

#[derive(Clone)]
pub struct AppState {
    // -------- Storage --------
    pub commands: CommandStore,
    pub calls: CallStore,

    // -------- Collaborators --------
    pub registry: Arc<dyn CommandRegistry>,
    pub settings: Arc<dyn SettingsSource>,
    pub invoker: Invoker,

    pub urls: AdminUrls,
}

impl AppState {
    pub fn new(
        pool: SqlitePool,
        registry: Arc<dyn CommandRegistry>,
        settings: Arc<dyn SettingsSource>,
        url_prefix: &str,
    ) -> Self {
        let calls = CallStore::new(pool.clone());
        Self {
            commands: CommandStore::new(pool),
            invoker: Invoker::new(registry.clone(), calls.clone()),
            calls,
            registry,
            settings,
            urls: AdminUrls::new(url_prefix),
        }
    }
}
