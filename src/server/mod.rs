//! HTTP server: router assembly and the serve loop

pub mod db;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::admin::admin_router;
use crate::api::health_handler;
use crate::state::AppState;

pub use db::{connect, create_pool, memory_pool, run_migrations};

/// Full application router: admin panel plus `/health`.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .merge(admin_router(state))
        .layer(TraceLayer::new_for_http())
}

pub async fn serve(state: Arc<AppState>, bind_address: &str) -> Result<()> {
    let app = create_router(state.clone());
    let listener = tokio::net::TcpListener::bind(bind_address)
        .await
        .with_context(|| format!("Failed to bind {bind_address}"))?;

    info!("Admin panel listening on http://{}{}", bind_address, state.urls.command_list());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
