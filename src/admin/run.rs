// src/admin/run.rs
// GET {prefix}/django_command_admin/{name}: run, record, redirect to the record

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::Response,
};
use tracing::info;

use super::found;
use crate::api::ApiResult;
use crate::state::AppState;

pub async fn run_command(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> ApiResult<Response> {
    info!("Running command {} from the admin panel", name);
    let call = state.invoker.invoke(&name).await?;
    Ok(found(&state.urls.call_change(call.id)))
}
