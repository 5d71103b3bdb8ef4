// src/api/mod.rs

pub mod error;

use axum::Json;
use serde_json::{Value, json};

pub use error::{ApiError, ApiResult};

pub async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
