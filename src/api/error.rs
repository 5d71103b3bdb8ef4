// src/api/error.rs
// Centralized error handling for admin responses

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use std::fmt;
use tracing::error;

use crate::admin::render;
use crate::error::AdminError;

/// Error page returned by admin handlers
#[derive(Debug)]
pub struct ApiError {
    pub message: String,
    pub status_code: StatusCode,
}

impl ApiError {
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status_code: StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status_code: StatusCode::NOT_FOUND,
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status_code: StatusCode::FORBIDDEN,
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status_code: StatusCode::CONFLICT,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}

impl From<AdminError> for ApiError {
    fn from(err: AdminError) -> Self {
        match err {
            AdminError::UnknownCommand(_) | AdminError::InvalidName(_) | AdminError::NotFound { .. } => {
                ApiError::not_found(err.to_string())
            }
            AdminError::PermissionDenied(_) => ApiError::forbidden(err.to_string()),
            AdminError::Duplicate(_) => ApiError::conflict(err.to_string()),
            other => {
                // Storage and worker failures: details go to the log only.
                error!("Admin request failed: {:?}", other);
                ApiError::internal("Server error")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let title = self
            .status_code
            .canonical_reason()
            .unwrap_or("Error")
            .to_string();
        let body = format!(
            "<h1>{}</h1>\n<p class=\"errornote\">{}</p>",
            render::escape(&title),
            render::escape(&self.message)
        );
        (self.status_code, Html(render::bare_page(&title, &body))).into_response()
    }
}

/// Result type alias for admin handlers
pub type ApiResult<T> = Result<T, ApiError>;
