// src/error.rs
// Domain errors for registry lookups, storage and command runs

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdminError {
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Invalid command name: {0:?}")]
    InvalidName(String),

    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: i64 },

    #[error("A command named {0} already exists")]
    Duplicate(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Command failed: {0}")]
    Invocation(String),

    #[error("Invalid command manifest: {0}")]
    Manifest(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type AdminResult<T> = Result<T, AdminError>;

impl AdminError {
    pub fn not_found(kind: &'static str, id: i64) -> Self {
        Self::NotFound { kind, id }
    }
}
