// src/store/types.rs
// Persisted rows: registry mirror entries and execution records

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CommandEntry {
    pub id: i64,
    pub name: String,
    pub app: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallStatus {
    Succeeded,
    Failed,
}

impl CallStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallStatus::Succeeded => "succeeded",
            CallStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for CallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CallStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "succeeded" => Ok(CallStatus::Succeeded),
            "failed" => Ok(CallStatus::Failed),
            other => Err(format!("unknown call status: {other}")),
        }
    }
}

/// One invocation of one command. Never updated after insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallRecord {
    pub id: i64,
    pub app: String,
    pub name: String,
    pub stdout: String,
    pub status: CallStatus,
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl CallRecord {
    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }

    pub fn succeeded(&self) -> bool {
        self.status == CallStatus::Succeeded
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCall {
    pub app: String,
    pub name: String,
    pub stdout: String,
    pub status: CallStatus,
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct CallRow {
    pub id: i64,
    pub app: String,
    pub name: String,
    pub stdout: String,
    pub status: String,
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl From<CallRow> for CallRecord {
    fn from(row: CallRow) -> Self {
        // Rows are only ever written through CallStatus::as_str.
        let status = row.status.parse().unwrap_or(CallStatus::Failed);
        Self {
            id: row.id,
            app: row.app,
            name: row.name,
            stdout: row.stdout,
            status,
            error: row.error,
            started_at: row.started_at,
            finished_at: row.finished_at,
        }
    }
}

/// Filter for list views: exact app match plus a substring search over
/// app and name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub app: Option<String>,
    #[serde(default)]
    pub q: Option<String>,
}

impl ListQuery {
    pub fn app_filter(&self) -> Option<&str> {
        self.app.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn search(&self) -> Option<&str> {
        self.q.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

/// Escapes LIKE wildcards so a search for `50%` matches the literal text.
pub(crate) fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}
