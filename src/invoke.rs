// src/invoke.rs
// Run one command on a blocking thread, capture its output, log the call

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::capture::capture_output;
use crate::error::{AdminError, AdminResult};
use crate::registry::{CommandRegistry, is_valid_name};
use crate::store::{CallRecord, CallStatus, CallStore, NewCall};

#[derive(Clone)]
pub struct Invoker {
    registry: Arc<dyn CommandRegistry>,
    calls: CallStore,
}

impl Invoker {
    pub fn new(registry: Arc<dyn CommandRegistry>, calls: CallStore) -> Self {
        Self { registry, calls }
    }

    /// Runs `name` to completion and stores one call record for it.
    ///
    /// The app is taken from the live registry, not from the commands table,
    /// so commands that were never synced (or were synced and later removed
    /// from the table) still run. An unknown name fails before anything runs
    /// and leaves no record. A command that errors or panics is recorded as
    /// failed with whatever it printed before stopping.
    ///
    /// There is no locking: concurrent calls of the same command run side by
    /// side and produce separate records.
    pub async fn invoke(&self, name: &str) -> AdminResult<CallRecord> {
        if !is_valid_name(name) {
            return Err(AdminError::InvalidName(name.to_string()));
        }
        let app = self
            .registry
            .app_for(name)
            .ok_or_else(|| AdminError::UnknownCommand(name.to_string()))?;

        let started_at = Utc::now();
        let registry = self.registry.clone();
        let command = name.to_string();
        let (stdout, outcome) = tokio::task::spawn_blocking(move || capture_output(|| registry.call(&command)))
            .await
            .map_err(|e| AdminError::Invocation(format!("worker for {name} did not finish: {e}")))?;
        let finished_at = Utc::now();

        let (status, error) = match outcome {
            Ok(()) => (CallStatus::Succeeded, None),
            Err(e) => {
                warn!("Command {} failed: {:#}", name, e);
                (CallStatus::Failed, Some(format!("{e:#}")))
            }
        };

        let record = self
            .calls
            .create(NewCall {
                app,
                name: name.to_string(),
                stdout,
                status,
                error,
                started_at,
                finished_at,
            })
            .await?;

        info!(
            "Command {} {} in {} ms (call {})",
            record.name,
            record.status,
            record.duration().num_milliseconds(),
            record.id
        );
        Ok(record)
    }
}
