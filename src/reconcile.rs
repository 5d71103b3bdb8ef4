// src/reconcile.rs
// Mirror the prefix-filtered registry into the commands table

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::AdminResult;
use crate::registry::is_valid_name;
use crate::store::CommandStore;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub created: usize,
    pub kept: usize,
    pub deleted: u64,
}

impl SyncReport {
    pub fn changed(&self) -> bool {
        self.created > 0 || self.deleted > 0
    }
}

/// Registry entries whose name starts with `prefix`. Names the run endpoint
/// would reject are left out so the list never offers a dead Run button.
pub fn filter_commands<'a>(
    commands: &'a BTreeMap<String, String>,
    prefix: &'a str,
) -> impl Iterator<Item = (&'a String, &'a String)> + 'a {
    commands.iter().filter(move |(name, _)| {
        if !name.starts_with(prefix) {
            return false;
        }
        if !is_valid_name(name) {
            warn!("Not listing command {:?}: name is not URL-safe", name);
            return false;
        }
        true
    })
}

/// Afterwards the table holds exactly the registry names starting with
/// `prefix`. Existing rows keep their app. The create and delete steps are
/// not one transaction; an interrupted run is completed by the next one.
pub async fn reconcile(
    store: &CommandStore,
    commands: &BTreeMap<String, String>,
    prefix: &str,
) -> AdminResult<SyncReport> {
    let mut report = SyncReport::default();
    let mut keep = Vec::new();

    for (name, app) in filter_commands(commands, prefix) {
        let (_, created) = store.get_or_create(name, app).await?;
        if created {
            debug!("Registered command {} ({})", name, app);
            report.created += 1;
        } else {
            report.kept += 1;
        }
        keep.push(name.clone());
    }

    report.deleted = store.delete_except(&keep).await?;

    if report.changed() {
        info!(
            "Command sync: {} created, {} deleted, {} unchanged",
            report.created, report.deleted, report.kept
        );
    }
    Ok(report)
}
