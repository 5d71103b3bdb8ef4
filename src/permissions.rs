// src/permissions.rs
// Add/change/delete switches for the command list, straight from settings

use serde::Serialize;

use crate::config::AdminSettings;
use crate::error::{AdminError, AdminResult};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Permissions {
    pub add: bool,
    pub change: bool,
    pub delete: bool,
}

impl Permissions {
    pub fn from_settings(settings: &AdminSettings) -> Self {
        Self {
            add: settings.allow_add,
            change: settings.allow_edit,
            delete: settings.allow_delete,
        }
    }

    pub fn has_add_permission(&self) -> bool {
        self.add
    }

    pub fn has_change_permission(&self) -> bool {
        self.change
    }

    pub fn has_delete_permission(&self) -> bool {
        self.delete
    }

    pub fn require_add(&self) -> AdminResult<()> {
        require(self.add, "adding commands is disabled")
    }

    pub fn require_change(&self) -> AdminResult<()> {
        require(self.change, "editing commands is disabled")
    }

    pub fn require_delete(&self) -> AdminResult<()> {
        require(self.delete, "deleting commands is disabled")
    }
}

fn require(allowed: bool, reason: &'static str) -> AdminResult<()> {
    if allowed {
        Ok(())
    } else {
        Err(AdminError::PermissionDenied(reason))
    }
}
