// src/config/mod.rs
// Server configuration (read once) and admin settings (read on every request)

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub const DEFAULT_SHELL_TEMPLATE: &str = "command-admin run {name}";

// Values may carry trailing `# comments` when they come from a .env file.
fn clean(val: &str) -> &str {
    val.split('#').next().unwrap_or("").trim()
}

/// Process environment as a key lookup.
pub fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn var_or<T, L>(lookup: &L, key: &str, default: T) -> T
where
    T: FromStr,
    L: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(val) => match clean(&val).parse::<T>() {
            Ok(parsed) => {
                debug!("Config: {} = {} (from environment)", key, clean(&val));
                parsed
            }
            Err(_) => {
                warn!("Config: {} = '{}' (parse failed, using default)", key, val);
                default
            }
        },
        None => default,
    }
}

fn flag_or<L>(lookup: &L, key: &str, default: bool) -> bool
where
    L: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(val) => match parse_flag(clean(&val)) {
            Some(flag) => flag,
            None => {
                warn!("Config: {} = '{}' is not a boolean, using {}", key, val, default);
                default
            }
        },
        None => default,
    }
}

/// Accepts the spellings people actually put in settings files.
pub fn parse_flag(val: &str) -> Option<bool> {
    match val.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

// ── Server configuration

pub const LOG_LEVEL_KEY: &str = "COMMAND_ADMIN_LOG_LEVEL";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub manifest_path: Option<PathBuf>,
    pub url_prefix: String,
    pub log_level: tracing::Level,
}

impl ServerConfig {
    /// Loads `.env` and picks the level for the log subscriber. Bad values
    /// fall back quietly here; `from_env` reports them once logging is up.
    pub fn bootstrap_level() -> tracing::Level {
        let _ = dotenvy::dotenv();
        Self::bootstrap_level_from(env_lookup)
    }

    pub fn bootstrap_level_from(lookup: impl Fn(&str) -> Option<String>) -> tracing::Level {
        lookup(LOG_LEVEL_KEY)
            .and_then(|val| clean(&val).parse().ok())
            .unwrap_or(tracing::Level::INFO)
    }

    pub fn from_env() -> Self {
        if dotenvy::dotenv().is_err() {
            debug!(".env file not found, using environment variables and defaults");
        }
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let manifest: String = var_or(&lookup, "COMMAND_ADMIN_MANIFEST", String::new());

        Self {
            host: var_or(&lookup, "COMMAND_ADMIN_HOST", "127.0.0.1".to_string()),
            port: var_or(&lookup, "COMMAND_ADMIN_PORT", 8000),
            database_url: var_or(
                &lookup,
                "DATABASE_URL",
                "sqlite:./command_admin.db?mode=rwc".to_string(),
            ),
            manifest_path: (!manifest.is_empty()).then(|| PathBuf::from(manifest)),
            url_prefix: normalize_prefix(&var_or(
                &lookup,
                "COMMAND_ADMIN_URL_PREFIX",
                "/admin".to_string(),
            )),
            log_level: var_or(&lookup, LOG_LEVEL_KEY, tracing::Level::INFO),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// `admin/` and `/admin/` both become `/admin`; an empty prefix stays empty.
pub fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

// ── Admin settings

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminSettings {
    /// Only registry entries whose name starts with this are managed.
    pub prefix: String,
    /// Reconcile the registry into the commands table on every list render.
    pub sync: bool,
    pub allow_add: bool,
    pub allow_edit: bool,
    pub allow_delete: bool,
    pub shell_template: String,
}

impl Default for AdminSettings {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            sync: true,
            allow_add: false,
            allow_edit: false,
            allow_delete: false,
            shell_template: DEFAULT_SHELL_TEMPLATE.to_string(),
        }
    }
}

impl AdminSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            prefix: var_or(&lookup, "DJANGO_ADMIN_COMMANDS_PREFIX", defaults.prefix),
            sync: flag_or(&lookup, "DJANGO_ADMIN_COMMANDS_SYNC", defaults.sync),
            allow_add: flag_or(&lookup, "DJANGO_ADMIN_COMMANDS_ALLOW_ADD", defaults.allow_add),
            allow_edit: flag_or(&lookup, "DJANGO_ADMIN_COMMANDS_ALLOW_EDIT", defaults.allow_edit),
            allow_delete: flag_or(&lookup, "DJANGO_ADMIN_COMMANDS_ALLOW_DELETE", defaults.allow_delete),
            shell_template: var_or(&lookup, "COMMAND_ADMIN_SHELL_TEMPLATE", defaults.shell_template),
        }
    }
}

/// Where request handlers get their settings from. Implementations must not
/// cache: every call reflects the current configuration.
pub trait SettingsSource: Send + Sync {
    fn current(&self) -> AdminSettings;
}

/// Reads the process environment on every call.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvSettings;

impl SettingsSource for EnvSettings {
    fn current(&self) -> AdminSettings {
        AdminSettings::from_env()
    }
}

/// Settings held in memory and replaceable at runtime.
#[derive(Debug, Default)]
pub struct SharedSettings {
    inner: RwLock<AdminSettings>,
}

impl SharedSettings {
    pub fn new(settings: AdminSettings) -> Self {
        Self {
            inner: RwLock::new(settings),
        }
    }

    pub fn replace(&self, settings: AdminSettings) {
        match self.inner.write() {
            Ok(mut guard) => *guard = settings,
            Err(poisoned) => *poisoned.into_inner() = settings,
        }
    }

    pub fn update(&self, f: impl FnOnce(&mut AdminSettings)) {
        let mut next = self.current();
        f(&mut next);
        self.replace(next);
    }
}

impl SettingsSource for SharedSettings {
    fn current(&self) -> AdminSettings {
        match self.inner.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}
