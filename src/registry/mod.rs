// src/registry/mod.rs
// Command registry: the authoritative name -> app list and the way to run one

pub mod builtin;
pub mod manifest;

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{info, warn};

use crate::config::SettingsSource;
use crate::error::AdminError;

pub use builtin::{BUILTIN_APP, register_builtins};
pub use manifest::{Manifest, ManifestEntry, ProcessCommand};

static SLUG: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[-a-zA-Z0-9_]+$").expect("valid slug regex"));

/// Command names travel in URL paths, so they are limited to slug characters.
pub fn is_valid_name(name: &str) -> bool {
    SLUG.is_match(name)
}

/// A maintenance routine. `run` is synchronous and writes its output through
/// [`crate::capture::stdout`].
pub trait Command: Send + Sync {
    fn app(&self) -> &str;

    fn help(&self) -> &str {
        ""
    }

    fn run(&self) -> anyhow::Result<()>;
}

/// Read-only lookup of the commands that can be invoked, plus the call itself.
pub trait CommandRegistry: Send + Sync {
    /// Full `name -> app` mapping.
    fn commands(&self) -> BTreeMap<String, String>;

    fn call(&self, name: &str) -> anyhow::Result<()>;

    fn app_for(&self, name: &str) -> Option<String> {
        self.commands().remove(name)
    }

    /// One-line description, if the command has one.
    fn help(&self, _name: &str) -> Option<String> {
        None
    }
}

struct FnCommand<F> {
    app: String,
    help: String,
    f: F,
}

impl<F> Command for FnCommand<F>
where
    F: Fn() -> anyhow::Result<()> + Send + Sync,
{
    fn app(&self) -> &str {
        &self.app
    }

    fn help(&self) -> &str {
        &self.help
    }

    fn run(&self) -> anyhow::Result<()> {
        (self.f)()
    }
}

/// In-process registry assembled at startup.
#[derive(Clone, Default)]
pub struct StaticRegistry {
    commands: BTreeMap<String, Arc<dyn Command>>,
}

impl StaticRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `command` under `name`, replacing any previous entry. Names
    /// that could not be run from a URL are skipped.
    pub fn register(&mut self, name: impl Into<String>, command: impl Command + 'static) -> &mut Self {
        let name = name.into();
        if !is_valid_name(&name) {
            warn!(
                "Skipping command {:?}: names may only contain letters, digits, '-' and '_'",
                name
            );
            return self;
        }
        self.commands.insert(name, Arc::new(command));
        self
    }

    pub fn register_fn<F>(&mut self, name: impl Into<String>, app: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn() -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.register(
            name,
            FnCommand {
                app: app.into(),
                help: String::new(),
                f,
            },
        )
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Command>> {
        self.commands.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Registry for the binary: manifest commands (if a manifest is configured)
/// followed by the built-ins.
pub fn load_registry(
    manifest: Option<&Path>,
    settings: Arc<dyn SettingsSource>,
) -> anyhow::Result<StaticRegistry> {
    let mut registry = StaticRegistry::new();
    if let Some(path) = manifest {
        let count = Manifest::load(path)?.register_into(&mut registry);
        info!("Loaded {} commands from {}", count, path.display());
    }
    register_builtins(&mut registry, settings);
    Ok(registry)
}

impl fmt::Debug for StaticRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.commands.iter().map(|(name, cmd)| (name, cmd.app())))
            .finish()
    }
}

impl CommandRegistry for StaticRegistry {
    fn commands(&self) -> BTreeMap<String, String> {
        self.commands
            .iter()
            .map(|(name, cmd)| (name.clone(), cmd.app().to_string()))
            .collect()
    }

    fn call(&self, name: &str) -> anyhow::Result<()> {
        let command = self
            .get(name)
            .ok_or_else(|| AdminError::UnknownCommand(name.to_string()))?;
        command.run()
    }

    fn app_for(&self, name: &str) -> Option<String> {
        self.commands.get(name).map(|c| c.app().to_string())
    }

    fn help(&self, name: &str) -> Option<String> {
        self.commands
            .get(name)
            .map(|c| c.help().trim())
            .filter(|help| !help.is_empty())
            .map(str::to_string)
    }
}
