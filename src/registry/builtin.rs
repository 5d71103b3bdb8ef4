// src/registry/builtin.rs
// Commands every deployment gets for free

use std::collections::BTreeMap;
use std::io::Write;
use std::sync::Arc;

use super::{Command, CommandRegistry, StaticRegistry};
use crate::capture::stdout;
use crate::config::SettingsSource;

pub const BUILTIN_APP: &str = "command_admin";

struct ListCommands {
    snapshot: BTreeMap<String, String>,
}

impl Command for ListCommands {
    fn app(&self) -> &str {
        BUILTIN_APP
    }

    fn help(&self) -> &str {
        "Print every registered command and the app it belongs to"
    }

    fn run(&self) -> anyhow::Result<()> {
        let mut out = stdout();
        for (name, app) in &self.snapshot {
            writeln!(out, "{name} ({app})")?;
        }
        Ok(())
    }
}

struct ShowSettings {
    settings: Arc<dyn SettingsSource>,
}

impl Command for ShowSettings {
    fn app(&self) -> &str {
        BUILTIN_APP
    }

    fn help(&self) -> &str {
        "Print the admin settings currently in effect"
    }

    fn run(&self) -> anyhow::Result<()> {
        let settings = self.settings.current();
        let mut out = stdout();
        writeln!(out, "prefix = {:?}", settings.prefix)?;
        writeln!(out, "sync = {}", settings.sync)?;
        writeln!(out, "allow_add = {}", settings.allow_add)?;
        writeln!(out, "allow_edit = {}", settings.allow_edit)?;
        writeln!(out, "allow_delete = {}", settings.allow_delete)?;
        writeln!(out, "shell_template = {:?}", settings.shell_template)?;
        Ok(())
    }
}

/// Adds `show_settings` and `list_commands`. Register these last:
/// `list_commands` prints the registry as it stands at this point.
pub fn register_builtins(registry: &mut StaticRegistry, settings: Arc<dyn SettingsSource>) {
    registry.register("show_settings", ShowSettings { settings });

    let mut snapshot = registry.commands();
    snapshot.insert("list_commands".to_string(), BUILTIN_APP.to_string());
    registry.register("list_commands", ListCommands { snapshot });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::capture_output;
    use crate::config::{AdminSettings, SharedSettings};

    #[test]
    fn test_builtins_print() {
        let settings = Arc::new(SharedSettings::new(AdminSettings {
            prefix: "app_".into(),
            ..AdminSettings::default()
        }));
        let mut registry = StaticRegistry::new();
        registry.register_fn("app_flush", "cache", || Ok(()));
        register_builtins(&mut registry, settings);

        let (text, result) = capture_output(|| registry.call("list_commands"));
        result.unwrap();
        assert_eq!(
            text,
            "app_flush (cache)\nlist_commands (command_admin)\nshow_settings (command_admin)\n"
        );

        let (text, result) = capture_output(|| registry.call("show_settings"));
        result.unwrap();
        assert!(text.starts_with("prefix = \"app_\"\n"));
        assert!(text.contains("allow_delete = false\n"));
    }
}
