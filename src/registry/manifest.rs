// src/registry/manifest.rs
// TOML manifest that registers external programs as commands
//
// [[command]]
// name = "clear_cache"
// app = "cache"
// program = "/usr/local/bin/cachectl"
// args = ["clear", "--all"]

use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use anyhow::{Context, bail};
use serde::Deserialize;
use tracing::debug;

use super::{Command, StaticRegistry, is_valid_name};
use crate::capture::stdout;
use crate::error::{AdminError, AdminResult};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Manifest {
    #[serde(default, rename = "command")]
    pub commands: Vec<ManifestEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ManifestEntry {
    pub name: String,
    pub app: String,
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    #[serde(default)]
    pub help: String,
}

impl Manifest {
    pub fn parse(text: &str) -> AdminResult<Self> {
        let manifest: Self = toml::from_str(text).map_err(|e| AdminError::Manifest(e.to_string()))?;
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read command manifest {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Failed to load command manifest {}", path.display()))
    }

    fn validate(&self) -> AdminResult<()> {
        let mut seen = HashSet::new();
        for entry in &self.commands {
            if !is_valid_name(&entry.name) {
                return Err(AdminError::Manifest(format!(
                    "command name {:?} may only contain letters, digits, '-' and '_'",
                    entry.name
                )));
            }
            if entry.program.trim().is_empty() {
                return Err(AdminError::Manifest(format!("command {} has no program", entry.name)));
            }
            if !seen.insert(entry.name.as_str()) {
                return Err(AdminError::Manifest(format!("command {} is declared twice", entry.name)));
            }
        }
        Ok(())
    }

    pub fn register_into(self, registry: &mut StaticRegistry) -> usize {
        let count = self.commands.len();
        for entry in self.commands {
            let name = entry.name.clone();
            registry.register(name, ProcessCommand::from(entry));
        }
        count
    }
}

/// Runs an external program; its stdout becomes the command output.
#[derive(Debug, Clone)]
pub struct ProcessCommand {
    entry: ManifestEntry,
}

impl From<ManifestEntry> for ProcessCommand {
    fn from(entry: ManifestEntry) -> Self {
        Self { entry }
    }
}

impl Command for ProcessCommand {
    fn app(&self) -> &str {
        &self.entry.app
    }

    fn help(&self) -> &str {
        &self.entry.help
    }

    fn run(&self) -> anyhow::Result<()> {
        let mut process = std::process::Command::new(&self.entry.program);
        process
            .args(&self.entry.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(cwd) = &self.entry.cwd {
            process.current_dir(cwd);
        }

        debug!("Spawning {} for command {}", self.entry.program, self.entry.name);
        let output = process
            .output()
            .with_context(|| format!("Failed to start {}", self.entry.program))?;

        stdout().write_all(&output.stdout)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            match output.status.code() {
                Some(code) => bail!("{} exited with status {}: {}", self.entry.program, code, stderr.trim()),
                None => bail!("{} was terminated by a signal: {}", self.entry.program, stderr.trim()),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::capture_output;
    use crate::registry::CommandRegistry;

    const MANIFEST: &str = r#"
        [[command]]
        name = "say_hello"
        app = "greetings"
        program = "sh"
        args = ["-c", "echo hello"]
        help = "Prints hello"

        [[command]]
        name = "fail_loudly"
        app = "greetings"
        program = "sh"
        args = ["-c", "echo before; echo broken >&2; exit 3"]
    "#;

    #[test]
    fn test_parse_manifest() {
        let manifest = Manifest::parse(MANIFEST).unwrap();
        assert_eq!(manifest.commands.len(), 2);
        assert_eq!(manifest.commands[0].args, vec!["-c", "echo hello"]);
        assert_eq!(manifest.commands[1].help, "");
    }

    #[test]
    fn test_empty_manifest() {
        assert!(Manifest::parse("").unwrap().commands.is_empty());
    }

    #[test]
    fn test_rejects_bad_names_and_duplicates() {
        let bad = "[[command]]\nname = \"a b\"\napp = \"x\"\nprogram = \"true\"\n";
        assert!(matches!(Manifest::parse(bad), Err(AdminError::Manifest(_))));

        let dup = "[[command]]\nname = \"a\"\napp = \"x\"\nprogram = \"true\"\n\
                   [[command]]\nname = \"a\"\napp = \"y\"\nprogram = \"true\"\n";
        let err = Manifest::parse(dup).unwrap_err();
        assert!(err.to_string().contains("declared twice"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("commands.toml");
        std::fs::write(&path, MANIFEST).unwrap();

        let mut registry = StaticRegistry::new();
        let count = Manifest::load(&path).unwrap().register_into(&mut registry);
        assert_eq!(count, 2);
        assert_eq!(registry.app_for("say_hello").as_deref(), Some("greetings"));
        assert_eq!(registry.help("say_hello").as_deref(), Some("Prints hello"));
        assert_eq!(registry.help("fail_loudly"), None);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Manifest::load(&dir.path().join("absent.toml")).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_process_command_output() {
        let mut registry = StaticRegistry::new();
        Manifest::parse(MANIFEST).unwrap().register_into(&mut registry);

        let (text, result) = capture_output(|| registry.call("say_hello"));
        result.unwrap();
        assert_eq!(text, "hello\n");

        let (text, result) = capture_output(|| registry.call("fail_loudly"));
        assert_eq!(text, "before\n");
        let message = result.unwrap_err().to_string();
        assert!(message.contains("status 3"));
        assert!(message.contains("broken"));
    }
}
