use std::collections::HashSet;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::command::ProgramCallable;
use crate::owner::Owner;

/// The plugin manifest, usually read from `cmdhub.toml`.
#[derive(Debug, Default, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub plugins: Vec<PluginConfig>,
}

impl Manifest {
    pub fn load_from_file(path: &str) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest file: {path}"))?;
        Self::from_toml(&text).with_context(|| format!("invalid manifest: {path}"))
    }

    /// Parses and validates a manifest.
    pub fn from_toml(text: &str) -> Result<Self> {
        let manifest = toml::from_str::<Self>(text).context("failed to parse TOML manifest")?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Checks plugin ids and command declarations.
    pub fn validate(&self) -> Result<()> {
        let mut ids = HashSet::new();
        for plugin in &self.plugins {
            plugin.owner()?;
            if !ids.insert(plugin.id.as_str()) {
                bail!("plugin '{}' is declared more than once", plugin.id);
            }
            for (index, command) in plugin.commands.iter().enumerate() {
                if command.aliases.iter().all(|alias| alias.trim().is_empty()) {
                    bail!("command #{} of plugin '{}' has no alias", index + 1, plugin.id);
                }
                if command.program.trim().is_empty() {
                    bail!(
                        "command '{}' of plugin '{}' has no program",
                        command.aliases[0],
                        plugin.id
                    );
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PluginConfig {
    pub id: String,
    pub name: Option<String>,
    pub version: Option<String>,
    #[serde(default)]
    pub commands: Vec<CommandConfig>,
}

impl PluginConfig {
    /// The owner identity commands of this plugin are registered under.
    pub fn owner(&self) -> Result<Owner> {
        let name = self.name.as_deref().unwrap_or(&self.id);
        let owner = Owner::with_name(&self.id, name)
            .with_context(|| format!("invalid plugin id '{}'", self.id))?;
        Ok(match &self.version {
            Some(version) => owner.versioned(version),
            None => owner,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommandConfig {
    pub aliases: Vec<String>,
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    pub description: Option<String>,
    pub permission: Option<String>,
}

impl CommandConfig {
    pub fn callable(&self) -> ProgramCallable {
        let mut callable = ProgramCallable::new(&self.program, self.args.clone());
        if let Some(description) = &self.description {
            callable = callable.with_description(description);
        }
        if let Some(permission) = &self.permission {
            callable = callable.with_permission(permission);
        }
        callable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandCallable;

    fn fixture() -> &'static str {
        r#"
        [[plugins]]
        id = "medkit"
        name = "Medkit"
        version = "1.0.0"

        [[plugins.commands]]
        aliases = ["heal", "h"]
        program = "echo"
        args = ["healing"]
        description = "Heal the caller"
        permission = "medkit.heal"

        [[plugins]]
        id = "core"

        [[plugins.commands]]
        aliases = ["stop"]
        program = "true"
        "#
    }

    #[test]
    fn parses_plugins_and_commands() {
        let manifest = Manifest::from_toml(fixture()).expect("fixture should parse");
        assert_eq!(manifest.plugins.len(), 2);

        let medkit = &manifest.plugins[0];
        let owner = medkit.owner().unwrap();
        assert_eq!(owner.id(), "medkit");
        assert_eq!(owner.version(), Some("1.0.0"));

        let heal = &medkit.commands[0];
        assert_eq!(heal.aliases, vec!["heal", "h"]);
        assert_eq!(
            heal.callable().short_description().as_deref(),
            Some("Heal the caller")
        );

        let core = manifest.plugins[1].owner().unwrap();
        assert_eq!(core.name(), "core");
        assert!(manifest.plugins[1].commands[0].args.is_empty());
    }

    #[test]
    fn empty_manifest_has_no_plugins() {
        let manifest = Manifest::from_toml("").unwrap();
        assert!(manifest.plugins.is_empty());
    }

    #[test]
    fn rejects_invalid_plugin_id() {
        let err = Manifest::from_toml("[[plugins]]\nid = \"bad:id\"\n").unwrap_err();
        assert!(err.to_string().contains("invalid plugin id"));
    }

    #[test]
    fn rejects_duplicate_plugins() {
        let err = Manifest::from_toml("[[plugins]]\nid = \"a\"\n[[plugins]]\nid = \"a\"\n")
            .unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn rejects_commands_without_alias_or_program() {
        let no_alias = r#"
        [[plugins]]
        id = "a"
        [[plugins.commands]]
        aliases = []
        program = "echo"
        "#;
        assert!(Manifest::from_toml(no_alias).is_err());

        let no_program = r#"
        [[plugins]]
        id = "a"
        [[plugins.commands]]
        aliases = ["x"]
        program = ""
        "#;
        assert!(Manifest::from_toml(no_program).is_err());
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cmdhub.toml");
        std::fs::write(&path, fixture()).unwrap();

        let manifest = Manifest::load_from_file(path.to_str().unwrap()).unwrap();
        assert_eq!(manifest.plugins.len(), 2);

        let missing = dir.path().join("missing.toml");
        assert!(Manifest::load_from_file(missing.to_str().unwrap()).is_err());
    }
}
