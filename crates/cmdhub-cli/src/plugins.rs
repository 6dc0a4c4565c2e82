use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info, warn};

use cmdhub_core::{CommandCallable, CommandService, Manifest};

/// Registers every command declared in `manifest` under its plugin's owner.
///
/// Commands whose aliases are all taken are skipped with a warning. Returns
/// the number of commands that were bound.
pub fn register_plugins(manifest: &Manifest, service: &CommandService) -> Result<usize> {
    let mut bound = 0;

    for plugin in &manifest.plugins {
        let owner = plugin.owner()?;
        debug!("registering {} commands for '{}'", plugin.commands.len(), owner.id());

        for command in &plugin.commands {
            let callable: Arc<dyn CommandCallable> = Arc::new(command.callable());
            let Some(mapping) = service.register(&owner, callable, &command.aliases) else {
                warn!(
                    "no alias of {:?} is free for plugin '{}'",
                    command.aliases,
                    owner.id()
                );
                continue;
            };

            if command.aliases.first().map(String::as_str) != Some(mapping.primary_alias()) {
                info!(
                    "'{}' of plugin '{}' is taken; bound as '{}'",
                    command.aliases[0],
                    owner.id(),
                    mapping.primary_alias()
                );
            }
            bound += 1;
        }
    }

    Ok(bound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn manifest() -> Manifest {
        Manifest::from_toml(
            r#"
            [[plugins]]
            id = "core"
            [[plugins.commands]]
            aliases = ["stop"]
            program = "true"

            [[plugins]]
            id = "plugin1"
            [[plugins.commands]]
            aliases = ["stop"]
            program = "true"
            [[plugins.commands]]
            aliases = ["stop"]
            program = "false"
            "#,
        )
        .expect("fixture manifest should parse")
    }

    #[test]
    fn conflicting_aliases_fall_back_to_namespaced_forms() {
        let service = CommandService::new();
        let bound = register_plugins(&manifest(), &service).unwrap();

        // plugin1's second `stop` finds both `stop` and `plugin1:stop` taken.
        assert_eq!(bound, 2);
        assert_eq!(
            service.primary_aliases(),
            HashSet::from(["stop".to_string(), "plugin1:stop".to_string()])
        );

        let plugin1 = manifest().plugins[1].owner().unwrap();
        assert_eq!(service.owned_by(&plugin1).len(), 1);
    }

    #[test]
    fn empty_manifest_registers_nothing() {
        let service = CommandService::new();
        assert_eq!(register_plugins(&Manifest::default(), &service).unwrap(), 0);
        assert!(service.is_empty());
    }
}
