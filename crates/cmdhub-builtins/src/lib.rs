//! Commands the host registers for itself under the `cmdhub` owner.

use std::sync::{Arc, Weak};

use anyhow::anyhow;
use tracing::{debug, warn};

use cmdhub_core::{
    CommandCallable, CommandError, CommandMapping, CommandService, CommandSource, Owner,
    OwnerError,
};

pub const OWNER_ID: &str = "cmdhub";

pub fn default_aliases() -> &'static [(&'static str, &'static [&'static str])] {
    &[
        ("help", &["help", "?"]),
        ("plugins", &["plugins", "pl"]),
        ("echo", &["echo", "say"]),
    ]
}

/// The owner built-in commands are registered under.
pub fn owner() -> Result<Owner, OwnerError> {
    Ok(Owner::with_name(OWNER_ID, "cmdhub")?.versioned(env!("CARGO_PKG_VERSION")))
}

/// Registers the built-in commands and returns the mappings that were bound.
///
/// Built-ins only hold a weak handle to `service`.
pub fn register_builtins(
    service: &Arc<CommandService>,
) -> Result<Vec<CommandMapping>, OwnerError> {
    let owner = owner()?;
    let mut mappings = Vec::new();

    for &(name, aliases) in default_aliases() {
        let callable: Arc<dyn CommandCallable> = match name {
            "help" => Arc::new(HelpCommand::new(service)),
            "plugins" => Arc::new(PluginsCommand::new(service)),
            _ => Arc::new(EchoCommand),
        };

        match service.register(&owner, callable, aliases) {
            Some(mapping) => {
                debug!("built-in '{}' bound as '{}'", name, mapping.primary_alias());
                mappings.push(mapping);
            }
            None => warn!("built-in '{}' could not be bound", name),
        }
    }

    Ok(mappings)
}

fn upgrade(service: &Weak<CommandService>) -> Result<Arc<CommandService>, CommandError> {
    service
        .upgrade()
        .ok_or_else(|| anyhow!("command service has shut down").into())
}

/// Lists commands, or describes one command.
#[derive(Debug)]
pub struct HelpCommand {
    service: Weak<CommandService>,
}

impl HelpCommand {
    pub fn new(service: &Arc<CommandService>) -> Self {
        Self {
            service: Arc::downgrade(service),
        }
    }
}

impl CommandCallable for HelpCommand {
    fn call(
        &self,
        source: &dyn CommandSource,
        arguments: &str,
        _parents: &[String],
    ) -> Result<bool, CommandError> {
        let service = upgrade(&self.service)?;
        let alias = arguments.trim();

        if alias.is_empty() {
            let help = service.help().unwrap_or_else(|| "no commands registered".to_string());
            for line in help.lines() {
                source.send_message(line);
            }
            return Ok(true);
        }

        let Some(mapping) = service.get(alias) else {
            return Err(CommandError::invalid_usage(
                format!("unknown command '{alias}'"),
                self.usage(),
            ));
        };

        let callable = mapping.callable();
        let description = callable
            .help()
            .or_else(|| callable.short_description())
            .unwrap_or_else(|| "no description".to_string());
        source.send_message(&format!("{}: {}", mapping.primary_alias(), description));
        source.send_message(&format!(
            "usage: {} {}",
            mapping.primary_alias(),
            callable.usage()
        ));
        if mapping.aliases().len() > 1 {
            source.send_message(&format!("aliases: {}", mapping.aliases().join(", ")));
        }
        Ok(true)
    }

    fn suggestions(
        &self,
        source: &dyn CommandSource,
        arguments: &str,
    ) -> Result<Vec<String>, CommandError> {
        let service = upgrade(&self.service)?;
        if arguments.trim().contains(char::is_whitespace) {
            return Ok(Vec::new());
        }
        service.suggestions(source, arguments.trim())
    }

    fn short_description(&self) -> Option<String> {
        Some("List commands or describe one".to_string())
    }

    fn usage(&self) -> String {
        "[command]".to_string()
    }
}

/// Lists the owners that currently hold commands.
#[derive(Debug)]
pub struct PluginsCommand {
    service: Weak<CommandService>,
}

impl PluginsCommand {
    pub fn new(service: &Arc<CommandService>) -> Self {
        Self {
            service: Arc::downgrade(service),
        }
    }
}

impl CommandCallable for PluginsCommand {
    fn call(
        &self,
        source: &dyn CommandSource,
        _arguments: &str,
        _parents: &[String],
    ) -> Result<bool, CommandError> {
        let service = upgrade(&self.service)?;
        let mut owners = service.owners().into_iter().collect::<Vec<_>>();
        owners.sort_by(|a, b| a.id().cmp(b.id()));

        for owner in owners {
            let count = service.owned_by(&owner).len();
            source.send_message(&format!("{} ({}): {} commands", owner.id(), owner, count));
        }
        Ok(true)
    }

    fn short_description(&self) -> Option<String> {
        Some("List plugins and their command counts".to_string())
    }
}

/// Sends its arguments back to the source.
#[derive(Debug)]
pub struct EchoCommand;

impl CommandCallable for EchoCommand {
    fn call(
        &self,
        source: &dyn CommandSource,
        arguments: &str,
        _parents: &[String],
    ) -> Result<bool, CommandError> {
        if arguments.trim().is_empty() {
            return Err(CommandError::invalid_usage("nothing to say", self.usage()));
        }
        source.send_message(arguments);
        Ok(true)
    }

    fn short_description(&self) -> Option<String> {
        Some("Repeat a message".to_string())
    }

    fn usage(&self) -> String {
        "<message>".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmdhub_core::ProgramCallable;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingSource {
        messages: Mutex<Vec<String>>,
    }

    impl RecordingSource {
        fn take(&self) -> Vec<String> {
            std::mem::take(&mut *self.messages.lock())
        }
    }

    impl CommandSource for RecordingSource {
        fn name(&self) -> &str {
            "tester"
        }

        fn send_message(&self, message: &str) {
            self.messages.lock().push(message.to_string());
        }
    }

    fn service_with_builtins() -> Arc<CommandService> {
        let service = Arc::new(CommandService::new());
        let mappings = register_builtins(&service).expect("builtin owner is valid");
        assert_eq!(mappings.len(), default_aliases().len());
        service
    }

    #[test]
    fn builtins_are_owned_by_cmdhub() {
        let service = service_with_builtins();
        let owner = owner().unwrap();

        assert_eq!(service.owned_by(&owner).len(), 3);
        assert!(service.contains_alias("?"));
        assert!(service.contains_alias("cmdhub:say"));
    }

    #[test]
    fn help_lists_every_primary_alias() {
        let service = service_with_builtins();
        let source = RecordingSource::default();

        assert!(service.call(&source, "help", &[]).unwrap());
        assert_eq!(
            source.take(),
            vec![
                "echo - Repeat a message",
                "help - List commands or describe one",
                "plugins - List plugins and their command counts",
            ]
        );
    }

    #[test]
    fn help_describes_a_single_command() {
        let service = service_with_builtins();
        let source = RecordingSource::default();

        service.call(&source, "? say", &[]).unwrap();
        assert_eq!(
            source.take(),
            vec![
                "echo: Repeat a message",
                "usage: echo <message>",
                "aliases: echo, cmdhub:echo, say, cmdhub:say",
            ]
        );

        let err = service.call(&source, "help nope", &[]).expect_err("unknown command");
        assert!(matches!(err, CommandError::InvalidUsage { .. }));
    }

    #[test]
    fn help_completes_command_aliases() {
        let service = service_with_builtins();
        let source = RecordingSource::default();

        let out = service.suggestions(&source, "help pl").unwrap();
        assert_eq!(out, vec!["pl", "plugins"]);
    }

    #[test]
    fn plugins_lists_owners_with_counts() {
        let service = service_with_builtins();
        let medkit = Owner::with_name("medkit", "Medkit").unwrap();
        service
            .register(&medkit, Arc::new(ProgramCallable::new("true", Vec::new())), &["heal"])
            .unwrap();
        let source = RecordingSource::default();

        service.call(&source, "pl", &[]).unwrap();
        let messages = source.take();
        assert_eq!(messages.len(), 2);
        assert!(messages[0].starts_with("cmdhub (cmdhub v"));
        assert!(messages[0].ends_with("3 commands"));
        assert_eq!(messages[1], "medkit (Medkit): 1 commands");
    }

    #[test]
    fn echo_repeats_arguments() {
        let service = service_with_builtins();
        let source = RecordingSource::default();

        service.call(&source, "say hello  world", &[]).unwrap();
        assert_eq!(source.take(), vec!["hello  world"]);
        assert!(service.call(&source, "echo", &[]).is_err());
    }

    #[test]
    fn builtins_fail_once_service_is_dropped() {
        let service = Arc::new(CommandService::new());
        let help = HelpCommand::new(&service);
        drop(service);

        let err = help
            .call(&RecordingSource::default(), "", &[])
            .expect_err("service is gone");
        assert!(matches!(err, CommandError::Failed(_)));
    }
}
