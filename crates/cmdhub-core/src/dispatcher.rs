use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::command::{CommandCallable, CommandError, CommandSource};
use crate::mapping::CommandMapping;

/// Transform applied to the free candidate aliases before they are bound.
///
/// It may reorder, drop or add aliases; the first alias it returns that is
/// still free becomes the primary alias.
pub type AliasFilter<'a> = &'a dyn Fn(Vec<String>) -> Vec<String>;

/// The alias filter that binds every free candidate in order.
pub fn identity(aliases: Vec<String>) -> Vec<String> {
    aliases
}

/// The authoritative table from alias strings to registered commands.
///
/// Implementations synchronise internally; every method takes `&self`.
pub trait AliasDispatcher: Send + Sync {
    /// Binds `callable` to the candidate aliases that are still free.
    ///
    /// Returns `None` when no candidate could be bound.
    fn register(
        &self,
        callable: Arc<dyn CommandCallable>,
        aliases: Vec<String>,
        filter: AliasFilter<'_>,
    ) -> Option<CommandMapping>;

    /// Unbinds the mapping `alias` resolves to.
    fn remove(&self, alias: &str) -> Option<CommandMapping>;

    fn remove_mapping(&self, mapping: &CommandMapping) -> Option<CommandMapping>;

    fn get(&self, alias: &str) -> Option<CommandMapping>;

    fn contains_alias(&self, alias: &str) -> bool;

    fn contains_mapping(&self, mapping: &CommandMapping) -> bool;

    fn commands(&self) -> HashSet<CommandMapping>;

    fn primary_aliases(&self) -> HashSet<String>;

    fn aliases(&self) -> HashSet<String>;

    /// Resolves the first token of `arguments` and runs the bound command.
    ///
    /// Returns `Ok(false)` if no command is bound to that token, otherwise
    /// whatever the bound command returns.
    ///
    /// # Errors
    /// Propagates the command's own failure unchanged.
    fn call(
        &self,
        source: &dyn CommandSource,
        arguments: &str,
        parents: &[String],
    ) -> Result<bool, CommandError>;

    fn test_permission(&self, source: &dyn CommandSource) -> bool;

    /// Completes either the alias itself or the bound command's arguments.
    ///
    /// # Errors
    /// Propagates the command's own failure unchanged.
    fn suggestions(
        &self,
        source: &dyn CommandSource,
        arguments: &str,
    ) -> Result<Vec<String>, CommandError>;

    fn short_description(&self) -> Option<String>;

    fn help(&self) -> Option<String>;

    fn usage(&self) -> String;

    /// Number of distinct mappings.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A case-insensitive, thread-safe alias table.
#[derive(Debug, Default)]
pub struct SimpleDispatcher {
    commands: RwLock<HashMap<String, CommandMapping>>,
}

impl SimpleDispatcher {
    pub fn new() -> Self {
        Self::default()
    }
}

fn alias_key(alias: &str) -> String {
    alias.to_lowercase()
}

/// Splits `arguments` into the leading alias and the remaining argument string.
fn split_alias(arguments: &str) -> (&str, Option<&str>) {
    let trimmed = arguments.trim_start();
    match trimmed.find(char::is_whitespace) {
        Some(at) => (&trimmed[..at], Some(trimmed[at..].trim_start())),
        None => (trimmed, None),
    }
}

fn usable_alias(alias: &str) -> bool {
    let usable = !alias.is_empty() && !alias.chars().any(char::is_whitespace);
    if !usable {
        warn!("ignoring unusable alias {:?}", alias);
    }
    usable
}

impl AliasDispatcher for SimpleDispatcher {
    fn register(
        &self,
        callable: Arc<dyn CommandCallable>,
        aliases: Vec<String>,
        filter: AliasFilter<'_>,
    ) -> Option<CommandMapping> {
        let free = {
            let commands = self.commands.read();
            let mut seen = HashSet::new();
            aliases
                .into_iter()
                .filter(|alias| usable_alias(alias))
                .filter(|alias| {
                    let key = alias_key(alias);
                    !commands.contains_key(&key) && seen.insert(key)
                })
                .collect::<Vec<_>>()
        };

        // The filter runs unlocked; candidates are re-checked once the write
        // lock is held.
        let filtered = filter(free);

        let mut commands = self.commands.write();
        let mut seen = HashSet::new();
        let bound = filtered
            .into_iter()
            .filter(|alias| usable_alias(alias))
            .filter(|alias| {
                let key = alias_key(alias);
                !commands.contains_key(&key) && seen.insert(key)
            })
            .collect::<Vec<_>>();

        let Some(mapping) = CommandMapping::new(callable, bound) else {
            debug!("no free alias left to bind");
            return None;
        };

        for alias in mapping.aliases() {
            commands.insert(alias_key(alias), mapping.clone());
        }
        debug!("bound {:?}", mapping.aliases());
        Some(mapping)
    }

    fn remove(&self, alias: &str) -> Option<CommandMapping> {
        let mut commands = self.commands.write();
        let mapping = commands.get(&alias_key(alias))?.clone();
        commands.retain(|_, bound| *bound != mapping);
        debug!("unbound {:?}", mapping.aliases());
        Some(mapping)
    }

    fn remove_mapping(&self, mapping: &CommandMapping) -> Option<CommandMapping> {
        let mut commands = self.commands.write();
        let before = commands.len();
        commands.retain(|_, bound| bound != mapping);
        if commands.len() == before {
            return None;
        }
        debug!("unbound {:?}", mapping.aliases());
        Some(mapping.clone())
    }

    fn get(&self, alias: &str) -> Option<CommandMapping> {
        self.commands.read().get(&alias_key(alias)).cloned()
    }

    fn contains_alias(&self, alias: &str) -> bool {
        self.commands.read().contains_key(&alias_key(alias))
    }

    fn contains_mapping(&self, mapping: &CommandMapping) -> bool {
        self.commands.read().values().any(|bound| bound == mapping)
    }

    fn commands(&self) -> HashSet<CommandMapping> {
        self.commands.read().values().cloned().collect()
    }

    fn primary_aliases(&self) -> HashSet<String> {
        self.commands
            .read()
            .values()
            .map(|mapping| mapping.primary_alias().to_string())
            .collect()
    }

    fn aliases(&self) -> HashSet<String> {
        self.commands
            .read()
            .values()
            .flat_map(|mapping| mapping.aliases().iter().cloned())
            .collect()
    }

    fn call(
        &self,
        source: &dyn CommandSource,
        arguments: &str,
        parents: &[String],
    ) -> Result<bool, CommandError> {
        let (alias, rest) = split_alias(arguments);
        let Some(mapping) = self.get(alias) else {
            return Ok(false);
        };

        let mut passed_parents = parents.to_vec();
        passed_parents.push(alias.to_string());

        mapping
            .callable()
            .call(source, rest.unwrap_or_default(), &passed_parents)
    }

    fn test_permission(&self, source: &dyn CommandSource) -> bool {
        self.commands()
            .iter()
            .any(|mapping| mapping.callable().test_permission(source))
    }

    fn suggestions(
        &self,
        source: &dyn CommandSource,
        arguments: &str,
    ) -> Result<Vec<String>, CommandError> {
        let (alias, rest) = split_alias(arguments);

        if let Some(rest) = rest {
            return match self.get(alias) {
                Some(mapping) => mapping.callable().suggestions(source, rest),
                None => Ok(Vec::new()),
            };
        }

        let prefix = alias_key(alias);
        let candidates = self
            .commands
            .read()
            .iter()
            .filter(|(key, _)| key.starts_with(&prefix))
            .map(|(key, mapping)| (key.clone(), mapping.clone()))
            .collect::<Vec<_>>();

        // Keys are lower-cased; report the spelling the alias was registered with.
        let mut suggestions = candidates
            .into_iter()
            .filter(|(_, mapping)| mapping.callable().test_permission(source))
            .filter_map(|(key, mapping)| {
                mapping
                    .aliases()
                    .iter()
                    .find(|alias| alias_key(alias) == key)
                    .cloned()
            })
            .collect::<Vec<_>>();
        suggestions.sort_by_key(|alias| alias_key(alias));
        Ok(suggestions)
    }

    fn short_description(&self) -> Option<String> {
        None
    }

    fn help(&self) -> Option<String> {
        let mut mappings = self.commands().into_iter().collect::<Vec<_>>();
        if mappings.is_empty() {
            return None;
        }
        mappings.sort_by(|a, b| a.primary_alias().cmp(b.primary_alias()));

        let lines = mappings
            .iter()
            .map(|mapping| match mapping.callable().short_description() {
                Some(description) => format!("{} - {}", mapping.primary_alias(), description),
                None => mapping.primary_alias().to_string(),
            })
            .collect::<Vec<_>>();
        Some(lines.join("\n"))
    }

    fn usage(&self) -> String {
        let mut primaries = self.primary_aliases().into_iter().collect::<Vec<_>>();
        primaries.sort();
        format!("<{}>", primaries.join("|"))
    }

    fn len(&self) -> usize {
        self.commands().len()
    }
}
