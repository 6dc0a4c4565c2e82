//! The command service: the entry point plugins use to register commands.
//!
//! Every alias a plugin asks for is offered twice to the dispatcher, bare and
//! namespaced with the owner id (`heal` and `medkit:heal`), so a plugin always
//! gets a reachable alias even when another plugin already holds the bare one.
//!
//! Registration, removal and the ownership queries run under one service-wide
//! lock, so the dispatcher's table and the ownership bookkeeping never diverge
//! for a concurrent reader. Pure lookups go straight to the dispatcher.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, instrument};

use crate::command::{CommandCallable, CommandError, CommandSource};
use crate::dispatcher::{identity, AliasDispatcher, AliasFilter, SimpleDispatcher};
use crate::mapping::CommandMapping;
use crate::owner::Owner;
use crate::ownership::OwnershipIndex;

/// Registers commands on behalf of owners and tracks who owns what.
pub struct CommandService<D: AliasDispatcher = SimpleDispatcher> {
    dispatcher: D,
    owners: Mutex<OwnershipIndex>,
}

impl CommandService {
    /// Creates a service backed by a fresh [`SimpleDispatcher`].
    pub fn new() -> Self {
        Self::with_dispatcher(SimpleDispatcher::new())
    }
}

impl Default for CommandService {
    fn default() -> Self {
        Self::new()
    }
}

/// Expands every alias into its bare and namespaced form, preserving order.
fn candidate_aliases<S: AsRef<str>>(owner: &Owner, aliases: &[S]) -> Vec<String> {
    let mut candidates = Vec::with_capacity(aliases.len() * 2);
    for alias in aliases {
        let alias = alias.as_ref();
        candidates.push(alias.to_string());
        candidates.push(owner.namespaced(alias));
    }
    candidates
}

impl<D: AliasDispatcher> CommandService<D> {
    /// Creates a service on top of a caller-supplied dispatcher.
    pub fn with_dispatcher(dispatcher: D) -> Self {
        Self {
            dispatcher,
            owners: Mutex::new(OwnershipIndex::default()),
        }
    }

    /// Registers `callable` for `owner` under `aliases` and their
    /// `owner:alias` forms.
    ///
    /// Returns `None` if none of the candidates could be bound.
    pub fn register<S: AsRef<str>>(
        &self,
        owner: &Owner,
        callable: Arc<dyn CommandCallable>,
        aliases: &[S],
    ) -> Option<CommandMapping> {
        self.register_with(owner, callable, aliases, &identity)
    }

    /// Like [`register`](Self::register), with `filter` forwarded to the
    /// dispatcher to reorder, prune or extend the free candidates.
    ///
    /// The filter runs while the service lock is held and must not call back
    /// into this service.
    #[instrument(skip_all, fields(owner = owner.id()))]
    pub fn register_with<S: AsRef<str>>(
        &self,
        owner: &Owner,
        callable: Arc<dyn CommandCallable>,
        aliases: &[S],
        filter: AliasFilter<'_>,
    ) -> Option<CommandMapping> {
        let mut owners = self.owners.lock();

        let candidates = candidate_aliases(owner, aliases);
        debug!("offering candidates {:?}", candidates);

        let mapping = self.dispatcher.register(callable, candidates, filter);
        match &mapping {
            Some(mapping) => {
                owners.insert(owner.clone(), mapping.clone());
                info!(
                    "registered '{}' for {} ({} entries owned overall)",
                    mapping.primary_alias(),
                    owner.id(),
                    owners.len()
                );
            }
            None => debug!("no alias could be bound for {}", owner.id()),
        }
        mapping
    }

    /// Removes the command bound to `alias`, together with its ownership entry.
    #[instrument(skip(self))]
    pub fn remove(&self, alias: &str) -> Option<CommandMapping> {
        let mut owners = self.owners.lock();
        let removed = self.dispatcher.remove(alias)?;
        forget(&mut owners, &removed);
        Some(removed)
    }

    /// Removes `mapping`, together with its ownership entry.
    #[instrument(skip_all, fields(alias = mapping.primary_alias()))]
    pub fn remove_mapping(&self, mapping: &CommandMapping) -> Option<CommandMapping> {
        let mut owners = self.owners.lock();
        let removed = self.dispatcher.remove_mapping(mapping)?;
        forget(&mut owners, &removed);
        Some(removed)
    }

    /// Removes every command `owner` holds, e.g. when a plugin unloads.
    #[instrument(skip_all, fields(owner = owner.id()))]
    pub fn remove_owned_by(&self, owner: &Owner) -> HashSet<CommandMapping> {
        let mut owners = self.owners.lock();
        let removed = owners
            .take_owner(owner)
            .into_iter()
            .filter_map(|mapping| self.dispatcher.remove_mapping(&mapping))
            .collect::<HashSet<_>>();
        info!("removed {} commands of {}", removed.len(), owner.id());
        removed
    }

    /// Owners currently holding at least one command.
    pub fn owners(&self) -> HashSet<Owner> {
        self.owners.lock().owners()
    }

    /// Commands registered by `owner`; empty for unknown owners.
    pub fn owned_by(&self, owner: &Owner) -> HashSet<CommandMapping> {
        self.owners.lock().owned_by(owner)
    }

    /// The owner that registered `mapping`, if it is still recorded.
    pub fn owner_of(&self, mapping: &CommandMapping) -> Option<Owner> {
        self.owners.lock().owner_of(mapping)
    }

    /// Every bound command.
    pub fn commands(&self) -> HashSet<CommandMapping> {
        self.dispatcher.commands()
    }

    /// The primary alias of every bound command.
    pub fn primary_aliases(&self) -> HashSet<String> {
        self.dispatcher.primary_aliases()
    }

    /// Every bound alias, bare and namespaced.
    pub fn aliases(&self) -> HashSet<String> {
        self.dispatcher.aliases()
    }

    /// The command `alias` resolves to.
    pub fn get(&self, alias: &str) -> Option<CommandMapping> {
        self.dispatcher.get(alias)
    }

    /// Whether `alias` is bound.
    pub fn contains_alias(&self, alias: &str) -> bool {
        self.dispatcher.contains_alias(alias)
    }

    /// Whether `mapping` is still bound.
    pub fn contains_mapping(&self, mapping: &CommandMapping) -> bool {
        self.dispatcher.contains_mapping(mapping)
    }

    /// Dispatches a command line.
    ///
    /// Returns `Ok(false)` when no command is bound to the first token or
    /// the command declined the input.
    ///
    /// # Errors
    /// Returns the command's own error unchanged.
    pub fn call(
        &self,
        source: &dyn CommandSource,
        arguments: &str,
        parents: &[String],
    ) -> Result<bool, CommandError> {
        self.dispatcher.call(source, arguments, parents)
    }

    /// Whether `source` may use at least one command.
    pub fn test_permission(&self, source: &dyn CommandSource) -> bool {
        self.dispatcher.test_permission(source)
    }

    /// Completions for a partial command line.
    ///
    /// # Errors
    /// Returns the command's own error unchanged.
    pub fn suggestions(
        &self,
        source: &dyn CommandSource,
        arguments: &str,
    ) -> Result<Vec<String>, CommandError> {
        self.dispatcher.suggestions(source, arguments)
    }

    pub fn short_description(&self) -> Option<String> {
        self.dispatcher.short_description()
    }

    /// One line per command, or `None` when nothing is registered.
    pub fn help(&self) -> Option<String> {
        self.dispatcher.help()
    }

    /// `<a|b|...>` over the primary aliases.
    pub fn usage(&self) -> String {
        self.dispatcher.usage()
    }

    /// Number of bound commands.
    pub fn len(&self) -> usize {
        self.dispatcher.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dispatcher.is_empty()
    }
}

fn forget(owners: &mut OwnershipIndex, mapping: &CommandMapping) {
    match owners.remove_first(mapping) {
        Some(owner) => debug!("{} no longer owns '{}'", owner.id(), mapping.primary_alias()),
        None => debug!("'{}' had no recorded owner", mapping.primary_alias()),
    }
}
