use std::collections::{HashMap, HashSet};

use crate::mapping::CommandMapping;
use crate::owner::Owner;

/// Bookkeeping of which owner registered which mapping.
///
/// Owners whose last mapping is removed are pruned, so every key holds at
/// least one mapping.
#[derive(Debug, Default)]
pub(crate) struct OwnershipIndex {
    entries: HashMap<Owner, Vec<CommandMapping>>,
}

impl OwnershipIndex {
    pub(crate) fn insert(&mut self, owner: Owner, mapping: CommandMapping) {
        self.entries.entry(owner).or_default().push(mapping);
    }

    /// Removes the first entry holding `mapping` and returns its owner.
    ///
    /// At most one entry is removed even if the mapping was recorded twice.
    pub(crate) fn remove_first(&mut self, mapping: &CommandMapping) -> Option<Owner> {
        let (owner, position) = self.entries.iter().find_map(|(owner, mappings)| {
            mappings
                .iter()
                .position(|held| held == mapping)
                .map(|position| (owner.clone(), position))
        })?;

        if let Some(mappings) = self.entries.get_mut(&owner) {
            mappings.remove(position);
            if mappings.is_empty() {
                self.entries.remove(&owner);
            }
        }
        Some(owner)
    }

    /// Removes every entry of `owner`, returning its mappings.
    pub(crate) fn take_owner(&mut self, owner: &Owner) -> Vec<CommandMapping> {
        self.entries.remove(owner).unwrap_or_default()
    }

    pub(crate) fn owners(&self) -> HashSet<Owner> {
        self.entries.keys().cloned().collect()
    }

    pub(crate) fn owned_by(&self, owner: &Owner) -> HashSet<CommandMapping> {
        self.entries
            .get(owner)
            .map(|mappings| mappings.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub(crate) fn owner_of(&self, mapping: &CommandMapping) -> Option<Owner> {
        self.entries
            .iter()
            .find(|(_, mappings)| mappings.contains(mapping))
            .map(|(owner, _)| owner.clone())
    }

    /// Total number of recorded entries.
    pub(crate) fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }
}
