use std::fmt::{Debug, Formatter};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::command::CommandCallable;

/// The record of one successful alias registration.
///
/// Mappings are cheap handles onto a shared record. Equality is identity of
/// that record: two mappings compare equal only if they come from the same
/// registration, even when their aliases and handler coincide.
#[derive(Clone)]
pub struct CommandMapping {
    inner: Arc<MappingRecord>,
}

struct MappingRecord {
    primary_alias: String,
    aliases: Vec<String>,
    callable: Arc<dyn CommandCallable>,
}

impl CommandMapping {
    /// Creates a mapping. The first alias becomes the primary alias.
    ///
    /// Returns `None` when `aliases` is empty.
    pub fn new(callable: Arc<dyn CommandCallable>, aliases: Vec<String>) -> Option<Self> {
        let primary_alias = aliases.first()?.clone();
        Some(Self {
            inner: Arc::new(MappingRecord {
                primary_alias,
                aliases,
                callable,
            }),
        })
    }

    pub fn primary_alias(&self) -> &str {
        &self.inner.primary_alias
    }

    /// All aliases bound to this mapping, primary first.
    pub fn aliases(&self) -> &[String] {
        &self.inner.aliases
    }

    pub fn callable(&self) -> &Arc<dyn CommandCallable> {
        &self.inner.callable
    }
}

impl PartialEq for CommandMapping {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for CommandMapping {}

impl Hash for CommandMapping {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(Arc::as_ptr(&self.inner), state);
    }
}

impl Debug for CommandMapping {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandMapping")
            .field("primary_alias", &self.inner.primary_alias)
            .field("aliases", &self.inner.aliases)
            .finish_non_exhaustive()
    }
}
