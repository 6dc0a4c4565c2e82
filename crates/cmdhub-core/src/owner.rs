use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use thiserror::Error;

/// Separator placed between an owner id and an alias in namespaced aliases.
pub const NAMESPACE_SEPARATOR: char = ':';

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OwnerError {
    #[error("owner id must not be empty")]
    EmptyId,
    #[error("owner id '{0}' must not contain whitespace")]
    Whitespace(String),
    #[error("owner id '{0}' must not contain the namespace separator ':'")]
    Separator(String),
}

/// The entity (usually a plugin) on whose behalf commands are registered.
///
/// Two owners are equal when their ids are equal; the display name and
/// version are informational only.
#[derive(Debug, Clone)]
pub struct Owner {
    id: Arc<str>,
    name: Arc<str>,
    version: Option<Arc<str>>,
}

impl Owner {
    /// Creates an owner whose display name is its id.
    ///
    /// # Errors
    /// Returns an error if `id` is empty or contains whitespace or `:`.
    pub fn new(id: &str) -> Result<Self, OwnerError> {
        Self::with_name(id, id)
    }

    /// Creates an owner with a separate display name.
    ///
    /// # Errors
    /// Returns an error if `id` is empty or contains whitespace or `:`.
    pub fn with_name(id: &str, name: &str) -> Result<Self, OwnerError> {
        validate_id(id)?;
        Ok(Self {
            id: Arc::from(id),
            name: Arc::from(name),
            version: None,
        })
    }

    pub fn versioned(mut self, version: &str) -> Self {
        self.version = Some(Arc::from(version));
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Prefixes `alias` with this owner's namespace, e.g. `medkit:heal`.
    pub fn namespaced(&self, alias: &str) -> String {
        format!("{}{}{}", self.id, NAMESPACE_SEPARATOR, alias)
    }
}

fn validate_id(id: &str) -> Result<(), OwnerError> {
    if id.is_empty() {
        return Err(OwnerError::EmptyId);
    }
    if id.chars().any(char::is_whitespace) {
        return Err(OwnerError::Whitespace(id.to_string()));
    }
    if id.contains(NAMESPACE_SEPARATOR) {
        return Err(OwnerError::Separator(id.to_string()));
    }
    Ok(())
}

impl PartialEq for Owner {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Owner {}

impl Hash for Owner {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl Display for Owner {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{} v{}", self.name, version),
            None => write!(f, "{}", self.name),
        }
    }
}
