//! Core logic and abstractions for the cmdhub command host.
//!
//! This crate defines owner identities, command mappings, the alias
//! dispatcher, and the command service that lets independent plugins
//! register commands under namespaced aliases.

pub mod command;
pub mod config;
pub mod dispatcher;
pub mod mapping;
pub mod owner;
mod ownership;
pub mod service;

pub use command::{CommandCallable, CommandError, CommandSource, ProgramCallable};
pub use config::{CommandConfig, Manifest, PluginConfig};
pub use dispatcher::{identity, AliasDispatcher, AliasFilter, SimpleDispatcher};
pub use mapping::CommandMapping;
pub use owner::{Owner, OwnerError, NAMESPACE_SEPARATOR};
pub use service::CommandService;
