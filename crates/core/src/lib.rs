//! injector-core - Dependency-ordered command injection
//!
//! This crate provides functionality to:
//! - Declare injections that attach generated commands to a host's registry
//! - Stack several injection strategies on one callback
//! - Resolve injections into a load order and prune the ones that cannot load
//! - Drive a host through `pre_init`, `init` and `uninit`
pub mod command;
pub mod config;
pub mod error;
pub mod host;
pub mod inject;
pub mod manifest;
pub mod resolver;

// Re-export commonly used types and traits
pub use error::{Error, Result};

pub use command::{
    Callback, Command, CommandGenerator, CommandKind, CommandOptions, CommandRegistry, CommandTree,
};
pub use config::{DuplicatePolicy, InjectorConfig};
pub use host::{InjectableHost, InjectionOutcome, LifecycleReport, Phase, Plan};
pub use inject::{
    Candidate, Decorate, Hook, InjectionDescriptor, MainCommand, OwnerContext, ParentScope,
    Subcommand, ensure_inject, inject_as_group, try_append_payload,
};
pub use manifest::{CommandSpec, InjectionSpec, Manifest, SiteSpec};
pub use resolver::{DependencyResolver, ResolverState};
