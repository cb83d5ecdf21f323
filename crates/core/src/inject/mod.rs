//! Injection declarations
//!
//! An injection is a named pair of actions: `inject` attaches something to a
//! host's command registry, `eject` takes it off again. Declarations stack:
//! every strategy applied to the same callback produces a new descriptor that
//! wraps the previous one and shares its [`CommandGenerator`](crate::command::CommandGenerator).

pub mod descriptor;
pub mod strategy;

pub use descriptor::{
    Candidate, EjectFn, InjectFn, InjectionDescriptor, ensure_inject, try_append_payload,
};
pub use strategy::{Decorate, Hook, MainCommand, ParentScope, Subcommand, inject_as_group};

/// The object injections were declared on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerContext {
    name: String,
}

impl OwnerContext {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}
