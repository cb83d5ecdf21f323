//! Injection descriptors and chaining

use indexmap::IndexSet;
use std::fmt;
use std::sync::Arc;

use super::OwnerContext;
use crate::command::{Callback, Command, CommandGenerator, CommandRegistry};
use crate::error::{Error, Result};

/// Action run when an injection is applied
pub type InjectFn =
    Arc<dyn Fn(&mut dyn CommandRegistry, &OwnerContext) -> Result<()> + Send + Sync>;

/// Action run when an injection is removed
pub type EjectFn = Arc<dyn Fn(&mut dyn CommandRegistry) -> Result<()> + Send + Sync>;

pub(crate) fn noop_inject() -> InjectFn {
    Arc::new(|_: &mut dyn CommandRegistry, _: &OwnerContext| Ok(()))
}

pub(crate) fn noop_eject() -> EjectFn {
    Arc::new(|_: &mut dyn CommandRegistry| Ok(()))
}

/// One injectable unit.
///
/// Descriptors are immutable once built. `next` points at the descriptor this
/// one wraps, so the most recently applied strategy is the head of the chain.
pub struct InjectionDescriptor {
    name: String,
    after: IndexSet<String>,
    inject: InjectFn,
    eject: EjectFn,
    generator: Arc<CommandGenerator>,
    next: Option<Arc<InjectionDescriptor>>,
}

impl fmt::Debug for InjectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InjectionDescriptor")
            .field("name", &self.name)
            .field("after", &self.after)
            .field("callback", &self.generator.callback().name())
            .field("next", &self.next.as_ref().map(|next| next.name()))
            .finish()
    }
}

impl InjectionDescriptor {
    pub fn new<I, S>(
        name: impl Into<String>,
        after: I,
        inject: InjectFn,
        eject: EjectFn,
        generator: Arc<CommandGenerator>,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            after: after.into_iter().map(Into::into).collect(),
            inject,
            eject,
            generator,
            next: None,
        }
    }

    fn noop(name: String, generator: CommandGenerator) -> Self {
        Self::new(
            name,
            Vec::<String>::new(),
            noop_inject(),
            noop_eject(),
            Arc::new(generator),
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Prerequisites declared by this descriptor alone. Chain ordering is added
    /// on top of these during discovery.
    pub fn after(&self) -> &IndexSet<String> {
        &self.after
    }

    pub fn generator(&self) -> &Arc<CommandGenerator> {
        &self.generator
    }

    /// The descriptor this one wraps
    pub fn next(&self) -> Option<&Arc<InjectionDescriptor>> {
        self.next.as_ref()
    }

    /// Names along the chain, starting with this descriptor
    pub fn chain_names(&self) -> Vec<&str> {
        let mut names = vec![self.name()];
        let mut current = self.next();
        while let Some(descriptor) = current {
            names.push(descriptor.name());
            current = descriptor.next();
        }
        names
    }

    pub fn inject(&self, registry: &mut dyn CommandRegistry, owner: &OwnerContext) -> Result<()> {
        (self.inject)(registry, owner)
    }

    pub fn eject(&self, registry: &mut dyn CommandRegistry) -> Result<()> {
        (self.eject)(registry)
    }

    /// Apply another strategy on top of this declaration
    pub fn wrap<D: super::Decorate>(self, decorator: D) -> Result<Self> {
        decorator.decorate(Candidate::Injection(self))
    }
}

/// Anything a strategy can be applied to
#[derive(Debug)]
pub enum Candidate {
    /// A bare callback
    Callback(Callback),
    /// A command that was already built; its options seed the generator
    Command(Command),
    /// An existing declaration, wrapped again
    Injection(InjectionDescriptor),
}

impl From<Callback> for Candidate {
    fn from(callback: Callback) -> Self {
        Candidate::Callback(callback)
    }
}

impl From<Command> for Candidate {
    fn from(command: Command) -> Self {
        Candidate::Command(command)
    }
}

impl From<InjectionDescriptor> for Candidate {
    fn from(descriptor: InjectionDescriptor) -> Self {
        Candidate::Injection(descriptor)
    }
}

/// Normalise a candidate into a descriptor.
///
/// Callbacks and commands become a descriptor with no prerequisites and no-op
/// actions, named after the callback or command, backed by a fresh generator.
/// Existing descriptors pass through unchanged.
pub fn ensure_inject(candidate: impl Into<Candidate>, group: bool) -> Result<InjectionDescriptor> {
    match candidate.into() {
        Candidate::Injection(descriptor) => Ok(descriptor),
        Candidate::Command(command) => {
            let generator = CommandGenerator::from_command(&command, group);
            Ok(InjectionDescriptor::noop(command.name().to_string(), generator))
        }
        Candidate::Callback(callback) => {
            let name = callback.name().trim();
            if name.is_empty() {
                return Err(Error::DeclarationError(format!(
                    "cannot derive an injection name from {callback:?}"
                )));
            }
            let name = name.to_string();
            Ok(InjectionDescriptor::noop(
                name,
                CommandGenerator::new(callback, group),
            ))
        }
    }
}

/// Build a descriptor that wraps `previous`, sharing its generator
pub fn try_append_payload<I, S>(
    name: impl Into<String>,
    previous: InjectionDescriptor,
    inject: InjectFn,
    eject: EjectFn,
    after: I,
) -> InjectionDescriptor
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let generator = Arc::clone(&previous.generator);
    let mut descriptor = InjectionDescriptor::new(name, after, inject, eject, generator);
    descriptor.next = Some(Arc::new(previous));
    descriptor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{CommandKind, CommandOptions, CommandTree};

    #[test]
    fn test_ensure_inject_callback() {
        let descriptor = ensure_inject(Callback::noop("play"), false).unwrap();

        assert_eq!(descriptor.name(), "play");
        assert!(descriptor.after().is_empty());
        assert!(descriptor.next().is_none());
        assert!(!descriptor.generator().is_group());

        // No-op actions leave the registry alone
        let mut tree = CommandTree::new();
        descriptor
            .inject(&mut tree, &OwnerContext::new("player"))
            .unwrap();
        descriptor.eject(&mut tree).unwrap();
        assert!(tree.is_empty());
    }

    #[test]
    fn test_ensure_inject_command_seeds_generator() {
        let command = Command::build(
            Callback::noop("skip"),
            CommandKind::Leaf,
            CommandOptions::new().with_help("Skip a song"),
        )
        .unwrap();

        let descriptor = ensure_inject(command, true).unwrap();
        assert_eq!(descriptor.name(), "skip");
        assert!(descriptor.generator().is_group());
        assert_eq!(
            descriptor.generator().base_options().help.as_deref(),
            Some("Skip a song")
        );
        assert_eq!(descriptor.generator().instances(), vec!["skip"]);
    }

    #[test]
    fn test_ensure_inject_rejects_unnamed_callback() {
        let result = ensure_inject(Callback::noop("  "), false);
        assert!(matches!(result, Err(Error::DeclarationError(_))));
    }

    #[test]
    fn test_ensure_inject_passes_descriptors_through() {
        let original = ensure_inject(Callback::noop("play"), false).unwrap();
        let generator = Arc::clone(original.generator());

        let again = ensure_inject(original, true).unwrap();
        assert!(Arc::ptr_eq(again.generator(), &generator));
        assert!(!again.generator().is_group());
    }

    #[test]
    fn test_try_append_payload_chains_and_shares_generator() {
        let base = ensure_inject(Callback::noop("play"), false).unwrap();
        let generator = Arc::clone(base.generator());

        let wrapped = try_append_payload(
            "inject_play",
            base,
            noop_inject(),
            noop_eject(),
            ["setup"],
        );

        assert_eq!(wrapped.name(), "inject_play");
        assert!(wrapped.after().contains("setup"));
        // Chain ordering is added during discovery, not here
        assert!(!wrapped.after().contains("play"));
        assert!(Arc::ptr_eq(wrapped.generator(), &generator));
        assert_eq!(wrapped.chain_names(), vec!["inject_play", "play"]);
    }
}
