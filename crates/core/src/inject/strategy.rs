//! Injection strategies
//!
//! Each strategy turns a candidate into a descriptor whose actions put a
//! generated command somewhere in the host's registry. Strategies can be
//! stacked with [`InjectionDescriptor::wrap`]; every layer becomes its own
//! named injection that runs after the one it wraps.

use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

use super::OwnerContext;
use super::descriptor::{
    Candidate, EjectFn, InjectFn, InjectionDescriptor, ensure_inject, try_append_payload,
};
use crate::command::{Command, CommandOptions, CommandRegistry, validate_name};
use crate::error::{Error, Result};

/// A declaration-time wrapper that produces a descriptor from a candidate
pub trait Decorate {
    fn decorate(self, candidate: Candidate) -> Result<InjectionDescriptor>;
}

/// Mark a candidate as a group-style command without injecting it anywhere
pub fn inject_as_group(candidate: impl Into<Candidate>) -> Result<InjectionDescriptor> {
    ensure_inject(candidate, true)
}

fn lock<T>(slot: &Mutex<T>) -> MutexGuard<'_, T> {
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Register one top-level command per name
#[derive(Debug, Clone)]
pub struct MainCommand {
    names: Vec<String>,
    inject_name: Option<String>,
    after: Vec<String>,
    options: CommandOptions,
}

impl MainCommand {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            inject_name: None,
            after: Vec::new(),
            options: CommandOptions::default(),
        }
    }

    pub fn inject_name(mut self, name: impl Into<String>) -> Self {
        self.inject_name = Some(name.into());
        self
    }

    pub fn after<I, S>(mut self, after: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.after.extend(after.into_iter().map(Into::into));
        self
    }

    pub fn options(mut self, options: CommandOptions) -> Self {
        self.options = options;
        self
    }
}

impl Decorate for MainCommand {
    fn decorate(self, candidate: Candidate) -> Result<InjectionDescriptor> {
        if self.names.is_empty() {
            return Err(Error::DeclarationError(
                "main command injection needs at least one name".to_string(),
            ));
        }
        for name in &self.names {
            validate_name(name)?;
        }

        let base = ensure_inject(candidate, false)?;
        let injection_name = self
            .inject_name
            .unwrap_or_else(|| format!("inject_{}", self.names.join("_")));

        let names = Arc::new(self.names);
        // Names this injection actually registered, so eject never removes a
        // command somebody else owns
        let registered: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));

        let inject: InjectFn = {
            let generator = Arc::clone(base.generator());
            let names = Arc::clone(&names);
            let registered = Arc::clone(&registered);
            let options = self.options;
            Arc::new(move |registry: &mut dyn CommandRegistry, owner: &OwnerContext| -> Result<()> {
                debug!(
                    "Injecting '{}' as main command(s) {:?}",
                    generator.callback().name(),
                    names
                );
                for name in names.iter() {
                    let overrides = options.merged(&CommandOptions::new().with_name(name.as_str()));
                    let mut command = generator.make_command(&overrides)?;
                    command.set_owner(Some(owner.name().to_string()));
                    registry.add_command(command)?;
                    lock(&registered).push(name.clone());
                }
                Ok(())
            })
        };

        let eject: EjectFn = {
            let names = Arc::clone(&names);
            Arc::new(move |registry: &mut dyn CommandRegistry| -> Result<()> {
                debug!("Ejecting main command(s) {:?}", names);
                for name in lock(&registered).drain(..) {
                    if registry.remove_command(&name).is_none() {
                        debug!("Main command '{}' was already gone", name);
                    }
                }
                Ok(())
            })
        };

        Ok(try_append_payload(injection_name, base, inject, eject, self.after))
    }
}

/// Where a subcommand's parent group is looked up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentScope {
    /// Anywhere in the host registry
    Host,
    /// Among the commands belonging to the owning context
    Owner,
}

/// Attach a generated command under an existing group
#[derive(Debug, Clone)]
pub struct Subcommand {
    parent: String,
    scope: ParentScope,
    inject_name: Option<String>,
    after: Vec<String>,
    options: CommandOptions,
}

impl Subcommand {
    /// Subcommand of a group registered on the host
    pub fn of(parent: impl Into<String>) -> Self {
        Self::with_scope(parent, ParentScope::Host)
    }

    /// Subcommand of a group belonging to the owning context
    pub fn of_owner(parent: impl Into<String>) -> Self {
        Self::with_scope(parent, ParentScope::Owner)
    }

    fn with_scope(parent: impl Into<String>, scope: ParentScope) -> Self {
        Self {
            parent: parent.into(),
            scope,
            inject_name: None,
            after: Vec::new(),
            options: CommandOptions::default(),
        }
    }

    pub fn inject_name(mut self, name: impl Into<String>) -> Self {
        self.inject_name = Some(name.into());
        self
    }

    pub fn after<I, S>(mut self, after: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.after.extend(after.into_iter().map(Into::into));
        self
    }

    pub fn options(mut self, options: CommandOptions) -> Self {
        self.options = options;
        self
    }
}

impl Decorate for Subcommand {
    fn decorate(self, candidate: Candidate) -> Result<InjectionDescriptor> {
        let base = ensure_inject(candidate, false)?;
        let subcommand: Command = base.generator().make_command(&self.options)?;
        let injection_name = self
            .inject_name
            .unwrap_or_else(|| format!("inject_{}_{}", subcommand.name(), self.parent));

        let child_name = subcommand.name().to_string();
        // Qualified path of the group the command was attached to
        let attached: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));

        let inject: InjectFn = {
            let parent = self.parent.clone();
            let scope = self.scope;
            let attached = Arc::clone(&attached);
            Arc::new(move |registry: &mut dyn CommandRegistry, owner: &OwnerContext| -> Result<()> {
                debug!(
                    "Injecting '{}' as {:?} subcommand of '{}'",
                    subcommand.name(),
                    scope,
                    parent
                );
                let mut command = subcommand.clone();
                command.set_owner(Some(owner.name().to_string()));

                let group = match scope {
                    ParentScope::Host => registry.get_command_mut(&parent),
                    ParentScope::Owner => registry.owner_command_mut(owner.name(), &parent),
                }
                .ok_or_else(|| Error::CommandNotFound(parent.clone()))?;

                let group_path = group.qualified_name();
                group.add_command(command)?;
                *lock(&attached) = Some(group_path.clone());

                let qualified = format!("{group_path} {}", subcommand.name());
                registry.fix_chained_command_alias(&qualified, "injected")
            })
        };

        let eject: EjectFn = {
            let parent = self.parent.clone();
            Arc::new(move |registry: &mut dyn CommandRegistry| -> Result<()> {
                debug!("Ejecting subcommand '{}' from '{}'", child_name, parent);
                let Some(group_path) = lock(&attached).take() else {
                    debug!("Subcommand '{}' was never attached", child_name);
                    return Ok(());
                };

                let group = registry
                    .get_command_mut(&group_path)
                    .ok_or_else(|| Error::CommandNotFound(group_path.clone()))?;
                let qualified = format!("{group_path} {child_name}");
                group
                    .remove_command(&child_name)
                    .ok_or_else(|| Error::CommandNotFound(qualified.clone()))?;

                registry.fix_chained_command_alias(&qualified, "ejected")
            })
        };

        Ok(try_append_payload(injection_name, base, inject, eject, self.after))
    }
}

/// Arbitrary setup and teardown attached to a declaration
pub struct Hook {
    name: String,
    after: Vec<String>,
    inject: InjectFn,
    eject: EjectFn,
}

impl Hook {
    pub fn new<I, E>(name: impl Into<String>, inject: I, eject: E) -> Self
    where
        I: Fn(&mut dyn CommandRegistry, &OwnerContext) -> Result<()> + Send + Sync + 'static,
        E: Fn(&mut dyn CommandRegistry) -> Result<()> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            after: Vec::new(),
            inject: Arc::new(inject),
            eject: Arc::new(eject),
        }
    }

    pub fn after<I, S>(mut self, after: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.after.extend(after.into_iter().map(Into::into));
        self
    }
}

impl Decorate for Hook {
    fn decorate(self, candidate: Candidate) -> Result<InjectionDescriptor> {
        let base = ensure_inject(candidate, false)?;
        Ok(try_append_payload(self.name, base, self.inject, self.eject, self.after))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{Callback, CommandKind, CommandTree};

    fn owner() -> OwnerContext {
        OwnerContext::new("player")
    }

    fn tree_with_group(name: &str, owner: Option<&str>) -> CommandTree {
        let mut tree = CommandTree::new();
        let mut group = Command::build(
            Callback::noop(name),
            CommandKind::Group,
            CommandOptions::new().with_aliases(["m"]),
        )
        .unwrap();
        group.set_owner(owner.map(str::to_string));
        tree.add_command(group).unwrap();
        tree
    }

    #[test]
    fn test_main_command_registers_every_name() {
        let descriptor = MainCommand::new(["play", "p"])
            .options(CommandOptions::new().with_help("Play a song"))
            .decorate(Callback::noop("play_song").into())
            .unwrap();
        assert_eq!(descriptor.name(), "inject_play_p");
        assert_eq!(descriptor.chain_names(), vec!["inject_play_p", "play_song"]);

        let mut tree = CommandTree::new();
        descriptor.inject(&mut tree, &owner()).unwrap();

        let play = tree.get_command("play").unwrap();
        assert_eq!(play.help(), Some("Play a song"));
        assert_eq!(play.owner(), Some("player"));
        assert!(tree.get_command("p").is_some());
        assert_eq!(descriptor.generator().instances(), vec!["play", "p"]);

        descriptor.eject(&mut tree).unwrap();
        assert!(tree.is_empty());
    }

    #[test]
    fn test_main_command_eject_keeps_foreign_commands() {
        let descriptor = MainCommand::new(["play", "stop"])
            .decorate(Callback::noop("play").into())
            .unwrap();

        let mut tree = CommandTree::new();
        tree.add_command(Command::leaf(Callback::noop("stop")).unwrap())
            .unwrap();

        // "stop" is taken, so only "play" gets registered
        let result = descriptor.inject(&mut tree, &owner());
        assert!(matches!(result, Err(Error::CommandExists(name)) if name == "stop"));

        descriptor.eject(&mut tree).unwrap();
        assert!(tree.get_command("play").is_none());
        assert!(tree.get_command("stop").is_some());
    }

    #[test]
    fn test_main_command_requires_names() {
        let result =
            MainCommand::new(Vec::<String>::new()).decorate(Callback::noop("play").into());
        assert!(matches!(result, Err(Error::DeclarationError(_))));
    }

    #[test]
    fn test_subcommand_attaches_and_fixes_aliases() {
        let descriptor = Subcommand::of("music")
            .options(CommandOptions::new().with_aliases(["q"]))
            .decorate(Callback::noop("queue").into())
            .unwrap();
        assert_eq!(descriptor.name(), "inject_queue_music");

        let mut tree = tree_with_group("music", None);
        descriptor.inject(&mut tree, &owner()).unwrap();

        let queue = tree.get_command("music queue").unwrap();
        assert_eq!(queue.owner(), Some("player"));
        assert_eq!(tree.resolve_alias("m q"), Some("music queue"));

        descriptor.eject(&mut tree).unwrap();
        assert!(tree.get_command("music queue").is_none());
        assert!(tree.get_command("music").is_some());
        assert_eq!(tree.chained_aliases().count(), 0);
    }

    #[test]
    fn test_subcommand_missing_parent_fails() {
        let descriptor = Subcommand::of("music")
            .decorate(Callback::noop("queue").into())
            .unwrap();

        let mut tree = CommandTree::new();
        let result = descriptor.inject(&mut tree, &owner());
        assert!(matches!(result, Err(Error::CommandNotFound(name)) if name == "music"));

        // Nothing was attached, so there is nothing to undo
        descriptor.eject(&mut tree).unwrap();
    }

    #[test]
    fn test_owner_subcommand_resolves_against_owner() {
        let descriptor = Subcommand::of_owner("music")
            .inject_name("queue_into_player")
            .decorate(Callback::noop("queue").into())
            .unwrap();
        assert_eq!(descriptor.name(), "queue_into_player");

        let mut foreign = tree_with_group("music", Some("admin"));
        assert!(descriptor.inject(&mut foreign, &owner()).is_err());

        let mut own = tree_with_group("music", Some("player"));
        descriptor.inject(&mut own, &owner()).unwrap();
        assert!(own.get_command("music queue").is_some());

        descriptor.eject(&mut own).unwrap();
        assert!(own.get_command("music queue").is_none());
    }

    #[test]
    fn test_eject_fails_when_parent_disappeared() {
        let descriptor = Subcommand::of("music")
            .decorate(Callback::noop("queue").into())
            .unwrap();

        let mut tree = tree_with_group("music", None);
        descriptor.inject(&mut tree, &owner()).unwrap();
        tree.remove_command("music").unwrap();

        let result = descriptor.eject(&mut tree);
        assert!(matches!(result, Err(Error::CommandNotFound(name)) if name == "music"));
    }

    #[test]
    fn test_stacked_strategies_share_one_generator() {
        let descriptor = ensure_inject(Callback::noop("queue"), false)
            .unwrap()
            .wrap(MainCommand::new(["queue"]))
            .unwrap()
            .wrap(Subcommand::of("music").after(["setup"]))
            .unwrap();

        assert_eq!(
            descriptor.chain_names(),
            vec!["inject_queue_music", "inject_queue", "queue"]
        );
        assert!(descriptor.after().contains("setup"));

        let wrapped = descriptor.next().unwrap();
        assert!(Arc::ptr_eq(descriptor.generator(), wrapped.generator()));
    }

    #[test]
    fn test_hook_runs_custom_actions() {
        let descriptor = Hook::new(
            "register_music",
            |registry: &mut dyn CommandRegistry, owner: &OwnerContext| {
                registry.add_command(
                    Command::group(Callback::noop("music"))?.with_owner(owner.name()),
                )
            },
            |registry: &mut dyn CommandRegistry| {
                registry
                    .remove_command("music")
                    .map(|_| ())
                    .ok_or_else(|| Error::CommandNotFound("music".to_string()))
            },
        )
        .decorate(Callback::noop("music").into())
        .unwrap();

        let mut tree = CommandTree::new();
        descriptor.inject(&mut tree, &owner()).unwrap();
        assert!(tree.get_command("music").unwrap().is_group());

        descriptor.eject(&mut tree).unwrap();
        assert!(descriptor.eject(&mut tree).is_err());
    }

    #[test]
    fn test_inject_as_group_marks_generator() {
        let descriptor = inject_as_group(Callback::noop("music")).unwrap();
        assert!(descriptor.generator().is_group());

        let descriptor = descriptor.wrap(MainCommand::new(["music"])).unwrap();
        let mut tree = CommandTree::new();
        descriptor.inject(&mut tree, &owner()).unwrap();
        assert!(tree.get_command("music").unwrap().is_group());
    }
}
