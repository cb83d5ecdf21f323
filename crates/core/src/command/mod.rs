//! Command model shared by the registry and the injection strategies
//!
//! A [`Command`] is what ends up in a host's command tree. It is built by a
//! [`CommandGenerator`] from a [`Callback`] plus [`CommandOptions`], and keeps
//! the options it was built from so a later generator can rebuild it.

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::error::{Error, Result};

pub mod generator;
pub mod options;
pub mod registry;

pub use generator::CommandGenerator;
pub use options::CommandOptions;
pub use registry::{CommandRegistry, CommandTree};

/// Handler signature of a command callback
pub type Handler = Arc<dyn Fn(&[String]) -> anyhow::Result<()> + Send + Sync>;

/// A named action a command dispatches to
#[derive(Clone)]
pub struct Callback {
    name: String,
    handler: Handler,
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callback").field("name", &self.name).finish()
    }
}

impl Callback {
    pub fn new<F>(name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&[String]) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            handler: Arc::new(handler),
        }
    }

    /// Callback that accepts anything and does nothing
    pub fn noop(name: impl Into<String>) -> Self {
        Self::new(name, |_| Ok(()))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the handler. Only the host's dispatcher calls this; injection never
    /// invokes callbacks.
    pub fn invoke(&self, args: &[String]) -> anyhow::Result<()> {
        (self.handler)(args)
    }

    /// Whether both callbacks share the same handler
    pub fn same_handler(&self, other: &Callback) -> bool {
        Arc::ptr_eq(&self.handler, &other.handler)
    }
}

/// Leaf commands dispatch directly; groups own subcommands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    Leaf,
    Group,
}

/// A concrete, registrable command
#[derive(Debug, Clone)]
pub struct Command {
    name: String,
    aliases: Vec<String>,
    help: Option<String>,
    brief: Option<String>,
    usage: Option<String>,
    hidden: bool,
    enabled: bool,
    invoke_without_command: bool,
    kind: CommandKind,
    callback: Callback,
    options: CommandOptions,
    owner: Option<String>,
    parent: Option<String>,
    children: IndexMap<String, Command>,
}

fn name_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\S+$").expect("command name regex"))
}

/// Check that `name` can be used as a command name or alias
pub fn validate_name(name: &str) -> Result<()> {
    if name_pattern().is_match(name) {
        Ok(())
    } else {
        Err(Error::InvalidCommandName(name.to_string()))
    }
}

impl Command {
    /// Build a command from a callback and its construction options. The name
    /// defaults to the callback's name.
    pub fn build(callback: Callback, kind: CommandKind, options: CommandOptions) -> Result<Self> {
        let name = options
            .name
            .clone()
            .unwrap_or_else(|| callback.name().to_string());
        validate_name(&name)?;

        let aliases = options.aliases.clone().unwrap_or_default();
        for alias in &aliases {
            validate_name(alias)?;
        }

        Ok(Self {
            name,
            aliases,
            help: options.help.clone(),
            brief: options.brief.clone(),
            usage: options.usage.clone(),
            hidden: options.hidden.unwrap_or(false),
            enabled: options.enabled.unwrap_or(true),
            invoke_without_command: options.invoke_without_command.unwrap_or(false),
            kind,
            callback,
            options,
            owner: None,
            parent: None,
            children: IndexMap::new(),
        })
    }

    pub fn leaf(callback: Callback) -> Result<Self> {
        Self::build(callback, CommandKind::Leaf, CommandOptions::default())
    }

    pub fn group(callback: Callback) -> Result<Self> {
        Self::build(callback, CommandKind::Group, CommandOptions::default())
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    pub fn brief(&self) -> Option<&str> {
        self.brief.as_deref()
    }

    pub fn usage(&self) -> Option<&str> {
        self.usage.as_deref()
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn invokes_without_command(&self) -> bool {
        self.invoke_without_command
    }

    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    pub fn is_group(&self) -> bool {
        self.kind == CommandKind::Group
    }

    pub fn callback(&self) -> &Callback {
        &self.callback
    }

    /// The options this command was originally constructed with
    pub fn options(&self) -> &CommandOptions {
        &self.options
    }

    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    pub fn set_owner(&mut self, owner: Option<String>) {
        self.owner = owner;
    }

    /// Qualified name of the parent group, if attached to one
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    /// Space separated path from the top-level command down to this one
    pub fn qualified_name(&self) -> String {
        match &self.parent {
            Some(parent) => format!("{parent} {}", self.name),
            None => self.name.clone(),
        }
    }

    /// Whether `name` is this command's name or one of its aliases
    pub fn answers_to(&self, name: &str) -> bool {
        self.name == name || self.aliases.iter().any(|alias| alias == name)
    }

    pub fn children(&self) -> impl Iterator<Item = &Command> {
        self.children.values()
    }

    fn set_parent(&mut self, parent: Option<String>) {
        self.parent = parent;
        let qualified = self.qualified_name();
        for child in self.children.values_mut() {
            child.set_parent(Some(qualified.clone()));
        }
    }

    fn child_key(&self, name: &str) -> Option<String> {
        if self.children.contains_key(name) {
            return Some(name.to_string());
        }
        self.children
            .values()
            .find(|child| child.answers_to(name))
            .map(|child| child.name.clone())
    }

    /// Attach a subcommand to this group
    pub fn add_command(&mut self, mut command: Command) -> Result<()> {
        if !self.is_group() {
            return Err(Error::NotAGroup(self.qualified_name()));
        }

        let clash = std::iter::once(command.name.as_str())
            .chain(command.aliases.iter().map(String::as_str))
            .find(|name| self.child_key(name).is_some());
        if let Some(name) = clash {
            return Err(Error::CommandExists(format!(
                "{} {}",
                self.qualified_name(),
                name
            )));
        }

        command.set_parent(Some(self.qualified_name()));
        self.children.insert(command.name.clone(), command);
        Ok(())
    }

    /// Detach a subcommand by name or alias
    pub fn remove_command(&mut self, name: &str) -> Option<Command> {
        let key = self.child_key(name)?;
        let mut removed = self.children.shift_remove(&key)?;
        removed.set_parent(None);
        Some(removed)
    }

    /// Look up a subcommand by name, alias, or space separated path
    pub fn get_command(&self, path: &str) -> Option<&Command> {
        let mut current = self;
        for segment in path.split_whitespace() {
            let key = current.child_key(segment)?;
            current = current.children.get(&key)?;
        }
        Some(current)
    }

    pub fn get_command_mut(&mut self, path: &str) -> Option<&mut Command> {
        let mut current = self;
        for segment in path.split_whitespace() {
            let key = current.child_key(segment)?;
            current = current.children.get_mut(&key)?;
        }
        Some(current)
    }
}
