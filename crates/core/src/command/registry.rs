//! Command registries
//!
//! [`CommandRegistry`] is the surface injections need from a host: top-level
//! add/remove, lookup of groups to attach subcommands to, and a hook to fix up
//! the alias table after a chained command moves. [`CommandTree`] is the
//! in-memory implementation used by the CLI and the tests.

use indexmap::IndexMap;
use tracing::debug;

use super::{Command, validate_name};
use crate::error::{Error, Result};

/// Host-side command registry that injections attach to
pub trait CommandRegistry {
    /// Look up a command by name, alias, or space separated path
    fn get_command(&self, name: &str) -> Option<&Command>;

    fn get_command_mut(&mut self, name: &str) -> Option<&mut Command>;

    /// Register a top-level command
    fn add_command(&mut self, command: Command) -> Result<()>;

    /// Remove a top-level command by name or alias
    fn remove_command(&mut self, name: &str) -> Option<Command>;

    /// Refresh alias bookkeeping for a command that was attached to (or
    /// detached from) a group.
    ///
    /// [`CommandTree`] records every alias spelling of the path, so a path of
    /// `depth` segments with `n` names per segment (name plus aliases) yields
    /// `n^depth` entries. Cheap at the depth of chat-style command trees.
    fn fix_chained_command_alias(&mut self, qualified_name: &str, reason: &str) -> Result<()>;

    /// Look up a command that belongs to `owner`
    fn owner_command_mut(&mut self, owner: &str, name: &str) -> Option<&mut Command> {
        match self.get_command_mut(name) {
            Some(command) if command.owner() == Some(owner) => Some(command),
            _ => None,
        }
    }
}

/// In-memory command tree with alias tracking
#[derive(Debug, Clone, Default)]
pub struct CommandTree {
    commands: IndexMap<String, Command>,
    /// Every alias spelling of a subcommand path, mapped to its canonical path
    chained_aliases: IndexMap<String, String>,
}

impl CommandTree {
    pub fn new() -> Self {
        Self::default()
    }

    fn top_level_key(&self, name: &str) -> Option<String> {
        if self.commands.contains_key(name) {
            return Some(name.to_string());
        }
        self.commands
            .values()
            .find(|command| command.answers_to(name))
            .map(|command| command.name().to_string())
    }

    pub fn commands(&self) -> impl Iterator<Item = &Command> {
        self.commands.values()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Canonical path for an alias spelling recorded by
    /// [`fix_chained_command_alias`](CommandRegistry::fix_chained_command_alias)
    pub fn resolve_alias(&self, path: &str) -> Option<&str> {
        let normalized = path.split_whitespace().collect::<Vec<_>>().join(" ");
        self.chained_aliases.get(&normalized).map(String::as_str)
    }

    pub fn chained_aliases(&self) -> impl Iterator<Item = (&str, &str)> {
        self.chained_aliases
            .iter()
            .map(|(alias, target)| (alias.as_str(), target.as_str()))
    }

    /// Every name each segment of `qualified_name` answers to
    fn path_spellings(&self, qualified_name: &str) -> Option<Vec<Vec<String>>> {
        let mut segments = qualified_name.split_whitespace();
        let first = segments.next()?;
        let mut current = self.commands.get(&self.top_level_key(first)?)?;
        let mut spellings = vec![names_of(current)];

        for segment in segments {
            current = current.get_command(segment)?;
            spellings.push(names_of(current));
        }
        Some(spellings)
    }

    fn prune_aliases_under(&mut self, qualified_name: &str) {
        let nested = format!("{qualified_name} ");
        self.chained_aliases
            .retain(|_, target| target != qualified_name && !target.starts_with(&nested));
    }
}

fn names_of(command: &Command) -> Vec<String> {
    std::iter::once(command.name().to_string())
        .chain(command.aliases().iter().cloned())
        .collect()
}

impl CommandRegistry for CommandTree {
    fn get_command(&self, name: &str) -> Option<&Command> {
        let mut segments = name.splitn(2, char::is_whitespace);
        let first = segments.next()?;
        let command = self.commands.get(&self.top_level_key(first)?)?;
        match segments.next().map(str::trim) {
            Some(rest) if !rest.is_empty() => command.get_command(rest),
            _ => Some(command),
        }
    }

    fn get_command_mut(&mut self, name: &str) -> Option<&mut Command> {
        let mut segments = name.splitn(2, char::is_whitespace);
        let first = segments.next()?;
        let key = self.top_level_key(first)?;
        let command = self.commands.get_mut(&key)?;
        match segments.next().map(str::trim) {
            Some(rest) if !rest.is_empty() => command.get_command_mut(rest),
            _ => Some(command),
        }
    }

    fn add_command(&mut self, command: Command) -> Result<()> {
        validate_name(command.name())?;
        let clash = std::iter::once(command.name())
            .chain(command.aliases().iter().map(String::as_str))
            .find(|name| self.top_level_key(name).is_some());
        if let Some(name) = clash {
            return Err(Error::CommandExists(name.to_string()));
        }

        debug!("Registering command '{}'", command.name());
        self.commands.insert(command.name().to_string(), command);
        Ok(())
    }

    fn remove_command(&mut self, name: &str) -> Option<Command> {
        let key = self.top_level_key(name)?;
        let removed = self.commands.shift_remove(&key)?;
        self.prune_aliases_under(&key);
        debug!("Removed command '{}'", key);
        Some(removed)
    }

    fn fix_chained_command_alias(&mut self, qualified_name: &str, reason: &str) -> Result<()> {
        self.prune_aliases_under(qualified_name);

        let Some(spellings) = self.path_spellings(qualified_name) else {
            debug!(
                "Dropped chained aliases of '{}' ({})",
                qualified_name, reason
            );
            return Ok(());
        };

        let mut paths: Vec<Vec<String>> = vec![Vec::new()];
        for names in &spellings {
            paths = paths
                .iter()
                .flat_map(|prefix| {
                    names.iter().map(move |name| {
                        let mut path = prefix.clone();
                        path.push(name.clone());
                        path
                    })
                })
                .collect();
        }

        let canonical = spellings
            .iter()
            .filter_map(|names| names.first().cloned())
            .collect::<Vec<_>>()
            .join(" ");

        let mut added = 0usize;
        for path in paths {
            let alias = path.join(" ");
            if alias != canonical {
                self.chained_aliases.insert(alias, canonical.clone());
                added += 1;
            }
        }

        debug!(
            "Fixed {} chained alias(es) of '{}' ({})",
            added, canonical, reason
        );
        Ok(())
    }
}
