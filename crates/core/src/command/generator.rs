//! Command generator
//!
//! Turns one callback into any number of concrete commands, each with its own
//! option overrides. Generators are shared between every injection declared on
//! the same callback.

use indexmap::IndexSet;
use std::sync::Mutex;
use tracing::debug;

use super::{Callback, Command, CommandKind, CommandOptions};
use crate::error::Result;

#[derive(Debug)]
pub struct CommandGenerator {
    callback: Callback,
    group: bool,
    base_options: CommandOptions,
    instances: Mutex<IndexSet<String>>,
}

impl CommandGenerator {
    /// Generator for a bare callback
    pub fn new(callback: Callback, group: bool) -> Self {
        Self {
            callback,
            group,
            base_options: CommandOptions::default(),
            instances: Mutex::new(IndexSet::new()),
        }
    }

    /// Generator seeded from an existing command. The command's construction
    /// options become the base every later build starts from, and the command
    /// itself is tracked as an instance.
    pub fn from_command(command: &Command, group: bool) -> Self {
        let generator = Self {
            callback: command.callback().clone(),
            group: group || command.is_group(),
            base_options: command.options().clone(),
            instances: Mutex::new(IndexSet::new()),
        };
        generator.track(command);
        generator
    }

    pub fn callback(&self) -> &Callback {
        &self.callback
    }

    pub fn is_group(&self) -> bool {
        self.group
    }

    pub fn base_options(&self) -> &CommandOptions {
        &self.base_options
    }

    /// Qualified names of every command built from (or adopted by) this
    /// generator, each recorded once
    pub fn instances(&self) -> Vec<String> {
        self.instances
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .cloned()
            .collect()
    }

    fn track(&self, command: &Command) {
        self.instances
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(command.qualified_name());
    }

    /// Build a new command from a copy of the base options with `overrides`
    /// applied on top
    pub fn make_command(&self, overrides: &CommandOptions) -> Result<Command> {
        let options = self.base_options.merged(overrides);
        let kind = if self.group {
            CommandKind::Group
        } else {
            CommandKind::Leaf
        };

        let command = Command::build(self.callback.clone(), kind, options)?;
        debug!(
            "Generated {:?} command '{}' from callback '{}'",
            kind,
            command.name(),
            self.callback.name()
        );
        self.track(&command);
        Ok(command)
    }
}
