//! Construction options for commands
//!
//! Options are layered: a generator keeps the options a command was originally
//! built with, and every build applies its own overrides on top of a copy.

use serde::{Deserialize, Serialize};

/// Options used to construct a [`Command`](super::Command)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct CommandOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aliases: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brief: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hidden: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Only meaningful for group commands
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoke_without_command: Option<bool>,
}

impl CommandOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases = Some(aliases.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn with_brief(mut self, brief: impl Into<String>) -> Self {
        self.brief = Some(brief.into());
        self
    }

    pub fn with_usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = Some(usage.into());
        self
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = Some(hidden);
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    pub fn invoke_without_command(mut self, invoke: bool) -> Self {
        self.invoke_without_command = Some(invoke);
        self
    }

    /// Apply another set of options on top of this one. Fields set in `other`
    /// win; aliases are replaced, not merged.
    pub fn apply(&mut self, other: &CommandOptions) {
        if other.name.is_some() {
            self.name = other.name.clone();
        }
        if other.aliases.is_some() {
            self.aliases = other.aliases.clone();
        }
        if other.help.is_some() {
            self.help = other.help.clone();
        }
        if other.brief.is_some() {
            self.brief = other.brief.clone();
        }
        if other.usage.is_some() {
            self.usage = other.usage.clone();
        }
        if other.hidden.is_some() {
            self.hidden = other.hidden;
        }
        if other.enabled.is_some() {
            self.enabled = other.enabled;
        }
        if other.invoke_without_command.is_some() {
            self.invoke_without_command = other.invoke_without_command;
        }
    }

    /// Copy of `self` with `other` applied
    pub fn merged(&self, other: &CommandOptions) -> CommandOptions {
        let mut merged = self.clone();
        merged.apply(other);
        merged
    }
}
