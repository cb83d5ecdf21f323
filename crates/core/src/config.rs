//! Configuration for injection hosts
//!
//! Loaded from `.injector.json` (or `injector.json`), found by walking up
//! from a starting directory.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Error, Result};

/// File names searched for, in order, in every directory
pub const CONFIG_FILE_NAMES: [&str; 2] = [".injector.json", "injector.json"];

/// What discovery does when two different declarations share a name
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Abort `init` with [`Error::DuplicateInjection`]
    #[default]
    Error,
    /// Keep the declaration discovered last
    LastWins,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct InjectorConfig {
    /// Injections that are dropped before dependency resolution
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub disabled: Vec<String>,

    /// Extra prerequisites per injection name
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub extra_after: IndexMap<String, Vec<String>>,

    #[serde(default)]
    pub duplicate_names: DuplicatePolicy,
}

impl InjectorConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&contents)
            .map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))?;
        Ok(config)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn find_config_file(start_path: &Path) -> Option<PathBuf> {
        let mut current = start_path;

        loop {
            for file_name in CONFIG_FILE_NAMES {
                let config_path = current.join(file_name);
                if config_path.is_file() {
                    return Some(config_path);
                }
            }

            current = current.parent()?;
        }
    }

    /// Load the nearest config above `start_path`, or the defaults when there
    /// is none
    pub fn discover(start_path: &Path) -> Result<Self> {
        match Self::find_config_file(start_path) {
            Some(path) => {
                debug!("Loading injector config from {}", path.display());
                Self::load_from_file(&path)
            }
            None => {
                debug!("No injector config above {}", start_path.display());
                Ok(Self::default())
            }
        }
    }

    pub fn is_disabled(&self, name: &str) -> bool {
        self.disabled.iter().any(|disabled| disabled == name)
    }

    pub fn with_disabled(mut self, name: impl Into<String>) -> Self {
        self.disabled.push(name.into());
        self
    }

    pub fn with_extra_after<I, S>(mut self, name: impl Into<String>, after: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_after
            .entry(name.into())
            .or_default()
            .extend(after.into_iter().map(Into::into));
        self
    }

    pub fn with_duplicate_names(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_names = policy;
        self
    }
}
