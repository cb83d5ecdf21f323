//! Declarative injection manifests
//!
//! A manifest names an owner, the commands that owner registers itself, and
//! the injections it declares. It is read from JSON or TOML:
//!
//! ```toml
//! owner = "player"
//!
//! [[commands]]
//! name = "music"
//! group = true
//! options = { aliases = ["m"] }
//!
//! [[injections]]
//! callback = "queue"
//!
//! [[injections.sites]]
//! as = "main_command"
//! names = ["queue"]
//!
//! [[injections.sites]]
//! as = "owner_subcommand"
//! parent = "music"
//! ```
//!
//! Sites are applied in the order listed, so every site wraps the one before
//! it and loads after it.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::command::{Callback, Command, CommandKind, CommandOptions, CommandRegistry};
use crate::config::InjectorConfig;
use crate::error::{Error, Result};
use crate::host::InjectableHost;
use crate::inject::{Candidate, InjectionDescriptor, MainCommand, Subcommand, ensure_inject};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    pub owner: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub commands: Vec<CommandSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub injections: Vec<InjectionSpec>,
}

/// A command the owner registers on its own
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommandSpec {
    pub name: String,
    #[serde(default)]
    pub group: bool,
    #[serde(default)]
    pub options: CommandOptions,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subcommands: Vec<CommandSpec>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InjectionSpec {
    pub callback: String,
    #[serde(default)]
    pub group: bool,
    /// Construction options of the wrapped command. When set, the callback is
    /// first turned into a command and its options seed the generator.
    #[serde(default)]
    pub options: CommandOptions,
    #[serde(default)]
    pub sites: Vec<SiteSpec>,
}

/// Where an injection puts its generated command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "as", rename_all = "snake_case")]
pub enum SiteSpec {
    MainCommand {
        names: Vec<String>,
        #[serde(default)]
        inject_name: Option<String>,
        #[serde(default)]
        after: Vec<String>,
        #[serde(default)]
        options: CommandOptions,
    },
    Subcommand {
        parent: String,
        #[serde(default)]
        inject_name: Option<String>,
        #[serde(default)]
        after: Vec<String>,
        #[serde(default)]
        options: CommandOptions,
    },
    OwnerSubcommand {
        parent: String,
        #[serde(default)]
        inject_name: Option<String>,
        #[serde(default)]
        after: Vec<String>,
        #[serde(default)]
        options: CommandOptions,
    },
}

impl SiteSpec {
    fn apply(&self, descriptor: InjectionDescriptor) -> Result<InjectionDescriptor> {
        match self {
            SiteSpec::MainCommand {
                names,
                inject_name,
                after,
                options,
            } => {
                let mut strategy = MainCommand::new(names.iter().cloned())
                    .after(after.iter().cloned())
                    .options(options.clone());
                if let Some(name) = inject_name {
                    strategy = strategy.inject_name(name.clone());
                }
                descriptor.wrap(strategy)
            }
            SiteSpec::Subcommand {
                parent,
                inject_name,
                after,
                options,
            }
            | SiteSpec::OwnerSubcommand {
                parent,
                inject_name,
                after,
                options,
            } => {
                let strategy = match self {
                    SiteSpec::OwnerSubcommand { .. } => Subcommand::of_owner(parent.clone()),
                    _ => Subcommand::of(parent.clone()),
                };
                let mut strategy = strategy
                    .after(after.iter().cloned())
                    .options(options.clone());
                if let Some(name) = inject_name {
                    strategy = strategy.inject_name(name.clone());
                }
                descriptor.wrap(strategy)
            }
        }
    }
}

/// Callback that only records that it ran
fn logging_callback(name: &str) -> Callback {
    let label = name.to_string();
    Callback::new(name, move |args: &[String]| {
        debug!("Invoked '{}' with {:?}", label, args);
        Ok(())
    })
}

fn kind_of(group: bool) -> CommandKind {
    if group {
        CommandKind::Group
    } else {
        CommandKind::Leaf
    }
}

impl CommandSpec {
    fn build(&self, owner: &str) -> Result<Command> {
        let options = self
            .options
            .merged(&CommandOptions::new().with_name(self.name.as_str()));
        let kind = kind_of(self.group || !self.subcommands.is_empty());
        let mut command =
            Command::build(logging_callback(&self.name), kind, options)?.with_owner(owner);

        for subcommand in &self.subcommands {
            command.add_command(subcommand.build(owner)?)?;
        }
        Ok(command)
    }
}

impl InjectionSpec {
    /// Build the declaration chain, innermost first
    pub fn declare(&self) -> Result<InjectionDescriptor> {
        let callback = logging_callback(&self.callback);
        let candidate: Candidate = if self.options == CommandOptions::default() {
            callback.into()
        } else {
            Command::build(callback, kind_of(self.group), self.options.clone())?.into()
        };

        let mut descriptor = ensure_inject(candidate, self.group)?;
        for site in &self.sites {
            descriptor = site.apply(descriptor)?;
        }
        Ok(descriptor)
    }
}

impl Manifest {
    pub fn from_json_str(contents: &str) -> Result<Self> {
        Ok(serde_json::from_str(contents)?)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| Error::ConfigError(format!("Failed to parse manifest: {e}")))
    }

    /// Load a manifest, picking the format from the file extension
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let is_toml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

        debug!("Loading manifest from {}", path.display());
        let result = if is_toml {
            Self::from_toml_str(&contents)
        } else {
            Self::from_json_str(&contents)
        };
        result.map_err(|e| match e {
            Error::ConfigError(message) => {
                Error::ConfigError(format!("{}: {message}", path.display()))
            }
            Error::SerializationError(e) => {
                Error::ConfigError(format!("{}: Failed to parse manifest: {e}", path.display()))
            }
            other => other,
        })
    }

    /// Build a host carrying every declared injection
    pub fn build_host(&self, config: InjectorConfig) -> Result<InjectableHost> {
        let mut host = InjectableHost::with_config(self.owner.clone(), config);
        for injection in &self.injections {
            host.declare(injection.declare()?);
        }
        Ok(host)
    }

    /// Register the owner's own commands
    pub fn seed_registry(&self, registry: &mut dyn CommandRegistry) -> Result<()> {
        for spec in &self.commands {
            registry.add_command(spec.build(&self.owner)?)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandTree;
    use tempfile::TempDir;

    const MUSIC_JSON: &str = r#"{
        "owner": "player",
        "commands": [
            { "name": "music", "group": true, "options": { "aliases": ["m"] } }
        ],
        "injections": [
            {
                "callback": "play",
                "options": { "help": "Play a song" },
                "sites": [{ "as": "main_command", "names": ["play", "p"] }]
            },
            {
                "callback": "queue",
                "sites": [
                    { "as": "main_command", "names": ["queue"] },
                    { "as": "owner_subcommand", "parent": "music", "options": { "aliases": ["q"] } }
                ]
            },
            {
                "callback": "stop",
                "sites": [
                    { "as": "subcommand", "parent": "music", "after": ["inject_play_p"] }
                ]
            }
        ]
    }"#;

    #[test]
    fn test_manifest_drives_full_lifecycle() {
        let manifest = Manifest::from_json_str(MUSIC_JSON).unwrap();
        let mut tree = CommandTree::new();
        manifest.seed_registry(&mut tree).unwrap();

        let mut host = manifest.build_host(InjectorConfig::default()).unwrap();
        host.pre_init().unwrap();
        let report = host.init(&mut tree).unwrap();
        assert!(report.is_clean());

        let play = tree.get_command("p").unwrap();
        assert_eq!(play.help(), Some("Play a song"));
        assert!(tree.get_command("m q").is_some());
        assert!(tree.get_command("music stop").is_some());

        let order = report.order();
        let position = |name: &str| order.iter().position(|n| *n == name).unwrap();
        assert!(position("inject_play_p") < position("inject_stop_music"));
        assert!(position("inject_queue") < position("inject_queue_music"));

        host.uninit(&mut tree).unwrap();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.get_command("music").unwrap().children().count(), 0);
    }

    #[test]
    fn test_toml_manifest() {
        let manifest = Manifest::from_toml_str(
            r#"
owner = "player"

[[commands]]
name = "music"
subcommands = [{ name = "volume" }]

[[injections]]
callback = "queue"

[[injections.sites]]
as = "owner_subcommand"
parent = "music"
inject_name = "queue_into_music"
"#,
        )
        .unwrap();

        let mut tree = CommandTree::new();
        manifest.seed_registry(&mut tree).unwrap();
        let music = tree.get_command("music").unwrap();
        assert!(music.is_group());
        assert_eq!(music.owner(), Some("player"));
        assert!(tree.get_command("music volume").is_some());

        let plan = manifest
            .build_host(InjectorConfig::default())
            .unwrap()
            .plan()
            .unwrap();
        assert_eq!(plan.load_order, vec!["queue", "queue_into_music"]);
    }

    #[test]
    fn test_unknown_site_is_rejected() {
        let result = Manifest::from_json_str(
            r#"{"owner": "player", "injections": [{"callback": "a", "sites": [{"as": "sidebar"}]}]}"#,
        );
        assert!(matches!(result, Err(Error::SerializationError(_))));
    }

    #[test]
    fn test_load_picks_format_by_extension() {
        let temp_dir = TempDir::new().unwrap();
        let json = temp_dir.path().join("music.inject.json");
        let toml = temp_dir.path().join("music.inject.toml");
        std::fs::write(&json, MUSIC_JSON).unwrap();
        std::fs::write(&toml, "owner = \"player\"\n").unwrap();

        assert_eq!(Manifest::load(&json).unwrap().injections.len(), 3);
        assert_eq!(Manifest::load(&toml).unwrap().owner, "player");

        std::fs::write(&toml, "owner = [").unwrap();
        let error = Manifest::load(&toml).unwrap_err().to_string();
        assert!(error.contains("music.inject.toml"));

        std::fs::write(&json, "{\"owner\": 7}").unwrap();
        let error = Manifest::load(&json).unwrap_err();
        assert!(matches!(&error, Error::ConfigError(message) if message.contains("music.inject.json")));
    }
}
