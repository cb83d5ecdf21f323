use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands::{analyze_command, init_command, run_command};

#[derive(Parser, Debug)]
#[command(name = "injector")]
#[command(version, about, long_about = None)]
#[command(after_help = "ENVIRONMENT:\n    RUST_LOG=debug    Enable debug logging")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve injection manifests and show their load order
    #[command(visible_alias = "a")]
    Analyze {
        /// Manifest file, or a directory searched for *.inject.json / *.inject.toml
        path: String,

        /// Print the plans as JSON
        #[arg(short, long)]
        verbose: bool,
    },
    /// Run a manifest's full lifecycle against an in-memory command tree
    #[command(visible_alias = "r")]
    Run {
        /// Path to the manifest
        manifest: String,

        /// Print the plan without injecting anything
        #[arg(short, long)]
        dry_run: bool,
    },
    /// Write a sample config and manifest
    Init {
        /// Specify the current working directory
        #[arg(short, long)]
        cwd: Option<String>,

        /// Force overwrite existing files
        #[arg(short, long)]
        force: bool,
    },
}

impl Commands {
    /// Execute the command
    pub fn execute(self) -> Result<()> {
        match self {
            Commands::Analyze { path, verbose } => analyze_command(&path, verbose),
            Commands::Run { manifest, dry_run } => run_command(&manifest, dry_run),
            Commands::Init { cwd, force } => init_command(cwd.as_deref(), force),
        }
    }
}
