use anyhow::{Context, Result};
use injector_core::{
    CommandOptions, CommandSpec, InjectionSpec, InjectorConfig, Manifest, SiteSpec,
};
use std::{env, fs, path::PathBuf};
use tracing::info;

const CONFIG_FILE: &str = ".injector.json";
const MANIFEST_FILE: &str = "music.inject.json";

pub fn init_command(cwd: Option<&str>, force: bool) -> Result<()> {
    // Determine the project root
    let project_root = if let Some(cwd) = cwd {
        PathBuf::from(cwd)
    } else {
        env::current_dir().context("Failed to get current directory")?
    };

    let project_root = project_root
        .canonicalize()
        .context("Failed to canonicalize project root")?;

    println!("🚀 Initializing injector in: {}", project_root.display());

    let mut created = 0;
    let mut skipped = 0;

    let config_path = project_root.join(CONFIG_FILE);
    if config_path.exists() && !force {
        info!("Skipping existing config: {}", config_path.display());
        skipped += 1;
    } else {
        InjectorConfig::default()
            .save_to_file(&config_path)
            .with_context(|| format!("Failed to write config to {}", config_path.display()))?;
        println!("✅ Created config: {}", config_path.display());
        created += 1;
    }

    let manifest_path = project_root.join(MANIFEST_FILE);
    if manifest_path.exists() && !force {
        info!("Skipping existing manifest: {}", manifest_path.display());
        skipped += 1;
    } else {
        let contents = serde_json::to_string_pretty(&sample_manifest())?;
        fs::write(&manifest_path, contents)
            .with_context(|| format!("Failed to write manifest to {}", manifest_path.display()))?;
        println!("✅ Created manifest: {}", manifest_path.display());
        created += 1;
    }

    println!("\n✅ Initialization complete!");
    println!("   • Created {} file(s)", created);
    if skipped > 0 {
        println!(
            "   • Skipped {} existing file(s) (use --force to overwrite)",
            skipped
        );
    }

    println!("\n📌 Try it out:");
    println!("   injector analyze {}", project_root.display());
    println!("   injector run {}", manifest_path.display());

    Ok(())
}

/// A music player that owns a `music` group and injects three commands
pub fn sample_manifest() -> Manifest {
    Manifest {
        owner: "player".to_string(),
        commands: vec![CommandSpec {
            name: "music".to_string(),
            group: true,
            options: CommandOptions::new()
                .with_aliases(["m"])
                .with_help("Music commands"),
            subcommands: Vec::new(),
        }],
        injections: vec![
            InjectionSpec {
                callback: "play".to_string(),
                options: CommandOptions::new().with_help("Play a song"),
                sites: vec![SiteSpec::MainCommand {
                    names: vec!["play".to_string(), "p".to_string()],
                    inject_name: None,
                    after: Vec::new(),
                    options: CommandOptions::default(),
                }],
                ..Default::default()
            },
            InjectionSpec {
                callback: "queue".to_string(),
                sites: vec![
                    SiteSpec::MainCommand {
                        names: vec!["queue".to_string()],
                        inject_name: None,
                        after: Vec::new(),
                        options: CommandOptions::default(),
                    },
                    SiteSpec::OwnerSubcommand {
                        parent: "music".to_string(),
                        inject_name: None,
                        after: Vec::new(),
                        options: CommandOptions::new().with_aliases(["q"]),
                    },
                ],
                ..Default::default()
            },
            InjectionSpec {
                callback: "stop".to_string(),
                sites: vec![SiteSpec::Subcommand {
                    parent: "music".to_string(),
                    inject_name: None,
                    after: vec!["inject_play_p".to_string()],
                    options: CommandOptions::default(),
                }],
                ..Default::default()
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sample_manifest_resolves_cleanly() {
        let plan = sample_manifest()
            .build_host(InjectorConfig::default())
            .unwrap()
            .plan()
            .unwrap();

        assert!(plan.unsatisfied.is_empty());
        assert_eq!(plan.load_order.len(), 7);
    }

    #[test]
    fn test_init_respects_force() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().to_str().unwrap();
        let config_path = temp_dir.path().join(CONFIG_FILE);

        init_command(Some(root), false).unwrap();
        assert!(config_path.exists());
        assert!(temp_dir.path().join(MANIFEST_FILE).exists());

        fs::write(&config_path, r#"{"disabled": ["inject_play_p"]}"#).unwrap();
        init_command(Some(root), false).unwrap();
        let kept = InjectorConfig::load_from_file(&config_path).unwrap();
        assert!(kept.is_disabled("inject_play_p"));

        init_command(Some(root), true).unwrap();
        let reset = InjectorConfig::load_from_file(&config_path).unwrap();
        assert_eq!(reset, InjectorConfig::default());
    }
}
