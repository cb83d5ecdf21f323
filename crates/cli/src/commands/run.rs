use anyhow::{Context, Result};
use injector_core::CommandTree;
use std::path::Path;
use tracing::{debug, info};

use super::load_host;
use crate::display::formatter::{print_plan, print_report, print_tree};

pub fn run_command(manifest_arg: &str, dry_run: bool) -> Result<()> {
    let manifest_path = Path::new(manifest_arg);
    debug!("Running manifest: {}", manifest_path.display());

    let (manifest, mut host) = load_host(manifest_path)?;

    if dry_run {
        let plan = host.plan().context("Failed to resolve injections")?;
        print_plan(&plan);
        return Ok(());
    }

    let mut tree = CommandTree::new();
    manifest
        .seed_registry(&mut tree)
        .context("Failed to register the owner's commands")?;

    host.pre_init()?;
    let loaded = host.init(&mut tree).context("Failed to initialize host")?;
    info!("Initialized host '{}'", manifest.owner);
    print_report("🚀 Init", &loaded);
    print_tree(&tree);

    let unloaded = host.uninit(&mut tree).context("Failed to uninitialize host")?;
    println!();
    print_report("🧹 Uninit", &unloaded);
    print_tree(&tree);

    let failed = loaded.failures().count() + unloaded.failures().count();
    if failed > 0 {
        return Err(anyhow::anyhow!("{} injection action(s) failed", failed));
    }

    Ok(())
}
