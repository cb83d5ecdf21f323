pub mod analyze;
pub mod init;
pub mod run;

pub use analyze::analyze_command;
pub use init::init_command;
pub use run::run_command;

use anyhow::{Context, Result};
use injector_core::{InjectableHost, InjectorConfig, Manifest};
use std::path::Path;

/// Load a manifest together with the nearest config above it
pub(crate) fn load_host(manifest_path: &Path) -> Result<(Manifest, InjectableHost)> {
    let manifest = Manifest::load(manifest_path)
        .with_context(|| format!("Failed to load manifest {}", manifest_path.display()))?;

    let search_root = manifest_path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let config = InjectorConfig::discover(search_root)
        .with_context(|| format!("Failed to load config for {}", manifest_path.display()))?;

    let host = manifest
        .build_host(config)
        .with_context(|| format!("Invalid declarations in {}", manifest_path.display()))?;
    Ok((manifest, host))
}
