use anyhow::{Context, Result};
use injector_core::Plan;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use super::load_host;
use crate::display::formatter::print_plan;

const MANIFEST_SUFFIXES: [&str; 2] = [".inject.json", ".inject.toml"];

pub fn analyze_command(path_arg: &str, verbose: bool) -> Result<()> {
    debug!("Analyzing: {}", path_arg);

    let path = Path::new(path_arg);
    if !path.exists() {
        return Err(anyhow::anyhow!("Path not found: {}", path.display()));
    }

    let manifests = collect_manifests(path)?;
    if manifests.is_empty() {
        println!("❌ No manifests found under {}", path.display());
        return Ok(());
    }

    let mut plans: Vec<(PathBuf, Plan)> = Vec::new();
    for manifest_path in manifests {
        let (_, host) = load_host(&manifest_path)?;
        let plan = host
            .plan()
            .with_context(|| format!("Failed to resolve {}", manifest_path.display()))?;
        plans.push((manifest_path, plan));
    }

    if verbose {
        // Show JSON output for verbose mode
        let json: Vec<_> = plans
            .iter()
            .map(|(path, plan)| {
                serde_json::json!({
                    "manifest": path.display().to_string(),
                    "plan": plan,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&json)?);
    } else {
        for (path, plan) in &plans {
            println!("🔍 Analyzing: {}", path.display());
            println!("{}", "=".repeat(80));
            print_plan(plan);
            println!();
        }
    }

    Ok(())
}

/// A single manifest, or every manifest below a directory
pub fn collect_manifests(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut manifests = Vec::new();
    for entry in WalkDir::new(path)
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| {
            // Skip hidden and build directories
            e.depth() == 0
                || e.file_name()
                    .to_str()
                    .is_some_and(|name| !name.starts_with('.') && name != "target")
        })
        .filter_map(|e| e.ok())
    {
        let is_manifest = entry.file_type().is_file()
            && entry
                .file_name()
                .to_str()
                .is_some_and(|name| MANIFEST_SUFFIXES.iter().any(|s| name.ends_with(s)));
        if is_manifest {
            manifests.push(entry.path().to_path_buf());
        }
    }

    manifests.sort();
    debug!("Found {} manifest(s) under {}", manifests.len(), path.display());
    Ok(manifests)
}
