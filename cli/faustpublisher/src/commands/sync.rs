//! `faustpublisher sync` — offline synchronization between two directories.

use std::path::Path;

use anyhow::{Context, Result};

/// Synchronize `source` into `registry` without touching version control.
pub fn run(registry: &Path, source: &Path, json: bool) -> Result<()> {
    let report = faust_registry::synchronize_library_registry(registry, source)
        .with_context(|| format!("synchronizing {} into {}", source.display(), registry.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if !report.changed() {
        println!("Registry already up to date.");
        return Ok(());
    }

    for entry in &report.created {
        println!("Added {} {} -> {}", entry.name, entry.version, entry.path.display());
    }
    println!("\n{} new library versions", report.created.len());
    Ok(())
}
