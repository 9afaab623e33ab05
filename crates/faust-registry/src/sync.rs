//! Registry synchronization from a flat library collection.
//!
//! Makes the registry's set of `(library, version)` entries a superset of the
//! collection's. Synchronization is one-directional and additive: existing
//! versions are never rewritten and libraries missing from the collection are
//! left alone.
//!
//! Layout of a synchronized library:
//! ```text
//! <registry>/
//!   oscillators.lib/
//!     1.0.0/
//!       oscillators.lib
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use crate::error::Result;
use crate::scan::{scan_directory, LibraryRecord};

/// A registry entry written by one synchronization run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedEntry {
    /// Library file name.
    pub name: String,
    /// Version directory that was created.
    pub version: String,
    /// Collection file it was copied from.
    pub source: PathBuf,
    /// Full path of the copied library file.
    pub path: PathBuf,
}

/// Outcome of a synchronization run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncReport {
    /// Entries written, in write order.
    pub created: Vec<CreatedEntry>,
}

impl SyncReport {
    /// Whether the run wrote anything to the registry.
    pub fn changed(&self) -> bool {
        !self.created.is_empty()
    }
}

/// Path of the library file for `name@version` inside the registry.
pub fn library_entry_path(registry: &Path, name: &str, version: &str) -> PathBuf {
    registry.join(name).join(version).join(name)
}

fn materialize(registry: &Path, record: &LibraryRecord) -> Result<CreatedEntry> {
    let dest = library_entry_path(registry, &record.name, &record.version);
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(&record.source_path, &dest)?;
    info!(
        "added {}@{} from {}",
        record.name,
        record.version,
        record.source_path.display()
    );
    Ok(CreatedEntry {
        name: record.name.clone(),
        version: record.version.clone(),
        source: record.source_path.clone(),
        path: dest,
    })
}

/// Copy every library version found under `source` but absent from
/// `registry` into the registry's versioned layout.
///
/// The existing-version check consults only the registry as it was before
/// the run. When the collection holds the same name and version twice, the
/// later copy overwrites the earlier one at the same destination.
pub fn synchronize_library_registry(registry: &Path, source: &Path) -> Result<SyncReport> {
    let structured = scan_directory(registry)?;
    let unstructured = scan_directory(source)?;

    let mut report = SyncReport::default();
    let mut written: HashMap<PathBuf, PathBuf> = HashMap::new();

    for (name, records) in unstructured.iter() {
        let existing = structured.versions(name);

        for record in records {
            if existing.contains(record.version.as_str()) {
                continue;
            }

            let entry = materialize(registry, record)?;
            if let Some(previous) = written.insert(entry.path.clone(), record.source_path.clone())
            {
                warn!(
                    "{}@{} appears more than once in {}; {} replaced {}",
                    name,
                    record.version,
                    source.display(),
                    record.source_path.display(),
                    previous.display()
                );
            }
            report.created.push(entry);
        }
    }

    if report.changed() {
        info!("synchronized {} new library versions", report.created.len());
    } else {
        info!("registry already contains every library version");
    }
    Ok(report)
}
