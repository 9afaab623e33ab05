//! Library scanner.
//!
//! Walks a directory tree and indexes every versioned `.lib` file by its
//! basename. The same scan is applied to the structured registry and to the
//! flat library collection, so both sides are compared in one shape.

use std::collections::{HashMap, HashSet};
use std::path::{Component, Path, PathBuf};

use serde::Serialize;
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::error::{RegistryError, Result};
use crate::version::extract_version;

/// File extension that marks a Faust library.
pub const LIBRARY_EXTENSION: &str = ".lib";

/// One versioned library file found during a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LibraryRecord {
    /// File basename, e.g. `oscillators.lib`.
    pub name: String,
    /// Declared version string.
    pub version: String,
    /// Where the file was found.
    pub source_path: PathBuf,
}

/// Library name to every record found under that name.
///
/// Record order follows directory traversal and must not be relied upon.
#[derive(Debug, Clone, Default)]
pub struct ScanIndex {
    libraries: HashMap<String, Vec<LibraryRecord>>,
}

impl ScanIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record under its library name.
    pub fn insert(&mut self, record: LibraryRecord) {
        self.libraries
            .entry(record.name.clone())
            .or_default()
            .push(record);
    }

    /// All records for a library.
    pub fn get(&self, name: &str) -> Option<&[LibraryRecord]> {
        self.libraries.get(name).map(Vec::as_slice)
    }

    /// Whether any record exists for a library.
    pub fn contains(&self, name: &str) -> bool {
        self.libraries.contains_key(name)
    }

    /// The set of version strings recorded for a library.
    pub fn versions(&self, name: &str) -> HashSet<&str> {
        self.libraries
            .get(name)
            .map(|records| records.iter().map(|r| r.version.as_str()).collect())
            .unwrap_or_default()
    }

    /// Library names in the index, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.libraries.keys().map(String::as_str)
    }

    /// Iterate over `(name, records)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[LibraryRecord])> {
        self.libraries
            .iter()
            .map(|(name, records)| (name.as_str(), records.as_slice()))
    }

    /// Number of distinct library names.
    pub fn len(&self) -> usize {
        self.libraries.len()
    }

    /// Whether the index has no libraries.
    pub fn is_empty(&self) -> bool {
        self.libraries.is_empty()
    }

    /// Total number of records across all libraries.
    pub fn record_count(&self) -> usize {
        self.libraries.values().map(Vec::len).sum()
    }
}

fn is_git_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_dir() && entry.file_name() == ".git"
}

fn is_library_file(entry: &DirEntry) -> bool {
    entry.file_type().is_file()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.ends_with(LIBRARY_EXTENSION))
}

/// Whether `version` can name a single directory level of the registry.
fn is_path_component(version: &str) -> bool {
    let mut components = Path::new(version).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(part)), None) if part == version
    )
}

/// Scan `root` recursively and index every versioned library file.
///
/// Fails without returning a partial index when `root` is missing or is not
/// a directory, or when any entry cannot be read.
pub fn scan_directory(root: &Path) -> Result<ScanIndex> {
    if !root.is_dir() {
        return Err(RegistryError::ScanRoot {
            path: root.to_path_buf(),
        });
    }

    let mut index = ScanIndex::new();
    let walker = WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| !is_git_dir(e));

    for entry in walker {
        let entry = entry.map_err(std::io::Error::from)?;
        if !is_library_file(&entry) {
            continue;
        }

        let Some(version) = extract_version(entry.path())? else {
            debug!("skipping unversioned library {}", entry.path().display());
            continue;
        };
        if !is_path_component(&version) {
            warn!(
                "skipping {}: declared version \"{}\" cannot name a registry directory",
                entry.path().display(),
                version
            );
            continue;
        }

        index.insert(LibraryRecord {
            name: entry.file_name().to_string_lossy().into_owned(),
            version,
            source_path: entry.path().to_path_buf(),
        });
    }

    debug!(
        "scanned {}: {} libraries, {} versioned files",
        root.display(),
        index.len(),
        index.record_count()
    );
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn sorted_pairs(index: &ScanIndex, name: &str) -> Vec<(String, PathBuf)> {
        let mut pairs: Vec<_> = index
            .get(name)
            .unwrap_or_default()
            .iter()
            .map(|r| (r.version.clone(), r.source_path.clone()))
            .collect();
        pairs.sort();
        pairs
    }

    #[test]
    fn indexes_nested_libraries_by_basename() {
        let dir = tempfile::tempdir().unwrap();
        write(
            &dir.path().join("osc.lib"),
            "declare version \"1.0.0\";\n",
        );
        write(
            &dir.path().join("old/deep/osc.lib"),
            "declare version \"0.9.0\";\n",
        );
        write(
            &dir.path().join("filters.lib"),
            "declare version \"2.3.1\";\n",
        );

        let index = scan_directory(dir.path()).unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index.record_count(), 3);
        assert_eq!(
            index.versions("osc.lib"),
            HashSet::from(["1.0.0", "0.9.0"])
        );
        assert!(index.contains("filters.lib"));
    }

    #[test]
    fn skips_unversioned_and_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("plain.lib"), "process = _;\n");
        write(
            &dir.path().join("notes.txt"),
            "declare version \"1.0.0\";\n",
        );
        write(
            &dir.path().join("main.dsp"),
            "declare version \"1.0.0\";\n",
        );

        let index = scan_directory(dir.path()).unwrap();
        assert!(index.is_empty());
    }

    #[test]
    fn skips_versions_that_are_not_directory_names() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("up.lib"), "declare version \"..\";\n");
        write(&dir.path().join("here.lib"), "declare version \".\";\n");
        write(&dir.path().join("odd.lib"), "declare version \"1..2\";\n");

        let index = scan_directory(dir.path()).unwrap();
        assert!(!index.contains("up.lib"));
        assert!(!index.contains("here.lib"));
        assert_eq!(index.versions("odd.lib"), HashSet::from(["1..2"]));
    }

    #[test]
    fn ignores_git_metadata() {
        let dir = tempfile::tempdir().unwrap();
        write(
            &dir.path().join(".git/stash/osc.lib"),
            "declare version \"1.0.0\";\n",
        );
        let index = scan_directory(dir.path()).unwrap();
        assert!(index.is_empty());
    }

    #[test]
    fn missing_root_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = scan_directory(&dir.path().join("absent")).unwrap_err();
        assert!(matches!(err, RegistryError::ScanRoot { .. }));
    }

    #[test]
    fn file_root_fails() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("osc.lib");
        write(&file, "declare version \"1.0.0\";\n");
        assert!(matches!(
            scan_directory(&file),
            Err(RegistryError::ScanRoot { .. })
        ));
    }

    #[test]
    fn rescanning_yields_same_contents() {
        let dir = tempfile::tempdir().unwrap();
        for (i, sub) in ["a", "b", "c/d"].iter().enumerate() {
            write(
                &dir.path().join(sub).join("maths.lib"),
                &format!("declare version \"1.{i}.0\";\n"),
            );
        }

        let first = scan_directory(dir.path()).unwrap();
        let second = scan_directory(dir.path()).unwrap();

        let mut first_names: Vec<_> = first.names().collect();
        let mut second_names: Vec<_> = second.names().collect();
        first_names.sort();
        second_names.sort();
        assert_eq!(first_names, second_names);
        assert_eq!(
            sorted_pairs(&first, "maths.lib"),
            sorted_pairs(&second, "maths.lib")
        );
    }
}
