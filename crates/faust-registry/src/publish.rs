//! Single-package publish gate.
//!
//! Validates one author-submitted package and adds it to the registry. The
//! checks run in a fixed order and each one is a hard stop:
//!
//! 1. repository name ends in `.lib`
//! 2. download and compile
//! 3. only package imports
//! 4. declared version is `MAJOR.MINOR.PATCH`
//! 5. `<owner>/<package>/<version>` is not already in the registry
//! 6. copy the artifact into place
//!
//! Nothing in the registry is touched before step 6.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::compile::Compiler;
use crate::download::Fetcher;
use crate::error::{RegistryError, Result};
use crate::imports::ImportChecker;
use crate::repo_id::parse_repo_url;
use crate::scan::LIBRARY_EXTENSION;
use crate::version::is_valid_version_format;

/// A package that passed the gate and now lives in the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedPackage {
    /// Registry namespace the package was published under.
    pub owner: String,
    /// Package name, e.g. `mylib.lib`.
    pub name: String,
    /// Published version.
    pub version: String,
    /// Path of the copied artifact inside the registry.
    pub entry_path: PathBuf,
}

/// Directory holding `owner/package@version` inside the registry.
pub fn package_version_dir(registry: &Path, owner: &str, package: &str, version: &str) -> PathBuf {
    registry.join(owner).join(package).join(version)
}

/// Derive the package name from a repository URL and check its extension.
pub fn package_name_from_repo(repo_url: &str) -> Result<String> {
    let repo = parse_repo_url(repo_url)?;
    if !repo.name.ends_with(LIBRARY_EXTENSION) {
        return Err(RegistryError::InvalidName { name: repo.name });
    }
    Ok(repo.name)
}

/// Whether `version` of `owner/package` is free to publish.
pub fn is_version_available(registry: &Path, owner: &str, package: &str, version: &str) -> bool {
    !package_version_dir(registry, owner, package, version).exists()
}

/// The gate and its collaborators.
pub struct PublishGate<'a> {
    fetcher: &'a dyn Fetcher,
    compiler: &'a dyn Compiler,
    imports: &'a dyn ImportChecker,
}

impl<'a> PublishGate<'a> {
    /// Assemble a gate from its collaborators.
    pub fn new(
        fetcher: &'a dyn Fetcher,
        compiler: &'a dyn Compiler,
        imports: &'a dyn ImportChecker,
    ) -> Self {
        PublishGate {
            fetcher,
            compiler,
            imports,
        }
    }

    /// Run every check for `repo_url` and publish it under `owner`.
    pub fn publish(
        &self,
        repo_url: &str,
        owner: &str,
        registry: &Path,
        downloads_dir: &Path,
    ) -> Result<PublishedPackage> {
        let package_name = package_name_from_repo(repo_url)?;

        let package_dir = self
            .fetcher
            .fetch(repo_url, &package_name, downloads_dir)?;
        let compiled = self.compiler.compile(&package_dir, &package_name)?;
        debug!(
            "compiled {} to {} (declares {})",
            package_name,
            compiled.main_artifact.display(),
            compiled.declared_version
        );

        if !self.imports.check(&compiled.main_artifact)? {
            return Err(RegistryError::DisallowedImports);
        }

        let version = compiled.declared_version;
        if !is_valid_version_format(&version) {
            return Err(RegistryError::InvalidVersionFormat { version });
        }

        if !is_version_available(registry, owner, &package_name, &version) {
            return Err(RegistryError::VersionAlreadyExists {
                name: format!("{owner}/{package_name}"),
                version,
            });
        }

        let entry_path =
            copy_into_registry(&compiled.main_artifact, registry, owner, &package_name, &version)
                .map_err(|e| {
                    debug!("copy into registry failed: {}", e);
                    RegistryError::CopyFailed
                })?;
        info!("published {}/{}@{}", owner, package_name, version);

        Ok(PublishedPackage {
            owner: owner.to_string(),
            name: package_name,
            version,
            entry_path,
        })
    }
}

fn copy_into_registry(
    artifact: &Path,
    registry: &Path,
    owner: &str,
    package: &str,
    version: &str,
) -> std::io::Result<PathBuf> {
    let dir = package_version_dir(registry, owner, package, version);
    fs::create_dir_all(&dir)?;
    let dest = dir.join(package);
    fs::copy(artifact, &dest)?;
    Ok(dest)
}
