//! Remote source download.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::command;
use crate::error::{RegistryError, Result};

/// Fetches a remote repository into a local downloads directory.
pub trait Fetcher {
    /// Download `repo_url` to `<downloads_dir>/<destination_name>` and return
    /// the local path.
    fn fetch(&self, repo_url: &str, destination_name: &str, downloads_dir: &Path)
        -> Result<PathBuf>;
}

/// `Fetcher` performing a shallow `git clone`.
#[derive(Debug, Clone)]
pub struct GitFetcher {
    program: String,
}

impl Default for GitFetcher {
    fn default() -> Self {
        GitFetcher::new("git")
    }
}

impl GitFetcher {
    /// Use the given git executable.
    pub fn new(program: impl Into<String>) -> Self {
        GitFetcher {
            program: program.into(),
        }
    }
}

impl Fetcher for GitFetcher {
    fn fetch(
        &self,
        repo_url: &str,
        destination_name: &str,
        downloads_dir: &Path,
    ) -> Result<PathBuf> {
        let dest = downloads_dir.join(destination_name);
        if dest.exists() {
            fs::remove_dir_all(&dest)?;
        }
        fs::create_dir_all(downloads_dir)?;

        info!("downloading {} into {}", repo_url, dest.display());
        let target = dest.to_string_lossy();
        command::run(
            &self.program,
            ["clone", "--depth", "1", repo_url, &*target],
            None,
        )
        .map_err(|detail| RegistryError::Download {
            url: repo_url.to_string(),
            detail,
        })?;

        Ok(dest)
    }
}
