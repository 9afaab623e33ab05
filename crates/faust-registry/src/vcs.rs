//! Version-control operations on the registry working copy.
//!
//! The `VersionControl` trait is the seam between the registry flows and the
//! git history that stores them. `GitCli` drives the `git` program; tests use
//! in-memory fakes.

use std::path::Path;

use tracing::info;

use crate::command;
use crate::error::{RegistryError, Result};

/// Abstract version-control backend for the registry checkout.
pub trait VersionControl {
    /// Make `path` an exact copy of the remote's default branch, cloning it
    /// first when no checkout exists yet.
    fn sync_to_remote_default_branch(&self, path: &Path, remote_url: &str) -> Result<()>;

    /// Name of the remote's current default branch.
    fn resolve_default_branch(&self, path: &Path) -> Result<String>;

    /// Stage everything, commit with `message` and push to `branch`.
    fn commit_and_push(&self, path: &Path, message: &str, branch: &str) -> Result<()>;
}

/// `VersionControl` backed by the `git` command-line client.
#[derive(Debug, Clone)]
pub struct GitCli {
    program: String,
}

impl Default for GitCli {
    fn default() -> Self {
        GitCli::new("git")
    }
}

impl GitCli {
    /// Use the given git executable.
    pub fn new(program: impl Into<String>) -> Self {
        GitCli {
            program: program.into(),
        }
    }

    fn git(&self, path: &Path, args: &[&str]) -> Result<String> {
        command::run(&self.program, args, Some(path)).map_err(|detail| RegistryError::Vcs {
            command: args.first().copied().unwrap_or_default().to_string(),
            detail,
        })
    }
}

/// Branch named by the `ref:` line of `git ls-remote --symref <remote> HEAD`.
fn branch_from_ls_remote(output: &str) -> Option<&str> {
    output.lines().find_map(|line| {
        let (target, name) = line.strip_prefix("ref:")?.split_once('\t')?;
        if name.trim() != "HEAD" {
            return None;
        }
        let branch = target.trim().strip_prefix("refs/heads/")?;
        (!branch.is_empty()).then_some(branch)
    })
}

impl VersionControl for GitCli {
    fn sync_to_remote_default_branch(&self, path: &Path, remote_url: &str) -> Result<()> {
        if !path.join(".git").is_dir() {
            let parent = path.parent().unwrap_or(Path::new("."));
            std::fs::create_dir_all(parent)?;
            info!("cloning registry {} into {}", remote_url, path.display());
            let target = path.to_string_lossy();
            command::run(&self.program, ["clone", remote_url, &*target], None)
                .map_err(|detail| RegistryError::Vcs {
                    command: "clone".to_string(),
                    detail,
                })?;
            return Ok(());
        }

        info!("updating registry checkout at {}", path.display());
        self.git(path, &["remote", "set-url", "origin", remote_url])?;
        self.git(path, &["fetch", "--prune", "origin"])?;
        let branch = self.resolve_default_branch(path)?;
        let upstream = format!("origin/{branch}");
        self.git(path, &["checkout", "-B", &branch, &upstream])?;
        self.git(path, &["reset", "--hard", &upstream])?;
        self.git(path, &["clean", "-fd"])?;
        Ok(())
    }

    /// Asks the remote itself; the local `origin/HEAD` only reflects the
    /// last clone or `set-head`.
    fn resolve_default_branch(&self, path: &Path) -> Result<String> {
        let output = self.git(path, &["ls-remote", "--symref", "origin", "HEAD"])?;
        branch_from_ls_remote(&output)
            .map(str::to_string)
            .ok_or_else(|| RegistryError::Vcs {
                command: "ls-remote".to_string(),
                detail: format!("remote HEAD is not a branch: '{output}'"),
            })
    }

    fn commit_and_push(&self, path: &Path, message: &str, branch: &str) -> Result<()> {
        self.git(path, &["add", "--all"])?;
        self.git(path, &["commit", "-m", message])?;
        self.git(path, &["push", "origin", &format!("HEAD:{branch}")])?;
        info!("pushed registry commit to {}", branch);
        Ok(())
    }
}
