//! Repository identifier parsing.
//!
//! Turns a hosted-repository URL such as
//! `https://github.com/owner/mylib.lib.git` into its owner and name.

use std::fmt;

use url::Url;

use crate::error::{RegistryError, Result};

/// Owner and repository name parsed from a repository URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoId {
    /// Account or organization owning the repository.
    pub owner: String,
    /// Repository name without any `.git` suffix.
    pub name: String,
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

fn invalid(url: &str, detail: impl Into<String>) -> RegistryError {
    RegistryError::InvalidRepoUrl {
        url: url.to_string(),
        detail: detail.into(),
    }
}

/// Parse `<scheme>://<host>/<owner>/<name>[.git][/]`.
///
/// Exactly two non-empty path segments are required. A single trailing slash
/// and a trailing `.git` are tolerated.
pub fn parse_repo_url(repo_url: &str) -> Result<RepoId> {
    let url = Url::parse(repo_url).map_err(|e| invalid(repo_url, e.to_string()))?;
    if url.cannot_be_a_base() || url.host_str().is_none() {
        return Err(invalid(repo_url, "expected a hierarchical URL with a host"));
    }

    let path = url.path().strip_prefix('/').unwrap_or(url.path());
    let path = path.strip_suffix('/').unwrap_or(path);
    let segments: Vec<&str> = path.split('/').collect();

    let &[owner, name] = segments.as_slice() else {
        return Err(invalid(
            repo_url,
            format!("expected /<owner>/<repository>, found {} path segments", segments.len()),
        ));
    };

    let name = name.strip_suffix(".git").unwrap_or(name);
    if owner.is_empty() || name.is_empty() {
        return Err(invalid(repo_url, "owner and repository must be non-empty"));
    }

    Ok(RepoId {
        owner: owner.to_string(),
        name: name.to_string(),
    })
}
