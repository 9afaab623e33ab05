//! Identity and collaborator lookups against the hosting service.

use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::error::{RegistryError, Result};
use crate::repo_id::parse_repo_url;

/// Account service used to identify and authorize the publisher.
pub trait IdentityProvider {
    /// Resolve an access token to the account's username.
    fn resolve_identity(&self, token: &str) -> Result<String>;

    /// Whether `username` collaborates on `repo_url`.
    ///
    /// Lookup failures of any kind answer `false`.
    fn is_authorized_collaborator(&self, username: &str, repo_url: &str, token: &str) -> bool;
}

/// `IdentityProvider` backed by the GitHub REST API.
#[derive(Clone)]
pub struct GithubApi {
    client: reqwest::blocking::Client,
    api_base: String,
}

const USER_AGENT: &str = concat!("faustpublisher/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct GithubUser {
    login: String,
}

impl GithubApi {
    /// Create a client for the API rooted at `api_base`.
    pub fn new(api_base: impl Into<String>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| RegistryError::Identity {
                detail: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(GithubApi {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
        })
    }

    fn collaborator_url(&self, username: &str, repo_url: &str) -> Option<String> {
        let repo = parse_repo_url(repo_url).ok()?;
        Some(format!(
            "{}/repos/{}/{}/collaborators/{}",
            self.api_base, repo.owner, repo.name, username
        ))
    }
}

impl IdentityProvider for GithubApi {
    fn resolve_identity(&self, token: &str) -> Result<String> {
        let url = format!("{}/user", self.api_base);
        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .send()
            .map_err(|e| RegistryError::Identity {
                detail: format!("request failed: {e}"),
            })?;

        if !response.status().is_success() {
            return Err(RegistryError::Identity {
                detail: format!("HTTP {} from {}", response.status(), url),
            });
        }

        let user: GithubUser = response.json().map_err(|e| RegistryError::Identity {
            detail: format!("unexpected response: {e}"),
        })?;
        Ok(user.login)
    }

    fn is_authorized_collaborator(&self, username: &str, repo_url: &str, token: &str) -> bool {
        let Some(url) = self.collaborator_url(username, repo_url) else {
            return false;
        };

        match self.client.get(&url).bearer_auth(token).send() {
            Ok(response) => {
                debug!("collaborator check {} -> {}", url, response.status());
                response.status() == reqwest::StatusCode::NO_CONTENT
            }
            Err(e) => {
                debug!("collaborator check {} failed: {}", url, e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collaborator_url_strips_git_suffix() {
        let api = GithubApi::new("https://api.github.com/").unwrap();
        assert_eq!(
            api.collaborator_url("alice", "https://github.com/grame/faustlibraries.git")
                .as_deref(),
            Some("https://api.github.com/repos/grame/faustlibraries/collaborators/alice")
        );
    }

    #[test]
    fn malformed_repo_is_not_authorized() {
        let api = GithubApi::new("http://127.0.0.1:9").unwrap();
        assert!(!api.is_authorized_collaborator("alice", "not a url", "token"));
    }

    #[test]
    fn unreachable_service_is_not_authorized() {
        let api = GithubApi::new("http://127.0.0.1:9").unwrap();
        assert!(!api.is_authorized_collaborator(
            "alice",
            "https://github.com/grame/faustlibraries.git",
            "token"
        ));
    }
}
