//! End-to-end registry flows.
//!
//! Both flows share the same shape: open a session, refresh the checkout,
//! mutate through the synchronizer or the publish gate, then commit and push
//! only if something was written.

use tracing::info;

use crate::auth::IdentityProvider;
use crate::config::RegistryConfig;
use crate::download::Fetcher;
use crate::error::{RegistryError, Result};
use crate::publish::{PublishGate, PublishedPackage};
use crate::session::{RegistrySession, SessionOutcome};
use crate::sync::{synchronize_library_registry, SyncReport};
use crate::vcs::VersionControl;

/// Download directory name for the library collection.
pub const LIBRARIES_DOWNLOAD_NAME: &str = "faustlibraries";

/// Commit message for a library synchronization.
pub const LIBRARIES_COMMIT_MESSAGE: &str = "Synchronizing faust registry with faustlibraries";

/// Resolve the caller behind `token` and require collaborator access to
/// `repo_url`. Returns the caller's username.
pub fn authorize(identity: &dyn IdentityProvider, token: &str, repo_url: &str) -> Result<String> {
    let username = identity.resolve_identity(token)?;
    if !identity.is_authorized_collaborator(&username, repo_url, token) {
        return Err(RegistryError::NotCollaborator {
            repo: repo_url.to_string(),
        });
    }
    info!("{} is authorized for {}", username, repo_url);
    Ok(username)
}

/// Result of a library synchronization run.
#[derive(Debug, Clone)]
pub struct LibrariesOutcome {
    /// Entries written by the synchronizer.
    pub report: SyncReport,
    /// Whether a commit was pushed.
    pub session: SessionOutcome,
}

/// Synchronize the configured library collection into the registry.
pub fn publish_libraries(
    config: &RegistryConfig,
    vcs: &dyn VersionControl,
    fetcher: &dyn Fetcher,
) -> Result<LibrariesOutcome> {
    config.ensure_dirs()?;

    let mut session = RegistrySession::open(vcs, config)?;
    let registry = session.refresh()?.to_path_buf();

    let libraries = fetcher.fetch(
        &config.libraries_repo_url,
        LIBRARIES_DOWNLOAD_NAME,
        &config.downloads_path(),
    )?;

    let report = synchronize_library_registry(&registry, &libraries)?;
    let session = session.close(report.changed(), LIBRARIES_COMMIT_MESSAGE)?;
    Ok(LibrariesOutcome { report, session })
}

/// Gate and publish the package at `repo_url` under `owner`.
pub fn publish_package(
    config: &RegistryConfig,
    vcs: &dyn VersionControl,
    gate: &PublishGate<'_>,
    repo_url: &str,
    owner: &str,
) -> Result<PublishedPackage> {
    config.ensure_dirs()?;

    let mut session = RegistrySession::open(vcs, config)?;
    let registry = session.refresh()?.to_path_buf();

    let published = gate.publish(repo_url, owner, &registry, &config.downloads_path())?;
    let message = format!(
        "Publish {}/{} version {}",
        published.owner, published.name, published.version
    );
    session.close(true, &message)?;
    Ok(published)
}
