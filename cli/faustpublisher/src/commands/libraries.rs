//! `faustpublisher publish-libraries` — sync faustlibraries into the registry.

use anyhow::{bail, Context, Result};
use faust_registry::{
    Fetcher, GitCli, GitFetcher, GithubApi, IdentityProvider, RegistryConfig, VersionControl,
};

/// Authorize the caller against the library collection and synchronize it.
pub fn run(config: &RegistryConfig, token: &str) -> Result<()> {
    let identity = GithubApi::new(&config.api_base)?;
    let vcs = GitCli::new(&config.git);
    let fetcher = GitFetcher::new(&config.git);
    run_with(config, &identity, &vcs, &fetcher, token)
}

/// [`run`] with explicit collaborators.
pub fn run_with(
    config: &RegistryConfig,
    identity: &dyn IdentityProvider,
    vcs: &dyn VersionControl,
    fetcher: &dyn Fetcher,
    token: &str,
) -> Result<()> {
    faust_registry::authorize(identity, token, &config.libraries_repo_url)?;

    let outcome = faust_registry::publish_libraries(config, vcs, fetcher)
        .context("Failed to publish libraries")?;

    if !outcome.report.changed() {
        bail!("No changes detected: The registry is already up to date.");
    }

    for entry in &outcome.report.created {
        println!("  + {} {}", entry.name, entry.version);
    }
    println!("✅ Registry updated successfully!");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::fakes::{config, write, RecordingVcs, StaticFetcher, StaticIdentity};

    const MAINTAINER: StaticIdentity = StaticIdentity {
        user: "grame",
        collaborator: true,
    };

    fn upstream() -> StaticFetcher {
        StaticFetcher {
            files: vec![("osc.lib", "declare version \"1.0.0\";\n")],
            ..Default::default()
        }
    }

    #[test]
    fn up_to_date_registry_reports_no_changes_and_never_pushes() {
        let root = tempfile::tempdir().unwrap();
        let cfg = config(root.path());
        write(
            &cfg.registry_path().join("osc.lib/1.0.0/osc.lib"),
            "declare version \"1.0.0\";\n",
        );
        let vcs = RecordingVcs::default();
        let fetcher = upstream();

        let err = run_with(&cfg, &MAINTAINER, &vcs, &fetcher, "token").unwrap_err();

        assert_eq!(
            err.to_string(),
            "No changes detected: The registry is already up to date."
        );
        assert_eq!(fetcher.calls.get(), 1);
        assert!(vcs.pushes.borrow().is_empty());
    }

    #[test]
    fn new_version_is_pushed_once() {
        let root = tempfile::tempdir().unwrap();
        let cfg = config(root.path());
        let vcs = RecordingVcs::default();

        run_with(&cfg, &MAINTAINER, &vcs, &upstream(), "token").unwrap();

        assert!(cfg.registry_path().join("osc.lib/1.0.0/osc.lib").is_file());
        assert_eq!(
            *vcs.pushes.borrow(),
            vec![format!("main: {}", faust_registry::workflow::LIBRARIES_COMMIT_MESSAGE)]
        );
    }

    #[test]
    fn non_collaborator_is_stopped_before_download() {
        let root = tempfile::tempdir().unwrap();
        let cfg = config(root.path());
        let outsider = StaticIdentity {
            user: "mallory",
            collaborator: false,
        };
        let vcs = RecordingVcs::default();
        let fetcher = upstream();

        assert!(run_with(&cfg, &outsider, &vcs, &fetcher, "token").is_err());
        assert_eq!(fetcher.calls.get(), 0);
        assert!(vcs.pushes.borrow().is_empty());
    }
}
