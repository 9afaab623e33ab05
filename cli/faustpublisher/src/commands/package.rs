//! `faustpublisher publish <repo-url>` — gate and publish one package.

use anyhow::{Context, Result};
use faust_registry::{
    FaustCompiler, GitCli, GitFetcher, GithubApi, IdentityProvider, PackageImportChecker,
    PublishGate, RegistryConfig, VersionControl,
};

/// Authorize the caller against the package repository and publish it under
/// the caller's account.
pub fn run(config: &RegistryConfig, token: &str, repo_url: &str) -> Result<()> {
    let identity = GithubApi::new(&config.api_base)?;
    let vcs = GitCli::new(&config.git);
    let fetcher = GitFetcher::new(&config.git);
    let compiler = FaustCompiler::new(&config.compiler);
    let checker = PackageImportChecker;
    let gate = PublishGate::new(&fetcher, &compiler, &checker);
    run_with(config, &identity, &vcs, &gate, token, repo_url)
}

/// [`run`] with explicit collaborators.
pub fn run_with(
    config: &RegistryConfig,
    identity: &dyn IdentityProvider,
    vcs: &dyn VersionControl,
    gate: &PublishGate<'_>,
    token: &str,
    repo_url: &str,
) -> Result<()> {
    let owner = faust_registry::authorize(identity, token, repo_url)?;

    let published = faust_registry::publish_package(config, vcs, gate, repo_url, &owner)
        .with_context(|| format!("Failed to publish {repo_url}"))?;

    println!(
        "✅ Published {}/{} version {}",
        published.owner, published.name, published.version
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::fakes::{
        config, write, PassthroughCompiler, RecordingVcs, StaticFetcher, StaticIdentity,
    };

    const REPO: &str = "https://github.com/alice/filters.lib";

    const ALICE: StaticIdentity = StaticIdentity {
        user: "alice",
        collaborator: true,
    };

    fn package(body: &'static str) -> StaticFetcher {
        StaticFetcher {
            files: vec![("filters.lib", body)],
            ..Default::default()
        }
    }

    #[test]
    fn publishes_under_caller_and_pushes() {
        let root = tempfile::tempdir().unwrap();
        let cfg = config(root.path());
        let vcs = RecordingVcs::default();
        let fetcher = package("declare version \"1.2.0\";\nprocess = _;\n");
        let gate = PublishGate::new(&fetcher, &PassthroughCompiler, &PackageImportChecker);

        run_with(&cfg, &ALICE, &vcs, &gate, "token", REPO).unwrap();

        assert!(cfg
            .registry_path()
            .join("alice/filters.lib/1.2.0/filters.lib")
            .is_file());
        assert_eq!(vcs.pushes.borrow().len(), 1);
    }

    #[test]
    fn existing_version_fails_with_context_and_never_pushes() {
        let root = tempfile::tempdir().unwrap();
        let cfg = config(root.path());
        write(
            &cfg.registry_path().join("alice/filters.lib/1.2.0/filters.lib"),
            "declare version \"1.2.0\";\n",
        );
        let vcs = RecordingVcs::default();
        let fetcher = package("declare version \"1.2.0\";\nprocess = _;\n");
        let gate = PublishGate::new(&fetcher, &PassthroughCompiler, &PackageImportChecker);

        let err = run_with(&cfg, &ALICE, &vcs, &gate, "token", REPO).unwrap_err();

        assert_eq!(err.to_string(), format!("Failed to publish {REPO}"));
        assert!(vcs.pushes.borrow().is_empty());
    }

    #[test]
    fn relative_import_is_rejected_without_push() {
        let root = tempfile::tempdir().unwrap();
        let cfg = config(root.path());
        let vcs = RecordingVcs::default();
        let fetcher = package("declare version \"1.0.0\";\nimport(\"stdfaust.lib\");\n");
        let gate = PublishGate::new(&fetcher, &PassthroughCompiler, &PackageImportChecker);

        let err = run_with(&cfg, &ALICE, &vcs, &gate, "token", REPO).unwrap_err();

        assert!(format!("{err:#}").contains("Failed to publish"));
        assert!(vcs.pushes.borrow().is_empty());
        assert!(!cfg.registry_path().join("alice").exists());
    }
}
