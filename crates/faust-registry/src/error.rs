//! Registry error types.

use std::path::PathBuf;

/// Errors that can occur during registry operations.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// Scan root missing or not a directory.
    #[error("cannot scan {path}: not a directory")]
    ScanRoot { path: PathBuf },

    /// Repository URL could not be parsed into owner and name.
    #[error("invalid repository URL '{url}': {detail}")]
    InvalidRepoUrl { url: String, detail: String },

    /// Repository name does not carry the library extension.
    #[error("Invalid Repository Name: '{name}' must end in .lib")]
    InvalidName { name: String },

    /// Compiled artifact imports something other than registry packages.
    #[error("You are using non-package imports, which is not allowed.")]
    DisallowedImports,

    /// Declared version is not `MAJOR.MINOR.PATCH`.
    #[error("Invalid declared version format '{version}'. Use Semantic Versioning (semver).")]
    InvalidVersionFormat { version: String },

    /// Version directory already present in the registry.
    #[error("The version you are trying to publish already exists: {name}@{version}")]
    VersionAlreadyExists { name: String, version: String },

    /// Copying the artifact into the registry failed.
    #[error("Unexpected error occurred while copying the package. Please try again.")]
    CopyFailed,

    /// Compilation collaborator failure.
    #[error("compilation of '{package}' failed: {detail}")]
    Compile { package: String, detail: String },

    /// Remote download failure.
    #[error("download of {url} failed: {detail}")]
    Download { url: String, detail: String },

    /// Version-control command failure.
    #[error("git {command} failed: {detail}")]
    Vcs { command: String, detail: String },

    /// Another publisher holds the local registry lock.
    #[error("registry at {path} is locked by another publisher")]
    RegistryLocked { path: PathBuf },

    /// Session used outside the state that permits the operation.
    #[error("registry session is {state}, expected {expected}")]
    SessionState {
        state: &'static str,
        expected: &'static str,
    },

    /// Token could not be resolved to an account.
    #[error("could not resolve identity: {detail}")]
    Identity { detail: String },

    /// Caller is not a collaborator on the target repository.
    #[error("You are not a collaborator of {repo}.")]
    NotCollaborator { repo: String },

    /// Configuration problem.
    #[error("configuration error: {detail}")]
    Config { detail: String },

    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RegistryError {
    /// Whether this error is a gate rejection that left the registry untouched.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            RegistryError::InvalidRepoUrl { .. }
                | RegistryError::InvalidName { .. }
                | RegistryError::DisallowedImports
                | RegistryError::InvalidVersionFormat { .. }
                | RegistryError::VersionAlreadyExists { .. }
        )
    }
}

/// Result type alias for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;
