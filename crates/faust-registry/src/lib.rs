//! Versioned package registry for Faust libraries.
//!
//! The registry is a git repository holding every published version of every
//! library or package, one file per version:
//!
//! ```text
//! <registry>/
//!   oscillators.lib/1.0.0/oscillators.lib          # synchronized library
//!   alice/mylib.lib/0.2.0/mylib.lib                # published package
//! ```
//!
//! Two producers feed it:
//! - **Library synchronization** copies every version found in the flat
//!   `faustlibraries` collection that the registry does not have yet.
//! - **Package publishing** gates a single author-submitted package on its
//!   name, imports, version format and version uniqueness.
//!
//! Entries are only ever added. Both producers run inside a
//! [`RegistrySession`] that refreshes the checkout first and pushes a commit
//! only when something was written.

mod command;

pub mod auth;
pub mod compile;
pub mod config;
pub mod download;
pub mod error;
pub mod imports;
pub mod publish;
pub mod repo_id;
pub mod scan;
pub mod session;
pub mod sync;
pub mod vcs;
pub mod version;
pub mod workflow;

// Re-exports for convenience.
pub use auth::{GithubApi, IdentityProvider};
pub use compile::{CompiledPackage, Compiler, FaustCompiler};
pub use config::RegistryConfig;
pub use download::{Fetcher, GitFetcher};
pub use error::{RegistryError, Result};
pub use imports::{ImportChecker, PackageImportChecker};
pub use publish::{PublishGate, PublishedPackage};
pub use repo_id::{parse_repo_url, RepoId};
pub use scan::{scan_directory, LibraryRecord, ScanIndex};
pub use session::{RegistrySession, SessionOutcome, SessionPhase};
pub use sync::{synchronize_library_registry, CreatedEntry, SyncReport};
pub use vcs::{GitCli, VersionControl};
pub use version::{extract_version, is_valid_version_format};
pub use workflow::{authorize, publish_libraries, publish_package, LibrariesOutcome};
