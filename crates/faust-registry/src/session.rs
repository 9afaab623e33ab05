//! Registry session lifecycle.
//!
//! A session owns the local registry checkout for the duration of one
//! synchronize or publish operation:
//!
//! ```text
//! open ──> Stale ──refresh──> Ready ──close──> Closed
//!                                  (commit + push only if mutated)
//! ```
//!
//! Reads that feed gating decisions must happen in `Ready`, after the
//! checkout has been reset to the remote's default branch. An advisory file
//! lock keeps a second local publisher out while the session is alive.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::{debug, info};

use crate::config::RegistryConfig;
use crate::error::{RegistryError, Result};
use crate::vcs::VersionControl;

/// Lifecycle phase of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Acquired, not yet refreshed from the remote.
    Stale,
    /// Refreshed; safe to read and mutate.
    Ready,
    /// Committed and pushed, or discarded.
    Closed,
}

impl SessionPhase {
    fn as_str(&self) -> &'static str {
        match self {
            SessionPhase::Stale => "stale",
            SessionPhase::Ready => "ready",
            SessionPhase::Closed => "closed",
        }
    }
}

/// How a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// A commit was pushed to `branch`.
    Pushed { branch: String },
    /// Nothing changed; no commit was made.
    Discarded,
}

/// Exclusive use of the registry checkout for one operation.
pub struct RegistrySession<'a, V: VersionControl + ?Sized> {
    vcs: &'a V,
    path: PathBuf,
    remote_url: String,
    phase: SessionPhase,
    // Held for the advisory lock; released on drop.
    _lock: File,
}

impl<'a, V: VersionControl + ?Sized> RegistrySession<'a, V> {
    /// Acquire the registry lock and return a stale session.
    pub fn open(vcs: &'a V, config: &RegistryConfig) -> Result<Self> {
        let remote_url = config.registry_remote()?.to_string();
        std::fs::create_dir_all(&config.working_root)?;

        let lock_path = config.lock_path();
        let lock = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)?;
        lock.try_lock_exclusive()
            .map_err(|_| RegistryError::RegistryLocked {
                path: config.registry_path(),
            })?;
        debug!("acquired registry lock {}", lock_path.display());

        Ok(RegistrySession {
            vcs,
            path: config.registry_path(),
            remote_url,
            phase: SessionPhase::Stale,
            _lock: lock,
        })
    }

    /// Current phase.
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    fn expect_phase(&self, expected: SessionPhase) -> Result<()> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(RegistryError::SessionState {
                state: self.phase.as_str(),
                expected: expected.as_str(),
            })
        }
    }

    /// Bring the checkout up to date with the remote default branch.
    pub fn refresh(&mut self) -> Result<&Path> {
        self.expect_phase(SessionPhase::Stale)?;
        self.vcs
            .sync_to_remote_default_branch(&self.path, &self.remote_url)?;
        self.phase = SessionPhase::Ready;
        Ok(&self.path)
    }

    /// The refreshed checkout. Fails unless the session is ready.
    pub fn registry_path(&self) -> Result<&Path> {
        self.expect_phase(SessionPhase::Ready)?;
        Ok(&self.path)
    }

    /// End the session, committing and pushing when `mutated`.
    ///
    /// The push target is resolved now rather than at refresh, so a default
    /// branch renamed during a long compile is still honored.
    pub fn close(mut self, mutated: bool, message: &str) -> Result<SessionOutcome> {
        self.expect_phase(SessionPhase::Ready)?;

        let outcome = if mutated {
            let branch = self.vcs.resolve_default_branch(&self.path)?;
            self.vcs.commit_and_push(&self.path, message, &branch)?;
            info!("registry changes pushed to {}", branch);
            SessionOutcome::Pushed { branch }
        } else {
            debug!("no registry changes; discarding session");
            SessionOutcome::Discarded
        };

        self.phase = SessionPhase::Closed;
        Ok(outcome)
    }
}
