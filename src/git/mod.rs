//! Git operations abstraction layer
//!
//! This module provides a trait-based abstraction over the version-control
//! side effects of an update run, allowing for multiple implementations
//! including real Git repositories and mock implementations for testing.
//!
//! # Overview
//!
//! [Repository] produces a fresh [WorkingCopy] per run from a remote
//! location. The working copy exposes the narrow capability set an update
//! needs: read, write, stage, commit and push. The concrete implementations
//! include:
//!
//! - [repository::Git2Repository]: A real implementation using the `git2` crate
//! - [mock::MockRepository]: An in-memory implementation for testing
//!
//! # Usage
//!
//! ```rust,no_run
//! # use tagbump::cancel::CancelToken;
//! # use tagbump::config::Credentials;
//! # use tagbump::git::{Git2Repository, Repository, WorkingCopy};
//! # fn example() -> tagbump::Result<()> {
//! let repo = Git2Repository::new(Credentials::new("bot", "token"));
//! let copy = repo.checkout("https://github.com/acme/deploy.git", &CancelToken::new())?;
//! let manifest = copy.read_file("apps/api/kustomization.yaml")?;
//! # let _ = manifest;
//! # Ok(())
//! # }
//! ```

pub mod mock;
pub mod repository;

pub use mock::MockRepository;
pub use repository::Git2Repository;

use chrono::{DateTime, Utc};

use crate::cancel::CancelToken;
use crate::domain::{CommitAuthor, CommitInfo};
use crate::error::Result;

/// Source of per-run working copies.
///
/// Implementors carry the credentials used for every network operation. Each
/// call to [Repository::checkout] returns an independent working copy, so one
/// repository value may serve several runs, including concurrent ones.
pub trait Repository: Send + Sync {
    type WorkingCopy: WorkingCopy;

    /// Clone `location` into a fresh, ephemeral working copy.
    ///
    /// # Errors
    /// * `Checkout` - authentication or network failure, missing repository,
    ///   or a remote without a branch to work on
    /// * `Cancelled` - the token fired before or during the clone
    fn checkout(&self, location: &str, cancel: &CancelToken) -> Result<Self::WorkingCopy>;
}

/// A checked-out copy of a repository owned by a single run.
///
/// Paths are relative to the repository root. The copy is discarded when
/// dropped; nothing written to it survives unless pushed.
pub trait WorkingCopy {
    /// Read a file as UTF-8 text.
    ///
    /// # Errors
    /// * `FileNotFound` - the path does not exist or is not readable text
    fn read_file(&self, path: &str) -> Result<String>;

    /// Overwrite a file's content.
    fn write_file(&mut self, path: &str, content: &str) -> Result<()>;

    /// Add a file to the index for the next commit.
    ///
    /// # Errors
    /// * `Stage` - the file is unknown to the working copy
    fn stage(&mut self, path: &str) -> Result<()>;

    /// Commit the index on top of the current branch head.
    ///
    /// The same identity is used for author and committer, with the given
    /// UTC timestamp.
    fn commit(
        &mut self,
        message: &str,
        author: &CommitAuthor,
        timestamp: DateTime<Utc>,
    ) -> Result<CommitInfo>;

    /// Push the current branch to `remote`.
    ///
    /// Without `force` a non-fast-forward update is rejected.
    ///
    /// # Errors
    /// * `Push` - authentication, network, or rejected update
    /// * `Cancelled` - the token fired before or during the push
    fn push(&mut self, remote: &str, force: bool, cancel: &CancelToken) -> Result<()>;
}
