//! Version-control collaborator interface.
//!
//! The conflict check consumes git through the narrow [`RepoSource`]
//! capability trait so the reconciliation logic can be driven by an
//! in-memory fake in tests. [`GitClient`] is the git2-backed
//! implementation used by the CLI.

mod client;
#[cfg(test)]
pub(crate) mod memory;

pub use client::GitClient;

use crate::errors::GitError;
use crate::models::ChangedFile;

/// The version-control capabilities the conflict check needs.
pub trait RepoSource {
    /// List the files changed between the merge base of `base_ref` and
    /// the current head, with their change status.
    fn changed_paths(&self, base_ref: &str) -> Result<Vec<ChangedFile>, GitError>;

    /// List every file path in the tree of `reference`.
    fn list_paths(&self, reference: &str) -> Result<Vec<String>, GitError>;

    /// Fetch the full content of `path` as of `reference`.
    ///
    /// Returns [`GitError::PathNotFound`] when the path does not exist at
    /// that revision; callers tolerate this for files new to the change set.
    fn read_at(&self, reference: &str, path: &str) -> Result<String, GitError>;

    /// Read the current working-tree content of `path`.
    fn read_worktree(&self, path: &str) -> Result<String, GitError>;
}
