//! In-memory [`RepoSource`] fake for unit tests.

use std::collections::{HashMap, HashSet};

use crate::errors::GitError;
use crate::models::{ChangeStatus, ChangedFile};

use super::RepoSource;

/// A scripted repository: a change set, the reference tree as a path →
/// content map, and the working tree likewise.
#[derive(Debug, Default)]
pub(crate) struct MemorySource {
    pub changed: Vec<ChangedFile>,
    pub reference: HashMap<String, String>,
    pub worktree: HashMap<String, String>,
    /// Make `changed_paths` fail (simulates an unresolvable base ref).
    pub fail_changed: bool,
    /// Make `list_paths` fail.
    pub fail_list: bool,
    /// Paths whose `read_at` fails with a non-NotFound error.
    pub unreadable_reference: HashSet<String>,
}

impl MemorySource {
    pub fn with_changed(mut self, status: ChangeStatus, path: &str) -> Self {
        self.changed.push(ChangedFile::new(status, path));
        self
    }

    pub fn with_reference(mut self, path: &str, content: &str) -> Self {
        self.reference.insert(path.to_string(), content.to_string());
        self
    }

    pub fn with_worktree(mut self, path: &str, content: &str) -> Self {
        self.worktree.insert(path.to_string(), content.to_string());
        self
    }
}

impl RepoSource for MemorySource {
    fn changed_paths(&self, base_ref: &str) -> Result<Vec<ChangedFile>, GitError> {
        if self.fail_changed {
            return Err(GitError::RefNotFound(base_ref.to_string()));
        }
        Ok(self.changed.clone())
    }

    fn list_paths(&self, reference: &str) -> Result<Vec<String>, GitError> {
        if self.fail_list {
            return Err(GitError::RefNotFound(reference.to_string()));
        }
        let mut paths: Vec<String> = self.reference.keys().cloned().collect();
        paths.sort();
        Ok(paths)
    }

    fn read_at(&self, reference: &str, path: &str) -> Result<String, GitError> {
        if self.unreadable_reference.contains(path) {
            return Err(GitError::Git2Error(git2::Error::from_str(
                "simulated read failure",
            )));
        }
        self.reference
            .get(path)
            .cloned()
            .ok_or_else(|| GitError::PathNotFound {
                revision: reference.to_string(),
                path: path.to_string(),
            })
    }

    fn read_worktree(&self, path: &str) -> Result<String, GitError> {
        self.worktree.get(path).cloned().ok_or_else(|| {
            GitError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no such file: {}", path),
            ))
        })
    }
}
