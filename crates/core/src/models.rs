//! Shared data types for rule files and change sets.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// A numeric rule identifier taken from a `rule` element's `id` attribute.
pub type RuleId = u64;

// ---------------------------------------------------------------------------
// Change status
// ---------------------------------------------------------------------------

/// How a rule file changed relative to the reference revision.
///
/// Renames are not modeled; without rename detection a rename shows up as
/// an independent `Deleted` plus `Added` pair.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChangeStatus {
    Added,
    Modified,
    Deleted,
}

impl ChangeStatus {
    /// The single-letter code git uses in `--name-status` output.
    pub fn code(&self) -> char {
        match self {
            Self::Added => 'A',
            Self::Modified => 'M',
            Self::Deleted => 'D',
        }
    }
}

impl std::fmt::Display for ChangeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Added => write!(f, "added"),
            Self::Modified => write!(f, "modified"),
            Self::Deleted => write!(f, "deleted"),
        }
    }
}

/// One entry of the change set: a repository-relative path and its status.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChangedFile {
    pub status: ChangeStatus,
    pub path: String,
}

impl ChangedFile {
    pub fn new(status: ChangeStatus, path: impl Into<String>) -> Self {
        Self {
            status,
            path: path.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Conflict
// ---------------------------------------------------------------------------

/// A rule identifier claimed by the change set that is already owned by
/// one or more files in the reference revision.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Conflict {
    /// The colliding identifier.
    pub id: RuleId,
    /// Reference-revision files that already declare this identifier.
    pub owners: BTreeSet<String>,
}

impl Conflict {
    pub fn new(id: RuleId, owners: BTreeSet<String>) -> Self {
        Self { id, owners }
    }
}
