//! Error types for the rulecheck core library.
//!
//! Each subsystem has its own error type derived with `thiserror`. Only
//! run-critical conditions surface as errors; per-file problems (an
//! unreadable working-copy file, a reference file that cannot be fetched,
//! malformed XML) are reported as findings and never abort the run.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Git errors
// ---------------------------------------------------------------------------

/// Errors from local Git (git2) operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// The repository path does not exist or is not a git repo.
    #[error("git repository not found at '{0}'")]
    RepositoryNotFound(String),

    /// The repository has no working tree (bare repo).
    #[error("git repository at '{0}' is bare; a working tree is required")]
    BareRepository(String),

    /// A ref (branch, tag, SHA) could not be resolved.
    #[error("git ref not found: {0}")]
    RefNotFound(String),

    /// A path does not exist in the tree of the given revision.
    #[error("path '{path}' not found at revision '{revision}'")]
    PathNotFound {
        revision: String,
        path: String,
    },

    /// A `git2` library error.
    #[error("git2 error: {0}")]
    Git2Error(#[from] git2::Error),

    /// Generic I/O wrapper (working-tree reads).
    #[error("git I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// TOML parse error.
    #[error("configuration parse error: {0}")]
    ParseError(String),

    /// A config value is invalid.
    #[error("invalid configuration value for '{field}': {detail}")]
    InvalidValue {
        field: String,
        detail: String,
    },

    /// Generic I/O error reading the config file.
    #[error("configuration I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Check errors
// ---------------------------------------------------------------------------

/// Run-fatal errors from the change-set resolver.
///
/// Only the two run-critical collaborator calls surface here: enumerating
/// the changed files and enumerating the reference tree. Everything else
/// degrades to a warning finding on the run report.
#[derive(Debug, Error)]
pub enum CheckError {
    /// Could not enumerate the changed files against the base ref.
    #[error("failed to list changed files against '{base}': {source}")]
    ChangedFiles {
        base: String,
        source: GitError,
    },

    /// Could not enumerate the reference-revision file tree.
    #[error("failed to list the tree of '{reference}': {source}")]
    ReferenceTree {
        reference: String,
        source: GitError,
    },
}
