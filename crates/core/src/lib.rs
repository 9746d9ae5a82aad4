//! rulecheck core library.
//!
//! This crate provides the components of the pre-merge rule ID conflict
//! check: configuration, rule ID extraction from XML rule files, the
//! reference-branch identifier index, the change-set resolver, and the
//! git collaborator interface.

pub mod check;
pub mod config;
pub mod errors;
pub mod extract;
pub mod git;
pub mod index;
pub mod models;

// Re-exports for convenience.
pub use check::{CheckOutcome, ConflictChecker};
pub use config::AppConfig;
pub use git::{GitClient, RepoSource};
pub use index::ReferenceIndex;
