//! Change-set reconciliation against the reference index.
//!
//! [`ConflictChecker::run`] walks the changed rule files in order and
//! applies the reconciliation policy per file: a range advisory (soft),
//! the internal duplicate check (fatal), then the status-specific
//! cross-file check. An `Added` file must not claim any identifier the
//! reference revision already knows; a `Modified` file is only held to
//! the identifiers it did not already own (`devIds − mainIds`), so
//! keeping an identifier the file always declared is never a conflict.
//! Deletions are informational.
//!
//! The run stops at the first hard violation. Infrastructure failures
//! (the two run-critical git enumerations) surface as [`CheckError`];
//! everything else degrades to findings on the report.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::errors::{CheckError, GitError};
use crate::extract::extract_rule_ids;
use crate::git::RepoSource;
use crate::index::{IndexWarning, ReferenceIndex};
use crate::models::{ChangeStatus, ChangedFile, Conflict, RuleId};

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

/// A non-fatal observation about one checked file.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Finding {
    /// The file was deleted; deletions cannot create conflicts.
    Deleted,
    /// The working-copy file could not be read; it was skipped.
    Unreadable { detail: String },
    /// The content is not well-formed XML and yielded no identifiers.
    ParseIssue { message: String, preview: String },
    /// No rule identifiers found.
    NoIds,
    /// Identifiers outside the recommended range (advisory only).
    OutOfRange {
        ids: Vec<RuleId>,
        min: RuleId,
        max: RuleId,
    },
    /// Modified, but the identifier set is unchanged from the reference.
    IdsUnchanged,
    /// All checks passed for this file.
    Passed,
}

/// Per-file outcome of the reconciliation pass.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FileReport {
    pub path: String,
    pub status: ChangeStatus,
    pub findings: Vec<Finding>,
}

/// A hard policy violation; the run stops at the first one.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    /// One file declares the same identifier more than once.
    DuplicateIds { path: String, ids: Vec<RuleId> },
    /// The change set claims identifiers already owned elsewhere.
    IdConflicts {
        path: String,
        conflicts: Vec<Conflict>,
    },
}

impl Violation {
    /// The change-set file the violation was detected in.
    pub fn path(&self) -> &str {
        match self {
            Self::DuplicateIds { path, .. } => path,
            Self::IdConflicts { path, .. } => path,
        }
    }
}

/// Everything observed during one run, in file order.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RunReport {
    pub files: Vec<FileReport>,
    pub index_warnings: Vec<IndexWarning>,
}

/// The overall result of a check run.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum CheckOutcome {
    /// No changed rule files; the reference index was never built.
    NoRuleChanges,
    /// Every changed rule file passed reconciliation.
    Passed(RunReport),
    /// A hard violation stopped the run.
    Failed {
        report: RunReport,
        violation: Violation,
    },
}

impl CheckOutcome {
    /// Whether the run should produce a failing exit status.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

// ---------------------------------------------------------------------------
// Checker
// ---------------------------------------------------------------------------

/// Drives one conflict-check run over a [`RepoSource`].
pub struct ConflictChecker<'a> {
    source: &'a dyn RepoSource,
    config: &'a AppConfig,
}

impl<'a> ConflictChecker<'a> {
    pub fn new(source: &'a dyn RepoSource, config: &'a AppConfig) -> Self {
        Self { source, config }
    }

    /// Run the check: enumerate the change set, build the reference index,
    /// reconcile each file in order, fail fast on the first violation.
    pub fn run(&self) -> Result<CheckOutcome, CheckError> {
        let base = &self.config.check.base_ref;

        let changed: Vec<ChangedFile> = self
            .source
            .changed_paths(base)
            .map_err(|source| CheckError::ChangedFiles {
                base: base.clone(),
                source,
            })?
            .into_iter()
            .filter(|f| self.config.rules.matches(&f.path))
            .collect();

        if changed.is_empty() {
            info!(base, "no rule files changed");
            return Ok(CheckOutcome::NoRuleChanges);
        }

        let index = ReferenceIndex::build(self.source, base, &self.config.rules).map_err(
            |source| CheckError::ReferenceTree {
                reference: base.clone(),
                source,
            },
        )?;
        info!(
            base,
            changed = changed.len(),
            known_ids = index.len(),
            "checking changed rule files"
        );

        let mut files = Vec::new();
        for file in changed {
            debug!(path = %file.path, status = %file.status, "checking file");
            let mut findings = Vec::new();
            let violation = self.check_file(&file, &index, &mut findings);
            files.push(FileReport {
                path: file.path.clone(),
                status: file.status,
                findings,
            });
            if let Some(violation) = violation {
                warn!(path = %file.path, "hard violation; stopping run");
                return Ok(CheckOutcome::Failed {
                    report: RunReport {
                        files,
                        index_warnings: index.warnings().to_vec(),
                    },
                    violation,
                });
            }
        }

        info!("all rule file changes passed conflict checks");
        Ok(CheckOutcome::Passed(RunReport {
            files,
            index_warnings: index.warnings().to_vec(),
        }))
    }

    /// Reconcile one file. Soft observations go to `findings`; a returned
    /// violation fails the whole run.
    fn check_file(
        &self,
        file: &ChangedFile,
        index: &ReferenceIndex,
        findings: &mut Vec<Finding>,
    ) -> Option<Violation> {
        if file.status == ChangeStatus::Deleted {
            findings.push(Finding::Deleted);
            return None;
        }

        let content = match self.source.read_worktree(&file.path) {
            Ok(content) => content,
            Err(e) => {
                warn!(path = %file.path, error = %e, "could not read working copy; skipping");
                findings.push(Finding::Unreadable {
                    detail: e.to_string(),
                });
                return None;
            }
        };

        let extraction = extract_rule_ids(&content);
        if let Some(issue) = extraction.issue {
            findings.push(Finding::ParseIssue {
                message: issue.message,
                preview: issue.preview,
            });
        }
        let dev_ids = extraction.ids;
        if dev_ids.is_empty() {
            findings.push(Finding::NoIds);
            return None;
        }

        let check = &self.config.check;
        let out_of_range: BTreeSet<RuleId> = dev_ids
            .iter()
            .copied()
            .filter(|id| !check.in_range(*id))
            .collect();
        if !out_of_range.is_empty() {
            findings.push(Finding::OutOfRange {
                ids: out_of_range.into_iter().collect(),
                min: check.id_range_min,
                max: check.id_range_max,
            });
        }

        let duplicates = duplicate_ids(&dev_ids);
        if !duplicates.is_empty() {
            return Some(Violation::DuplicateIds {
                path: file.path.clone(),
                ids: duplicates,
            });
        }

        let dev_set: BTreeSet<RuleId> = dev_ids.into_iter().collect();
        let claimed = match file.status {
            ChangeStatus::Added => dev_set,
            ChangeStatus::Modified => {
                let main_set = self.reference_ids(&file.path);
                if dev_set == main_set {
                    debug!(path = %file.path, "modified but identifier set unchanged");
                    findings.push(Finding::IdsUnchanged);
                    return None;
                }
                // Only identifiers this file did not already own can conflict.
                dev_set.difference(&main_set).copied().collect()
            }
            ChangeStatus::Deleted => unreachable!("deleted files return early"),
        };

        let conflicts = conflicts_with_index(&claimed, index);
        if conflicts.is_empty() {
            findings.push(Finding::Passed);
            None
        } else {
            Some(Violation::IdConflicts {
                path: file.path.clone(),
                conflicts,
            })
        }
    }

    /// Identifier set this path had in the reference revision. A path with
    /// no reference version (or one that cannot be fetched) counts as empty.
    fn reference_ids(&self, path: &str) -> BTreeSet<RuleId> {
        match self.source.read_at(&self.config.check.base_ref, path) {
            Ok(content) => {
                let extraction = extract_rule_ids(&content);
                if let Some(issue) = extraction.issue {
                    warn!(path, message = %issue.message, "reference version is not well-formed");
                }
                extraction.ids.into_iter().collect()
            }
            Err(GitError::PathNotFound { .. }) => {
                debug!(path, "no reference version; treating identifiers as new");
                BTreeSet::new()
            }
            Err(e) => {
                warn!(path, error = %e, "could not read reference version; treating identifiers as new");
                BTreeSet::new()
            }
        }
    }
}

/// Identifiers appearing more than once, sorted.
fn duplicate_ids(ids: &[RuleId]) -> Vec<RuleId> {
    let mut counts: BTreeMap<RuleId, usize> = BTreeMap::new();
    for id in ids {
        *counts.entry(*id).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(id, _)| id)
        .collect()
}

/// Cross-check a claimed identifier set against the reference index.
fn conflicts_with_index(claimed: &BTreeSet<RuleId>, index: &ReferenceIndex) -> Vec<Conflict> {
    claimed
        .iter()
        .filter_map(|id| index.owners(*id).map(|owners| Conflict::new(*id, owners.clone())))
        .collect()
}
