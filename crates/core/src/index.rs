//! Reference-branch rule ID index.
//!
//! Maps every rule identifier declared in the reference revision to the
//! set of rule files declaring it. Built once per run and immutable
//! afterward. Construction is best-effort: a reference file that cannot
//! be fetched or parsed is skipped with a warning and the index stays
//! partial; only the tree enumeration itself is fatal.

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;
use tracing::{info, warn};

use crate::config::RulesConfig;
use crate::errors::GitError;
use crate::extract::extract_rule_ids;
use crate::git::RepoSource;
use crate::models::RuleId;

/// A reference file that could not contribute to the index.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct IndexWarning {
    pub path: String,
    pub detail: String,
}

/// Identifier → owning reference files.
#[derive(Debug, Default)]
pub struct ReferenceIndex {
    by_id: HashMap<RuleId, BTreeSet<String>>,
    warnings: Vec<IndexWarning>,
}

impl ReferenceIndex {
    /// Build the index for `reference` by fetching every rule file in its
    /// tree through `source`.
    pub fn build(
        source: &dyn RepoSource,
        reference: &str,
        rules: &RulesConfig,
    ) -> Result<Self, GitError> {
        let paths = source.list_paths(reference)?;

        let mut by_id: HashMap<RuleId, BTreeSet<String>> = HashMap::new();
        let mut warnings = Vec::new();

        for path in paths.into_iter().filter(|p| rules.matches(p)) {
            let content = match source.read_at(reference, &path) {
                Ok(content) => content,
                Err(e) => {
                    warn!(path = %path, reference, error = %e, "skipping unreadable reference file");
                    warnings.push(IndexWarning {
                        path,
                        detail: format!("could not read from {}: {}", reference, e),
                    });
                    continue;
                }
            };

            let extraction = extract_rule_ids(&content);
            if let Some(issue) = extraction.issue {
                warn!(path = %path, message = %issue.message, "reference file is not well-formed");
                warnings.push(IndexWarning {
                    path: path.clone(),
                    detail: issue.message,
                });
            }
            // A file declaring the same id twice still contributes a single
            // set entry; duplicate detection belongs to the resolver.
            for id in extraction.ids {
                by_id.entry(id).or_default().insert(path.clone());
            }
        }

        info!(
            reference,
            ids = by_id.len(),
            skipped = warnings.len(),
            "built reference index"
        );
        Ok(Self { by_id, warnings })
    }

    /// The reference files that declare `id`.
    pub fn owners(&self, id: RuleId) -> Option<&BTreeSet<String>> {
        self.by_id.get(&id)
    }

    /// Whether `id` is declared anywhere in the reference revision.
    pub fn contains(&self, id: RuleId) -> bool {
        self.by_id.contains_key(&id)
    }

    /// Number of distinct identifiers indexed.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Files skipped or flagged during construction.
    pub fn warnings(&self) -> &[IndexWarning] {
        &self.warnings
    }
}
