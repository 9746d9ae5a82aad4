//! TOML-based configuration for rulecheck.
//!
//! Every field has a serde default so the tool runs unconfigured: a
//! pre-merge hook cannot assume a config file is checked in. The defaults
//! reproduce the stock convention (`rules/*.xml` against `origin/main`,
//! advisory range 100000-120000).

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::ConfigError;
use crate::models::RuleId;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level application configuration loaded from a TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Rule-file path convention.
    #[serde(default)]
    pub rules: RulesConfig,

    /// Conflict-check behaviour.
    #[serde(default)]
    pub check: CheckConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }
        let raw = std::fs::read_to_string(path)?;
        let config: Self =
            toml::from_str(&raw).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Validate field values. Serde guarantees types; this checks semantics.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rules.root.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "rules.root".into(),
                detail: "must not be empty".into(),
            });
        }
        if !self.rules.extension.starts_with('.') {
            return Err(ConfigError::InvalidValue {
                field: "rules.extension".into(),
                detail: format!("'{}' must start with '.'", self.rules.extension),
            });
        }
        if self.check.base_ref.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "check.base_ref".into(),
                detail: "must not be empty".into(),
            });
        }
        if self.check.id_range_min > self.check.id_range_max {
            return Err(ConfigError::InvalidValue {
                field: "check.id_range_min".into(),
                detail: format!(
                    "{} exceeds id_range_max {}",
                    self.check.id_range_min, self.check.id_range_max
                ),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// Which repository paths count as rule files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesConfig {
    /// Directory prefix rule files live under. Default `rules/`.
    #[serde(default = "default_root")]
    pub root: String,

    /// File extension of rule files. Default `.xml`.
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Glob patterns for rule files to exclude from checking
    /// (e.g. generated or vendored files). Matched against the
    /// repository-relative path.
    #[serde(default)]
    pub ignore: Vec<String>,
}

fn default_root() -> String {
    "rules/".into()
}
fn default_extension() -> String {
    ".xml".into()
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            extension: default_extension(),
            ignore: Vec::new(),
        }
    }
}

impl RulesConfig {
    /// Whether a repository-relative path is a rule file under this
    /// convention and not excluded by an ignore pattern.
    pub fn matches(&self, path: &str) -> bool {
        if !path.starts_with(&self.root) || !path.ends_with(&self.extension) {
            return false;
        }
        for pattern in &self.ignore {
            if glob_match::glob_match(pattern, path) {
                debug!(path, pattern = pattern.as_str(), "rule file ignored");
                return false;
            }
        }
        true
    }
}

// ---------------------------------------------------------------------------
// Check
// ---------------------------------------------------------------------------

/// Conflict-check behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckConfig {
    /// The reference revision the change set is compared against.
    /// Default `origin/main`.
    #[serde(default = "default_base_ref")]
    pub base_ref: String,

    /// Lower bound (inclusive) of the recommended custom rule ID range.
    #[serde(default = "default_range_min")]
    pub id_range_min: RuleId,

    /// Upper bound (inclusive) of the recommended custom rule ID range.
    #[serde(default = "default_range_max")]
    pub id_range_max: RuleId,
}

fn default_base_ref() -> String {
    "origin/main".into()
}
fn default_range_min() -> RuleId {
    100_000
}
fn default_range_max() -> RuleId {
    120_000
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            base_ref: default_base_ref(),
            id_range_min: default_range_min(),
            id_range_max: default_range_max(),
        }
    }
}

impl CheckConfig {
    /// Whether an identifier falls inside the recommended range.
    pub fn in_range(&self, id: RuleId) -> bool {
        (self.id_range_min..=self.id_range_max).contains(&id)
    }
}
