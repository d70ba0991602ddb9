//! Configuration for allOf merging.

use serde::{Deserialize, Serialize};

use crate::error::MergeError;
use crate::merge::checks::CheckName;

/// What a deep merge does when merging one subtree fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Stop and surface the failure with its schema path (default).
    #[default]
    Abort,
    /// Leave the failing subtree untouched and record an advisory.
    PassThrough,
}

/// Options for a [`Merger`](crate::Merger).
///
/// ## Serialization Format
///
/// Fields are serialized in `kebab-case` (e.g., `max-depth`, `on-failure`),
/// and check names use the same kebab-case strings as [`ErrorCode`](crate::ErrorCode).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct MergeOptions {
    /// Ordered checks run against every merge step. An empty list disables
    /// validation entirely (best-effort mode).
    pub checks: Vec<CheckName>,
    /// Maximum nesting depth for traversal and recursive keyword merges.
    pub max_depth: usize,
    /// Deep-merge behavior when a subtree fails.
    pub on_failure: FailurePolicy,
}

impl MergeOptions {
    /// Options with every check disabled.
    ///
    /// Merges never raise a check failure in this mode, even for
    /// contradictory inputs; the output may accept values the inputs reject.
    pub fn best_effort() -> Self {
        Self {
            checks: Vec::new(),
            ..Self::default()
        }
    }

    /// Parse options from a JSON document such as a config file.
    ///
    /// Missing fields fall back to their defaults; unknown check names are
    /// rejected.
    pub fn from_json(json: &str) -> Result<Self, MergeError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Whether `check` is configured.
    pub fn is_enabled(&self, check: CheckName) -> bool {
        self.checks.contains(&check)
    }
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            checks: CheckName::ALL.to_vec(),
            max_depth: 50,
            on_failure: FailurePolicy::Abort,
        }
    }
}
