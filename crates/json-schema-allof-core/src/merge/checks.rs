//! Named checks run against every merge step.
//!
//! A merge step records a [`CheckFailure`] for each conflict it detects and
//! always produces a best-effort value. [`settle`] then walks the configured
//! checks in order: the first configured fatal check with a recorded
//! conflict aborts the step; configured advisory checks are returned to the
//! caller; conflicts whose check is not configured are resolved silently.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::MergeOptions;
use crate::error::MergeError;

/// Names of the checks a [`Merger`](crate::Merger) can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CheckName {
    /// `type` keywords with no common type.
    IncompatibleTypes,
    /// `enum`/`const` sets with no common value.
    IncompatibleEnum,
    /// A `oneOf`/`anyOf` cross product where every pair is unsatisfiable.
    NoConsistentResolution,
    /// A lower bound above its upper bound after tightening.
    IncompatibleBounds,
    /// A keyword pair left as a residual `allOf` fragment. Advisory only.
    ResidualFragment,
}

impl CheckName {
    /// Every check, in default evaluation order.
    pub const ALL: &'static [CheckName] = &[
        CheckName::IncompatibleTypes,
        CheckName::IncompatibleEnum,
        CheckName::NoConsistentResolution,
        CheckName::IncompatibleBounds,
        CheckName::ResidualFragment,
    ];

    /// Whether a failure of this check aborts the merge step.
    pub fn is_fatal(self) -> bool {
        !matches!(self, CheckName::ResidualFragment)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CheckName::IncompatibleTypes => "incompatible-types",
            CheckName::IncompatibleEnum => "incompatible-enum",
            CheckName::NoConsistentResolution => "no-consistent-resolution",
            CheckName::IncompatibleBounds => "incompatible-bounds",
            CheckName::ResidualFragment => "residual-fragment",
        }
    }
}

impl fmt::Display for CheckName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A conflict detected during a merge step.
///
/// Returned in [`MergeResult::advisories`](crate::MergeResult) when the
/// check is advisory, or when deep merge passed a failing subtree through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckFailure {
    pub check: CheckName,
    /// Schema pointer of the node being merged.
    pub path: String,
    pub message: String,
}

impl CheckFailure {
    pub fn new(check: CheckName, path: &str, message: impl Into<String>) -> Self {
        Self {
            check,
            path: path.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn into_error(self) -> MergeError {
        MergeError::Check {
            check: self.check,
            path: self.path,
            message: self.message,
        }
    }
}

/// Evaluate the configured checks against the conflicts of one merge step.
///
/// Returns the advisories to surface, or the first fatal failure.
pub(crate) fn settle(
    options: &MergeOptions,
    mut conflicts: Vec<CheckFailure>,
) -> Result<Vec<CheckFailure>, MergeError> {
    if conflicts.is_empty() {
        return Ok(Vec::new());
    }

    for check in &options.checks {
        if !check.is_fatal() {
            continue;
        }
        if let Some(pos) = conflicts.iter().position(|c| c.check == *check) {
            return Err(conflicts.swap_remove(pos).into_error());
        }
    }

    let mut advisories = Vec::new();
    for conflict in conflicts {
        if !options.is_enabled(conflict.check) {
            tracing::debug!(
                check = %conflict.check,
                path = %conflict.path,
                "check disabled, keeping best-effort result"
            );
        } else {
            advisories.push(conflict);
        }
    }
    Ok(advisories)
}
