//! Error types for allOf merging.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::merge::checks::CheckName;

/// Stable, machine-readable error codes.
///
/// The serialized `kebab-case` strings are part of the public contract and
/// match the check names used in configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub enum ErrorCode {
    /// JSON (de)serialization error.
    JsonParseError,
    /// Two `type` keywords share no common type.
    IncompatibleTypes,
    /// `enum`/`const` candidate sets share no common value.
    IncompatibleEnum,
    /// Every branch of a combinator cross product is unsatisfiable.
    NoConsistentResolution,
    /// A lower bound ended up above its upper bound.
    IncompatibleBounds,
    /// A keyword pair was left unmerged (advisory only).
    ResidualFragment,
    /// Document nesting exceeded the configured depth.
    UnboundedRecursion,
}

impl From<CheckName> for ErrorCode {
    fn from(check: CheckName) -> Self {
        match check {
            CheckName::IncompatibleTypes => ErrorCode::IncompatibleTypes,
            CheckName::IncompatibleEnum => ErrorCode::IncompatibleEnum,
            CheckName::NoConsistentResolution => ErrorCode::NoConsistentResolution,
            CheckName::IncompatibleBounds => ErrorCode::IncompatibleBounds,
            CheckName::ResidualFragment => ErrorCode::ResidualFragment,
        }
    }
}

#[derive(Debug, Error)]
pub enum MergeError {
    #[error("JSON (de)serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Check '{check}' failed at {path}: {message}")]
    Check {
        check: CheckName,
        path: String,
        message: String,
    },

    #[error("Unbounded recursion at {path} (max depth: {max_depth})")]
    UnboundedRecursion { path: String, max_depth: usize },
}

impl MergeError {
    /// Returns the stable error code for this error variant.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            MergeError::Json(_) => ErrorCode::JsonParseError,
            MergeError::Check { check, .. } => (*check).into(),
            MergeError::UnboundedRecursion { .. } => ErrorCode::UnboundedRecursion,
        }
    }

    /// Returns the schema pointer the error was raised at, if any.
    pub fn path(&self) -> Option<&str> {
        match self {
            MergeError::Json(_) => None,
            MergeError::Check { path, .. } => Some(path),
            MergeError::UnboundedRecursion { path, .. } => Some(path),
        }
    }

    /// Returns the failed check, if this error is a check failure.
    pub fn check(&self) -> Option<CheckName> {
        match self {
            MergeError::Check { check, .. } => Some(*check),
            _ => None,
        }
    }

    /// Produces a structured JSON error.
    ///
    /// Format: `{"code": "...", "message": "...", "path": "..." | null}`
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "code": self.error_code(),
            "message": self.to_string(),
            "path": self.path(),
        })
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_code_serializes_kebab_case() {
        let json = serde_json::to_value(ErrorCode::NoConsistentResolution).unwrap();
        assert_eq!(json, json!("no-consistent-resolution"));
    }

    #[test]
    fn test_check_error_to_json() {
        let err = MergeError::Check {
            check: CheckName::IncompatibleTypes,
            path: "#/properties/a".to_string(),
            message: "no common type".to_string(),
        };

        let json = err.to_json();
        assert_eq!(json["code"], json!("incompatible-types"));
        assert_eq!(json["path"], json!("#/properties/a"));
        assert!(json["message"]
            .as_str()
            .unwrap()
            .contains("incompatible-types"));
    }

    #[test]
    fn test_recursion_error_code_and_path() {
        let err = MergeError::UnboundedRecursion {
            path: "#/items".to_string(),
            max_depth: 3,
        };
        assert_eq!(err.error_code(), ErrorCode::UnboundedRecursion);
        assert_eq!(err.path(), Some("#/items"));
        assert_eq!(err.check(), None);
        assert!(err.to_string().contains("max depth: 3"));
    }

    #[test]
    fn test_json_error_has_no_path() {
        let err: MergeError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert_eq!(err.error_code(), ErrorCode::JsonParseError);
        assert!(err.path().is_none());
    }
}
