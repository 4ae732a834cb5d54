//! Exit codes and structured error reporting.

use serde::Serialize;

use crate::duplicates::FinderError;
use crate::manifest::ManifestError;

/// Process exit codes.
///
/// - 0: success
/// - 1: unexpected failure
/// - 2: usage error (bad undo target, no manifest to undo, bad scan root)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// The command completed.
    Success = 0,
    /// An unexpected error occurred.
    GeneralError = 1,
    /// The command was invoked with unusable arguments.
    UsageError = 2,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "MS000",
            Self::GeneralError => "MS001",
            Self::UsageError => "MS002",
        }
    }

    /// Classify an error bubbled up to `main`.
    #[must_use]
    pub fn for_error(err: &anyhow::Error) -> Self {
        let usage = err.chain().any(|cause| {
            cause
                .downcast_ref::<ManifestError>()
                .is_some_and(ManifestError::is_usage_error)
                || cause.downcast_ref::<FinderError>().is_some_and(|e| {
                    matches!(
                        e,
                        FinderError::PathNotFound(_) | FinderError::NotADirectory(_)
                    )
                })
        });

        if usage {
            Self::UsageError
        } else {
            Self::GeneralError
        }
    }
}

/// Structured error information for `--json-errors`.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "MS001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message, including causes
    pub message: String,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{err:#}"),
        }
    }
}
