//! Pipeline error types.

use ledgerflow_shared::AppError;
use thiserror::Error;

/// Conditions that stop a processing run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// Every supplied rule was rejected, or none were supplied.
    #[error("No valid rules to apply ({total_rules} supplied, {blocking_issues} blocking issues)")]
    NoValidRules {
        /// Number of rules supplied.
        total_rules: usize,
        /// Number of blocking issues raised by validation.
        blocking_issues: usize,
    },
}

impl PipelineError {
    /// Returns the error code for structured output.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NoValidRules { .. } => "NO_VALID_RULES",
        }
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        Self::Validation(err.to_string())
    }
}
