//! Rule condition errors.

use serde::Serialize;
use thiserror::Error;

/// Errors raised while compiling or evaluating a rule condition.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleError {
    /// Condition does not parse. Blocking: the rule is excluded.
    #[error("Syntax error at position {position}: {message}")]
    Syntax {
        /// Character offset of the offending token.
        position: usize,
        /// Description of the problem.
        message: String,
    },

    /// Condition failed against a specific entry. The rule is treated as
    /// non-matching for that entry.
    #[error("Evaluation error: {message}")]
    Evaluation {
        /// Description of the problem.
        message: String,
    },
}

impl RuleError {
    /// Creates a syntax error.
    pub fn syntax(position: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            position,
            message: message.into(),
        }
    }

    /// Creates an evaluation error.
    pub fn evaluation(message: impl Into<String>) -> Self {
        Self::Evaluation {
            message: message.into(),
        }
    }

    /// Returns the error code for structured output.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Syntax { .. } => "RULE_SYNTAX_ERROR",
            Self::Evaluation { .. } => "RULE_EVALUATION_ERROR",
        }
    }
}
