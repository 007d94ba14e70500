//! Chart-of-accounts construction errors.

use thiserror::Error;

/// Errors raised while building an [`AccountHierarchy`](super::AccountHierarchy).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HierarchyError {
    /// Account code appears more than once.
    #[error("Duplicate account code: {0}")]
    DuplicateCode(String),

    /// Account code is blank.
    #[error("Account code cannot be empty")]
    EmptyCode,

    /// Level outside 1-4.
    #[error("Account {code} has invalid level {level}; levels must be between 1 and 4")]
    InvalidLevel {
        /// Account code.
        code: String,
        /// Offending level.
        level: u8,
    },

    /// Level-1 account declares a parent.
    #[error("Root account {code} cannot have a parent (found {parent})")]
    RootWithParent {
        /// Account code.
        code: String,
        /// Declared parent code.
        parent: String,
    },

    /// Non-root account has no parent.
    #[error("Account {code} at level {level} must have a parent")]
    MissingParent {
        /// Account code.
        code: String,
        /// Account level.
        level: u8,
    },

    /// Parent code does not exist.
    #[error("Account {code} references unknown parent {parent}")]
    ParentNotFound {
        /// Account code.
        code: String,
        /// Missing parent code.
        parent: String,
    },

    /// Parent is not exactly one level above the child.
    #[error("Account {code} at level {level} has parent {parent} at level {parent_level}")]
    LevelMismatch {
        /// Account code.
        code: String,
        /// Account level.
        level: u8,
        /// Parent code.
        parent: String,
        /// Parent level.
        parent_level: u8,
    },
}

impl HierarchyError {
    /// Returns the error code for structured output.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::DuplicateCode(_) => "DUPLICATE_ACCOUNT_CODE",
            Self::EmptyCode => "EMPTY_ACCOUNT_CODE",
            Self::InvalidLevel { .. } => "INVALID_ACCOUNT_LEVEL",
            Self::RootWithParent { .. } => "ROOT_WITH_PARENT",
            Self::MissingParent { .. } => "MISSING_PARENT",
            Self::ParentNotFound { .. } => "PARENT_NOT_FOUND",
            Self::LevelMismatch { .. } => "PARENT_LEVEL_MISMATCH",
        }
    }
}
