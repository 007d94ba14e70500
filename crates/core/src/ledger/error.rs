//! Posting validation errors.

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use crate::rules::{LedgerType, Severity};

/// Problems found when checking an application result against its source entry.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LedgerError {
    /// Result flagged as no-match still carries postings.
    #[error("Entry {entry_id} is marked no-match but has {count} posting(s)")]
    UnexpectedPostings {
        /// Source entry.
        entry_id: String,
        /// Number of postings found.
        count: usize,
    },

    /// Posting does not point back at its source entry.
    #[error("Posting {posting_id} references source {found}, expected {expected}")]
    SourceMismatch {
        /// Posting id.
        posting_id: String,
        /// Source entry id.
        expected: String,
        /// Source id on the posting.
        found: String,
    },

    /// Unsplit posting amount differs from the source amount.
    #[error("Posting {posting_id} amount {actual} does not match source amount {expected}")]
    AmountMismatch {
        /// Posting id.
        posting_id: String,
        /// Source amount.
        expected: Decimal,
        /// Posted amount.
        actual: Decimal,
    },

    /// Split postings on one side do not add up to the source amount.
    #[error(
        "Split postings for entry {entry_id} ({ledger_type}) sum to {actual}, expected {expected}"
    )]
    SplitAmountMismatch {
        /// Source entry.
        entry_id: String,
        /// Ledger side.
        ledger_type: LedgerType,
        /// Source amount.
        expected: Decimal,
        /// Sum of split postings.
        actual: Decimal,
    },

    /// Posting account is not in the hierarchy.
    #[error("Posting {posting_id} uses account {account_code} not found in hierarchy")]
    UnknownAccount {
        /// Posting id.
        posting_id: String,
        /// Account code.
        account_code: String,
    },
}

impl LedgerError {
    /// Returns the error code for structured output.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::UnexpectedPostings { .. } => "UNEXPECTED_POSTINGS",
            Self::SourceMismatch { .. } => "SOURCE_MISMATCH",
            Self::AmountMismatch { .. } => "AMOUNT_MISMATCH",
            Self::SplitAmountMismatch { .. } => "SPLIT_AMOUNT_MISMATCH",
            Self::UnknownAccount { .. } => "UNKNOWN_ACCOUNT",
        }
    }

    /// Severity of the problem.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        match self {
            Self::UnexpectedPostings { .. } | Self::SourceMismatch { .. } => Severity::Blocking,
            Self::AmountMismatch { .. }
            | Self::SplitAmountMismatch { .. }
            | Self::UnknownAccount { .. } => Severity::Warning,
        }
    }
}
