//! Journal entry validation errors.

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

/// Reasons a journal entry is rejected before rule application.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JournalError {
    /// A required text field is blank.
    #[error("Entry {entry_id}: field '{field}' cannot be empty")]
    EmptyField {
        /// Entry identifier (may itself be empty).
        entry_id: String,
        /// Field name.
        field: &'static str,
    },

    /// Year outside the supported range.
    #[error("Entry {entry_id}: year {year} is outside {min}-{max}")]
    YearOutOfRange {
        /// Entry identifier.
        entry_id: String,
        /// Offending year.
        year: i32,
        /// Lowest accepted year.
        min: i32,
        /// Highest accepted year.
        max: i32,
    },

    /// Explicit quarter outside 1-4.
    #[error("Entry {entry_id}: quarter {quarter} must be between 1 and 4")]
    InvalidQuarter {
        /// Entry identifier.
        entry_id: String,
        /// Offending quarter.
        quarter: u8,
    },

    /// Explicit quarter disagrees with the entry date.
    #[error("Entry {entry_id}: quarter {quarter} does not match date (expected Q{expected})")]
    QuarterDateMismatch {
        /// Entry identifier.
        entry_id: String,
        /// Declared quarter.
        quarter: u8,
        /// Quarter derived from the date.
        expected: u8,
    },

    /// Amount magnitude above the accepted ceiling.
    #[error("Entry {entry_id}: amount {amount} exceeds the limit of {max}")]
    AmountOutOfRange {
        /// Entry identifier.
        entry_id: String,
        /// Offending amount.
        amount: Decimal,
        /// Largest accepted magnitude.
        max: Decimal,
    },

    /// Entry id already used by an earlier entry.
    #[error("Duplicate entry id: {entry_id}")]
    DuplicateEntryId {
        /// Entry identifier.
        entry_id: String,
    },
}

impl JournalError {
    /// Returns the error code for structured output.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyField { .. } => "EMPTY_FIELD",
            Self::YearOutOfRange { .. } => "YEAR_OUT_OF_RANGE",
            Self::InvalidQuarter { .. } => "INVALID_QUARTER",
            Self::QuarterDateMismatch { .. } => "QUARTER_DATE_MISMATCH",
            Self::AmountOutOfRange { .. } => "AMOUNT_OUT_OF_RANGE",
            Self::DuplicateEntryId { .. } => "DUPLICATE_ENTRY_ID",
        }
    }

    /// Identifier of the rejected entry.
    #[must_use]
    pub fn entry_id(&self) -> &str {
        match self {
            Self::EmptyField { entry_id, .. }
            | Self::YearOutOfRange { entry_id, .. }
            | Self::InvalidQuarter { entry_id, .. }
            | Self::QuarterDateMismatch { entry_id, .. }
            | Self::AmountOutOfRange { entry_id, .. }
            | Self::DuplicateEntryId { entry_id } => entry_id,
        }
    }
}
