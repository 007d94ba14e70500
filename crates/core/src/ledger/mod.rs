//! Ledger postings.
//!
//! This module implements:
//! - The posting type produced by rule application
//! - Result-level validation (source references, amount preservation)
//! - Error types for posting checks

pub mod error;
pub mod posting;
pub mod validation;

pub use error::LedgerError;
pub use posting::LedgerEntry;
pub use validation::{PostingIssue, validate_result};
