//! Mapping rules: condition language, validation and application.
//!
//! This module implements:
//! - Rule and ledger side types
//! - The condition language (parser and tree-walking evaluator)
//! - A condition evaluator with a per-instance compiled cache
//! - Static rule set validation, including conflict detection
//! - Rule application producing ledger postings

pub mod applicator;
pub mod condition;
pub mod error;
pub mod evaluator;
pub mod types;
pub mod validator;

#[cfg(test)]
mod applicator_props;
#[cfg(test)]
mod validator_props;

pub use applicator::{ApplicationResult, EntryIssue, EntryIssueKind, RuleApplicator};
pub use error::RuleError;
pub use evaluator::{ConditionEvaluator, DEFAULT_CACHE_CAPACITY};
pub use types::{LedgerType, MappingRule, Severity};
pub use validator::{RuleIssue, RuleIssueKind, RuleValidation, RuleValidator};
