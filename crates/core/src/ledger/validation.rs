//! Checks an application result against its source entry.

use std::collections::{BTreeMap, HashSet};

use ledgerflow_shared::types::within_tolerance;
use rust_decimal::Decimal;
use serde::Serialize;

use super::error::LedgerError;
use crate::hierarchy::AccountHierarchy;
use crate::journal::JournalEntry;
use crate::rules::{ApplicationResult, EntryIssueKind, LedgerType, Severity};

/// A posting-level problem, tagged with its source entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostingIssue {
    /// Source entry.
    pub entry_id: String,
    /// Severity.
    pub severity: Severity,
    /// Stable machine code.
    pub code: &'static str,
    /// Human-readable description.
    pub message: String,
    /// Structured details.
    #[serde(rename = "details")]
    pub error: LedgerError,
}

impl PostingIssue {
    /// Wraps a ledger error.
    #[must_use]
    pub fn new(entry_id: impl Into<String>, error: LedgerError) -> Self {
        Self {
            entry_id: entry_id.into(),
            severity: error.severity(),
            code: error.error_code(),
            message: error.to_string(),
            error,
        }
    }

    /// True for blocking issues.
    #[must_use]
    pub fn is_blocking(&self) -> bool {
        self.severity == Severity::Blocking
    }
}

/// Validates the postings produced for one entry.
///
/// - a no-match result must not carry postings
/// - every posting must reference the source entry
/// - unsplit postings carry the full source amount
/// - split postings on each side sum to the source amount within `tolerance`
/// - posting accounts should exist in the hierarchy, when one is supplied,
///   unless the applicator already reported the rule's account as unresolved
#[must_use]
pub fn validate_result(
    entry: &JournalEntry,
    result: &ApplicationResult,
    hierarchy: Option<&AccountHierarchy>,
    tolerance: Decimal,
) -> Vec<PostingIssue> {
    let mut errors = Vec::new();

    if result.no_match && !result.postings.is_empty() {
        errors.push(LedgerError::UnexpectedPostings {
            entry_id: entry.entry_id.clone(),
            count: result.postings.len(),
        });
    }

    let split_rules: HashSet<&str> = result
        .applied_rules
        .iter()
        .filter(|r| r.generates_multiple)
        .map(|r| r.rule_id.as_str())
        .collect();
    let unresolved_rules: HashSet<&str> = result
        .issues
        .iter()
        .filter(|i| i.kind == EntryIssueKind::UnresolvedAccount)
        .map(|i| i.rule_id.as_str())
        .collect();
    let expected = entry.amount.abs();
    let mut split_sums: BTreeMap<LedgerType, Decimal> = BTreeMap::new();

    for posting in &result.postings {
        if posting.source_entry_id != entry.entry_id {
            errors.push(LedgerError::SourceMismatch {
                posting_id: posting.entry_id.clone(),
                expected: entry.entry_id.clone(),
                found: posting.source_entry_id.clone(),
            });
        }

        if split_rules.contains(posting.rule_applied.as_str()) {
            *split_sums.entry(posting.ledger_type).or_default() += posting.amount;
        } else if !within_tolerance(posting.amount.abs(), expected, tolerance) {
            errors.push(LedgerError::AmountMismatch {
                posting_id: posting.entry_id.clone(),
                expected: entry.amount,
                actual: posting.amount,
            });
        }

        if let Some(hierarchy) = hierarchy
            && hierarchy.get_account(&posting.account_code).is_none()
            && !unresolved_rules.contains(posting.rule_applied.as_str())
        {
            errors.push(LedgerError::UnknownAccount {
                posting_id: posting.entry_id.clone(),
                account_code: posting.account_code.clone(),
            });
        }
    }

    for (ledger_type, actual) in split_sums {
        if !within_tolerance(actual.abs(), expected, tolerance) {
            errors.push(LedgerError::SplitAmountMismatch {
                entry_id: entry.entry_id.clone(),
                ledger_type,
                expected: entry.amount,
                actual,
            });
        }
    }

    errors
        .into_iter()
        .map(|e| PostingIssue::new(entry.entry_id.clone(), e))
        .collect()
}
