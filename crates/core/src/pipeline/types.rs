//! Pipeline input and report types.

use std::collections::BTreeMap;

use ledgerflow_shared::types::RunId;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::aggregation::{HierarchicalTotals, QuarterlyAggregation, TotalsMismatch, YearlySummary};
use crate::hierarchy::AccountHierarchy;
use crate::journal::{JournalEntry, JournalError, TypeMapping};
use crate::ledger::{LedgerEntry, PostingIssue};
use crate::rules::{ApplicationResult, MappingRule, RuleIssue};

/// Everything one run consumes.
#[derive(Debug, Clone, Default)]
pub struct ProcessingInput {
    /// Journal entries, in source order.
    pub entries: Vec<JournalEntry>,
    /// Candidate mapping rules.
    pub rules: Vec<MappingRule>,
    /// Optional chart of accounts.
    pub hierarchy: Option<AccountHierarchy>,
    /// Optional `(year, old_type) -> new_type` table.
    pub type_mapping: Option<TypeMapping>,
}

/// Counts and amounts describing a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProcessingSummary {
    /// Entries supplied.
    pub total_entries: usize,
    /// Entries that passed validation and were processed.
    pub valid_entries: usize,
    /// Entries rejected by validation.
    pub rejected_entries: usize,
    /// Rules supplied.
    pub total_rules: usize,
    /// Rules applied after validation.
    pub active_rules: usize,
    /// Entries matched by at least one rule.
    pub matched_entries: usize,
    /// Entries no rule matched.
    pub unmatched_entries: usize,
    /// Postings generated.
    pub postings: usize,
    /// Blocking rule issues.
    pub blocking_rule_issues: usize,
    /// Warning rule issues.
    pub warning_rule_issues: usize,
    /// Recoverable issues raised while applying rules.
    pub application_issues: usize,
    /// Posting validation issues.
    pub posting_issues: usize,
    /// Hierarchy totals mismatches.
    pub totals_mismatches: usize,
    /// Sum of credit postings.
    pub total_cr: Decimal,
    /// Sum of debit postings.
    pub total_dr: Decimal,
    /// `total_cr - total_dr`.
    pub net: Decimal,
}

/// Output of one processing run.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessingReport {
    /// Run identifier for the audit trail.
    pub run_id: RunId,
    /// Every posting, in entry then rule-priority order.
    pub postings: Vec<LedgerEntry>,
    /// Per-entry application outcome, in entry order.
    pub results: Vec<ApplicationResult>,
    /// Entries no rule matched.
    pub unmatched_entries: Vec<JournalEntry>,
    /// Direct per-account quarterly aggregates.
    pub aggregates: Vec<QuarterlyAggregation>,
    /// Aggregates with descendant activity rolled into ancestors.
    pub rolled_up: Vec<QuarterlyAggregation>,
    /// Rolled-up totals per level and quarter.
    pub level_totals: BTreeMap<u8, Vec<HierarchicalTotals>>,
    /// Rolled-up totals per account and year.
    pub yearly: Vec<YearlySummary>,
    /// Rule validation issues.
    pub rule_issues: Vec<RuleIssue>,
    /// Rejected journal entries.
    pub entry_issues: Vec<JournalError>,
    /// Posting validation issues.
    pub posting_issues: Vec<PostingIssue>,
    /// Hierarchy totals mismatches.
    pub totals_issues: Vec<TotalsMismatch>,
    /// Run summary.
    pub summary: ProcessingSummary,
}

impl ProcessingReport {
    /// True when any rule or posting issue blocks trust in the output.
    #[must_use]
    pub fn has_blocking_issues(&self) -> bool {
        self.rule_issues.iter().any(RuleIssue::is_blocking)
            || self.posting_issues.iter().any(PostingIssue::is_blocking)
    }
}
