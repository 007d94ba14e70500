//! Rule application: journal entries in, ledger postings out.
//!
//! Semantics:
//! - rules are sorted once by priority (highest first, stable on ties)
//! - every matching rule produces a posting (all-match, not first-match)
//! - zero matches is reported as `no_match`, never as an error
//! - `generates_multiple` rules on the same ledger side split that side's amount

use ledgerflow_shared::config::{EngineConfig, NegativeAmountPolicy, UnresolvedAccountPolicy};
use rayon::prelude::*;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use super::evaluator::ConditionEvaluator;
use super::types::{LedgerType, MappingRule, Severity};
use crate::hierarchy::AccountHierarchy;
use crate::journal::JournalEntry;
use crate::ledger::LedgerEntry;

/// Minimum number of decimal places for split amounts.
const MIN_SPLIT_SCALE: u32 = 2;

/// Category of a per-entry issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryIssueKind {
    /// A rule condition failed at runtime; the rule was treated as non-matching.
    EvaluationError,
    /// A matching rule's account is not in the hierarchy.
    UnresolvedAccount,
}

/// A recoverable problem met while applying rules to one entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryIssue {
    /// Source entry.
    pub entry_id: String,
    /// Rule involved.
    pub rule_id: String,
    /// Issue category.
    pub kind: EntryIssueKind,
    /// Always a warning: the batch continues.
    pub severity: Severity,
    /// Human-readable description.
    pub message: String,
}

impl EntryIssue {
    fn warning(
        entry: &JournalEntry,
        rule: &MappingRule,
        kind: EntryIssueKind,
        message: String,
    ) -> Self {
        Self {
            entry_id: entry.entry_id.clone(),
            rule_id: rule.rule_id.clone(),
            kind,
            severity: Severity::Warning,
            message,
        }
    }

    /// Returns the error code for structured output.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self.kind {
            EntryIssueKind::EvaluationError => "RULE_EVALUATION_ERROR",
            EntryIssueKind::UnresolvedAccount => "UNRESOLVED_ACCOUNT",
        }
    }
}

/// Outcome of applying the rule set to one entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationResult {
    /// Source entry.
    pub entry_id: String,
    /// Postings produced, in rule priority order.
    pub postings: Vec<LedgerEntry>,
    /// Rules that produced postings.
    pub applied_rules: Vec<MappingRule>,
    /// True if no rule condition matched.
    pub no_match: bool,
    /// Recoverable problems.
    pub issues: Vec<EntryIssue>,
}

/// Matching rule with its resolved target.
struct Target<'r> {
    rule: &'r MappingRule,
    account_code: String,
    account_path: String,
    ledger_type: LedgerType,
}

/// Applies a validated rule set to journal entries.
#[derive(Debug, Clone)]
pub struct RuleApplicator {
    rules: Vec<MappingRule>,
    evaluator: ConditionEvaluator,
    unresolved_accounts: UnresolvedAccountPolicy,
    negative_amounts: NegativeAmountPolicy,
    parallel: bool,
}

impl RuleApplicator {
    /// Creates an applicator with default policies. Rules are sorted here,
    /// once, by descending priority.
    #[must_use]
    pub fn new(mut rules: Vec<MappingRule>, evaluator: ConditionEvaluator) -> Self {
        rules.sort_by(|a, b| b.priority.cmp(&a.priority));
        Self {
            rules,
            evaluator,
            unresolved_accounts: UnresolvedAccountPolicy::default(),
            negative_amounts: NegativeAmountPolicy::default(),
            parallel: false,
        }
    }

    /// Creates an applicator with policies taken from the engine config.
    #[must_use]
    pub fn from_config(
        rules: Vec<MappingRule>,
        evaluator: ConditionEvaluator,
        config: &EngineConfig,
    ) -> Self {
        Self::new(rules, evaluator)
            .with_unresolved_accounts(config.unresolved_accounts)
            .with_negative_amounts(config.negative_amounts)
            .with_parallel(config.parallel)
    }

    /// Sets the policy for accounts missing from the hierarchy.
    #[must_use]
    pub fn with_unresolved_accounts(mut self, policy: UnresolvedAccountPolicy) -> Self {
        self.unresolved_accounts = policy;
        self
    }

    /// Sets the policy for negative entry amounts.
    #[must_use]
    pub fn with_negative_amounts(mut self, policy: NegativeAmountPolicy) -> Self {
        self.negative_amounts = policy;
        self
    }

    /// Enables parallel batch application.
    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Rules in evaluation order.
    #[must_use]
    pub fn rules(&self) -> &[MappingRule] {
        &self.rules
    }

    /// Applies every matching rule to one entry.
    #[must_use]
    pub fn apply(
        &self,
        entry: &JournalEntry,
        hierarchy: Option<&AccountHierarchy>,
    ) -> ApplicationResult {
        let mut issues = Vec::new();
        let mut matched = Vec::new();

        for rule in &self.rules {
            match self.evaluator.evaluate(rule, entry) {
                Ok(true) => matched.push(rule),
                Ok(false) => {}
                Err(err) => {
                    tracing::debug!(
                        entry_id = %entry.entry_id,
                        rule_id = %rule.rule_id,
                        error = %err,
                        "Rule evaluation failed, treated as non-matching"
                    );
                    issues.push(EntryIssue::warning(
                        entry,
                        rule,
                        EntryIssueKind::EvaluationError,
                        err.to_string(),
                    ));
                }
            }
        }

        if matched.is_empty() {
            tracing::debug!(entry_id = %entry.entry_id, "No rule matched entry");
            return ApplicationResult {
                entry_id: entry.entry_id.clone(),
                postings: Vec::new(),
                applied_rules: Vec::new(),
                no_match: true,
                issues,
            };
        }

        let reversed = self.negative_amounts == NegativeAmountPolicy::Reverse
            && entry.amount < Decimal::ZERO;
        let amount = if reversed {
            entry.amount.abs()
        } else {
            entry.amount
        };

        let mut targets = Vec::with_capacity(matched.len());
        for rule in matched {
            let Some((account_code, account_path)) =
                self.resolve_account(entry, rule, hierarchy, &mut issues)
            else {
                continue;
            };
            let ledger_type = if reversed {
                rule.ledger_type.opposite()
            } else {
                rule.ledger_type
            };
            targets.push(Target {
                rule,
                account_code,
                account_path,
                ledger_type,
            });
        }

        let amounts = allocate(amount, &targets);
        let quarter = entry.effective_quarter();

        let postings = targets
            .iter()
            .zip(amounts)
            .map(|(target, amount)| LedgerEntry {
                entry_id: LedgerEntry::posting_id(&entry.entry_id, &target.rule.rule_id),
                account_code: target.account_code.clone(),
                account_path: target.account_path.clone(),
                amount,
                date: entry.date,
                description: entry.description.clone(),
                source_entry_id: entry.entry_id.clone(),
                rule_applied: target.rule.rule_id.clone(),
                quarter,
                year: entry.year,
                ledger_type: target.ledger_type,
            })
            .collect();

        ApplicationResult {
            entry_id: entry.entry_id.clone(),
            postings,
            applied_rules: targets.iter().map(|t| t.rule.clone()).collect(),
            no_match: false,
            issues,
        }
    }

    /// Resolves a rule's account to `(code, path)`. `None` means the rule is
    /// skipped for this entry.
    fn resolve_account(
        &self,
        entry: &JournalEntry,
        rule: &MappingRule,
        hierarchy: Option<&AccountHierarchy>,
        issues: &mut Vec<EntryIssue>,
    ) -> Option<(String, String)> {
        let Some(hierarchy) = hierarchy else {
            return Some((rule.account_code.clone(), rule.account_code.clone()));
        };

        if let Some(account) = hierarchy.resolve(&rule.account_code) {
            return Some((account.code.clone(), account.full_path.clone()));
        }

        tracing::warn!(
            entry_id = %entry.entry_id,
            rule_id = %rule.rule_id,
            account_code = %rule.account_code,
            policy = ?self.unresolved_accounts,
            "Account not found in hierarchy"
        );

        match self.unresolved_accounts {
            UnresolvedAccountPolicy::Skip => {
                issues.push(EntryIssue::warning(
                    entry,
                    rule,
                    EntryIssueKind::UnresolvedAccount,
                    format!(
                        "Account {} not found in hierarchy; rule skipped",
                        rule.account_code
                    ),
                ));
                None
            }
            UnresolvedAccountPolicy::RawCode => {
                issues.push(EntryIssue::warning(
                    entry,
                    rule,
                    EntryIssueKind::UnresolvedAccount,
                    format!(
                        "Account {} not found in hierarchy; raw code used as path",
                        rule.account_code
                    ),
                ));
                Some((rule.account_code.clone(), rule.account_code.clone()))
            }
        }
    }

    /// Applies the rule set to every entry, one result per entry in input
    /// order. Uses rayon when parallel application is enabled.
    #[must_use]
    pub fn apply_batch(
        &self,
        entries: &[JournalEntry],
        hierarchy: Option<&AccountHierarchy>,
    ) -> Vec<ApplicationResult> {
        let results: Vec<ApplicationResult> = if self.parallel {
            entries
                .par_iter()
                .map(|entry| self.apply(entry, hierarchy))
                .collect()
        } else {
            entries
                .iter()
                .map(|entry| self.apply(entry, hierarchy))
                .collect()
        };

        tracing::debug!(
            entries = entries.len(),
            postings = results.iter().map(|r| r.postings.len()).sum::<usize>(),
            unmatched = results.iter().filter(|r| r.no_match).count(),
            parallel = self.parallel,
            "Applied rules to batch"
        );
        results
    }
}

/// Per-target amounts. Unsplit targets get the full amount; split targets
/// on the same side share it by weight using the Largest Remainder Method,
/// so every share keeps the sign of `amount` and the side sums exactly to it.
fn allocate(amount: Decimal, targets: &[Target<'_>]) -> Vec<Decimal> {
    let mut amounts = vec![amount; targets.len()];

    for side in [LedgerType::Credit, LedgerType::Debit] {
        let members: Vec<(usize, Decimal)> = targets
            .iter()
            .enumerate()
            .filter(|(_, t)| t.rule.generates_multiple && t.ledger_type == side)
            .map(|(i, t)| {
                let weight = t.rule.effective_split_weight();
                (i, if weight > Decimal::ZERO { weight } else { Decimal::ONE })
            })
            .collect();
        if members.is_empty() {
            continue;
        }

        let weights: Vec<Decimal> = members.iter().map(|(_, w)| *w).collect();
        for ((index, _), share) in members.iter().zip(split_by_weight(amount, &weights)) {
            amounts[*index] = share;
        }
    }

    amounts
}

/// Splits `amount` by `weights` at `max(scale, 2)` decimal places.
///
/// Works on the magnitude: every share is rounded toward zero, then the
/// leftover units go one at a time to the largest fractional remainders
/// (earlier shares win ties). The sign is restored at the end.
fn split_by_weight(amount: Decimal, weights: &[Decimal]) -> Vec<Decimal> {
    let scale = amount.scale().max(MIN_SPLIT_SCALE);
    let unit = Decimal::new(1, scale);
    let magnitude = amount.abs();
    let total_weight: Decimal = weights.iter().copied().sum();

    let exact: Vec<Decimal> = weights
        .iter()
        .map(|w| {
            magnitude
                .checked_mul(*w)
                .and_then(|v| v.checked_div(total_weight))
                .unwrap_or(Decimal::ZERO)
        })
        .collect();
    let mut shares: Vec<Decimal> = exact
        .iter()
        .map(|e| e.round_dp_with_strategy(scale, RoundingStrategy::ToZero))
        .collect();

    let allocated: Decimal = shares.iter().copied().sum();
    let leftover_units = ((magnitude - allocated) / unit)
        .round_dp_with_strategy(0, RoundingStrategy::ToZero)
        .to_usize()
        .unwrap_or(0);

    let mut remainders: Vec<(usize, Decimal)> = exact
        .iter()
        .zip(&shares)
        .enumerate()
        .map(|(i, (e, r))| (i, *e - *r))
        .collect();
    remainders.sort_by(|a, b| b.1.cmp(&a.1));
    for (index, _) in remainders.into_iter().take(leftover_units) {
        shares[index] += unit;
    }

    if amount.is_sign_negative() {
        for share in shares.iter_mut().filter(|s| !s.is_zero()) {
            *share = -*share;
        }
    }
    shares
}
