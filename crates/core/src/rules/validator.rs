//! Static validation of a rule set before it is trusted.
//!
//! Checks, in order, for each rule:
//! 1. Schema: non-empty id/condition/account, priority >= 1, positive split weight
//! 2. Duplicate rule id
//! 3. Condition syntax
//! 4. Field references against the journal entry fields
//! 5. At least one of `old_type` / `new_type`
//! 6. Account existence (only with a hierarchy)
//!
//! Then conflict detection over the rules that passed.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use ledgerflow_shared::config::ValidationLevel;
use serde::{Deserialize, Serialize};

use super::evaluator::ConditionEvaluator;
use super::types::{LedgerType, MappingRule, Severity};
use crate::hierarchy::AccountHierarchy;
use crate::journal::ENTRY_FIELDS;

/// Category of a rule issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleIssueKind {
    /// Malformed rule fields.
    Schema,
    /// Rule id used by an earlier rule.
    DuplicateRuleId,
    /// Condition does not parse.
    Syntax,
    /// Condition references a field entries do not have.
    UnknownField,
    /// Neither `old_type` nor `new_type` is set.
    MissingType,
    /// Account code not found in the hierarchy.
    UnknownAccount,
    /// Same condition, priority and side routed to different accounts.
    Conflict,
}

/// A problem found in the rule set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleIssue {
    /// Issue category.
    pub kind: RuleIssueKind,
    /// Whether the rule is excluded.
    pub severity: Severity,
    /// Rules involved (one, except for conflicts).
    pub rule_ids: Vec<String>,
    /// Human-readable description.
    pub message: String,
}

impl RuleIssue {
    fn blocking(kind: RuleIssueKind, rule_id: &str, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: Severity::Blocking,
            rule_ids: vec![rule_id.to_string()],
            message: message.into(),
        }
    }

    /// Returns true if the issue excludes its rules.
    #[must_use]
    pub fn is_blocking(&self) -> bool {
        self.severity == Severity::Blocking
    }

    /// Returns the error code for structured output.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self.kind {
            RuleIssueKind::Schema => "RULE_SCHEMA_ERROR",
            RuleIssueKind::DuplicateRuleId => "DUPLICATE_RULE_ID",
            RuleIssueKind::Syntax => "RULE_SYNTAX_ERROR",
            RuleIssueKind::UnknownField => "UNKNOWN_FIELD",
            RuleIssueKind::MissingType => "MISSING_TYPE",
            RuleIssueKind::UnknownAccount => "UNKNOWN_ACCOUNT",
            RuleIssueKind::Conflict => "RULE_CONFLICT",
        }
    }
}

/// Outcome of validating a rule set.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RuleValidation {
    /// Rules safe to apply, in input order.
    pub valid_rules: Vec<MappingRule>,
    /// Every issue found.
    pub issues: Vec<RuleIssue>,
}

impl RuleValidation {
    /// Number of blocking issues.
    #[must_use]
    pub fn blocking_count(&self) -> usize {
        self.issues.iter().filter(|i| i.is_blocking()).count()
    }

    /// Number of warnings.
    #[must_use]
    pub fn warning_count(&self) -> usize {
        self.issues.len() - self.blocking_count()
    }

    /// Conflict issues only.
    pub fn conflicts(&self) -> impl Iterator<Item = &RuleIssue> {
        self.issues
            .iter()
            .filter(|i| i.kind == RuleIssueKind::Conflict)
    }
}

/// Validates rule sets against the condition grammar, the entry schema and
/// an optional chart of accounts.
#[derive(Debug, Clone)]
pub struct RuleValidator<'a> {
    evaluator: ConditionEvaluator,
    hierarchy: Option<&'a AccountHierarchy>,
    level: ValidationLevel,
}

impl<'a> RuleValidator<'a> {
    /// Creates a lenient validator without a hierarchy.
    ///
    /// Conditions are compiled through `evaluator`, so its cache is warm for
    /// the applicator afterwards.
    #[must_use]
    pub fn new(evaluator: ConditionEvaluator) -> Self {
        Self {
            evaluator,
            hierarchy: None,
            level: ValidationLevel::default(),
        }
    }

    /// Checks account codes against `hierarchy`.
    #[must_use]
    pub fn with_hierarchy(mut self, hierarchy: Option<&'a AccountHierarchy>) -> Self {
        self.hierarchy = hierarchy;
        self
    }

    /// Sets the strictness for warning-level checks.
    #[must_use]
    pub fn with_level(mut self, level: ValidationLevel) -> Self {
        self.level = level;
        self
    }

    /// Validates a rule set.
    #[must_use]
    pub fn validate(&self, rules: &[MappingRule]) -> RuleValidation {
        let mut issues = Vec::new();
        let mut candidates = Vec::with_capacity(rules.len());
        let mut seen_ids: HashSet<&str> = HashSet::with_capacity(rules.len());

        for rule in rules {
            let rule_issues = self.check_rule(rule, &mut seen_ids);
            let blocked = rule_issues.iter().any(RuleIssue::is_blocking);
            issues.extend(rule_issues);
            if !blocked {
                candidates.push(rule);
            }
        }

        let conflicts = detect_conflicts(&candidates);
        let conflicted: HashSet<&str> = conflicts
            .iter()
            .flat_map(|c| c.rule_ids.iter().map(String::as_str))
            .collect();
        for conflict in &conflicts {
            tracing::warn!(rule_ids = ?conflict.rule_ids, "{}", conflict.message);
        }

        let valid_rules: Vec<MappingRule> = candidates
            .into_iter()
            .filter(|r| !conflicted.contains(r.rule_id.as_str()))
            .cloned()
            .collect();
        issues.extend(conflicts);

        tracing::debug!(
            total = rules.len(),
            valid = valid_rules.len(),
            issues = issues.len(),
            "Rule set validated"
        );

        RuleValidation {
            valid_rules,
            issues,
        }
    }

    fn check_rule<'r>(
        &self,
        rule: &'r MappingRule,
        seen_ids: &mut HashSet<&'r str>,
    ) -> Vec<RuleIssue> {
        let id = rule.rule_id.as_str();

        let schema = schema_issues(rule);
        if !schema.is_empty() {
            return schema;
        }

        if !seen_ids.insert(id) {
            return vec![RuleIssue::blocking(
                RuleIssueKind::DuplicateRuleId,
                id,
                format!("Rule id {id} is already used by an earlier rule"),
            )];
        }

        let mut issues = Vec::new();

        match self.evaluator.compile(rule) {
            Err(err) => {
                return vec![RuleIssue::blocking(
                    RuleIssueKind::Syntax,
                    id,
                    format!("Invalid condition syntax: {err}"),
                )];
            }
            Ok(()) => {
                let unknown: Vec<String> = ConditionEvaluator::referenced_fields(&rule.condition)
                    .unwrap_or_default()
                    .into_iter()
                    .filter(|f| !ENTRY_FIELDS.contains(&f.as_str()))
                    .collect();
                if !unknown.is_empty() {
                    issues.push(RuleIssue::blocking(
                        RuleIssueKind::UnknownField,
                        id,
                        format!(
                            "Unknown field(s) in condition: {}. Valid fields: {}",
                            unknown.join(", "),
                            ENTRY_FIELDS.join(", ")
                        ),
                    ));
                }
            }
        }

        if !rule.has_type_hint() {
            issues.push(RuleIssue::blocking(
                RuleIssueKind::MissingType,
                id,
                "Rule must declare old_type or new_type",
            ));
        }

        if let Some(hierarchy) = self.hierarchy
            && hierarchy.resolve(&rule.account_code).is_none()
        {
            let severity = match self.level {
                ValidationLevel::Strict => Severity::Blocking,
                ValidationLevel::Lenient => Severity::Warning,
            };
            issues.push(RuleIssue {
                kind: RuleIssueKind::UnknownAccount,
                severity,
                rule_ids: vec![id.to_string()],
                message: format!(
                    "Account code {} not found in account hierarchy",
                    rule.account_code
                ),
            });
        }

        issues
    }
}

fn schema_issues(rule: &MappingRule) -> Vec<RuleIssue> {
    let id = rule.rule_id.as_str();
    let mut problems = Vec::new();

    if id.trim().is_empty() {
        problems.push("rule_id cannot be empty".to_string());
    }
    if rule.condition.trim().is_empty() {
        problems.push("condition cannot be empty".to_string());
    }
    if rule.account_code.trim().is_empty() {
        problems.push("account_code cannot be empty".to_string());
    }
    if rule.priority < 1 {
        problems.push(format!("priority must be at least 1, got {}", rule.priority));
    }
    if let Some(weight) = rule.split_weight
        && weight <= rust_decimal::Decimal::ZERO
    {
        problems.push(format!("split_weight must be positive, got {weight}"));
    }

    problems
        .into_iter()
        .map(|p| RuleIssue::blocking(RuleIssueKind::Schema, id, p))
        .collect()
}

/// Finds rules sharing normalized condition, priority and ledger side but
/// routing to different accounts. One issue per ambiguous group.
fn detect_conflicts(rules: &[&MappingRule]) -> Vec<RuleIssue> {
    let mut groups: BTreeMap<(String, i32, LedgerType), Vec<&MappingRule>> = BTreeMap::new();
    for rule in rules {
        groups
            .entry((rule.normalized_condition(), rule.priority, rule.ledger_type))
            .or_default()
            .push(rule);
    }

    groups
        .into_iter()
        .filter_map(|((condition, priority, ledger_type), members)| {
            let accounts: BTreeSet<&str> =
                members.iter().map(|r| r.account_code.as_str()).collect();
            if accounts.len() < 2 {
                return None;
            }
            let rule_ids: Vec<String> = members.iter().map(|r| r.rule_id.clone()).collect();
            Some(RuleIssue {
                kind: RuleIssueKind::Conflict,
                severity: Severity::Blocking,
                message: format!(
                    "Rules {} share condition '{condition}' at priority {priority} ({ledger_type}) \
                     but map to different accounts: {}",
                    rule_ids.join(", "),
                    accounts.into_iter().collect::<Vec<_>>().join(", ")
                ),
                rule_ids,
            })
        })
        .collect()
}
