//! Property-based tests for rule conflict detection.
//!
//! Feature: rule-validation, Property 1: Conflict detection

use proptest::prelude::*;

use super::evaluator::ConditionEvaluator;
use super::types::MappingRule;
use super::validator::{RuleIssueKind, RuleValidator};

fn rule(id: &str, condition: &str, account: &str, priority: i32) -> MappingRule {
    MappingRule::new(id, condition, account, priority).with_old_type("OL")
}

/// Strategy for a condition from a small pool so collisions are common.
fn condition_strategy() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just(r#"old_type == "OL""#),
        Just("amount > 100"),
        Just("year == 2024 and quarter == 1"),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property 1.1: Same condition and priority with different accounts is
    /// exactly one conflict naming both rules.
    #[test]
    fn prop_same_priority_conflicts(
        condition in condition_strategy(),
        priority in 1i32..100,
        padding in "[ ]{0,3}",
    ) {
        let padded = format!("{padding}{condition}{padding}");
        let result = RuleValidator::new(ConditionEvaluator::new()).validate(&[
            rule("A", condition, "A1", priority),
            rule("B", &padded, "B2", priority),
        ]);
        let conflicts: Vec<_> = result.conflicts().collect();

        prop_assert_eq!(conflicts.len(), 1);
        prop_assert_eq!(&conflicts[0].rule_ids, &vec!["A".to_string(), "B".to_string()]);
        prop_assert!(result.valid_rules.is_empty());
    }

    /// Property 1.2: Different priorities never conflict.
    #[test]
    fn prop_different_priorities_never_conflict(
        condition in condition_strategy(),
        p1 in 1i32..50,
        delta in 1i32..50,
    ) {
        let result = RuleValidator::new(ConditionEvaluator::new()).validate(&[
            rule("A", condition, "A1", p1),
            rule("B", condition, "B2", p1 + delta),
        ]);

        prop_assert!(result.issues.iter().all(|i| i.kind != RuleIssueKind::Conflict));
        prop_assert_eq!(result.valid_rules.len(), 2);
    }

    /// Property 1.3: Rules routing to the same account never conflict.
    #[test]
    fn prop_same_account_never_conflicts(
        condition in condition_strategy(),
        priority in 1i32..100,
        copies in 2usize..6,
    ) {
        let rules: Vec<MappingRule> = (0..copies)
            .map(|i| rule(&format!("R{i}"), condition, "SAME", priority))
            .collect();
        let result = RuleValidator::new(ConditionEvaluator::new()).validate(&rules);

        prop_assert_eq!(result.conflicts().count(), 0);
        prop_assert_eq!(result.valid_rules.len(), copies);
    }
}
