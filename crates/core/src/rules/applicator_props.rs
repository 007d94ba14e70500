//! Property-based tests for rule application.
//!
//! Feature: rule-application, Property 1: Idempotent batch application
//! Feature: rule-application, Property 2: All-match semantics
//! Feature: rule-application, Property 3: Split amount preservation and sign

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;

use ledgerflow_shared::config::NegativeAmountPolicy;

use super::applicator::RuleApplicator;
use super::evaluator::ConditionEvaluator;
use super::types::{LedgerType, MappingRule};
use crate::journal::JournalEntry;

/// Strategy for a signed amount with 0-4 decimal places.
fn amount_strategy() -> impl Strategy<Value = Decimal> {
    (-100_000_000i64..100_000_000i64, 0u32..=4).prop_map(|(units, scale)| Decimal::new(units, scale))
}

/// Strategy for a ledger side.
fn ledger_type_strategy() -> impl Strategy<Value = LedgerType> {
    prop_oneof![Just(LedgerType::Credit), Just(LedgerType::Debit)]
}

fn entry(id: usize, old_type: &str, amount: Decimal, month: u32) -> JournalEntry {
    JournalEntry::new(
        format!("JE-{id}"),
        "generated",
        old_type,
        amount,
        NaiveDate::from_ymd_opt(2024, month, 1).unwrap(),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // =========================================================================
    // Property 1: Idempotent batch application
    // =========================================================================

    /// Property 1.1: Applying the same batch twice, sequentially or in
    /// parallel, yields identical results in input order.
    #[test]
    fn prop_apply_batch_idempotent(
        rows in prop::collection::vec(
            (prop_oneof![Just("OL"), Just("IN"), Just("XX")], amount_strategy(), 1u32..=12),
            0..40,
        ),
    ) {
        let entries: Vec<JournalEntry> = rows
            .iter()
            .enumerate()
            .map(|(i, (t, a, m))| entry(i, t, *a, *m))
            .collect();
        let rules = vec![
            MappingRule::new("R1", r#"old_type == "OL""#, "CASH", 10).with_ledger_type(LedgerType::Credit),
            MappingRule::new("R2", r#"old_type == "OL""#, "INCOME", 10),
            MappingRule::new("R3", r#"old_type in ["IN", "OL"] and amount > 0"#, "BANK", 5),
        ];

        let applicator = RuleApplicator::new(rules, ConditionEvaluator::new());
        let first = applicator.apply_batch(&entries, None);
        let second = applicator.apply_batch(&entries, None);
        let parallel = applicator.clone().with_parallel(true).apply_batch(&entries, None);

        prop_assert_eq!(&first, &second);
        prop_assert_eq!(&first, &parallel);
        prop_assert_eq!(first.len(), entries.len());
    }

    // =========================================================================
    // Property 2: All-match semantics
    // =========================================================================

    /// Property 2.1: An entry matching k rules gets exactly k postings, each
    /// naming its own rule.
    #[test]
    fn prop_all_matching_rules_post(
        k in 2usize..8,
        amount in amount_strategy(),
        sides in prop::collection::vec(ledger_type_strategy(), 8),
    ) {
        let rules: Vec<MappingRule> = (0..k)
            .map(|i| {
                MappingRule::new(format!("R{i}"), r#"old_type == "OL""#, format!("ACC{i}"), 10)
                    .with_ledger_type(sides[i])
            })
            .collect();
        let applicator = RuleApplicator::new(rules, ConditionEvaluator::new());
        let result = applicator.apply(&entry(0, "OL", amount, 3), None);

        prop_assert!(!result.no_match);
        prop_assert_eq!(result.postings.len(), k);
        for (i, posting) in result.postings.iter().enumerate() {
            prop_assert_eq!(&posting.rule_applied, &format!("R{i}"));
            prop_assert_eq!(posting.amount, amount.abs());
        }
    }

    // =========================================================================
    // Property 3: Split amount preservation
    // =========================================================================

    /// Property 3.1: Split postings on one side sum exactly to the entry
    /// magnitude, for any weights.
    #[test]
    fn prop_split_preserves_amount(
        amount in amount_strategy(),
        weights in prop::collection::vec(1i64..1_000, 2..6),
    ) {
        let rules: Vec<MappingRule> = weights
            .iter()
            .enumerate()
            .map(|(i, w)| {
                MappingRule::new(format!("S{i}"), "true", format!("ACC{i}"), 1)
                    .with_split(Some(Decimal::new(*w, 1)))
            })
            .collect();
        let applicator = RuleApplicator::new(rules, ConditionEvaluator::new());
        let result = applicator.apply(&entry(0, "OL", amount, 6), None);

        let total: Decimal = result.postings.iter().map(|p| p.amount).sum();
        prop_assert_eq!(result.postings.len(), weights.len());
        prop_assert_eq!(total, amount.abs());
    }

    /// Property 3.2: Every split share has the sign of the entry amount (or
    /// is zero) and never exceeds its magnitude, including tiny amounts
    /// spread over many rules.
    #[test]
    fn prop_split_shares_keep_sign(
        units in -500i64..500,
        scale in 0u32..=3,
        weights in prop::collection::vec(1i64..1_000, 2..9),
    ) {
        let amount = Decimal::new(units, scale);
        let rules: Vec<MappingRule> = weights
            .iter()
            .enumerate()
            .map(|(i, w)| {
                MappingRule::new(format!("S{i}"), "true", format!("ACC{i}"), 1)
                    .with_split(Some(Decimal::new(*w, 1)))
            })
            .collect();
        let applicator = RuleApplicator::new(rules, ConditionEvaluator::new())
            .with_negative_amounts(NegativeAmountPolicy::Preserve);
        let result = applicator.apply(&entry(0, "OL", amount, 9), None);

        for posting in &result.postings {
            prop_assert!(
                posting.amount.is_zero()
                    || posting.amount.is_sign_negative() == amount.is_sign_negative(),
                "share {} has the wrong sign for {}", posting.amount, amount
            );
            prop_assert!(posting.amount.abs() <= amount.abs());
        }
        let total: Decimal = result.postings.iter().map(|p| p.amount).sum();
        prop_assert_eq!(total, amount);
    }
}
