//! Property-based tests for quarterly aggregation.
//!
//! Feature: aggregation, Property 1: Sign convention
//! Feature: aggregation, Property 2: Roll-up consistency

use chrono::NaiveDate;
use ledgerflow_shared::types::Quarter;
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::aggregator::QuarterlyAggregator;
use crate::hierarchy::{Account, AccountHierarchy};
use crate::ledger::LedgerEntry;
use crate::rules::LedgerType;

/// Strategy for a positive amount with 0-2 decimal places.
fn amount_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..10_000_000i64, 0u32..=2).prop_map(|(units, scale)| Decimal::new(units, scale))
}

fn side_strategy() -> impl Strategy<Value = LedgerType> {
    prop_oneof![Just(LedgerType::Credit), Just(LedgerType::Debit)]
}

fn posting(account: &str, side: LedgerType, amount: Decimal) -> LedgerEntry {
    LedgerEntry {
        entry_id: "LE".into(),
        account_code: account.into(),
        account_path: account.into(),
        amount,
        date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
        description: "generated".into(),
        source_entry_id: "JE".into(),
        rule_applied: "R".into(),
        quarter: Quarter::Q1,
        year: 2024,
        ledger_type: side,
    }
}

fn tree() -> AccountHierarchy {
    AccountHierarchy::new(vec![
        Account::root("A1", "Root"),
        Account::child("B1", "Left", 2, "A1"),
        Account::child("B2", "Right", 2, "A1"),
        Account::child("C1", "Deep", 3, "B1"),
        Account::child("D1", "Deeper", 4, "C1"),
    ])
    .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // =========================================================================
    // Property 1: Sign convention
    // =========================================================================

    /// Property 1.1: Every aggregate nets to credits minus debits.
    #[test]
    fn prop_total_is_cr_minus_dr(
        rows in prop::collection::vec(
            (prop_oneof![Just("X"), Just("Y")], side_strategy(), amount_strategy()),
            1..30,
        ),
    ) {
        let postings: Vec<LedgerEntry> = rows.iter().map(|(a, s, m)| posting(a, *s, *m)).collect();
        let aggs = QuarterlyAggregator::new(None).aggregate(&postings);

        for agg in &aggs {
            let cr: Decimal = postings
                .iter()
                .filter(|p| p.account_code == agg.account_code && p.ledger_type == LedgerType::Credit)
                .map(|p| p.amount)
                .sum();
            let dr: Decimal = postings
                .iter()
                .filter(|p| p.account_code == agg.account_code && p.ledger_type == LedgerType::Debit)
                .map(|p| p.amount)
                .sum();
            prop_assert_eq!(agg.cr_amount, cr);
            prop_assert_eq!(agg.dr_amount, dr);
            prop_assert_eq!(agg.total_amount, cr - dr);
        }
        let count: usize = aggs.iter().map(|a| a.entry_count).sum();
        prop_assert_eq!(count, postings.len());
    }

    // =========================================================================
    // Property 2: Roll-up consistency
    // =========================================================================

    /// Property 2.1: Rolling up direct postings on any accounts yields a tree
    /// with no totals mismatches when only leaves carry activity.
    #[test]
    fn prop_rolled_up_leaves_are_consistent(
        rows in prop::collection::vec(
            (prop_oneof![Just("B2"), Just("D1")], side_strategy(), amount_strategy()),
            1..20,
        ),
    ) {
        let h = tree();
        let aggregator = QuarterlyAggregator::new(Some(&h));
        let postings: Vec<LedgerEntry> = rows.iter().map(|(a, s, m)| posting(a, *s, *m)).collect();
        let rolled = aggregator.roll_up(&aggregator.aggregate(&postings));

        prop_assert!(aggregator.validate_totals(&rolled).is_empty());

        let root = rolled.iter().find(|a| a.account_code == "A1").unwrap();
        let net: Decimal = postings.iter().map(LedgerEntry::signed_amount).sum();
        prop_assert_eq!(root.total_amount, net);
    }
}
