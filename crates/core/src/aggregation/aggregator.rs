//! Quarterly aggregation of ledger postings.
//!
//! CRITICAL: net amounts are `cr - dr`. Never sum absolute amounts; an
//! income account with only credits nets positive, an expense account with
//! only debits nets negative.

use std::collections::{BTreeMap, HashMap};

use ledgerflow_shared::types::{DEFAULT_TOLERANCE, Quarter, within_tolerance};
use rust_decimal::Decimal;

use super::types::{HierarchicalTotals, QuarterlyAggregation, TotalsMismatch, YearlySummary};
use crate::hierarchy::AccountHierarchy;
use crate::ledger::LedgerEntry;
use crate::rules::LedgerType;

/// Child levels checked by `validate_totals`, deepest first.
const CHILD_LEVELS: [u8; 3] = [4, 3, 2];

#[derive(Default)]
struct Bucket {
    cr: Decimal,
    dr: Decimal,
    count: usize,
}

/// Stateless aggregator over an optional chart of accounts.
#[derive(Debug, Clone, Copy)]
pub struct QuarterlyAggregator<'a> {
    hierarchy: Option<&'a AccountHierarchy>,
    tolerance: Decimal,
}

impl<'a> QuarterlyAggregator<'a> {
    /// Creates an aggregator with the default 0.01 tolerance.
    #[must_use]
    pub fn new(hierarchy: Option<&'a AccountHierarchy>) -> Self {
        Self {
            hierarchy,
            tolerance: DEFAULT_TOLERANCE,
        }
    }

    /// Sets the tolerance used by `validate_totals`.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: Decimal) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Resolves an account code to `(path, level)`; unresolved codes are
    /// their own path at level 0.
    fn locate(&self, code: &str) -> (String, u8) {
        match self.hierarchy.and_then(|h| h.resolve(code)) {
            Some(account) => (account.full_path.clone(), account.level),
            None => (code.to_string(), 0),
        }
    }

    /// Groups postings by `(account, year, quarter)`.
    ///
    /// Output is ordered by account code, year, quarter.
    #[must_use]
    pub fn aggregate(&self, postings: &[LedgerEntry]) -> Vec<QuarterlyAggregation> {
        let mut buckets: BTreeMap<(String, i32, Quarter), Bucket> = BTreeMap::new();

        for posting in postings {
            let bucket = buckets
                .entry((posting.account_code.clone(), posting.year, posting.quarter))
                .or_default();
            match posting.ledger_type {
                LedgerType::Credit => bucket.cr += posting.amount,
                LedgerType::Debit => bucket.dr += posting.amount,
            }
            bucket.count += 1;
        }

        let aggregations: Vec<QuarterlyAggregation> = buckets
            .into_iter()
            .map(|((account_code, year, quarter), bucket)| {
                let (account_path, level) = self.locate(&account_code);
                QuarterlyAggregation {
                    account_code,
                    account_path,
                    quarter,
                    year,
                    cr_amount: bucket.cr,
                    dr_amount: bucket.dr,
                    total_amount: bucket.cr - bucket.dr,
                    entry_count: bucket.count,
                    level,
                }
            })
            .collect();

        tracing::debug!(
            postings = postings.len(),
            aggregations = aggregations.len(),
            "Aggregated postings"
        );
        aggregations
    }

    /// Aggregates postings, then totals them per level and quarter.
    #[must_use]
    pub fn aggregate_by_level(
        &self,
        postings: &[LedgerEntry],
    ) -> BTreeMap<u8, Vec<HierarchicalTotals>> {
        Self::level_totals(&self.aggregate(postings))
    }

    /// Totals existing aggregates per level and `(year, quarter)`.
    ///
    /// Each level's list is ordered by year, then quarter.
    #[must_use]
    pub fn level_totals(
        aggregations: &[QuarterlyAggregation],
    ) -> BTreeMap<u8, Vec<HierarchicalTotals>> {
        let mut grouped: BTreeMap<u8, BTreeMap<(i32, Quarter), HierarchicalTotals>> =
            BTreeMap::new();

        for agg in aggregations {
            let totals = grouped
                .entry(agg.level)
                .or_default()
                .entry((agg.year, agg.quarter))
                .or_insert_with(|| HierarchicalTotals {
                    level: agg.level,
                    quarter: agg.quarter,
                    year: agg.year,
                    total_amount: Decimal::ZERO,
                    account_count: 0,
                    accounts: Vec::new(),
                });
            totals.total_amount += agg.total_amount;
            totals.accounts.push(agg.account_code.clone());
        }

        grouped
            .into_iter()
            .map(|(level, periods)| {
                let totals = periods
                    .into_values()
                    .map(|mut t| {
                        t.accounts.sort();
                        t.accounts.dedup();
                        t.account_count = t.accounts.len();
                        t
                    })
                    .collect();
                (level, totals)
            })
            .collect()
    }

    /// Checks that each parent's total equals the sum of its children's
    /// totals for the same quarter.
    ///
    /// Walks child levels 4, 3, 2. Every aggregate one level up whose
    /// account has children in the hierarchy is compared; children with no
    /// aggregate in that quarter contribute zero. Leaf accounts are never
    /// compared. Mismatches are reported, never corrected. Without a
    /// hierarchy there is nothing to check.
    #[must_use]
    pub fn validate_totals(&self, aggregations: &[QuarterlyAggregation]) -> Vec<TotalsMismatch> {
        let Some(hierarchy) = self.hierarchy else {
            return Vec::new();
        };

        let mut mismatches = Vec::new();
        for child_level in CHILD_LEVELS {
            let level = child_level - 1;

            let mut sums: HashMap<(String, i32, Quarter), (Decimal, Vec<String>)> =
                HashMap::new();
            for agg in aggregations.iter().filter(|a| a.level == child_level) {
                let Some(parent_code) = hierarchy
                    .resolve(&agg.account_code)
                    .and_then(|a| a.parent_code.clone())
                else {
                    continue;
                };
                let (sum, children) = sums
                    .entry((parent_code, agg.year, agg.quarter))
                    .or_default();
                *sum += agg.total_amount;
                children.push(agg.account_code.clone());
            }

            for parent in aggregations.iter().filter(|a| a.level == level) {
                let Some(account) = hierarchy.resolve(&parent.account_code) else {
                    continue;
                };
                if !hierarchy.has_children(&account.code) {
                    continue;
                }

                let (expected, children) = sums
                    .remove(&(account.code.clone(), parent.year, parent.quarter))
                    .unwrap_or_default();
                let actual = parent.total_amount;
                if within_tolerance(actual, expected, self.tolerance) {
                    continue;
                }

                let (code, quarter, year) = (&parent.account_code, parent.quarter, parent.year);
                let message = format!(
                    "Level {level} account {code} total mismatch: expected {expected}, got {actual} ({quarter} {year})"
                );
                tracing::warn!(
                    account_code = %code,
                    level,
                    year,
                    quarter = %quarter,
                    expected = %expected,
                    actual = %actual,
                    "Hierarchy totals mismatch"
                );
                mismatches.push(TotalsMismatch {
                    account_code: code.clone(),
                    level,
                    quarter,
                    year,
                    expected,
                    actual,
                    difference: actual - expected,
                    children,
                    message,
                });
            }
        }

        mismatches.sort_by(|a, b| {
            (a.year, a.quarter, std::cmp::Reverse(a.level), &a.account_code).cmp(&(
                b.year,
                b.quarter,
                std::cmp::Reverse(b.level),
                &b.account_code,
            ))
        });
        mismatches
    }

    /// Adds every aggregate into all of its ancestors for the same quarter,
    /// creating ancestor buckets as needed.
    ///
    /// Input must be direct aggregates (as returned by `aggregate`); rolling
    /// up an already rolled-up set counts descendants twice. Output is
    /// ordered by account code, year, quarter.
    #[must_use]
    pub fn roll_up(&self, aggregations: &[QuarterlyAggregation]) -> Vec<QuarterlyAggregation> {
        let mut buckets: BTreeMap<(String, i32, Quarter), QuarterlyAggregation> = aggregations
            .iter()
            .map(|a| ((a.account_code.clone(), a.year, a.quarter), a.clone()))
            .collect();

        let Some(hierarchy) = self.hierarchy else {
            return buckets.into_values().collect();
        };

        for agg in aggregations {
            let Some(account) = hierarchy.resolve(&agg.account_code) else {
                continue;
            };
            for ancestor in hierarchy.ancestors(&account.code) {
                let slot = buckets
                    .entry((ancestor.code.clone(), agg.year, agg.quarter))
                    .or_insert_with(|| {
                        QuarterlyAggregation::empty(ancestor, agg.year, agg.quarter)
                    });
                slot.cr_amount += agg.cr_amount;
                slot.dr_amount += agg.dr_amount;
                slot.total_amount += agg.total_amount;
                slot.entry_count += agg.entry_count;
            }
        }

        buckets.into_values().collect()
    }

    /// Annual summary per account across quarters.
    ///
    /// Output is ordered by account code, then year.
    #[must_use]
    pub fn aggregate_by_year(aggregations: &[QuarterlyAggregation]) -> Vec<YearlySummary> {
        let mut years: BTreeMap<(String, i32), YearlySummary> = BTreeMap::new();

        for agg in aggregations {
            let summary = years
                .entry((agg.account_code.clone(), agg.year))
                .or_insert_with(|| YearlySummary {
                    account_code: agg.account_code.clone(),
                    account_path: agg.account_path.clone(),
                    level: agg.level,
                    year: agg.year,
                    cr_amount: Decimal::ZERO,
                    dr_amount: Decimal::ZERO,
                    total_amount: Decimal::ZERO,
                    entry_count: 0,
                    quarters: Vec::new(),
                });
            summary.cr_amount += agg.cr_amount;
            summary.dr_amount += agg.dr_amount;
            summary.total_amount += agg.total_amount;
            summary.entry_count += agg.entry_count;
            if !summary.quarters.contains(&agg.quarter) {
                summary.quarters.push(agg.quarter);
            }
        }

        years
            .into_values()
            .map(|mut s| {
                s.quarters.sort();
                s
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::Account;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn posting(
        account: &str,
        side: LedgerType,
        amount: Decimal,
        year: i32,
        quarter: Quarter,
    ) -> LedgerEntry {
        LedgerEntry {
            entry_id: format!("LE-{account}-{amount}"),
            account_code: account.into(),
            account_path: account.into(),
            amount,
            date: NaiveDate::from_ymd_opt(year, 1, 1).unwrap(),
            description: "test".into(),
            source_entry_id: "JE".into(),
            rule_applied: "R".into(),
            quarter,
            year,
            ledger_type: side,
        }
    }

    fn tree() -> AccountHierarchy {
        AccountHierarchy::new(vec![
            Account::root("A1", "Root"),
            Account::child("B2", "Left", 2, "A1"),
            Account::child("B3", "Right", 2, "A1"),
            Account::child("C1", "Leaf", 3, "B2"),
        ])
        .unwrap()
    }

    fn agg(code: &str, level: u8, total: Decimal) -> QuarterlyAggregation {
        QuarterlyAggregation {
            account_code: code.into(),
            account_path: code.into(),
            quarter: Quarter::Q1,
            year: 2024,
            cr_amount: total,
            dr_amount: Decimal::ZERO,
            total_amount: total,
            entry_count: 1,
            level,
        }
    }

    #[test]
    fn test_scenario_credit_debit_pair() {
        let postings = vec![
            posting("CASH", LedgerType::Credit, dec!(1000), 2024, Quarter::Q1),
            posting("INCOME", LedgerType::Debit, dec!(1000), 2024, Quarter::Q1),
        ];
        let aggs = QuarterlyAggregator::new(None).aggregate(&postings);

        assert_eq!(aggs.len(), 2);
        let cash = &aggs[0];
        assert_eq!(cash.account_code, "CASH");
        assert_eq!(
            (cash.cr_amount, cash.dr_amount, cash.total_amount),
            (dec!(1000), dec!(0), dec!(1000))
        );
        let income = &aggs[1];
        assert_eq!(income.account_code, "INCOME");
        assert_eq!(
            (income.cr_amount, income.dr_amount, income.total_amount),
            (dec!(0), dec!(1000), dec!(-1000))
        );
        assert_eq!(cash.level, 0);
        assert_eq!(cash.account_path, "CASH");
    }

    #[test]
    fn test_sign_convention_equal_sides_net_zero() {
        let postings = vec![
            posting("X", LedgerType::Credit, dec!(250.50), 2024, Quarter::Q2),
            posting("X", LedgerType::Debit, dec!(250.50), 2024, Quarter::Q2),
        ];
        let aggs = QuarterlyAggregator::new(None).aggregate(&postings);
        assert_eq!(aggs.len(), 1);
        assert_eq!(aggs[0].total_amount, Decimal::ZERO);
        assert_eq!(aggs[0].entry_count, 2);
    }

    #[test]
    fn test_grouping_by_period_and_ordering() {
        let postings = vec![
            posting("B", LedgerType::Credit, dec!(1), 2024, Quarter::Q2),
            posting("A", LedgerType::Credit, dec!(1), 2024, Quarter::Q3),
            posting("A", LedgerType::Credit, dec!(1), 2023, Quarter::Q4),
            posting("A", LedgerType::Credit, dec!(1), 2024, Quarter::Q1),
        ];
        let aggs = QuarterlyAggregator::new(None).aggregate(&postings);
        let keys: Vec<(&str, i32, Quarter)> = aggs
            .iter()
            .map(|a| (a.account_code.as_str(), a.year, a.quarter))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("A", 2023, Quarter::Q4),
                ("A", 2024, Quarter::Q1),
                ("A", 2024, Quarter::Q3),
                ("B", 2024, Quarter::Q2),
            ]
        );
    }

    #[test]
    fn test_hierarchy_resolution() {
        let h = tree();
        let postings = vec![
            posting("B2", LedgerType::Credit, dec!(5), 2024, Quarter::Q1),
            posting("Right", LedgerType::Credit, dec!(5), 2024, Quarter::Q1),
        ];
        let aggs = QuarterlyAggregator::new(Some(&h)).aggregate(&postings);
        assert_eq!(aggs[0].account_path, "Root/Left");
        assert_eq!(aggs[0].level, 2);
        assert_eq!(aggs[1].account_code, "Right");
        assert_eq!(aggs[1].account_path, "Root/Right");
    }

    #[test]
    fn test_roll_up_and_tree_consistency() {
        let h = tree();
        let aggregator = QuarterlyAggregator::new(Some(&h));
        let postings = vec![
            posting("C1", LedgerType::Credit, dec!(400), 2024, Quarter::Q1),
            posting("B3", LedgerType::Credit, dec!(700), 2024, Quarter::Q1),
        ];
        let rolled = aggregator.roll_up(&aggregator.aggregate(&postings));

        let a1 = rolled.iter().find(|a| a.account_code == "A1").unwrap();
        assert_eq!(a1.total_amount, dec!(1100));
        assert_eq!(a1.level, 1);
        assert_eq!(a1.entry_count, 2);
        assert_eq!(a1.account_path, "Root");
        assert!(aggregator.validate_totals(&rolled).is_empty());
    }

    #[test]
    fn test_roll_up_through_multiple_levels() {
        let h = tree();
        let aggregator = QuarterlyAggregator::new(Some(&h));
        let postings = vec![posting("C1", LedgerType::Debit, dec!(30), 2024, Quarter::Q1)];
        let rolled = aggregator.roll_up(&aggregator.aggregate(&postings));
        let codes: Vec<&str> = rolled.iter().map(|a| a.account_code.as_str()).collect();
        assert_eq!(codes, vec!["A1", "B2", "C1"]);
        assert!(rolled.iter().all(|a| a.total_amount == dec!(-30)));
        assert!(aggregator.validate_totals(&rolled).is_empty());
    }

    #[test]
    fn test_validate_totals_flags_mismatch() {
        let h = tree();
        let aggs = vec![
            agg("A1", 1, dec!(1000)),
            agg("B2", 2, dec!(400)),
            agg("B3", 2, dec!(700)),
            agg("C1", 3, dec!(400)),
        ];
        let mismatches = QuarterlyAggregator::new(Some(&h)).validate_totals(&aggs);
        assert_eq!(mismatches.len(), 1);
        let m = &mismatches[0];
        assert_eq!(m.account_code, "A1");
        assert_eq!(m.level, 1);
        assert_eq!(m.expected, dec!(1100));
        assert_eq!(m.actual, dec!(1000));
        assert_eq!(m.difference, dec!(-100));
        assert_eq!(m.children, vec!["B2", "B3"]);
        assert_eq!(
            m.message,
            "Level 1 account A1 total mismatch: expected 1100, got 1000 (Q1 2024)"
        );
    }

    #[test]
    fn test_validate_totals_within_tolerance() {
        let h = tree();
        let aggs = vec![
            agg("A1", 1, dec!(1100.01)),
            agg("B2", 2, dec!(400)),
            agg("B3", 2, dec!(700)),
            agg("C1", 3, dec!(400)),
        ];
        let aggregator = QuarterlyAggregator::new(Some(&h));
        assert!(aggregator.validate_totals(&aggs).is_empty());
        assert_eq!(
            aggregator
                .with_tolerance(dec!(0.001))
                .validate_totals(&aggs)
                .len(),
            1
        );
    }

    #[test]
    fn test_validate_totals_skips_missing_parent_and_no_hierarchy() {
        let h = tree();
        let aggs = vec![agg("C1", 3, dec!(400)), agg("B3", 2, dec!(700))];
        assert!(QuarterlyAggregator::new(Some(&h)).validate_totals(&aggs).is_empty());

        let aggs = vec![agg("A1", 1, dec!(1)), agg("B2", 2, dec!(400))];
        assert!(QuarterlyAggregator::new(None).validate_totals(&aggs).is_empty());
    }

    #[test]
    fn test_validate_totals_flags_parent_without_child_activity() {
        let h = tree();
        let aggregator = QuarterlyAggregator::new(Some(&h));

        let mismatches = aggregator.validate_totals(&[agg("A1", 1, dec!(500))]);
        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0].account_code, "A1");
        assert_eq!(mismatches[0].expected, Decimal::ZERO);
        assert_eq!(mismatches[0].actual, dec!(500));
        assert!(mismatches[0].children.is_empty());

        let mismatches =
            aggregator.validate_totals(&[agg("A1", 1, dec!(500)), agg("B3", 2, dec!(100))]);
        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0].expected, dec!(100));
        assert_eq!(mismatches[0].difference, dec!(400));
    }

    #[test]
    fn test_validate_totals_flags_each_level() {
        let h = tree();
        let aggs = vec![
            agg("A1", 1, dec!(250)),
            agg("B2", 2, dec!(250)),
            agg("C1", 3, dec!(200)),
        ];
        let mismatches = QuarterlyAggregator::new(Some(&h)).validate_totals(&aggs);
        let flagged: Vec<(&str, u8)> = mismatches
            .iter()
            .map(|m| (m.account_code.as_str(), m.level))
            .collect();
        assert_eq!(flagged, vec![("B2", 2)]);
        assert_eq!(mismatches[0].expected, dec!(200));
    }

    #[test]
    fn test_level_totals() {
        let h = tree();
        let postings = vec![
            posting("B2", LedgerType::Credit, dec!(400), 2024, Quarter::Q1),
            posting("B3", LedgerType::Debit, dec!(100), 2024, Quarter::Q1),
            posting("B3", LedgerType::Credit, dec!(50), 2024, Quarter::Q2),
            posting("ZZ", LedgerType::Credit, dec!(9), 2024, Quarter::Q1),
        ];
        let by_level = QuarterlyAggregator::new(Some(&h)).aggregate_by_level(&postings);

        let level2 = &by_level[&2];
        assert_eq!(level2.len(), 2);
        assert_eq!(level2[0].quarter, Quarter::Q1);
        assert_eq!(level2[0].total_amount, dec!(300));
        assert_eq!(level2[0].account_count, 2);
        assert_eq!(level2[0].accounts, vec!["B2", "B3"]);
        assert_eq!(level2[1].total_amount, dec!(50));

        let unresolved = &by_level[&0];
        assert_eq!(unresolved[0].accounts, vec!["ZZ"]);
    }

    #[test]
    fn test_aggregate_by_year() {
        let postings = vec![
            posting("A", LedgerType::Credit, dec!(10), 2024, Quarter::Q3),
            posting("A", LedgerType::Debit, dec!(4), 2024, Quarter::Q1),
            posting("A", LedgerType::Credit, dec!(1), 2025, Quarter::Q1),
        ];
        let aggs = QuarterlyAggregator::new(None).aggregate(&postings);
        let years = QuarterlyAggregator::aggregate_by_year(&aggs);
        assert_eq!(years.len(), 2);
        assert_eq!(years[0].year, 2024);
        assert_eq!(years[0].total_amount, dec!(6));
        assert_eq!(years[0].quarters, vec![Quarter::Q1, Quarter::Q3]);
        assert_eq!(years[0].entry_count, 2);
        assert_eq!(years[1].year, 2025);
    }

    #[test]
    fn test_empty_input() {
        let aggregator = QuarterlyAggregator::new(None);
        assert!(aggregator.aggregate(&[]).is_empty());
        assert!(aggregator.aggregate_by_level(&[]).is_empty());
        assert!(aggregator.roll_up(&[]).is_empty());
    }
}
