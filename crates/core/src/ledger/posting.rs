//! Ledger posting domain type.

use chrono::NaiveDate;
use ledgerflow_shared::types::{Period, Quarter};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::rules::LedgerType;

/// One posting produced by applying one rule to one journal entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Deterministic id: `LE-{source_entry_id}-{rule_id}`.
    pub entry_id: String,
    /// Canonical account code.
    pub account_code: String,
    /// Resolved hierarchy path, or the raw code when unresolved.
    pub account_path: String,
    /// Posted amount.
    pub amount: Decimal,
    /// Transaction date.
    pub date: NaiveDate,
    /// Description copied from the source entry.
    pub description: String,
    /// Journal entry this posting came from.
    pub source_entry_id: String,
    /// Rule that produced this posting.
    pub rule_applied: String,
    /// Reporting quarter.
    pub quarter: Quarter,
    /// Reporting year.
    pub year: i32,
    /// Ledger side.
    pub ledger_type: LedgerType,
}

impl LedgerEntry {
    /// Builds the deterministic posting id.
    #[must_use]
    pub fn posting_id(source_entry_id: &str, rule_id: &str) -> String {
        format!("LE-{source_entry_id}-{rule_id}")
    }

    /// Contribution to the account's net amount (credit positive, debit negative).
    #[must_use]
    pub fn signed_amount(&self) -> Decimal {
        match self.ledger_type {
            LedgerType::Credit => self.amount,
            LedgerType::Debit => -self.amount,
        }
    }

    /// Reporting period.
    #[must_use]
    pub fn period(&self) -> Period {
        Period::new(self.year, self.quarter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn posting(ledger_type: LedgerType, amount: Decimal) -> LedgerEntry {
        LedgerEntry {
            entry_id: LedgerEntry::posting_id("JE-1", "R1"),
            account_code: "CASH".into(),
            account_path: "Assets/Cash".into(),
            amount,
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            description: "x".into(),
            source_entry_id: "JE-1".into(),
            rule_applied: "R1".into(),
            quarter: Quarter::Q1,
            year: 2024,
            ledger_type,
        }
    }

    #[test]
    fn test_posting_id() {
        assert_eq!(LedgerEntry::posting_id("JE-1", "R1"), "LE-JE-1-R1");
    }

    #[test]
    fn test_signed_amount() {
        assert_eq!(posting(LedgerType::Credit, dec!(10)).signed_amount(), dec!(10));
        assert_eq!(posting(LedgerType::Debit, dec!(10)).signed_amount(), dec!(-10));
    }

    #[test]
    fn test_serializes_ledger_type_and_quarter() {
        let json = serde_json::to_value(posting(LedgerType::Credit, dec!(1))).unwrap();
        assert_eq!(json["ledger_type"], "CR");
        assert_eq!(json["quarter"], 1);
        assert_eq!(json["amount"], "1");
    }
}
