//! Aggregation data types.

use ledgerflow_shared::types::{Period, Quarter};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::hierarchy::Account;

/// Net activity of one account in one quarter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuarterlyAggregation {
    /// Account code.
    pub account_code: String,
    /// Hierarchy path, or the code when unresolved.
    pub account_path: String,
    /// Quarter.
    pub quarter: Quarter,
    /// Year.
    pub year: i32,
    /// Sum of credit postings.
    pub cr_amount: Decimal,
    /// Sum of debit postings.
    pub dr_amount: Decimal,
    /// Signed net: `cr_amount - dr_amount`.
    pub total_amount: Decimal,
    /// Number of postings.
    pub entry_count: usize,
    /// Hierarchy level, 0 when unresolved.
    pub level: u8,
}

impl QuarterlyAggregation {
    /// Zero-valued bucket for an account.
    #[must_use]
    pub fn empty(account: &Account, year: i32, quarter: Quarter) -> Self {
        Self {
            account_code: account.code.clone(),
            account_path: account.full_path.clone(),
            quarter,
            year,
            cr_amount: Decimal::ZERO,
            dr_amount: Decimal::ZERO,
            total_amount: Decimal::ZERO,
            entry_count: 0,
            level: account.level,
        }
    }

    /// Reporting period.
    #[must_use]
    pub fn period(&self) -> Period {
        Period::new(self.year, self.quarter)
    }
}

/// Sum of all account aggregates at one level in one quarter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchicalTotals {
    /// Hierarchy level.
    pub level: u8,
    /// Quarter.
    pub quarter: Quarter,
    /// Year.
    pub year: i32,
    /// Straight sum of member `total_amount`s.
    pub total_amount: Decimal,
    /// Number of member accounts.
    pub account_count: usize,
    /// Member account codes, sorted.
    pub accounts: Vec<String>,
}

/// A parent whose total disagrees with the sum of its children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotalsMismatch {
    /// Parent account code.
    pub account_code: String,
    /// Parent level.
    pub level: u8,
    /// Quarter.
    pub quarter: Quarter,
    /// Year.
    pub year: i32,
    /// Sum of the children's totals.
    pub expected: Decimal,
    /// Parent's own total.
    pub actual: Decimal,
    /// `actual - expected`.
    pub difference: Decimal,
    /// Child account codes that contributed.
    pub children: Vec<String>,
    /// Human-readable description.
    pub message: String,
}

/// Annual activity of one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearlySummary {
    /// Account code.
    pub account_code: String,
    /// Hierarchy path, or the code when unresolved.
    pub account_path: String,
    /// Hierarchy level, 0 when unresolved.
    pub level: u8,
    /// Year.
    pub year: i32,
    /// Sum of credit postings.
    pub cr_amount: Decimal,
    /// Sum of debit postings.
    pub dr_amount: Decimal,
    /// Signed net.
    pub total_amount: Decimal,
    /// Number of postings.
    pub entry_count: usize,
    /// Quarters with activity.
    pub quarters: Vec<Quarter>,
}
