//! Reporting periods and amount tolerance.
//!
//! CRITICAL: Amounts are always `rust_decimal::Decimal`. Tolerance checks
//! compare absolute differences, never floating-point values.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Default tolerance for amount comparisons (0.01 currency units).
pub const DEFAULT_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Returns true if `a` and `b` differ by no more than `tolerance`.
#[must_use]
pub fn within_tolerance(a: Decimal, b: Decimal, tolerance: Decimal) -> bool {
    (a - b).abs() <= tolerance
}

/// Calendar quarter.
///
/// Serialized as its number (1-4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Quarter {
    /// January to March.
    Q1 = 1,
    /// April to June.
    Q2 = 2,
    /// July to September.
    Q3 = 3,
    /// October to December.
    Q4 = 4,
}

impl Quarter {
    /// Quarter containing the given month (1-12).
    ///
    /// Months outside 1-12 are clamped into the nearest quarter.
    #[must_use]
    pub const fn from_month(month: u32) -> Self {
        match month {
            0..=3 => Self::Q1,
            4..=6 => Self::Q2,
            7..=9 => Self::Q3,
            _ => Self::Q4,
        }
    }

    /// Quarter containing the given date.
    #[must_use]
    pub fn from_date(date: NaiveDate) -> Self {
        Self::from_month(date.month())
    }

    /// Quarter number (1-4).
    #[must_use]
    pub const fn number(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for Quarter {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Q1),
            2 => Ok(Self::Q2),
            3 => Ok(Self::Q3),
            4 => Ok(Self::Q4),
            _ => Err(format!("Quarter must be between 1 and 4, got {value}")),
        }
    }
}

impl From<Quarter> for u8 {
    fn from(quarter: Quarter) -> Self {
        quarter.number()
    }
}

impl std::fmt::Display for Quarter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Q{}", self.number())
    }
}

impl std::str::FromStr for Quarter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix('Q')
            .or_else(|| trimmed.strip_prefix('q'))
            .unwrap_or(trimmed);
        let number: u8 = digits
            .parse()
            .map_err(|_| format!("Unknown quarter: {s}"))?;
        Self::try_from(number)
    }
}

/// A (year, quarter) reporting period.
///
/// Orders chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Period {
    /// Calendar year.
    pub year: i32,
    /// Quarter within the year.
    pub quarter: Quarter,
}

impl Period {
    /// Creates a new period.
    #[must_use]
    pub const fn new(year: i32, quarter: Quarter) -> Self {
        Self { year, quarter }
    }

    /// Period containing the given date.
    #[must_use]
    pub fn from_date(date: NaiveDate) -> Self {
        Self::new(date.year(), Quarter::from_date(date))
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.quarter, self.year)
    }
}
