//! Journal entry domain type.

use chrono::{Datelike, NaiveDate};
use ledgerflow_shared::types::{Period, Quarter};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::rules::condition::{Record, Value};

/// Field names a rule condition may reference.
pub const ENTRY_FIELDS: &[&str] = &[
    "entry_id",
    "year",
    "description",
    "old_type",
    "amount",
    "date",
    "quarter",
    "notes",
];

/// A single source transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Unique entry identifier.
    pub entry_id: String,
    /// Fiscal year (2000-2100).
    pub year: i32,
    /// Free-text description.
    pub description: String,
    /// Classification tag used for rule matching.
    pub old_type: String,
    /// Signed amount.
    pub amount: Decimal,
    /// Transaction date.
    pub date: NaiveDate,
    /// Explicit quarter (1-4). Inferred from `date` when absent.
    #[serde(default)]
    pub quarter: Option<u8>,
    /// Optional notes.
    #[serde(default)]
    pub notes: Option<String>,
}

impl JournalEntry {
    /// Creates an entry with the year taken from `date` and no quarter or notes.
    #[must_use]
    pub fn new(
        entry_id: impl Into<String>,
        description: impl Into<String>,
        old_type: impl Into<String>,
        amount: Decimal,
        date: NaiveDate,
    ) -> Self {
        Self {
            entry_id: entry_id.into(),
            year: date.year(),
            description: description.into(),
            old_type: old_type.into(),
            amount,
            date,
            quarter: None,
            notes: None,
        }
    }

    /// Quarter used for postings: the explicit quarter when valid, else the
    /// quarter containing `date`.
    #[must_use]
    pub fn effective_quarter(&self) -> Quarter {
        self.quarter
            .and_then(|q| Quarter::try_from(q).ok())
            .unwrap_or_else(|| Quarter::from_date(self.date))
    }

    /// Reporting period of the entry.
    #[must_use]
    pub fn period(&self) -> Period {
        Period::new(self.year, self.effective_quarter())
    }

    /// Returns a copy of this entry with a different `old_type`.
    #[must_use]
    pub fn with_old_type(&self, old_type: impl Into<String>) -> Self {
        Self {
            old_type: old_type.into(),
            ..self.clone()
        }
    }
}

impl Record for JournalEntry {
    fn field(&self, name: &str) -> Option<Value> {
        let value = match name {
            "entry_id" => Value::Text(self.entry_id.clone()),
            "year" => Value::Number(Decimal::from(self.year)),
            "description" => Value::Text(self.description.clone()),
            "old_type" => Value::Text(self.old_type.clone()),
            "amount" => Value::Number(self.amount),
            "date" => Value::Date(self.date),
            "quarter" => Value::Number(Decimal::from(self.effective_quarter().number())),
            "notes" => self.notes.clone().map_or(Value::Null, Value::Text),
            _ => return None,
        };
        Some(value)
    }
}
