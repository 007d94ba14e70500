//! Mapping rule domain types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Ledger side of a rule and of the postings it produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum LedgerType {
    /// Credit side. Adds to an account's net amount.
    #[serde(rename = "CR", alias = "cr")]
    Credit,
    /// Debit side. Subtracts from an account's net amount.
    #[default]
    #[serde(rename = "DR", alias = "dr")]
    Debit,
}

impl LedgerType {
    /// Returns the short tag (`CR` / `DR`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Credit => "CR",
            Self::Debit => "DR",
        }
    }

    /// Returns the other side.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Credit => Self::Debit,
            Self::Debit => Self::Credit,
        }
    }
}

impl std::fmt::Display for LedgerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LedgerType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "CR" => Ok(Self::Credit),
            "DR" => Ok(Self::Debit),
            _ => Err(format!("Unknown ledger type: {s}")),
        }
    }
}

/// Severity of a reported issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Reported for review; processing continues unaffected.
    Warning,
    /// The offending rule or result is excluded.
    Blocking,
}

/// A conditional instruction routing matching entries to one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingRule {
    /// Unique rule identifier.
    pub rule_id: String,
    /// Boolean condition over journal entry fields.
    pub condition: String,
    /// Target account code (or name).
    pub account_code: String,
    /// Evaluation priority (higher first, at least 1).
    pub priority: i32,
    /// Classification tag hint for the source side.
    #[serde(default)]
    pub old_type: Option<String>,
    /// Classification tag hint for the target side.
    #[serde(default)]
    pub new_type: Option<String>,
    /// Human-readable description.
    #[serde(default)]
    pub description: Option<String>,
    /// Part of a one-to-many split of the entry amount.
    #[serde(default)]
    pub generates_multiple: bool,
    /// Relative share of the entry amount when splitting.
    #[serde(default)]
    pub split_weight: Option<Decimal>,
    /// Ledger side of the produced postings.
    #[serde(default)]
    pub ledger_type: LedgerType,
}

impl MappingRule {
    /// Creates a debit rule with no type hints.
    #[must_use]
    pub fn new(
        rule_id: impl Into<String>,
        condition: impl Into<String>,
        account_code: impl Into<String>,
        priority: i32,
    ) -> Self {
        Self {
            rule_id: rule_id.into(),
            condition: condition.into(),
            account_code: account_code.into(),
            priority,
            old_type: None,
            new_type: None,
            description: None,
            generates_multiple: false,
            split_weight: None,
            ledger_type: LedgerType::default(),
        }
    }

    /// Sets the ledger side.
    #[must_use]
    pub fn with_ledger_type(mut self, ledger_type: LedgerType) -> Self {
        self.ledger_type = ledger_type;
        self
    }

    /// Sets the `old_type` hint.
    #[must_use]
    pub fn with_old_type(mut self, old_type: impl Into<String>) -> Self {
        self.old_type = Some(old_type.into());
        self
    }

    /// Sets the `new_type` hint.
    #[must_use]
    pub fn with_new_type(mut self, new_type: impl Into<String>) -> Self {
        self.new_type = Some(new_type.into());
        self
    }

    /// Marks the rule as part of a split with the given weight.
    #[must_use]
    pub fn with_split(mut self, weight: Option<Decimal>) -> Self {
        self.generates_multiple = true;
        self.split_weight = weight;
        self
    }

    /// Condition normalized for conflict detection (trimmed, lowercased).
    #[must_use]
    pub fn normalized_condition(&self) -> String {
        self.condition.trim().to_lowercase()
    }

    /// Split weight, defaulting to 1.
    #[must_use]
    pub fn effective_split_weight(&self) -> Decimal {
        self.split_weight.unwrap_or(Decimal::ONE)
    }

    /// Returns true if at least one of `old_type` / `new_type` is set.
    #[must_use]
    pub fn has_type_hint(&self) -> bool {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        present(&self.old_type) || present(&self.new_type)
    }
}
