//! Journal entry validation before rule application.

use std::collections::HashSet;

use ledgerflow_shared::types::Quarter;
use rust_decimal::Decimal;

use super::entry::JournalEntry;
use super::error::JournalError;

/// Lowest accepted fiscal year.
pub const MIN_YEAR: i32 = 2000;

/// Highest accepted fiscal year.
pub const MAX_YEAR: i32 = 2100;

/// Largest accepted entry magnitude, 10^15.
///
/// Keeps every downstream sum (side totals, aggregates, roll-ups) far from
/// `Decimal::MAX`, so accepted entries can be added without overflow.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(2_764_472_320, 232_830, 0, false, 0);

/// Checks a single entry in isolation.
///
/// Returns every problem found, not just the first.
#[must_use]
pub fn validate_entry(entry: &JournalEntry) -> Vec<JournalError> {
    let mut errors = Vec::new();

    for (field, value) in [
        ("entry_id", &entry.entry_id),
        ("description", &entry.description),
        ("old_type", &entry.old_type),
    ] {
        if value.trim().is_empty() {
            errors.push(JournalError::EmptyField {
                entry_id: entry.entry_id.clone(),
                field,
            });
        }
    }

    if !(MIN_YEAR..=MAX_YEAR).contains(&entry.year) {
        errors.push(JournalError::YearOutOfRange {
            entry_id: entry.entry_id.clone(),
            year: entry.year,
            min: MIN_YEAR,
            max: MAX_YEAR,
        });
    }

    if entry.amount.abs() > MAX_AMOUNT {
        errors.push(JournalError::AmountOutOfRange {
            entry_id: entry.entry_id.clone(),
            amount: entry.amount,
            max: MAX_AMOUNT,
        });
    }

    if let Some(quarter) = entry.quarter {
        match Quarter::try_from(quarter) {
            Err(_) => errors.push(JournalError::InvalidQuarter {
                entry_id: entry.entry_id.clone(),
                quarter,
            }),
            Ok(q) => {
                let expected = Quarter::from_date(entry.date);
                if q != expected {
                    errors.push(JournalError::QuarterDateMismatch {
                        entry_id: entry.entry_id.clone(),
                        quarter,
                        expected: expected.number(),
                    });
                }
            }
        }
    }

    errors
}

/// Splits entries into valid ones and the errors of the rejected ones.
///
/// Duplicate ids are rejected after their first occurrence. Input order is
/// preserved for the valid entries.
#[must_use]
pub fn validate_entries(entries: &[JournalEntry]) -> (Vec<JournalEntry>, Vec<JournalError>) {
    let mut valid = Vec::with_capacity(entries.len());
    let mut errors = Vec::new();
    let mut seen: HashSet<&str> = HashSet::with_capacity(entries.len());

    for entry in entries {
        let mut entry_errors = validate_entry(entry);
        if !entry.entry_id.is_empty() && !seen.insert(entry.entry_id.as_str()) {
            entry_errors.push(JournalError::DuplicateEntryId {
                entry_id: entry.entry_id.clone(),
            });
        }

        if entry_errors.is_empty() {
            valid.push(entry.clone());
        } else {
            tracing::warn!(
                entry_id = %entry.entry_id,
                errors = entry_errors.len(),
                "Journal entry rejected"
            );
            errors.extend(entry_errors);
        }
    }

    (valid, errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn entry(id: &str) -> JournalEntry {
        JournalEntry::new(
            id,
            "Office supplies",
            "OL",
            dec!(250.00),
            NaiveDate::from_ymd_opt(2024, 2, 3).unwrap(),
        )
    }

    #[test]
    fn test_valid_entry_passes() {
        assert!(validate_entry(&entry("JE-1")).is_empty());
    }

    #[rstest]
    #[case(JournalEntry { description: "  ".into(), ..entry("JE-1") }, "EMPTY_FIELD")]
    #[case(JournalEntry { old_type: String::new(), ..entry("JE-1") }, "EMPTY_FIELD")]
    #[case(JournalEntry { year: 1999, ..entry("JE-1") }, "YEAR_OUT_OF_RANGE")]
    #[case(JournalEntry { year: 2101, ..entry("JE-1") }, "YEAR_OUT_OF_RANGE")]
    #[case(JournalEntry { quarter: Some(0), ..entry("JE-1") }, "INVALID_QUARTER")]
    #[case(JournalEntry { quarter: Some(3), ..entry("JE-1") }, "QUARTER_DATE_MISMATCH")]
    #[case(JournalEntry { amount: Decimal::MAX, ..entry("JE-1") }, "AMOUNT_OUT_OF_RANGE")]
    #[case(JournalEntry { amount: -MAX_AMOUNT - dec!(0.01), ..entry("JE-1") }, "AMOUNT_OUT_OF_RANGE")]
    fn test_invalid_entry(#[case] e: JournalEntry, #[case] code: &str) {
        let errors = validate_entry(&e);
        assert_eq!(errors.len(), 1, "{errors:?}");
        assert_eq!(errors[0].error_code(), code);
    }

    #[test]
    fn test_amount_ceiling() {
        assert_eq!(MAX_AMOUNT, Decimal::from(1_000_000_000_000_000_i64));
        for amount in [MAX_AMOUNT, -MAX_AMOUNT] {
            assert!(validate_entry(&JournalEntry { amount, ..entry("JE-1") }).is_empty());
        }
    }

    #[test]
    fn test_matching_explicit_quarter_ok() {
        let e = JournalEntry {
            quarter: Some(1),
            ..entry("JE-1")
        };
        assert!(validate_entry(&e).is_empty());
    }

    #[test]
    fn test_duplicates_rejected_after_first() {
        let entries = vec![entry("JE-1"), entry("JE-2"), entry("JE-1")];
        let (valid, errors) = validate_entries(&entries);
        assert_eq!(valid.len(), 2);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].error_code(), "DUPLICATE_ENTRY_ID");
        assert_eq!(errors[0].entry_id(), "JE-1");
    }

    #[test]
    fn test_invalid_entries_excluded_in_order() {
        let entries = vec![
            entry("JE-1"),
            JournalEntry {
                year: 1990,
                ..entry("JE-2")
            },
            entry("JE-3"),
        ];
        let (valid, errors) = validate_entries(&entries);
        let ids: Vec<&str> = valid.iter().map(|e| e.entry_id.as_str()).collect();
        assert_eq!(ids, vec!["JE-1", "JE-3"]);
        assert_eq!(errors.len(), 1);
    }
}
