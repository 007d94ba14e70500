//! `(year, old_type) -> new_type` normalization pre-pass.
//!
//! Classification tags drift between years. The mapping lets an operator
//! rename a tag for one year and have later years inherit it: a lookup tries
//! the entry's own year first, then each earlier year down to the floor year.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::entry::JournalEntry;

/// Default earliest year consulted by the fallback.
pub const DEFAULT_FLOOR_YEAR: i32 = 2020;

/// One row of the mapping table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeMappingRow {
    /// Year the mapping applies to.
    pub year: i32,
    /// Source classification tag.
    pub old_type: String,
    /// Replacement tag.
    pub new_type: String,
}

/// Year-aware type remapping table.
#[derive(Debug, Clone)]
pub struct TypeMapping {
    table: HashMap<(i32, String), String>,
    floor_year: i32,
}

impl TypeMapping {
    /// Creates an empty mapping with the given floor year.
    #[must_use]
    pub fn new(floor_year: i32) -> Self {
        Self {
            table: HashMap::new(),
            floor_year,
        }
    }

    /// Builds a mapping from rows. Later rows override earlier ones.
    #[must_use]
    pub fn from_rows(rows: impl IntoIterator<Item = TypeMappingRow>, floor_year: i32) -> Self {
        let mut mapping = Self::new(floor_year);
        for row in rows {
            mapping.insert(row.year, row.old_type, row.new_type);
        }
        mapping
    }

    /// Adds or replaces one mapping.
    pub fn insert(&mut self, year: i32, old_type: impl Into<String>, new_type: impl Into<String>) {
        self.table.insert((year, old_type.into()), new_type.into());
    }

    /// Earliest year consulted by the fallback.
    #[must_use]
    pub fn floor_year(&self) -> i32 {
        self.floor_year
    }

    /// Number of mappings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns true if there are no mappings.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Finds the replacement for `old_type` in `year`.
    ///
    /// Tries `year` itself, then `year - 1` and so on down to the floor year.
    #[must_use]
    pub fn lookup(&self, year: i32, old_type: &str) -> Option<&str> {
        let key = |y: i32| (y, old_type.to_string());
        if let Some(found) = self.table.get(&key(year)) {
            return Some(found.as_str());
        }
        (self.floor_year..year)
            .rev()
            .find_map(|y| self.table.get(&key(y)))
            .map(String::as_str)
    }

    /// Returns a copy of `entry` with `old_type` remapped, or an unchanged
    /// copy when no mapping applies.
    #[must_use]
    pub fn apply(&self, entry: &JournalEntry) -> JournalEntry {
        match self.lookup(entry.year, &entry.old_type) {
            Some(new_type) if new_type != entry.old_type => {
                tracing::debug!(
                    entry_id = %entry.entry_id,
                    from = %entry.old_type,
                    to = %new_type,
                    "Remapped old_type"
                );
                entry.with_old_type(new_type)
            }
            _ => entry.clone(),
        }
    }

    /// Applies the mapping to every entry, preserving order.
    #[must_use]
    pub fn apply_all(&self, entries: &[JournalEntry]) -> Vec<JournalEntry> {
        entries.iter().map(|e| self.apply(e)).collect()
    }
}

impl Default for TypeMapping {
    fn default() -> Self {
        Self::new(DEFAULT_FLOOR_YEAR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn mapping() -> TypeMapping {
        let mut m = TypeMapping::new(2020);
        m.insert(2021, "OL", "OL-2021");
        m.insert(2023, "OL", "OL-2023");
        m.insert(2019, "XS", "XS-old");
        m
    }

    #[test]
    fn test_exact_year() {
        assert_eq!(mapping().lookup(2023, "OL"), Some("OL-2023"));
    }

    #[test]
    fn test_falls_back_to_nearest_earlier_year() {
        let m = mapping();
        assert_eq!(m.lookup(2024, "OL"), Some("OL-2023"));
        assert_eq!(m.lookup(2022, "OL"), Some("OL-2021"));
    }

    #[test]
    fn test_fallback_stops_at_floor() {
        let m = mapping();
        assert_eq!(m.lookup(2020, "OL"), None);
        // 2019 is below the floor, only reachable as an exact year.
        assert_eq!(m.lookup(2024, "XS"), None);
        assert_eq!(m.lookup(2019, "XS"), Some("XS-old"));
    }

    #[test]
    fn test_unknown_type_unchanged() {
        let m = mapping();
        let e = JournalEntry::new(
            "JE-1",
            "x",
            "ZZ",
            dec!(1),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        );
        assert_eq!(m.apply(&e), e);
    }

    #[test]
    fn test_apply_all_produces_new_entries() {
        let m = mapping();
        let e = JournalEntry::new(
            "JE-1",
            "x",
            "OL",
            dec!(1),
            NaiveDate::from_ymd_opt(2022, 6, 1).unwrap(),
        );
        let out = m.apply_all(std::slice::from_ref(&e));
        assert_eq!(out[0].old_type, "OL-2021");
        assert_eq!(e.old_type, "OL");
    }

    #[test]
    fn test_from_rows() {
        let rows: Vec<TypeMappingRow> = serde_json::from_str(
            r#"[{"year": 2022, "old_type": "A", "new_type": "B"},
                {"year": 2022, "old_type": "A", "new_type": "C"}]"#,
        )
        .unwrap();
        let m = TypeMapping::from_rows(rows, 2020);
        assert_eq!(m.len(), 1);
        assert_eq!(m.lookup(2022, "A"), Some("C"));
    }
}
