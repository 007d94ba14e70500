//! Property-based tests for the type mapping year fallback.
//!
//! Feature: type-mapping, Property 1: Fallback never crosses the floor year

use proptest::prelude::*;

use super::type_mapping::TypeMapping;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property 1.1: A mapping defined at or above the floor is found from
    /// any later year.
    #[test]
    fn prop_mapping_inherited_by_later_years(
        floor in 2000i32..2050,
        offset in 0i32..20,
        later in 0i32..30,
    ) {
        let mapped_year = floor + offset;
        let mut mapping = TypeMapping::new(floor);
        mapping.insert(mapped_year, "OL", "NEW");

        prop_assert_eq!(mapping.lookup(mapped_year + later, "OL"), Some("NEW"));
    }

    /// Property 1.2: A mapping defined below the floor is never reached by
    /// fallback from a later year.
    #[test]
    fn prop_mapping_below_floor_ignored(
        floor in 2000i32..2050,
        below in 1i32..10,
        later in 1i32..30,
    ) {
        let mut mapping = TypeMapping::new(floor);
        mapping.insert(floor - below, "OL", "OLD");

        prop_assert_eq!(mapping.lookup(floor - below + later.max(below), "OL"), None);
    }

    /// Property 1.3: Lookups never see mappings from later years.
    #[test]
    fn prop_future_mappings_invisible(
        year in 2020i32..2080,
        ahead in 1i32..20,
    ) {
        let mut mapping = TypeMapping::new(2020);
        mapping.insert(year + ahead, "OL", "FUTURE");

        prop_assert_eq!(mapping.lookup(year, "OL"), None);
    }
}
