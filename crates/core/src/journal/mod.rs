//! Journal entries: the source transactions fed into rule application.
//!
//! This module provides:
//! - The `JournalEntry` domain type and its condition-evaluation record
//! - Pre-application validation (`validate_entries`)
//! - The `(year, old_type)` normalization pre-pass (`TypeMapping`)

pub mod entry;
pub mod error;
pub mod type_mapping;
pub mod validation;

#[cfg(test)]
mod type_mapping_props;

pub use entry::{ENTRY_FIELDS, JournalEntry};
pub use error::JournalError;
pub use type_mapping::{DEFAULT_FLOOR_YEAR, TypeMapping, TypeMappingRow};
pub use validation::{MAX_AMOUNT, MAX_YEAR, MIN_YEAR, validate_entries, validate_entry};
