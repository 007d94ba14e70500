//! Quarterly aggregation over the account hierarchy.
//!
//! This module implements:
//! - Per-account quarterly buckets with signed net amounts
//! - Level totals and yearly summaries
//! - Parent/child consistency checks and ancestor roll-up

pub mod aggregator;
pub mod types;

#[cfg(test)]
mod aggregator_props;

pub use aggregator::QuarterlyAggregator;
pub use types::{HierarchicalTotals, QuarterlyAggregation, TotalsMismatch, YearlySummary};
