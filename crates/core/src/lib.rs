//! Core processing engine for Ledgerflow.
//!
//! This crate contains pure business logic with ZERO I/O.
//! Journal entries, mapping rules, and the chart of accounts come in as
//! values; postings, aggregates, and issue lists go out as values.
//!
//! # Modules
//!
//! - `hierarchy` - Four-level chart of accounts
//! - `journal` - Journal entries, entry validation, legacy type mapping
//! - `rules` - Condition language, rule validation and application
//! - `ledger` - Generated postings and their validation
//! - `aggregation` - Quarterly aggregation and hierarchy roll-up
//! - `pipeline` - End-to-end batch processing

pub mod aggregation;
pub mod hierarchy;
pub mod journal;
pub mod ledger;
pub mod pipeline;
pub mod rules;
