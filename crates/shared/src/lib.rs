//! Shared types, errors, and configuration for Ledgerflow.
//!
//! This crate provides common types used across all other crates:
//! - Reporting periods (quarters) and amount tolerance helpers
//! - Typed IDs for processing runs
//! - Application-wide error types
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::{AppConfig, EngineConfig};
pub use error::{AppError, AppResult};
