//! Common types used across the application.

pub mod id;
pub mod period;

pub use id::*;
pub use period::{DEFAULT_TOLERANCE, Period, Quarter, within_tolerance};
