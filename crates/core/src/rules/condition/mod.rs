//! Condition language for mapping rules.
//!
//! Conditions are small boolean expressions over the fields of one flat
//! record, for example:
//!
//! ```text
//! old_type == "OL" and amount >= 1000
//! "refund" in description or notes != null
//! old_type in ["OL", "OL-d"] and date < "2024-07-01"
//! ```
//!
//! Strings are compared exactly, numbers as exact decimals, and dates
//! against dates or ISO `YYYY-MM-DD` strings. Nothing outside the record
//! can be referenced.

mod ast;
mod eval;
mod lexer;
mod parser;


pub use ast::{CompareOp, Expr, Value};
pub use eval::Record;
pub use parser::parse;
