//! Tree-walking evaluation of compiled conditions.

use std::cmp::Ordering;

use chrono::NaiveDate;

use super::ast::{CompareOp, Expr, Value};
use crate::rules::error::RuleError;

/// A flat record conditions are evaluated against.
pub trait Record {
    /// Value of a field, or `None` if the record has no such field.
    fn field(&self, name: &str) -> Option<Value>;
}

impl Expr {
    /// Evaluates the expression to a boolean.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::Evaluation`] for unknown fields, type mismatches
    /// in ordering or membership tests, and non-boolean results.
    pub fn evaluate(&self, record: &dyn Record) -> Result<bool, RuleError> {
        as_bool(self.value(record)?)
    }

    fn value(&self, record: &dyn Record) -> Result<Value, RuleError> {
        match self {
            Self::Literal(value) => Ok(value.clone()),
            Self::Field(name) => record
                .field(name)
                .ok_or_else(|| RuleError::evaluation(format!("unknown field '{name}'"))),
            Self::List(items) => items
                .iter()
                .map(|item| item.value(record))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),
            Self::Compare { op, left, right } => {
                compare(*op, &left.value(record)?, &right.value(record)?).map(Value::Bool)
            }
            Self::In {
                needle,
                haystack,
                negated,
            } => contains(&haystack.value(record)?, &needle.value(record)?)
                .map(|found| Value::Bool(found != *negated)),
            Self::And(left, right) => {
                if !left.evaluate(record)? {
                    return Ok(Value::Bool(false));
                }
                right.evaluate(record).map(Value::Bool)
            }
            Self::Or(left, right) => {
                if left.evaluate(record)? {
                    return Ok(Value::Bool(true));
                }
                right.evaluate(record).map(Value::Bool)
            }
            Self::Not(inner) => inner.evaluate(record).map(|b| Value::Bool(!b)),
        }
    }
}

fn as_bool(value: Value) -> Result<bool, RuleError> {
    match value {
        Value::Bool(b) => Ok(b),
        other => Err(RuleError::evaluation(format!(
            "expected a boolean, got {}",
            other.type_name()
        ))),
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}

fn equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => a == b,
        (Value::Text(a), Value::Text(b)) => a == b,
        (Value::Date(a), Value::Date(b)) => a == b,
        (Value::Date(d), Value::Text(s)) | (Value::Text(s), Value::Date(d)) => {
            parse_date(s).is_some_and(|parsed| parsed == *d)
        }
        (Value::List(a), Value::List(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| equals(x, y))
        }
        _ => false,
    }
}

fn order(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Some(a.cmp(b)),
        (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
        (Value::Date(a), Value::Date(b)) => Some(a.cmp(b)),
        (Value::Date(a), Value::Text(s)) => parse_date(s).map(|b| a.cmp(&b)),
        (Value::Text(s), Value::Date(b)) => parse_date(s).map(|a| a.cmp(b)),
        _ => None,
    }
}

fn compare(op: CompareOp, left: &Value, right: &Value) -> Result<bool, RuleError> {
    match op {
        CompareOp::Eq => Ok(equals(left, right)),
        CompareOp::Ne => Ok(!equals(left, right)),
        CompareOp::Gt | CompareOp::Lt | CompareOp::Ge | CompareOp::Le => {
            let ordering = order(left, right).ok_or_else(|| {
                RuleError::evaluation(format!(
                    "cannot compare {} with {} using '{}'",
                    left.type_name(),
                    right.type_name(),
                    op.symbol()
                ))
            })?;
            Ok(match op {
                CompareOp::Gt => ordering.is_gt(),
                CompareOp::Lt => ordering.is_lt(),
                CompareOp::Ge => ordering.is_ge(),
                _ => ordering.is_le(),
            })
        }
    }
}

fn contains(haystack: &Value, needle: &Value) -> Result<bool, RuleError> {
    match (haystack, needle) {
        (Value::Text(h), Value::Text(n)) => Ok(h.contains(n.as_str())),
        (Value::Text(_), other) => Err(RuleError::evaluation(format!(
            "'in' on a string requires a string, got {}",
            other.type_name()
        ))),
        (Value::List(items), n) => Ok(items.iter().any(|item| equals(item, n))),
        (other, _) => Err(RuleError::evaluation(format!(
            "'in' requires a string or list, got {}",
            other.type_name()
        ))),
    }
}
