//! Typed expression tree for rule conditions.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Runtime value of a field or literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Absent value (`null` / `none`).
    Null,
    /// Boolean.
    Bool(bool),
    /// Exact decimal number.
    Number(Decimal),
    /// Text.
    Text(String),
    /// Calendar date.
    Date(NaiveDate),
    /// List of values (only produced by list literals).
    List(Vec<Value>),
}

impl Value {
    /// Short type name for error messages.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::Text(_) => "string",
            Self::Date(_) => "date",
            Self::List(_) => "list",
        }
    }
}

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `>`
    Gt,
    /// `<`
    Lt,
    /// `>=`
    Ge,
    /// `<=`
    Le,
}

impl CompareOp {
    /// Operator symbol.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Ge => ">=",
            Self::Le => "<=",
        }
    }
}

/// Compiled condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// Constant value.
    Literal(Value),
    /// Reference to a record field.
    Field(String),
    /// `[a, b, ...]`
    List(Vec<Expr>),
    /// Binary comparison.
    Compare {
        /// Operator.
        op: CompareOp,
        /// Left operand.
        left: Box<Expr>,
        /// Right operand.
        right: Box<Expr>,
    },
    /// Substring or list membership (`needle in haystack`).
    In {
        /// Value searched for.
        needle: Box<Expr>,
        /// String or list searched in.
        haystack: Box<Expr>,
        /// `not in`.
        negated: bool,
    },
    /// Logical conjunction, short-circuiting.
    And(Box<Expr>, Box<Expr>),
    /// Logical disjunction, short-circuiting.
    Or(Box<Expr>, Box<Expr>),
    /// Logical negation.
    Not(Box<Expr>),
}

impl Expr {
    /// Field names referenced anywhere in the expression.
    #[must_use]
    pub fn referenced_fields(&self) -> BTreeSet<String> {
        let mut fields = BTreeSet::new();
        self.collect_fields(&mut fields);
        fields
    }

    fn collect_fields(&self, out: &mut BTreeSet<String>) {
        match self {
            Self::Literal(_) => {}
            Self::Field(name) => {
                out.insert(name.clone());
            }
            Self::List(items) => items.iter().for_each(|i| i.collect_fields(out)),
            Self::Compare { left, right, .. } | Self::And(left, right) | Self::Or(left, right) => {
                left.collect_fields(out);
                right.collect_fields(out);
            }
            Self::In {
                needle, haystack, ..
            } => {
                needle.collect_fields(out);
                haystack.collect_fields(out);
            }
            Self::Not(inner) => inner.collect_fields(out),
        }
    }
}
