//! Operator definitions for predicate trees.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Boolean connective of an internal node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogicalOperator {
    And,
    Or,
}

impl LogicalOperator {
    /// Combine the truth values of two children
    pub fn evaluate(&self, left: bool, right: bool) -> bool {
        match self {
            LogicalOperator::And => left && right,
            LogicalOperator::Or => left || right,
        }
    }

    /// Keyword used when rendering SQL
    pub fn keyword(&self) -> &'static str {
        match self {
            LogicalOperator::And => "and",
            LogicalOperator::Or => "or",
        }
    }
}

/// Comparison performed by a leaf node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Comparison {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqualTo,
    LessThan,
    LessThanOrEqualTo,
    In,
    Like,
}

impl Comparison {
    /// Whether an ordering between field and comparand satisfies this comparison.
    ///
    /// `In` and `Like` are not ordering based and always return false here.
    pub fn holds(&self, ordering: Ordering) -> bool {
        match self {
            Comparison::Equal => ordering == Ordering::Equal,
            Comparison::NotEqual => ordering != Ordering::Equal,
            Comparison::GreaterThan => ordering == Ordering::Greater,
            Comparison::GreaterThanOrEqualTo => ordering != Ordering::Less,
            Comparison::LessThan => ordering == Ordering::Less,
            Comparison::LessThanOrEqualTo => ordering != Ordering::Greater,
            Comparison::In | Comparison::Like => false,
        }
    }

    /// Whether the comparison is an ordering comparison (`=`, `<`, ...)
    pub fn is_ordering(&self) -> bool {
        !matches!(self, Comparison::In | Comparison::Like)
    }

    /// Get the SQL operator for this comparison
    pub fn as_sql(&self) -> &'static str {
        match self {
            Comparison::Equal => "=",
            Comparison::NotEqual => "<>",
            Comparison::GreaterThan => ">",
            Comparison::GreaterThanOrEqualTo => ">=",
            Comparison::LessThan => "<",
            Comparison::LessThanOrEqualTo => "<=",
            Comparison::In => "in",
            Comparison::Like => "like",
        }
    }
}

/// How a leaf interprets its property and comparands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    /// Literal boolean carried in the leaf value
    Constant,
    /// Record identity
    Key,
    /// Named field of the record's value bag
    Value,
    /// Named field of the record's meta bag
    Meta,
    /// Physical column, produced by rewrite hooks
    Column,
}

impl Mode {
    /// Whether leaves in this mode must name a property
    pub fn requires_property(&self) -> bool {
        matches!(self, Mode::Value | Mode::Meta | Mode::Column)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mode::Constant => "constant",
            Mode::Key => "key",
            Mode::Value => "value",
            Mode::Meta => "meta",
            Mode::Column => "column",
        };
        f.write_str(name)
    }
}
