//! Builder pattern for creating predicate trees easily.
//!
//! This module provides a fluent API for building the trees consumed by
//! the in-memory evaluator and the SQL translator.

use crate::expression::{Comparison, Node};
use crate::value::Value;

/// Builder for creating predicate trees
pub struct FilterBuilder;

impl FilterBuilder {
    /// Create a new filter builder
    pub fn new() -> Self {
        Self
    }

    /// Create an equality comparison (field = value)
    pub fn eq(property: &str, value: impl Into<Value>) -> Node {
        Node::compare(property, Comparison::Equal, value)
    }

    /// Create a not-equal comparison (field <> value)
    pub fn ne(property: &str, value: impl Into<Value>) -> Node {
        Node::compare(property, Comparison::NotEqual, value)
    }

    /// Create a less-than comparison (field < value)
    pub fn lt(property: &str, value: impl Into<Value>) -> Node {
        Node::compare(property, Comparison::LessThan, value)
    }

    /// Create a less-than-or-equal comparison (field <= value)
    pub fn le(property: &str, value: impl Into<Value>) -> Node {
        Node::compare(property, Comparison::LessThanOrEqualTo, value)
    }

    /// Create a greater-than comparison (field > value)
    pub fn gt(property: &str, value: impl Into<Value>) -> Node {
        Node::compare(property, Comparison::GreaterThan, value)
    }

    /// Create a greater-than-or-equal comparison (field >= value)
    pub fn ge(property: &str, value: impl Into<Value>) -> Node {
        Node::compare(property, Comparison::GreaterThanOrEqualTo, value)
    }

    /// Create a membership test (field in (...))
    pub fn in_list<I, V>(property: &str, values: I) -> Node
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Node::in_values(property, values)
    }

    /// Create a pattern match (field like pattern)
    pub fn like(property: &str, pattern: impl Into<String>) -> Node {
        Node::like(property, pattern)
    }

    /// Create a comparison against a meta field
    pub fn meta(property: &str, comparison: Comparison, value: impl Into<Value>) -> Node {
        Node::meta(property, comparison, value)
    }

    /// Match a single record key
    pub fn key(key: impl Into<String>) -> Node {
        Node::key(Comparison::Equal, Value::String(key.into()))
    }

    /// Match any of the given record keys
    pub fn keys<I, K>(keys: I) -> Node
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        Node::keys(keys.into_iter().map(|k| Value::String(k.into())))
    }

    /// Matches every record
    pub fn always() -> Node {
        Node::constant(true)
    }

    /// Matches no record
    pub fn never() -> Node {
        Node::constant(false)
    }

    /// Create an AND node
    pub fn and(left: Node, right: Node) -> Node {
        Node::and(left, right)
    }

    /// Create an OR node
    pub fn or(left: Node, right: Node) -> Node {
        Node::or(left, right)
    }

    /// Create a NOT node
    pub fn not(node: Node) -> Node {
        node.negate()
    }
}

/// Convenience functions for common filter patterns
impl FilterBuilder {
    /// Inclusive range check (low <= field <= high)
    pub fn between(property: &str, low: impl Into<Value>, high: impl Into<Value>) -> Node {
        Node::and(Self::ge(property, low), Self::le(property, high))
    }

    /// Field starts with the given prefix
    pub fn starts_with(property: &str, prefix: &str) -> Node {
        Self::like(property, format!("{}%", prefix))
    }

    /// Field contains the given fragment
    pub fn contains(property: &str, fragment: &str) -> Node {
        Self::like(property, format!("%{}%", fragment))
    }
}

impl Default for FilterBuilder {
    fn default() -> Self {
        Self::new()
    }
}
