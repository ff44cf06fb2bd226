//! Predicate tree nodes.

use crate::error::{QueryError, QueryResult};
use crate::expression::operator::{Comparison, LogicalOperator, Mode};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single comparison against one property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leaf {
    pub mode: Mode,
    pub comparison: Comparison,
    /// Field or column name; unused by `Constant` and `Key` leaves
    pub property: Option<String>,
    /// Comparand for everything except `In`
    pub value: Value,
    /// Comparand set for `In`
    pub values: Vec<Value>,
}

impl Leaf {
    pub fn new(
        mode: Mode,
        comparison: Comparison,
        property: Option<String>,
        value: Value,
    ) -> Self {
        Self {
            mode,
            comparison,
            property,
            value,
            values: Vec::new(),
        }
    }

    pub fn with_values(mode: Mode, property: Option<String>, values: Vec<Value>) -> Self {
        Self {
            mode,
            comparison: Comparison::In,
            property,
            value: Value::Null,
            values,
        }
    }

    /// Name used in diagnostics
    pub fn describe_property(&self) -> String {
        match (&self.mode, &self.property) {
            (_, Some(name)) => name.clone(),
            (Mode::Key, None) => "<key>".to_string(),
            (mode, None) => format!("<{}>", mode),
        }
    }

    /// Truth value of a `Constant` leaf.
    ///
    /// `Equal` yields the literal, `NotEqual` its inverse.
    pub fn constant_truth(&self) -> QueryResult<bool> {
        let literal = match (&self.mode, &self.value) {
            (Mode::Constant, Value::Boolean(b)) => *b,
            (Mode::Constant, other) => {
                return Err(QueryError::malformed(format!(
                    "constant leaf carries non-boolean literal {}",
                    other
                )))
            }
            (mode, _) => {
                return Err(QueryError::malformed(format!(
                    "{} leaf has no constant truth value",
                    mode
                )))
            }
        };

        match self.comparison {
            Comparison::Equal => Ok(literal),
            Comparison::NotEqual => Ok(!literal),
            other => Err(QueryError::malformed(format!(
                "constant leaf cannot use comparison {:?}",
                other
            ))),
        }
    }
}

/// Leaf or boolean group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    Leaf(Leaf),
    Group {
        operator: LogicalOperator,
        children: Vec<Node>,
    },
}

/// Predicate tree node.
///
/// Normalization turns a wide group into a chain as deep as the group is
/// wide, so every walk over a tree (including `Clone`, `PartialEq` and
/// `Drop`) uses an explicit stack instead of recursion.
#[derive(Debug, Serialize, Deserialize)]
pub struct Node {
    /// Inverts the node's truth value after evaluation
    pub negated: bool,
    pub kind: NodeKind,
}

impl Node {
    pub fn leaf(leaf: Leaf) -> Self {
        Self {
            negated: false,
            kind: NodeKind::Leaf(leaf),
        }
    }

    /// Create a group node combining `children` with `operator`
    pub fn group(operator: LogicalOperator, children: Vec<Node>) -> Self {
        Self {
            negated: false,
            kind: NodeKind::Group { operator, children },
        }
    }

    /// Compare a value-bag field
    pub fn compare(
        property: impl Into<String>,
        comparison: Comparison,
        value: impl Into<Value>,
    ) -> Self {
        Self::leaf(Leaf::new(
            Mode::Value,
            comparison,
            Some(property.into()),
            value.into(),
        ))
    }

    /// Compare a meta-bag field
    pub fn meta(
        property: impl Into<String>,
        comparison: Comparison,
        value: impl Into<Value>,
    ) -> Self {
        Self::leaf(Leaf::new(
            Mode::Meta,
            comparison,
            Some(property.into()),
            value.into(),
        ))
    }

    /// Compare the record identity
    pub fn key(comparison: Comparison, value: impl Into<Value>) -> Self {
        Self::leaf(Leaf::new(Mode::Key, comparison, None, value.into()))
    }

    /// Match any of the given record identities
    pub fn keys<I, V>(keys: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::leaf(Leaf::with_values(
            Mode::Key,
            None,
            keys.into_iter().map(Into::into).collect(),
        ))
    }

    /// Literal always-true or always-false leaf
    pub fn constant(value: bool) -> Self {
        Self::leaf(Leaf::new(
            Mode::Constant,
            Comparison::Equal,
            None,
            Value::Boolean(value),
        ))
    }

    /// Membership of a value-bag field in a set
    pub fn in_values<I, V>(property: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::leaf(Leaf::with_values(
            Mode::Value,
            Some(property.into()),
            values.into_iter().map(Into::into).collect(),
        ))
    }

    /// SQL-style pattern match on a value-bag field
    pub fn like(property: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::compare(property, Comparison::Like, Value::String(pattern.into()))
    }

    /// Compare a physical column directly
    pub fn column(
        column: impl Into<String>,
        comparison: Comparison,
        value: impl Into<Value>,
    ) -> Self {
        Self::leaf(Leaf::new(
            Mode::Column,
            comparison,
            Some(column.into()),
            value.into(),
        ))
    }

    /// Membership of a physical column in a set
    pub fn column_in(column: impl Into<String>, values: Vec<Value>) -> Self {
        Self::leaf(Leaf::with_values(Mode::Column, Some(column.into()), values))
    }

    pub fn and(left: Node, right: Node) -> Self {
        Self::group(LogicalOperator::And, vec![left, right])
    }

    pub fn or(left: Node, right: Node) -> Self {
        Self::group(LogicalOperator::Or, vec![left, right])
    }

    /// AND over any number of children
    pub fn all(children: Vec<Node>) -> Self {
        Self::group(LogicalOperator::And, children)
    }

    /// OR over any number of children
    pub fn any(children: Vec<Node>) -> Self {
        Self::group(LogicalOperator::Or, children)
    }

    /// Logical negation of this node
    pub fn negate(mut self) -> Self {
        self.negated = !self.negated;
        self
    }

    /// Compose an additional negation onto this node (XOR)
    pub fn with_negation(mut self, negated: bool) -> Self {
        self.negated ^= negated;
        self
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf(_))
    }

    pub fn as_leaf(&self) -> Option<&Leaf> {
        match &self.kind {
            NodeKind::Leaf(leaf) => Some(leaf),
            NodeKind::Group { .. } => None,
        }
    }

    pub fn children(&self) -> &[Node] {
        match &self.kind {
            NodeKind::Leaf(_) => &[],
            NodeKind::Group { children, .. } => children,
        }
    }

    /// Number of nodes in the tree
    pub fn size(&self) -> usize {
        let mut pending = vec![self];
        let mut count = 0;
        while let Some(node) = pending.pop() {
            count += 1;
            pending.extend(node.children());
        }
        count
    }

    /// Height of the tree; a single leaf has depth 1
    pub fn depth(&self) -> usize {
        let mut pending = vec![(self, 1)];
        let mut deepest = 0;
        while let Some((node, depth)) = pending.pop() {
            deepest = deepest.max(depth);
            pending.extend(node.children().iter().map(|child| (child, depth + 1)));
        }
        deepest
    }

    /// Visit every leaf left to right
    pub fn leaves(&self) -> Vec<&Leaf> {
        let mut leaves = Vec::new();
        let mut pending = vec![self];
        while let Some(node) = pending.pop() {
            match &node.kind {
                NodeKind::Leaf(leaf) => leaves.push(leaf),
                NodeKind::Group { children, .. } => pending.extend(children.iter().rev()),
            }
        }
        leaves
    }

    /// Serialize the tree into its compact binary form
    pub fn encode(&self) -> QueryResult<Vec<u8>> {
        bincode::serialize(self).map_err(|e| QueryError::Encoding(e.to_string()))
    }

    /// Rebuild a tree from [`Node::encode`] output
    pub fn decode(bytes: &[u8]) -> QueryResult<Self> {
        bincode::deserialize(bytes).map_err(|e| QueryError::Encoding(e.to_string()))
    }
}

impl Clone for Node {
    fn clone(&self) -> Self {
        // Children are rebuilt before their parent; `built` holds finished
        // subtrees left to right
        let mut pending = vec![(self, false)];
        let mut built: Vec<Node> = Vec::new();

        while let Some((node, expanded)) = pending.pop() {
            match &node.kind {
                NodeKind::Leaf(leaf) => built.push(Node {
                    negated: node.negated,
                    kind: NodeKind::Leaf(leaf.clone()),
                }),
                NodeKind::Group { operator, children } if expanded => {
                    let children = built.split_off(built.len() - children.len());
                    built.push(Node {
                        negated: node.negated,
                        kind: NodeKind::Group {
                            operator: *operator,
                            children,
                        },
                    });
                }
                NodeKind::Group { children, .. } => {
                    pending.push((node, true));
                    pending.extend(children.iter().rev().map(|child| (child, false)));
                }
            }
        }

        // Only the root is left
        built.swap_remove(0)
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        let mut pending = vec![(self, other)];
        while let Some((left, right)) = pending.pop() {
            if left.negated != right.negated {
                return false;
            }
            match (&left.kind, &right.kind) {
                (NodeKind::Leaf(a), NodeKind::Leaf(b)) if a == b => {}
                (
                    NodeKind::Group {
                        operator: a,
                        children: left_children,
                    },
                    NodeKind::Group {
                        operator: b,
                        children: right_children,
                    },
                ) if a == b && left_children.len() == right_children.len() => {
                    pending.extend(left_children.iter().zip(right_children));
                }
                _ => return false,
            }
        }
        true
    }
}

impl Drop for Node {
    fn drop(&mut self) {
        let NodeKind::Group { children, .. } = &mut self.kind else {
            return;
        };
        if children.iter().all(Node::is_leaf) {
            return;
        }

        // Detach grandchildren before each child is dropped
        let mut pending = std::mem::take(children);
        while let Some(mut node) = pending.pop() {
            if let NodeKind::Group { children, .. } = &mut node.kind {
                pending.append(children);
            }
        }
    }
}

impl fmt::Display for Leaf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let target = match (self.mode, &self.property) {
            (Mode::Constant, _) => {
                return match self.constant_truth() {
                    Ok(truth) => write!(f, "{}", truth),
                    Err(_) => write!(f, "<invalid constant>"),
                }
            }
            (Mode::Key, _) => "key".to_string(),
            (Mode::Meta, Some(name)) => format!("meta.{}", name),
            (Mode::Column, Some(name)) => format!("column.{}", name),
            _ => self.describe_property(),
        };

        if self.comparison == Comparison::In {
            let values: Vec<String> = self.values.iter().map(ToString::to_string).collect();
            write!(f, "{} in ({})", target, values.join(", "))
        } else {
            write!(f, "{} {} {}", target, self.comparison.as_sql(), self.value)
        }
    }
}

enum Piece<'a> {
    Node(&'a Node),
    Separator(LogicalOperator),
    Close,
}

/// Renders in filter-language syntax, e.g. `(age > 30 and not (city = 'NY'))`
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut pending = vec![Piece::Node(self)];
        while let Some(piece) = pending.pop() {
            let node = match piece {
                Piece::Node(node) => node,
                Piece::Separator(operator) => {
                    write!(f, " {} ", operator.keyword())?;
                    continue;
                }
                Piece::Close => {
                    f.write_str(")")?;
                    continue;
                }
            };

            if node.negated {
                f.write_str("not ")?;
            }
            match &node.kind {
                NodeKind::Leaf(leaf) if node.negated => write!(f, "({})", leaf)?,
                NodeKind::Leaf(leaf) => write!(f, "{}", leaf)?,
                NodeKind::Group { operator, children } => {
                    f.write_str("(")?;
                    pending.push(Piece::Close);
                    for (index, child) in children.iter().enumerate().rev() {
                        pending.push(Piece::Node(child));
                        if index > 0 {
                            pending.push(Piece::Separator(*operator));
                        }
                    }
                }
            }
        }
        Ok(())
    }
}
