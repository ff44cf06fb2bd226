//! Binary normalization of predicate trees.
//!
//! Consumers of an evaluation plan assume every internal node has exactly
//! two children. Normalization rewrites wider AND/OR groups into a
//! left-leaning chain with the same operator, preserving child order:
//!
//! ```text
//! AND(a, b, c, d)  =>  AND(AND(AND(a, b), c), d)
//! ```

use crate::expression::node::{Node, NodeKind};

impl Node {
    /// Rewrite every group with more than two children into a binary chain.
    ///
    /// The node keeps its own `negated` flag; synthetic inner nodes are
    /// never negated. Normalizing a binary tree leaves it unchanged.
    pub fn normalize(&mut self) {
        let mut pending = vec![self];
        while let Some(node) = pending.pop() {
            let NodeKind::Group { operator, children } = &mut node.kind else {
                continue;
            };

            if children.len() > 2 {
                let operator = *operator;
                let mut chained = std::mem::take(children);
                let last = chained.pop();
                let chain = chained
                    .into_iter()
                    .reduce(|left, right| Node::group(operator, vec![left, right]));
                *children = chain.into_iter().chain(last).collect();
            }
            // Synthetic links are already binary and pass through unchanged
            pending.extend(children.iter_mut());
        }
    }

    /// Normalized deep copy; `self` is left untouched
    pub fn normalized(&self) -> Node {
        let mut copy = self.clone();
        copy.normalize();
        copy
    }

    /// Whether every node has zero or two children
    pub fn is_binary(&self) -> bool {
        let mut pending = vec![self];
        while let Some(node) = pending.pop() {
            match node.children() {
                [] if node.is_leaf() => {}
                children @ [_, _] => pending.extend(children),
                _ => return false,
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use crate::expression::{Comparison, LogicalOperator, Node, NodeKind};

    fn leaf(name: &str) -> Node {
        Node::compare(name, Comparison::Equal, 1i64)
    }

    fn shape(node: &Node) -> String {
        match &node.kind {
            NodeKind::Leaf(leaf) => leaf.describe_property(),
            NodeKind::Group { operator, children } => {
                let op = match operator {
                    LogicalOperator::And => "AND",
                    LogicalOperator::Or => "OR",
                };
                let inner: Vec<_> = children.iter().map(shape).collect();
                let text = format!("{}({})", op, inner.join(", "));
                if node.negated {
                    format!("!{}", text)
                } else {
                    text
                }
            }
        }
    }

    #[test]
    fn test_left_leaning_chain() {
        let tree = Node::all(vec![leaf("a"), leaf("b"), leaf("c"), leaf("d")]);
        let normalized = tree.normalized();
        assert_eq!(shape(&normalized), "AND(AND(AND(a, b), c), d)");
        assert!(normalized.is_binary());
        assert!(!tree.is_binary());
    }

    #[test]
    fn test_three_children() {
        let tree = Node::any(vec![leaf("a"), leaf("b"), leaf("c")]);
        assert_eq!(shape(&tree.normalized()), "OR(OR(a, b), c)");
    }

    #[test]
    fn test_negation_stays_on_original_node() {
        let tree = Node::all(vec![leaf("a"), leaf("b"), leaf("c")]).negate();
        assert_eq!(shape(&tree.normalized()), "!AND(AND(a, b), c)");
    }

    #[test]
    fn test_nested_groups_are_normalized() {
        let tree = Node::and(
            Node::any(vec![leaf("a"), leaf("b"), leaf("c")]),
            Node::all(vec![leaf("d"), leaf("e"), leaf("f")]),
        );
        let normalized = tree.normalized();
        assert_eq!(
            shape(&normalized),
            "AND(OR(OR(a, b), c), AND(AND(d, e), f))"
        );
        assert!(normalized.is_binary());
    }

    #[test]
    fn test_idempotent() {
        let tree = Node::any(vec![
            leaf("a"),
            Node::all(vec![leaf("b"), leaf("c"), leaf("d"), leaf("e")]),
            leaf("f"),
        ]);
        let once = tree.normalized();
        let twice = once.normalized();
        assert_eq!(once, twice);

        let binary = Node::and(leaf("a"), Node::or(leaf("b"), leaf("c")));
        assert_eq!(binary.normalized(), binary);
    }

    #[test]
    fn test_wide_group_becomes_deep_chain() {
        let width = 100_000;
        let tree = Node::any((0..width).map(|_| leaf("a")).collect());
        let normalized = tree.normalized();
        assert_eq!(normalized.depth(), width);
        assert_eq!(normalized.size(), 2 * width - 1);
        assert_eq!(normalized.leaves().len(), width);
        assert!(normalized.is_binary());

        let copy = normalized.clone();
        assert_eq!(copy, normalized);
        assert_eq!(copy.normalized(), normalized);
        assert!(copy.to_string().ends_with(") or a = 1)"));
    }

    #[test]
    fn test_leaf_is_untouched() {
        let single = leaf("a");
        assert_eq!(single.normalized(), single);
        assert!(single.is_binary());
    }
}
