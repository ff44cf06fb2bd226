//! Evaluation planner.
//!
//! Produces the post-order visitation sequence shared by the in-memory
//! evaluator and the SQL translator: every child appears before its
//! parent, and a left child before its right sibling. Consumers keep one
//! slot of state per step and look up children by index.

use crate::expression::Node;

/// One node of the plan together with the indexes of its children's steps
#[derive(Debug, Clone, Copy)]
pub struct PlanStep<'a> {
    pub node: &'a Node,
    /// Indexes into the plan; empty for leaves
    pub children: &'a [usize],
}

/// Post-order sequence of node references
#[derive(Debug, Clone)]
pub struct EvaluationPlan<'a> {
    nodes: Vec<&'a Node>,
    child_indexes: Vec<Vec<usize>>,
}

impl<'a> EvaluationPlan<'a> {
    /// Build the plan for `root`.
    ///
    /// The walk keeps its own stack, so a normalized chain of any depth
    /// can be planned.
    pub fn new(root: &'a Node) -> Self {
        let size = root.size();
        let mut plan = Self {
            nodes: Vec::with_capacity(size),
            child_indexes: Vec::with_capacity(size),
        };

        // `finished` holds the step indexes of completed subtrees whose
        // parent has not been emitted yet, left to right
        let mut pending = vec![(root, false)];
        let mut finished: Vec<usize> = Vec::new();

        while let Some((node, expanded)) = pending.pop() {
            let children = node.children();
            if expanded || children.is_empty() {
                let child_indexes = finished.split_off(finished.len() - children.len());
                plan.nodes.push(node);
                plan.child_indexes.push(child_indexes);
                finished.push(plan.nodes.len() - 1);
            } else {
                pending.push((node, true));
                pending.extend(children.iter().rev().map(|child| (child, false)));
            }
        }
        plan
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn step(&self, index: usize) -> PlanStep<'_> {
        PlanStep {
            node: self.nodes[index],
            children: &self.child_indexes[index],
        }
    }

    pub fn steps(&self) -> impl Iterator<Item = PlanStep<'_>> + '_ {
        (0..self.len()).map(move |index| self.step(index))
    }

    /// Nodes in visitation order
    pub fn nodes(&self) -> &[&'a Node] {
        &self.nodes
    }

    /// Index of the root step (always the last one)
    pub fn root_index(&self) -> usize {
        self.nodes.len() - 1
    }
}

/// Build the post-order plan for a tree
pub fn plan(root: &Node) -> EvaluationPlan<'_> {
    EvaluationPlan::new(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::Comparison;

    fn leaf(name: &str) -> Node {
        Node::compare(name, Comparison::Equal, 1i64)
    }

    fn labels(plan: &EvaluationPlan<'_>) -> Vec<String> {
        plan.nodes()
            .iter()
            .map(|node| match node.as_leaf() {
                Some(leaf) => leaf.describe_property(),
                None => "group".to_string(),
            })
            .collect()
    }

    #[test]
    fn test_single_leaf() {
        let tree = leaf("a");
        let plan = plan(&tree);
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.root_index(), 0);
        assert!(plan.step(0).children.is_empty());
    }

    #[test]
    fn test_post_order() {
        let tree = Node::and(leaf("a"), Node::or(leaf("b"), leaf("c")));
        let plan = plan(&tree);
        assert_eq!(labels(&plan), vec!["a", "b", "c", "group", "group"]);
        assert_eq!(plan.step(3).children, &[1, 2]);
        assert_eq!(plan.step(4).children, &[0, 3]);
        assert!(std::ptr::eq(plan.step(plan.root_index()).node, &tree));
    }

    #[test]
    fn test_children_precede_parent() {
        let tree = Node::any(vec![
            Node::all(vec![leaf("a"), leaf("b"), leaf("c")]),
            leaf("d"),
            Node::and(leaf("e"), leaf("f")),
        ])
        .normalized();
        let plan = plan(&tree);
        assert_eq!(plan.len(), tree.size());
        for (index, step) in plan.steps().enumerate() {
            assert!(step.children.iter().all(|child| *child < index));
        }
    }

    #[test]
    fn test_deep_chain() {
        let width = 100_000;
        let tree = Node::all((0..width).map(|_| leaf("a")).collect()).normalized();
        let plan = plan(&tree);
        assert_eq!(plan.len(), 2 * width - 1);
        // The innermost pair comes first, then one group per remaining leaf
        assert_eq!(plan.step(2).children, &[0, 1]);
        assert_eq!(plan.step(4).children, &[2, 3]);
        assert_eq!(plan.step(plan.root_index()).children, &[plan.len() - 3, plan.len() - 2]);
        assert!(std::ptr::eq(plan.step(plan.root_index()).node, &tree));
    }

    #[test]
    fn test_deterministic() {
        let tree = Node::or(Node::and(leaf("a"), leaf("b")), leaf("c"));
        let first: Vec<_> = plan(&tree).steps().map(|s| s.children.to_vec()).collect();
        let second: Vec<_> = plan(&tree.clone())
            .steps()
            .map(|s| s.children.to_vec())
            .collect();
        assert_eq!(first, second);
        assert_eq!(labels(&plan(&tree)), vec!["a", "b", "group", "c", "group"]);
    }
}
