//! Set-based evaluation of predicate trees over in-memory records.
//!
//! Nodes are processed in plan order. Every node produces its raw
//! true-key set; a node's `negated` flag is applied where the set is
//! consumed (XOR inside the parent, complement at the root) so leaf scans
//! never change for negation.

use crate::error::{QueryError, QueryResult};
use crate::expression::{Comparison, Leaf, LogicalOperator, Mode, Node, NodeKind};
use crate::memory::record::{RecordKey, RecordSource};
use crate::planner::{plan, EvaluationPlan};
use crate::value::{DataType, Value};
use log::{debug, trace};
use std::cmp::Ordering;
use std::collections::BTreeSet;

type KeySet = BTreeSet<RecordKey>;

/// Evaluates predicate trees against a record source
pub struct MemoryEvaluator<'a, S: RecordSource + ?Sized> {
    source: &'a S,
    universe: KeySet,
}

impl<'a, S: RecordSource + ?Sized> MemoryEvaluator<'a, S> {
    /// Evaluate over every key of `source`
    pub fn new(source: &'a S) -> Self {
        let universe = source.keys();
        Self { source, universe }
    }

    /// Evaluate over an explicit key universe
    pub fn with_universe(source: &'a S, universe: KeySet) -> Self {
        Self { source, universe }
    }

    pub fn universe(&self) -> &KeySet {
        &self.universe
    }

    /// Keys satisfying `node`. The caller's tree is cloned before it is
    /// normalized.
    pub fn evaluate(&self, node: &Node) -> QueryResult<KeySet> {
        let tree = node.normalized();
        tree.validate_shape()?;
        let plan = plan(&tree);
        self.evaluate_plan(&plan)
    }

    /// Evaluate an already normalized plan
    pub fn evaluate_plan(&self, plan: &EvaluationPlan<'_>) -> QueryResult<KeySet> {
        if plan.is_empty() {
            return Err(QueryError::malformed("empty evaluation plan"));
        }

        let mut sets: Vec<KeySet> = Vec::with_capacity(plan.len());

        for step in plan.steps() {
            let set = match &step.node.kind {
                NodeKind::Leaf(leaf) => self.evaluate_leaf(leaf)?,
                NodeKind::Group { operator, .. } => {
                    let &[left, right] = step.children else {
                        return Err(QueryError::malformed(format!(
                            "group with {} children reached evaluation",
                            step.children.len()
                        )));
                    };
                    // Each set has exactly one consumer
                    let left_set = std::mem::take(&mut sets[left]);
                    let right_set = std::mem::take(&mut sets[right]);
                    self.combine(
                        *operator,
                        (&left_set, plan.step(left).node.negated),
                        (&right_set, plan.step(right).node.negated),
                    )
                }
            };
            trace!("plan step {} matched {} keys", sets.len(), set.len());
            sets.push(set);
        }

        let root = plan.step(plan.root_index());
        let raw = sets.pop().unwrap_or_default();
        let result = if root.node.negated {
            self.universe.difference(&raw).cloned().collect()
        } else {
            raw
        };

        debug!(
            "evaluated {} plan steps over {} records: {} matches",
            plan.len(),
            self.universe.len(),
            result.len()
        );
        Ok(result)
    }

    fn combine(
        &self,
        operator: LogicalOperator,
        (left, left_negated): (&KeySet, bool),
        (right, right_negated): (&KeySet, bool),
    ) -> KeySet {
        self.universe
            .iter()
            .filter(|key| {
                operator.evaluate(
                    left.contains(*key) ^ left_negated,
                    right.contains(*key) ^ right_negated,
                )
            })
            .cloned()
            .collect()
    }

    fn evaluate_leaf(&self, leaf: &Leaf) -> QueryResult<KeySet> {
        match leaf.mode {
            Mode::Constant => {
                if leaf.constant_truth()? {
                    Ok(self.universe.clone())
                } else {
                    Ok(KeySet::new())
                }
            }
            Mode::Key => self.evaluate_key(leaf),
            Mode::Value | Mode::Meta | Mode::Column => self.scan(leaf),
        }
    }

    fn evaluate_key(&self, leaf: &Leaf) -> QueryResult<KeySet> {
        let target = |value: &Value| -> QueryResult<String> {
            value
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| QueryError::TypeMismatch {
                    property: leaf.describe_property(),
                    value: value.clone(),
                    expected: DataType::Varchar,
                })
        };

        match leaf.comparison {
            Comparison::Equal => {
                let key = target(&leaf.value)?;
                Ok(self.universe.iter().filter(|k| **k == key).cloned().collect())
            }
            Comparison::In => {
                let keys = leaf
                    .values
                    .iter()
                    .map(target)
                    .collect::<QueryResult<KeySet>>()?;
                Ok(self.universe.intersection(&keys).cloned().collect())
            }
            _ => {
                let mut matches = KeySet::new();
                for key in &self.universe {
                    let actual = Value::String(key.clone());
                    if leaf_matches(leaf, "<key>", &actual, DataType::Varchar)? {
                        matches.insert(key.clone());
                    }
                }
                Ok(matches)
            }
        }
    }

    /// Scan the universe for records whose field satisfies the leaf.
    ///
    /// A record without the field, or with a NULL in it, never matches.
    fn scan(&self, leaf: &Leaf) -> QueryResult<KeySet> {
        let property = leaf.property.as_deref().ok_or_else(|| {
            QueryError::malformed(format!("{} leaf without a property", leaf.mode))
        })?;

        let mut matches = KeySet::new();
        for key in &self.universe {
            let Some(record) = self.source.record(key) else {
                continue;
            };
            let Some(actual) = record.field(leaf.mode, property) else {
                continue;
            };
            let Some(actual_type) = actual.data_type() else {
                continue;
            };
            if leaf_matches(leaf, property, actual, actual_type)? {
                matches.insert(key.clone());
            }
        }
        Ok(matches)
    }
}

fn leaf_matches(
    leaf: &Leaf,
    property: &str,
    actual: &Value,
    actual_type: DataType,
) -> QueryResult<bool> {
    // `None` means NaN is involved: it is unordered and matches nothing
    let order = |expected: &Value| -> QueryResult<Option<Ordering>> {
        match actual.compare(expected) {
            Some(ordering) => Ok(Some(ordering)),
            None if is_nan(actual) || is_nan(expected) => Ok(None),
            None => Err(QueryError::TypeMismatch {
                property: property.to_string(),
                value: expected.clone(),
                expected: actual_type,
            }),
        }
    };

    match leaf.comparison {
        Comparison::In => {
            for candidate in &leaf.values {
                if order(candidate)? == Some(Ordering::Equal) {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        Comparison::Like => match (actual, &leaf.value) {
            (Value::String(text), Value::String(pattern)) => Ok(like_matches(text, pattern)),
            _ => Err(QueryError::TypeMismatch {
                property: property.to_string(),
                value: leaf.value.clone(),
                expected: actual_type,
            }),
        },
        comparison => Ok(order(&leaf.value)?.is_some_and(|ordering| comparison.holds(ordering))),
    }
}

fn is_nan(value: &Value) -> bool {
    matches!(value, Value::Float64(v) if v.is_nan())
}

/// SQL `LIKE` matching: `%` spans any run of characters, `_` exactly one.
/// Letters compare ASCII case-insensitively.
pub fn like_matches(text: &str, pattern: &str) -> bool {
    let text: Vec<char> = text.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();

    let (mut t, mut p) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        if p < pattern.len() && pattern[p] == '%' {
            backtrack = Some((p, t));
            p += 1;
        } else if p < pattern.len()
            && (pattern[p] == '_' || pattern[p].eq_ignore_ascii_case(&text[t]))
        {
            t += 1;
            p += 1;
        } else if let Some((star, matched)) = backtrack {
            p = star + 1;
            t = matched + 1;
            backtrack = Some((star, matched + 1));
        } else {
            return false;
        }
    }

    pattern[p..].iter().all(|c| *c == '%')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::FilterBuilder;
    use crate::memory::{MemoryStore, Record};

    fn people() -> MemoryStore {
        vec![
            Record::new("p1")
                .with_value("age", 25i64)
                .with_value("city", "NY")
                .with_meta("owner", "alice"),
            Record::new("p2")
                .with_value("age", 40i64)
                .with_value("city", "LA")
                .with_meta("owner", "bob"),
            Record::new("p3")
                .with_value("age", 50i64)
                .with_value("city", "SF"),
        ]
        .into_iter()
        .collect()
    }

    fn keys(names: &[&str]) -> KeySet {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_age_and_city_scenario() {
        let store = people();
        let tree = Node::and(
            FilterBuilder::gt("age", 30i64),
            Node::or(FilterBuilder::eq("city", "NY"), FilterBuilder::eq("city", "LA")),
        );
        assert_eq!(store.query(&tree).unwrap(), keys(&["p2"]));
    }

    #[test]
    fn test_constant_leaves() {
        let store = people();
        assert_eq!(store.query(&Node::constant(true)).unwrap().len(), 3);
        assert!(store.query(&Node::constant(false)).unwrap().is_empty());
        assert_eq!(
            store.query(&Node::constant(false).negate()).unwrap().len(),
            3
        );
    }

    #[test]
    fn test_key_leaves() {
        let store = people();
        assert_eq!(
            store.query(&FilterBuilder::key("p2")).unwrap(),
            keys(&["p2"])
        );
        assert_eq!(
            store
                .query(&FilterBuilder::keys(["p1", "p3", "missing"]))
                .unwrap(),
            keys(&["p1", "p3"])
        );
        assert_eq!(
            store
                .query(&Node::key(Comparison::GreaterThan, "p1"))
                .unwrap(),
            keys(&["p2", "p3"])
        );
        assert!(matches!(
            store.query(&Node::key(Comparison::Equal, 5i64)),
            Err(QueryError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_missing_field_is_excluded() {
        let store = people();
        let tree = FilterBuilder::meta("owner", Comparison::NotEqual, "alice");
        // p3 has no owner and is excluded rather than counted as "not alice"
        assert_eq!(store.query(&tree).unwrap(), keys(&["p2"]));

        let unknown = FilterBuilder::eq("height", 180i64);
        assert!(store.query(&unknown).unwrap().is_empty());
    }

    #[test]
    fn test_null_field_is_excluded() {
        let mut store = people();
        store.insert(Record::new("p4").with_value("age", Value::Null));
        let tree = FilterBuilder::le("age", 100i64);
        assert_eq!(store.query(&tree).unwrap(), keys(&["p1", "p2", "p3"]));
    }

    #[test]
    fn test_negation_law() {
        let store = people();
        let universe = store.keys();
        let trees = vec![
            FilterBuilder::gt("age", 30i64),
            FilterBuilder::in_list("city", ["NY", "SF"]),
            Node::or(
                FilterBuilder::eq("city", "LA"),
                FilterBuilder::lt("age", 30i64).negate(),
            ),
            Node::all(vec![
                FilterBuilder::ge("age", 25i64),
                FilterBuilder::ne("city", "SF"),
                FilterBuilder::like("city", "%a"),
            ]),
        ];

        for tree in trees {
            let positive = store.query(&tree).unwrap();
            let negative = store.query(&tree.clone().negate()).unwrap();
            let expected: KeySet = universe.difference(&positive).cloned().collect();
            assert_eq!(negative, expected);
        }
    }

    #[test]
    fn test_negated_children_inside_groups() {
        let store = people();
        let tree = Node::and(
            FilterBuilder::eq("city", "NY").negate(),
            FilterBuilder::eq("city", "SF").negate(),
        );
        assert_eq!(store.query(&tree).unwrap(), keys(&["p2"]));
    }

    #[test]
    fn test_empty_in_matches_nothing() {
        let store = people();
        let tree = Node::in_values("city", Vec::<Value>::new());
        assert!(store.query(&tree).unwrap().is_empty());
        assert_eq!(store.query(&tree.negate()).unwrap().len(), 3);
    }

    #[test]
    fn test_n_ary_groups() {
        let store = people();
        let tree = Node::any(vec![
            FilterBuilder::eq("city", "NY"),
            FilterBuilder::eq("city", "LA"),
            FilterBuilder::eq("city", "SF"),
            FilterBuilder::eq("city", "XX"),
        ]);
        assert_eq!(store.query(&tree).unwrap().len(), 3);
    }

    #[test]
    fn test_type_mismatch_surfaces() {
        let store = people();
        let tree = FilterBuilder::gt("city", 5i64);
        assert_eq!(
            store.query(&tree),
            Err(QueryError::TypeMismatch {
                property: "city".to_string(),
                value: Value::Int64(5),
                expected: DataType::Varchar,
            })
        );
    }

    #[test]
    fn test_caller_tree_is_not_modified() {
        let store = people();
        let tree = Node::all(vec![
            FilterBuilder::gt("age", 1i64),
            FilterBuilder::gt("age", 2i64),
            FilterBuilder::gt("age", 3i64),
        ]);
        let before = tree.clone();
        store.query(&tree).unwrap();
        assert_eq!(tree, before);
    }

    #[test]
    fn test_restricted_universe() {
        let store = people();
        let visible = keys(&["p1", "p2"]);
        let evaluator = MemoryEvaluator::with_universe(&store, visible);
        let result = evaluator
            .evaluate(&FilterBuilder::gt("age", 20i64).negate())
            .unwrap();
        assert!(result.is_empty());
        assert_eq!(
            evaluator.evaluate(&Node::constant(true)).unwrap(),
            keys(&["p1", "p2"])
        );
    }

    #[test]
    fn test_nan_never_matches() {
        let store: MemoryStore = vec![
            Record::new("a").with_value("score", 2.0),
            Record::new("b").with_value("score", f64::NAN),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            store.query(&FilterBuilder::gt("score", 1.0)).unwrap(),
            keys(&["a"])
        );
        assert!(store
            .query(&FilterBuilder::eq("score", f64::NAN))
            .unwrap()
            .is_empty());
        assert_eq!(
            store
                .query(&FilterBuilder::in_list("score", [f64::NAN, 2.0]))
                .unwrap(),
            keys(&["a"])
        );
        // Negation still complements within the universe
        assert_eq!(
            store.query(&FilterBuilder::gt("score", 1.0).negate()).unwrap(),
            keys(&["b"])
        );
    }

    #[test]
    fn test_wide_group() {
        let store = people();
        let width = 100_000;
        let mut children: Vec<Node> = (0..width)
            .map(|age| FilterBuilder::eq("age", 1_000 + age as i64))
            .collect();
        children.push(FilterBuilder::eq("city", "SF"));

        let tree = Node::any(children);
        assert_eq!(store.query(&tree).unwrap(), keys(&["p3"]));
        assert_eq!(store.query(&tree.negate()).unwrap(), keys(&["p1", "p2"]));
    }

    #[test]
    fn test_like_matching() {
        assert!(like_matches("Los Angeles", "los%"));
        assert!(like_matches("Los Angeles", "%ANGEL%"));
        assert!(like_matches("NY", "N_"));
        assert!(!like_matches("NYC", "N_"));
        assert!(like_matches("", "%"));
        assert!(!like_matches("", "_"));
        assert!(like_matches("abcabc", "%b%c"));
        assert!(!like_matches("abc", "%d%"));
    }
}
