//! Tree validation: structural checks and schema checks.

use crate::error::{QueryError, QueryResult};
use crate::expression::node::{Leaf, Node, NodeKind};
use crate::expression::operator::{Comparison, Mode};
use crate::sql::PropertyResolver;
use crate::value::{DataType, Value};

impl Node {
    /// Check structural well-formedness.
    ///
    /// Groups need at least two children; property-addressed leaves need a
    /// property; constant leaves need a boolean literal; `Like` needs a
    /// string pattern.
    pub fn validate_shape(&self) -> QueryResult<()> {
        let mut pending = vec![self];
        while let Some(node) = pending.pop() {
            match &node.kind {
                NodeKind::Leaf(leaf) => validate_leaf_shape(leaf)?,
                NodeKind::Group { children, .. } if children.len() < 2 => {
                    return Err(QueryError::malformed(format!(
                        "group with {} children",
                        children.len()
                    )));
                }
                NodeKind::Group { children, .. } => pending.extend(children.iter().rev()),
            }
        }
        Ok(())
    }

    /// Check the tree against a schema before any record is scanned or any
    /// SQL text is rendered.
    pub fn validate(&self, resolver: &dyn PropertyResolver) -> QueryResult<()> {
        self.validate_shape()?;
        self.leaves()
            .into_iter()
            .try_for_each(|leaf| validate_leaf_types(leaf, resolver))
    }
}

fn validate_leaf_shape(leaf: &Leaf) -> QueryResult<()> {
    if leaf.mode.requires_property() && leaf.property.is_none() {
        return Err(QueryError::malformed(format!(
            "{} leaf without a property",
            leaf.mode
        )));
    }

    if leaf.mode == Mode::Constant {
        return leaf.constant_truth().map(|_| ());
    }

    if leaf.comparison == Comparison::Like && leaf.value.as_str().is_none() {
        return Err(QueryError::TypeMismatch {
            property: leaf.describe_property(),
            value: leaf.value.clone(),
            expected: DataType::Varchar,
        });
    }

    Ok(())
}

fn validate_leaf_types(leaf: &Leaf, resolver: &dyn PropertyResolver) -> QueryResult<()> {
    if matches!(leaf.mode, Mode::Constant | Mode::Column) {
        return Ok(());
    }

    let property = resolver.resolve(leaf)?;
    let expected = property.codec.data_type();
    let mismatch = |value: &Value| QueryError::TypeMismatch {
        property: property.name.clone(),
        value: value.clone(),
        expected,
    };

    match leaf.comparison {
        Comparison::In => {
            for value in &leaf.values {
                value.coerce_to(expected).ok_or_else(|| mismatch(value))?;
            }
        }
        Comparison::Like => {
            if expected != DataType::Varchar {
                return Err(mismatch(&leaf.value));
            }
        }
        _ => {
            leaf.value
                .coerce_to(expected)
                .ok_or_else(|| mismatch(&leaf.value))?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CollectionSchema;

    fn schema() -> CollectionSchema {
        CollectionSchema::new("people", "people", "id")
            .with_value("age", "age", DataType::Int64)
            .with_value("city", "city", DataType::Varchar)
            .with_meta("created", "created_at", DataType::Timestamp)
    }

    #[test]
    fn test_shape_rejects_single_child_group() {
        let tree = Node::all(vec![Node::constant(true)]);
        assert!(matches!(
            tree.validate_shape(),
            Err(QueryError::MalformedTree { .. })
        ));
    }

    #[test]
    fn test_shape_rejects_missing_property() {
        let mut leaf = Node::compare("age", Comparison::Equal, 1i64)
            .as_leaf()
            .unwrap()
            .clone();
        leaf.property = None;
        assert!(matches!(
            Node::leaf(leaf).validate_shape(),
            Err(QueryError::MalformedTree { .. })
        ));
    }

    #[test]
    fn test_shape_rejects_non_string_like() {
        let tree = Node::compare("city", Comparison::Like, 5i64);
        assert!(matches!(
            tree.validate_shape(),
            Err(QueryError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_unknown_property_is_schema_mismatch() {
        let tree = Node::and(
            Node::compare("age", Comparison::GreaterThan, 30i64),
            Node::compare("height", Comparison::GreaterThan, 180i64),
        );
        assert_eq!(
            tree.validate(&schema()),
            Err(QueryError::SchemaMismatch {
                property: "height".to_string(),
                mode: Mode::Value,
            })
        );

        // A value field is not visible through the meta bag
        let tree = Node::meta("age", Comparison::Equal, 1i64);
        assert!(matches!(
            tree.validate(&schema()),
            Err(QueryError::SchemaMismatch { mode: Mode::Meta, .. })
        ));
    }

    #[test]
    fn test_uncoercible_literal_is_type_mismatch() {
        let tree = Node::compare("age", Comparison::Equal, "forty");
        assert_eq!(
            tree.validate(&schema()),
            Err(QueryError::TypeMismatch {
                property: "age".to_string(),
                value: Value::from("forty"),
                expected: DataType::Int64,
            })
        );

        let tree = Node::in_values("city", [Value::from("NY"), Value::Int64(3)]);
        assert!(matches!(
            tree.validate(&schema()),
            Err(QueryError::TypeMismatch { .. })
        ));

        let tree = Node::like("age", "4%");
        assert!(matches!(
            tree.validate(&schema()),
            Err(QueryError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_deep_chain_is_checked_to_the_bottom() {
        let mut children: Vec<Node> = (0..50_000)
            .map(|i| Node::compare("age", Comparison::GreaterThan, i as i64))
            .collect();
        children.push(Node::compare("height", Comparison::GreaterThan, 1i64));
        let tree = Node::all(children).normalized();
        assert!(tree.validate_shape().is_ok());
        assert!(matches!(
            tree.validate(&schema()),
            Err(QueryError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn test_valid_tree_passes() {
        let tree = Node::all(vec![
            Node::compare("age", Comparison::GreaterThan, 30i32),
            Node::in_values("city", ["NY", "LA"]),
            Node::meta("created", Comparison::LessThan, 1_000i64),
            Node::keys(["a", "b"]),
            Node::constant(true),
        ]);
        assert_eq!(tree.validate(&schema()), Ok(()));
    }
}
