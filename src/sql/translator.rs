//! Predicate tree to parameterized SQL.

use crate::error::{QueryError, QueryResult};
use crate::expression::{Comparison, Leaf, Mode, Node, NodeKind};
use crate::planner::plan;
use crate::sql::params::{BoundParameter, ParameterCreator};
use crate::sql::property::{PropertyResolver, SqlProperty};
use crate::sql::rewrite::Backend;
use crate::value::Value;
use log::{debug, trace};
use std::borrow::Cow;
use std::collections::VecDeque;

const ALWAYS_TRUE: &str = "(0 = 0)";
const ALWAYS_FALSE: &str = "(0 = 1)";

/// SQL text plus the parameters its placeholders refer to, in
/// placeholder order
#[derive(Debug, Clone, PartialEq)]
pub struct Translation {
    pub text: String,
    pub parameters: Vec<BoundParameter>,
}

impl Translation {
    fn map_text(self, f: impl FnOnce(String) -> String) -> Self {
        Self {
            text: f(self.text),
            parameters: self.parameters,
        }
    }
}

/// Renders predicate trees for one collection on one backend
pub struct SqlTranslator<'a> {
    resolver: &'a dyn PropertyResolver,
    backend: &'a Backend,
}

impl<'a> SqlTranslator<'a> {
    pub fn new(resolver: &'a dyn PropertyResolver, backend: &'a Backend) -> Self {
        Self { resolver, backend }
    }

    /// Render the boolean condition for `node`.
    ///
    /// The caller's tree is never modified. Schema and type errors are
    /// raised before any text is produced.
    pub fn translate(&self, node: &Node) -> QueryResult<Translation> {
        let tree = node.normalized();
        tree.validate(self.resolver)?;
        let mut physical = self.rewrite(&tree)?;
        physical.normalize();

        let plan = plan(&physical);
        let mut params = ParameterCreator::new(self.backend.dialect.parameter_marker());
        let mut rendered: Vec<Fragments> = Vec::with_capacity(plan.len());

        for step in plan.steps() {
            let mut fragments = match &step.node.kind {
                NodeKind::Leaf(leaf) => {
                    Fragments::from([Cow::Owned(self.render_leaf(leaf, &mut params)?)])
                }
                NodeKind::Group { operator, .. } => {
                    let &[left, right] = step.children else {
                        return Err(QueryError::malformed(format!(
                            "{} group with {} children after normalization",
                            operator.keyword(),
                            step.children.len()
                        )));
                    };
                    let left = std::mem::take(&mut rendered[left]);
                    let right = std::mem::take(&mut rendered[right]);
                    join(left, operator.keyword(), right)
                }
            };
            if step.node.negated {
                fragments.push_front(Cow::Borrowed("not "));
            }
            rendered.push(fragments);
        }

        let text: String = rendered
            .pop()
            .ok_or_else(|| QueryError::malformed("empty evaluation plan"))?
            .into_iter()
            .collect();
        debug!(
            "translated {} nodes into {} parameters for {} on {}",
            plan.len(),
            params.len(),
            self.resolver.table(),
            self.backend.dialect
        );
        Ok(Translation {
            text,
            parameters: params.into_parameters(),
        })
    }

    /// `where <condition>`
    pub fn where_clause(&self, node: &Node) -> QueryResult<Translation> {
        Ok(self
            .translate(node)?
            .map_text(|condition| format!("where {}", condition)))
    }

    /// `select <key> from <table> where <condition>`
    pub fn select_keys(&self, node: &Node) -> QueryResult<Translation> {
        let key = self.qualified(self.key_column()?);
        let table = self.backend.dialect.quote_identifier(self.resolver.table());
        Ok(self
            .where_clause(node)?
            .map_text(|clause| format!("select {} from {} {}", key, table, clause)))
    }

    /// `delete from <table> where <condition>`
    pub fn delete(&self, node: &Node) -> QueryResult<Translation> {
        let table = self.backend.dialect.quote_identifier(self.resolver.table());
        Ok(self
            .where_clause(node)?
            .map_text(|clause| format!("delete from {} {}", table, clause)))
    }

    fn key_column(&self) -> QueryResult<&str> {
        let key = self.resolver.key();
        key.single_column().ok_or_else(|| QueryError::Codec {
            codec: key.codec.name().to_string(),
            reason: format!("key property '{}' must map to one column", key.name),
        })
    }

    fn qualified(&self, column: &str) -> String {
        self.backend.dialect.qualify(self.resolver.table(), column)
    }

    /// Replace every schema-addressed leaf with leaves over physical
    /// columns. Multi-column properties go through their codec's hook.
    ///
    /// The physical tree is assembled in plan order so that deep chains
    /// never recurse.
    fn rewrite(&self, tree: &Node) -> QueryResult<Node> {
        let plan = plan(tree);
        let mut built: Vec<Option<Node>> = Vec::with_capacity(plan.len());

        for step in plan.steps() {
            let node = match &step.node.kind {
                NodeKind::Leaf(leaf) => self.rewrite_leaf(step.node, leaf)?,
                NodeKind::Group { operator, .. } => {
                    let children = step
                        .children
                        .iter()
                        .map(|&index| {
                            built[index].take().ok_or_else(|| {
                                QueryError::malformed("plan step consumed twice")
                            })
                        })
                        .collect::<QueryResult<Vec<_>>>()?;
                    Node::group(*operator, children).with_negation(step.node.negated)
                }
            };
            built.push(Some(node));
        }

        built
            .pop()
            .flatten()
            .ok_or_else(|| QueryError::malformed("empty evaluation plan"))
    }

    fn rewrite_leaf(&self, node: &Node, leaf: &Leaf) -> QueryResult<Node> {
        if matches!(leaf.mode, Mode::Constant | Mode::Column) {
            return Ok(node.clone());
        }

        let property = self.resolver.resolve(leaf)?;
        if property.column_count() > 1 {
            let codec = property.codec.name();
            let hook = self
                .backend
                .hooks
                .get(codec)
                .ok_or_else(|| QueryError::MissingRewriteHook {
                    property: property.name.clone(),
                    codec: codec.to_string(),
                })?;
            trace!("rewriting '{}' through hook '{}'", property.name, codec);
            return hook.rewrite(node, property);
        }

        let column = property.single_column().ok_or_else(|| QueryError::Codec {
            codec: property.codec.name().to_string(),
            reason: format!("property '{}' has no column", property.name),
        })?;
        let physical = match leaf.comparison {
            Comparison::In => {
                let values = leaf
                    .values
                    .iter()
                    .map(|value| encode_single(property, value))
                    .collect::<QueryResult<Vec<_>>>()?;
                Node::column_in(column, values)
            }
            // Patterns are matched against the stored text as is
            Comparison::Like => Node::column(column, Comparison::Like, leaf.value.clone()),
            comparison => Node::column(column, comparison, encode_single(property, &leaf.value)?),
        };
        Ok(physical.with_negation(node.negated))
    }

    fn render_leaf(&self, leaf: &Leaf, params: &mut ParameterCreator) -> QueryResult<String> {
        if leaf.mode == Mode::Constant {
            return Ok(if leaf.constant_truth()? {
                ALWAYS_TRUE.to_string()
            } else {
                ALWAYS_FALSE.to_string()
            });
        }

        let column = match (leaf.mode, leaf.property.as_deref()) {
            (Mode::Column, Some(column)) => self.qualified(column),
            (mode, _) => {
                return Err(QueryError::malformed(format!(
                    "{} leaf '{}' survived the rewrite pass",
                    mode,
                    leaf.describe_property()
                )))
            }
        };

        match leaf.comparison {
            Comparison::In if leaf.values.is_empty() => Ok(ALWAYS_FALSE.to_string()),
            Comparison::In => {
                let placeholders = leaf
                    .values
                    .iter()
                    .map(|value| params.create(value.clone()))
                    .collect::<Vec<_>>();
                Ok(format!("({} in ({}))", column, placeholders.join(", ")))
            }
            comparison => {
                let placeholder = params.create(leaf.value.clone());
                Ok(format!(
                    "({} {} {})",
                    column,
                    comparison.as_sql(),
                    placeholder
                ))
            }
        }
    }
}

/// Rendered text kept in pieces, so that wrapping a subtree in
/// parentheses or a `not ` prefix does not copy it
type Fragments = VecDeque<Cow<'static, str>>;

/// `(left keyword right)`, moving the smaller side into the larger one
fn join(mut left: Fragments, keyword: &'static str, mut right: Fragments) -> Fragments {
    let separator = Cow::Owned(format!(" {} ", keyword));
    if left.len() >= right.len() {
        left.push_front(Cow::Borrowed("("));
        left.push_back(separator);
        left.append(&mut right);
        left.push_back(Cow::Borrowed(")"));
        left
    } else {
        right.push_front(separator);
        while let Some(piece) = left.pop_back() {
            right.push_front(piece);
        }
        right.push_front(Cow::Borrowed("("));
        right.push_back(Cow::Borrowed(")"));
        right
    }
}

fn encode_single(property: &SqlProperty, value: &Value) -> QueryResult<Value> {
    property
        .codec
        .encode(value)?
        .into_iter()
        .next()
        .ok_or_else(|| QueryError::Codec {
            codec: property.codec.name().to_string(),
            reason: format!("encoded {} into no columns", value),
        })
}
