//! Per-backend rewrite hooks for multi-column properties.

use crate::error::QueryResult;
use crate::expression::Node;
use crate::sql::dialect::Dialect;
use crate::sql::property::SqlProperty;
use crate::sql::uint64::{SplitUInt64Rewrite, UINT64_SPLIT_CODEC};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Expands a leaf over a multi-column property into an equivalent tree
/// of single-column (`Mode::Column`) leaves.
///
/// Hooks are pure: the returned tree must already carry the original
/// leaf's negation, composed by XOR onto its root.
pub trait RewriteHook: Send + Sync {
    fn rewrite(&self, node: &Node, property: &SqlProperty) -> QueryResult<Node>;
}

/// Rewrite hooks keyed by codec name
#[derive(Clone, Default)]
pub struct RewriteRegistry {
    hooks: HashMap<&'static str, Arc<dyn RewriteHook>>,
}

impl RewriteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `hook` for properties using the codec named `codec`,
    /// replacing any earlier registration
    pub fn register(&mut self, codec: &'static str, hook: Arc<dyn RewriteHook>) {
        self.hooks.insert(codec, hook);
    }

    pub fn get(&self, codec: &str) -> Option<&Arc<dyn RewriteHook>> {
        self.hooks.get(codec)
    }

    pub fn contains(&self, codec: &str) -> bool {
        self.hooks.contains_key(codec)
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

impl fmt::Debug for RewriteRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut codecs: Vec<_> = self.hooks.keys().collect();
        codecs.sort();
        f.debug_struct("RewriteRegistry")
            .field("codecs", &codecs)
            .finish()
    }
}

/// A relational target: dialect plus its rewrite hooks
#[derive(Debug, Clone)]
pub struct Backend {
    pub dialect: Dialect,
    pub hooks: RewriteRegistry,
}

impl Backend {
    /// Backend without any rewrite hooks
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            hooks: RewriteRegistry::new(),
        }
    }

    /// SQLite with the unsigned 64-bit split rewrite
    pub fn sqlite() -> Self {
        Self::new(Dialect::Sqlite).with_hook(UINT64_SPLIT_CODEC, Arc::new(SplitUInt64Rewrite))
    }

    /// SQL Server with the unsigned 64-bit split rewrite
    pub fn sql_server() -> Self {
        Self::new(Dialect::SqlServer)
            .with_hook(UINT64_SPLIT_CODEC, Arc::new(SplitUInt64Rewrite))
    }

    pub fn with_hook(mut self, codec: &'static str, hook: Arc<dyn RewriteHook>) -> Self {
        self.hooks.register(codec, hook);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QueryError;
    use crate::expression::{Comparison, Node};
    use crate::value::DataType;

    struct Identity;

    impl RewriteHook for Identity {
        fn rewrite(&self, node: &Node, _property: &SqlProperty) -> QueryResult<Node> {
            Ok(node.clone())
        }
    }

    #[test]
    fn test_registry() {
        let mut registry = RewriteRegistry::new();
        assert!(registry.is_empty());
        registry.register("identity", Arc::new(Identity));
        assert!(registry.contains("identity"));
        assert!(!registry.contains("other"));
        assert_eq!(registry.len(), 1);

        let node = Node::compare("x", Comparison::Equal, 1i64);
        let property = SqlProperty::native("x", "t", "x", DataType::Int64);
        let hook = registry.get("identity").unwrap();
        assert_eq!(hook.rewrite(&node, &property).unwrap(), node);
        assert_eq!(
            format!("{:?}", registry),
            "RewriteRegistry { codecs: [\"identity\"] }"
        );
    }

    #[test]
    fn test_builtin_backends() {
        assert!(Backend::sqlite().hooks.contains(UINT64_SPLIT_CODEC));
        assert!(Backend::sql_server().hooks.contains(UINT64_SPLIT_CODEC));
        assert_eq!(Backend::sql_server().dialect, Dialect::SqlServer);
        assert!(Backend::new(Dialect::Sqlite).hooks.is_empty());
    }

    #[test]
    fn test_hook_errors_propagate() {
        struct Refuse;
        impl RewriteHook for Refuse {
            fn rewrite(&self, _node: &Node, property: &SqlProperty) -> QueryResult<Node> {
                Err(QueryError::Codec {
                    codec: property.codec.name().to_string(),
                    reason: "refused".to_string(),
                })
            }
        }

        let backend = Backend::new(Dialect::Sqlite).with_hook("native", Arc::new(Refuse));
        let property = SqlProperty::native("x", "t", "x", DataType::Int64);
        let node = Node::compare("x", Comparison::Equal, 1i64);
        let hook = backend.hooks.get("native").unwrap();
        assert!(hook.rewrite(&node, &property).is_err());
    }
}
