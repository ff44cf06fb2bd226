//! Backend-independent predicate trees.
//!
//! This module provides:
//! - Leaf and group node representation
//! - Binary normalization of wide AND/OR groups
//! - Structural and schema validation
//! - A fluent builder for common filters

pub mod builder;
pub mod node;
pub mod normalize;
pub mod operator;
pub mod validate;

pub use builder::FilterBuilder;
pub use node::{Leaf, Node, NodeKind};
pub use operator::{Comparison, LogicalOperator, Mode};
