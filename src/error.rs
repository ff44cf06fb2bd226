//! Query engine error types.

use crate::expression::Mode;
use crate::value::{DataType, Value};
use thiserror::Error;

/// Errors raised while validating, evaluating or translating predicates.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    #[error("Unknown {mode} property '{property}'")]
    SchemaMismatch { property: String, mode: Mode },

    #[error("Value {value} is not comparable with property '{property}' of type {expected}")]
    TypeMismatch {
        property: String,
        value: Value,
        expected: DataType,
    },

    #[error("Malformed predicate tree: {reason}")]
    MalformedTree { reason: String },

    #[error("Property '{property}' uses multi-column codec '{codec}' with no registered rewrite hook")]
    MissingRewriteHook { property: String, codec: String },

    #[error("Codec '{codec}' error: {reason}")]
    Codec { codec: String, reason: String },

    #[error("Predicate encoding error: {0}")]
    Encoding(String),

    #[error("Filter parse error at offset {position}: {message}")]
    Parse { position: usize, message: String },

    #[error("Collection '{0}' is already registered")]
    DuplicateCollection(String),

    #[error("Unknown collection '{0}'")]
    UnknownCollection(String),
}

impl QueryError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        QueryError::MalformedTree {
            reason: reason.into(),
        }
    }
}

/// Result type for query engine operations.
pub type QueryResult<T> = Result<T, QueryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = QueryError::SchemaMismatch {
            property: "height".to_string(),
            mode: Mode::Value,
        };
        assert_eq!(err.to_string(), "Unknown value property 'height'");

        let err = QueryError::TypeMismatch {
            property: "age".to_string(),
            value: Value::from("old"),
            expected: DataType::Int64,
        };
        assert_eq!(
            err.to_string(),
            "Value 'old' is not comparable with property 'age' of type int64"
        );

        let err = QueryError::MissingRewriteHook {
            property: "balance".to_string(),
            codec: "uint64-split".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Property 'balance' uses multi-column codec 'uint64-split' with no registered rewrite hook"
        );

        let err = QueryError::malformed("group with 1 child");
        assert_eq!(
            err.to_string(),
            "Malformed predicate tree: group with 1 child"
        );
    }
}
