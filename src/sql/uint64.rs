//! Unsigned 64-bit integers on backends without an unsigned 64-bit type.
//!
//! A value `v` is stored in two signed 64-bit columns:
//!
//! - `hi`: the most significant bit of `v` (0 or 1)
//! - `lo`: the remaining 63 bits, always non-negative
//!
//! Because `lo` never uses its sign bit, ordering `(hi, lo)`
//! lexicographically is the same as ordering `v`. The rewrite hook below
//! relies on that to express each comparison over the two columns.

use crate::error::{QueryError, QueryResult};
use crate::expression::{Comparison, Node};
use crate::sql::property::{ScalarCodec, SqlProperty};
use crate::sql::rewrite::RewriteHook;
use crate::value::{DataType, Value};
use log::trace;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Codec name the split rewrite is registered under
pub const UINT64_SPLIT_CODEC: &str = "uint64-split";

const LOW_BITS: u64 = (1 << 63) - 1;

/// Split `value` into `(hi, lo)`
pub fn encode(value: u64) -> (i64, i64) {
    ((value >> 63) as i64, (value & LOW_BITS) as i64)
}

/// Reassemble a value from its `(hi, lo)` columns
pub fn decode(hi: i64, lo: i64) -> QueryResult<u64> {
    if !(0..=1).contains(&hi) || lo < 0 {
        return Err(QueryError::Codec {
            codec: UINT64_SPLIT_CODEC.to_string(),
            reason: format!("invalid split pair ({}, {})", hi, lo),
        });
    }
    Ok(((hi as u64) << 63) | lo as u64)
}

/// Build the split descriptor for `name`, stored in `<column>_hi` and
/// `<column>_lo`
pub fn split_property(name: impl Into<String>, table: impl Into<String>, column: &str) -> SqlProperty {
    SqlProperty::new(
        name,
        table,
        vec![format!("{}_hi", column), format!("{}_lo", column)],
        Arc::new(SplitUInt64Codec),
    )
}

/// Two-column codec for `u64`
#[derive(Debug, Default, Clone, Copy)]
pub struct SplitUInt64Codec;

impl ScalarCodec for SplitUInt64Codec {
    fn name(&self) -> &'static str {
        UINT64_SPLIT_CODEC
    }

    fn data_type(&self) -> DataType {
        DataType::UInt64
    }

    fn column_count(&self) -> usize {
        2
    }

    fn encode(&self, value: &Value) -> QueryResult<Vec<Value>> {
        let (hi, lo) = encode(expect_u64(self.name(), value)?);
        Ok(vec![Value::Int64(hi), Value::Int64(lo)])
    }

    fn decode(&self, columns: &[Value]) -> QueryResult<Value> {
        match columns {
            [Value::Null, Value::Null] => Ok(Value::Null),
            [Value::Int64(hi), Value::Int64(lo)] => decode(*hi, *lo).map(Value::UInt64),
            _ => Err(QueryError::Codec {
                codec: UINT64_SPLIT_CODEC.to_string(),
                reason: format!("expected two int64 columns, got {:?}", columns),
            }),
        }
    }
}

fn expect_u64(property: &str, value: &Value) -> QueryResult<u64> {
    match value.coerce_to(DataType::UInt64) {
        Some(Value::UInt64(v)) => Ok(v),
        _ => Err(QueryError::TypeMismatch {
            property: property.to_string(),
            value: value.clone(),
            expected: DataType::UInt64,
        }),
    }
}

/// Rewrites comparisons on a split `u64` property into `(hi, lo)` trees
#[derive(Debug, Default, Clone, Copy)]
pub struct SplitUInt64Rewrite;

impl RewriteHook for SplitUInt64Rewrite {
    fn rewrite(&self, node: &Node, property: &SqlProperty) -> QueryResult<Node> {
        let leaf = node
            .as_leaf()
            .ok_or_else(|| QueryError::malformed("only leaves can be rewritten"))?;
        let [hi, lo] = property.columns.as_slice() else {
            return Err(QueryError::Codec {
                codec: UINT64_SPLIT_CODEC.to_string(),
                reason: format!(
                    "property '{}' needs exactly two columns, has {}",
                    property.name,
                    property.columns.len()
                ),
            });
        };
        let columns = SplitColumns { hi, lo };

        let rewritten = match leaf.comparison {
            Comparison::In => {
                let values = leaf
                    .values
                    .iter()
                    .map(|value| expect_u64(&property.name, value))
                    .collect::<QueryResult<BTreeSet<u64>>>()?;
                columns.any_of(&values)
            }
            Comparison::Like => {
                return Err(QueryError::TypeMismatch {
                    property: property.name.clone(),
                    value: leaf.value.clone(),
                    expected: DataType::UInt64,
                })
            }
            comparison => {
                let (h, l) = encode(expect_u64(&property.name, &leaf.value)?);
                match comparison {
                    Comparison::Equal => columns.equal(h, l),
                    Comparison::NotEqual => columns.equal(h, l).negate(),
                    Comparison::GreaterThan => columns.greater(h, l, Comparison::GreaterThan),
                    Comparison::GreaterThanOrEqualTo => {
                        columns.greater(h, l, Comparison::GreaterThanOrEqualTo)
                    }
                    Comparison::LessThan => columns
                        .greater(h, l, Comparison::GreaterThanOrEqualTo)
                        .negate(),
                    _ => columns.greater(h, l, Comparison::GreaterThan).negate(),
                }
            }
        };

        trace!(
            "rewrote {:?} on '{}' into {} nodes",
            leaf.comparison,
            property.name,
            rewritten.size()
        );
        Ok(rewritten.with_negation(node.negated))
    }
}

struct SplitColumns<'a> {
    hi: &'a str,
    lo: &'a str,
}

impl SplitColumns<'_> {
    /// `(hi = h) and (lo = l)`
    fn equal(&self, h: i64, l: i64) -> Node {
        Node::and(
            Node::column(self.hi, Comparison::Equal, h),
            Node::column(self.lo, Comparison::Equal, l),
        )
    }

    /// `(hi > h) or (hi = h and lo <op> l)`, `op` being `>` or `>=`
    fn greater(&self, h: i64, l: i64, low_comparison: Comparison) -> Node {
        Node::or(
            Node::column(self.hi, Comparison::GreaterThan, h),
            Node::and(
                Node::column(self.hi, Comparison::Equal, h),
                Node::column(self.lo, low_comparison, l),
            ),
        )
    }

    /// `(hi = 0 and lo in (...)) or (hi = 1 and lo in (...))`
    fn any_of(&self, values: &BTreeSet<u64>) -> Node {
        let mut buckets: [Vec<Value>; 2] = [Vec::new(), Vec::new()];
        for value in values {
            let (h, l) = encode(*value);
            buckets[h as usize].push(Value::Int64(l));
        }
        let [low, high] = buckets;
        Node::or(self.bucket(0, low), self.bucket(1, high))
    }

    fn bucket(&self, h: i64, lows: Vec<Value>) -> Node {
        if lows.is_empty() {
            return Node::constant(false);
        }
        Node::and(
            Node::column(self.hi, Comparison::Equal, h),
            Node::column_in(self.lo, lows),
        )
    }
}
