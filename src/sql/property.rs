//! Property descriptors: how an abstract property maps onto physical columns.

use crate::error::{QueryError, QueryResult};
use crate::expression::{Leaf, Mode};
use crate::value::{DataType, Value};
use std::fmt;
use std::sync::Arc;

/// Conversion between one logical value and its physical column values
pub trait ScalarCodec: Send + Sync + fmt::Debug {
    /// Name rewrite hooks are registered under
    fn name(&self) -> &'static str;

    /// Logical type of the property
    fn data_type(&self) -> DataType;

    /// Number of physical columns one value occupies
    fn column_count(&self) -> usize {
        1
    }

    /// Logical value to column values, in column order
    fn encode(&self, value: &Value) -> QueryResult<Vec<Value>>;

    /// Column values back to the logical value
    fn decode(&self, columns: &[Value]) -> QueryResult<Value>;
}

/// One column holding the value in its natural SQL representation.
///
/// Timestamps are stored as integer milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeCodec {
    data_type: DataType,
}

impl NativeCodec {
    pub fn new(data_type: DataType) -> Self {
        Self { data_type }
    }

    fn mismatch(&self, value: &Value) -> QueryError {
        QueryError::Codec {
            codec: self.name().to_string(),
            reason: format!("cannot store {} as {}", value, self.data_type),
        }
    }
}

impl ScalarCodec for NativeCodec {
    fn name(&self) -> &'static str {
        "native"
    }

    fn data_type(&self) -> DataType {
        self.data_type
    }

    fn encode(&self, value: &Value) -> QueryResult<Vec<Value>> {
        let coerced = value
            .coerce_to(self.data_type)
            .ok_or_else(|| self.mismatch(value))?;
        let physical = match coerced {
            Value::Timestamp(millis) => Value::Int64(millis),
            other => other,
        };
        Ok(vec![physical])
    }

    fn decode(&self, columns: &[Value]) -> QueryResult<Value> {
        let [column] = columns else {
            return Err(QueryError::Codec {
                codec: self.name().to_string(),
                reason: format!("expected 1 column, got {}", columns.len()),
            });
        };
        if column.is_null() {
            return Ok(Value::Null);
        }
        column
            .coerce_to(self.data_type)
            .ok_or_else(|| self.mismatch(column))
    }
}

/// Physical description of one abstract property
#[derive(Debug, Clone)]
pub struct SqlProperty {
    pub name: String,
    pub table: String,
    /// Column names in codec order
    pub columns: Vec<String>,
    pub codec: Arc<dyn ScalarCodec>,
}

impl SqlProperty {
    pub fn new(
        name: impl Into<String>,
        table: impl Into<String>,
        columns: Vec<String>,
        codec: Arc<dyn ScalarCodec>,
    ) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            columns,
            codec,
        }
    }

    /// Single-column property with a [`NativeCodec`]
    pub fn native(
        name: impl Into<String>,
        table: impl Into<String>,
        column: impl Into<String>,
        data_type: DataType,
    ) -> Self {
        Self::new(
            name,
            table,
            vec![column.into()],
            Arc::new(NativeCodec::new(data_type)),
        )
    }

    pub fn column_count(&self) -> usize {
        self.codec.column_count()
    }

    /// The only column, for single-column properties
    pub fn single_column(&self) -> Option<&str> {
        match self.columns.as_slice() {
            [column] if self.column_count() == 1 => Some(column),
            _ => None,
        }
    }

    /// Check that the column list matches the codec
    pub fn check_columns(&self) -> QueryResult<()> {
        if self.columns.len() != self.column_count() {
            return Err(QueryError::Codec {
                codec: self.codec.name().to_string(),
                reason: format!(
                    "property '{}' maps to {} columns but the codec needs {}",
                    self.name,
                    self.columns.len(),
                    self.column_count()
                ),
            });
        }
        Ok(())
    }
}

/// Resolves abstract property references for one collection
pub trait PropertyResolver {
    /// Table the collection lives in
    fn table(&self) -> &str;

    /// Descriptor of the identity column
    fn key(&self) -> &SqlProperty;

    /// Descriptor of a named value or meta field
    fn property(&self, mode: Mode, name: &str) -> Option<&SqlProperty>;

    /// Descriptor addressed by a leaf
    fn resolve(&self, leaf: &Leaf) -> QueryResult<&SqlProperty> {
        match (leaf.mode, leaf.property.as_deref()) {
            (Mode::Key, _) => Ok(self.key()),
            (mode @ (Mode::Value | Mode::Meta), Some(name)) => self
                .property(mode, name)
                .ok_or_else(|| QueryError::SchemaMismatch {
                    property: name.to_string(),
                    mode,
                }),
            (mode, _) => Err(QueryError::malformed(format!(
                "{} leaf does not address a schema property",
                mode
            ))),
        }
    }
}
