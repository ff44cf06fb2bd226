//! Scalar values carried by predicates and records.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Logical scalar types understood by the engine
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Boolean = 1,
    Int32 = 2,
    Int64 = 3,
    Varchar = 4,
    UInt64 = 5,
    Float64 = 6,
    /// Milliseconds since the Unix epoch
    Timestamp = 7,
}

impl DataType {
    /// Whether values of this type order numerically
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            DataType::Int32 | DataType::Int64 | DataType::UInt64 | DataType::Float64
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            DataType::Boolean => "boolean",
            DataType::Int32 => "int32",
            DataType::Int64 => "int64",
            DataType::Varchar => "varchar",
            DataType::UInt64 => "uint64",
            DataType::Float64 => "float64",
            DataType::Timestamp => "timestamp",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A typed scalar value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Boolean(bool),
    Int32(i32),
    Int64(i64),
    UInt64(u64),
    Float64(f64),
    String(String),
    Timestamp(i64),
}

impl Value {
    /// Get the data type of this value
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Value::Null => None,
            Value::Boolean(_) => Some(DataType::Boolean),
            Value::Int32(_) => Some(DataType::Int32),
            Value::Int64(_) => Some(DataType::Int64),
            Value::UInt64(_) => Some(DataType::UInt64),
            Value::Float64(_) => Some(DataType::Float64),
            Value::String(_) => Some(DataType::Varchar),
            Value::Timestamp(_) => Some(DataType::Timestamp),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Integer view used for exact cross-width comparison.
    fn as_integer(&self) -> Option<i128> {
        match self {
            Value::Int32(v) => Some(i128::from(*v)),
            Value::Int64(v) => Some(i128::from(*v)),
            Value::UInt64(v) => Some(i128::from(*v)),
            _ => None,
        }
    }

    fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float64(v) => Some(*v),
            Value::Int32(v) => Some(f64::from(*v)),
            Value::Int64(v) => Some(*v as f64),
            Value::UInt64(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Convert this value into the given type, if that is lossless.
    ///
    /// Integers move freely between widths as long as they fit. They widen
    /// into `Timestamp`, and into `Float64` only when the float holds them
    /// exactly (magnitudes up to 2^53, or larger values that happen to be
    /// representable). NULL never coerces.
    pub fn coerce_to(&self, data_type: DataType) -> Option<Value> {
        match (self, data_type) {
            (Value::Null, _) => None,
            (Value::Boolean(b), DataType::Boolean) => Some(Value::Boolean(*b)),
            (Value::String(s), DataType::Varchar) => Some(Value::String(s.clone())),
            (Value::Float64(v), DataType::Float64) => Some(Value::Float64(*v)),
            (Value::Timestamp(t), DataType::Timestamp) => Some(Value::Timestamp(*t)),
            (Value::Timestamp(t), DataType::Int64) => Some(Value::Int64(*t)),
            (_, DataType::Int32) => self
                .as_integer()
                .and_then(|v| i32::try_from(v).ok())
                .map(Value::Int32),
            (_, DataType::Int64) => self
                .as_integer()
                .and_then(|v| i64::try_from(v).ok())
                .map(Value::Int64),
            (_, DataType::UInt64) => self
                .as_integer()
                .and_then(|v| u64::try_from(v).ok())
                .map(Value::UInt64),
            (_, DataType::Timestamp) => self
                .as_integer()
                .and_then(|v| i64::try_from(v).ok())
                .map(Value::Timestamp),
            (_, DataType::Float64) => {
                let integer = self.as_integer()?;
                let float = integer as f64;
                (float as i128 == integer).then_some(Value::Float64(float))
            }
            _ => None,
        }
    }

    /// Typed ordering between two values.
    ///
    /// Returns `None` when the values are not comparable (different type
    /// families, NULL, or NaN).
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Null, _) | (_, Value::Null) => None,
            (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Timestamp(a), Value::Timestamp(b)) => Some(a.cmp(b)),
            (Value::Timestamp(a), other) => other.as_integer().map(|b| i128::from(*a).cmp(&b)),
            (this, Value::Timestamp(b)) => this.as_integer().map(|a| a.cmp(&i128::from(*b))),
            (Value::Float64(_), _) | (_, Value::Float64(_)) => {
                let a = self.as_float()?;
                let b = other.as_float()?;
                a.partial_cmp(&b)
            }
            _ => {
                let a = self.as_integer()?;
                let b = other.as_integer()?;
                Some(a.cmp(&b))
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Int32(v) => write!(f, "{}", v),
            Value::Int64(v) => write!(f, "{}", v),
            Value::UInt64(v) => write!(f, "{}", v),
            Value::Float64(v) => write!(f, "{}", v),
            Value::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
            Value::Timestamp(t) => write!(f, "timestamp({})", t),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int32(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int64(value)
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Value::UInt64(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float64(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}
