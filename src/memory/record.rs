use crate::expression::Mode;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Identity of a record within one collection
pub type RecordKey = String;

/// An in-memory record: identity plus value and meta bags
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Record {
    pub key: RecordKey,
    pub values: BTreeMap<String, Value>,
    pub meta: BTreeMap<String, Value>,
}

impl Record {
    pub fn new(key: impl Into<RecordKey>) -> Self {
        Self {
            key: key.into(),
            ..Default::default()
        }
    }

    pub fn with_value(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn with_meta(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.meta.insert(name.into(), value.into());
        self
    }

    /// Look up a named field in the bag addressed by `mode`.
    ///
    /// `Column` leaves read the value bag: rewritten trees address physical
    /// columns that a host mirrors there.
    pub fn field(&self, mode: Mode, name: &str) -> Option<&Value> {
        match mode {
            Mode::Value | Mode::Column => self.values.get(name),
            Mode::Meta => self.meta.get(name),
            Mode::Constant | Mode::Key => None,
        }
    }
}

/// Read access to a collection of records
pub trait RecordSource {
    /// Every key in the collection
    fn keys(&self) -> BTreeSet<RecordKey>;

    fn record(&self, key: &str) -> Option<&Record>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_lookup_by_mode() {
        let record = Record::new("r1")
            .with_value("age", 40i64)
            .with_meta("owner", "alice");

        assert_eq!(record.field(Mode::Value, "age"), Some(&Value::Int64(40)));
        assert_eq!(record.field(Mode::Column, "age"), Some(&Value::Int64(40)));
        assert_eq!(record.field(Mode::Meta, "age"), None);
        assert_eq!(
            record.field(Mode::Meta, "owner"),
            Some(&Value::from("alice"))
        );
        assert_eq!(record.field(Mode::Key, "age"), None);
    }
}
