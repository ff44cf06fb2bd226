use crate::error::QueryResult;
use crate::expression::Node;
use crate::memory::evaluator::MemoryEvaluator;
use crate::memory::record::{Record, RecordKey, RecordSource};
use crate::sql::PropertyResolver;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Ordered in-memory record collection
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: BTreeMap<RecordKey, Record>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a record, returning the previous version
    pub fn insert(&mut self, record: Record) -> Option<Record> {
        self.records.insert(record.key.clone(), record)
    }

    pub fn remove(&mut self, key: &str) -> Option<Record> {
        self.records.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&Record> {
        self.records.get(key)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.values()
    }

    /// Keys of every record matching `node`
    pub fn query(&self, node: &Node) -> QueryResult<BTreeSet<RecordKey>> {
        MemoryEvaluator::new(self).evaluate(node)
    }
}

impl RecordSource for MemoryStore {
    fn keys(&self) -> BTreeSet<RecordKey> {
        self.records.keys().cloned().collect()
    }

    fn record(&self, key: &str) -> Option<&Record> {
        self.records.get(key)
    }
}

impl FromIterator<Record> for MemoryStore {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        let mut store = MemoryStore::new();
        for record in iter {
            store.insert(record);
        }
        store
    }
}

/// A store shared between writers and concurrent queries.
///
/// Every query holds one read guard for its whole duration so the
/// evaluator observes a consistent snapshot; writers take the exclusive
/// guard.
#[derive(Debug, Clone, Default)]
pub struct SharedStore {
    inner: Arc<RwLock<MemoryStore>>,
}

impl SharedStore {
    pub fn new(store: MemoryStore) -> Self {
        Self {
            inner: Arc::new(RwLock::new(store)),
        }
    }

    pub fn insert(&self, record: Record) -> Option<Record> {
        self.inner.write().insert(record)
    }

    pub fn remove(&self, key: &str) -> Option<Record> {
        self.inner.write().remove(key)
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    pub fn read(&self) -> RwLockReadGuard<'_, MemoryStore> {
        self.inner.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, MemoryStore> {
        self.inner.write()
    }

    /// Evaluate `node` under a single read guard
    pub fn query(&self, node: &Node) -> QueryResult<BTreeSet<RecordKey>> {
        let guard = self.inner.read();
        guard.query(node)
    }

    /// Validate `node` against a schema, then evaluate it
    pub fn query_validated(
        &self,
        node: &Node,
        resolver: &dyn PropertyResolver,
    ) -> QueryResult<BTreeSet<RecordKey>> {
        node.validate(resolver)?;
        self.query(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CollectionSchema;
    use crate::error::QueryError;
    use crate::expression::Comparison;
    use crate::value::DataType;
    use std::thread;

    fn people() -> MemoryStore {
        vec![
            Record::new("a").with_value("age", 25i64),
            Record::new("b").with_value("age", 40i64),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_insert_replace_remove() {
        let mut store = people();
        assert_eq!(store.len(), 2);

        let previous = store.insert(Record::new("a").with_value("age", 26i64));
        assert!(previous.is_some());
        assert_eq!(store.len(), 2);

        assert!(store.remove("a").is_some());
        assert!(store.get("a").is_none());
        assert_eq!(store.keys(), BTreeSet::from(["b".to_string()]));
    }

    #[test]
    fn test_shared_store_query() {
        let shared = SharedStore::new(people());
        let node = Node::compare("age", Comparison::GreaterThan, 30i64);
        assert_eq!(
            shared.query(&node).unwrap(),
            BTreeSet::from(["b".to_string()])
        );

        shared.insert(Record::new("c").with_value("age", 60i64));
        assert_eq!(shared.query(&node).unwrap().len(), 2);
    }

    #[test]
    fn test_query_validated_fails_fast() {
        let shared = SharedStore::new(people());
        let schema =
            CollectionSchema::new("people", "people", "id").with_value("age", "age", DataType::Int64);

        let unknown = Node::compare("height", Comparison::GreaterThan, 1i64);
        assert!(matches!(
            shared.query_validated(&unknown, &schema),
            Err(QueryError::SchemaMismatch { .. })
        ));

        // Without validation an unknown field simply matches nothing
        assert!(shared.query(&unknown).unwrap().is_empty());
    }

    #[test]
    fn test_concurrent_readers_and_writer() {
        let shared = SharedStore::new(people());
        let mut handles = vec![];

        for i in 0..4 {
            let store = shared.clone();
            handles.push(thread::spawn(move || {
                store.insert(Record::new(format!("w{}", i)).with_value("age", 50i64));
                let node = Node::compare("age", Comparison::GreaterThanOrEqualTo, 25i64);
                store.query(&node).unwrap().len()
            }));
        }

        for handle in handles {
            assert!(handle.join().unwrap() >= 3);
        }
        assert_eq!(shared.len(), 6);
    }
}
