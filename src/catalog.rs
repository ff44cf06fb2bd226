//! Collection schemas and the registry that checks them against a backend.

use crate::error::{QueryError, QueryResult};
use crate::expression::{Mode, Node};
use crate::sql::{Backend, PropertyResolver, SqlProperty, SqlTranslator, Translation};
use crate::value::DataType;
use dashmap::DashMap;
use log::debug;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Static description of one logical collection: its table, identity
/// column and addressable properties
#[derive(Debug, Clone)]
pub struct CollectionSchema {
    pub name: String,
    table: String,
    key: SqlProperty,
    values: BTreeMap<String, SqlProperty>,
    meta: BTreeMap<String, SqlProperty>,
}

impl CollectionSchema {
    /// Collection stored in `table` with a string identity in `key_column`
    pub fn new(name: impl Into<String>, table: impl Into<String>, key_column: &str) -> Self {
        let table = table.into();
        Self {
            name: name.into(),
            key: SqlProperty::native("key", table.clone(), key_column, DataType::Varchar),
            table,
            values: BTreeMap::new(),
            meta: BTreeMap::new(),
        }
    }

    /// Add a single-column value-bag property
    pub fn with_value(self, name: &str, column: &str, data_type: DataType) -> Self {
        let property = SqlProperty::native(name, self.table.clone(), column, data_type);
        self.with_property(Mode::Value, property)
    }

    /// Add a single-column meta-bag property
    pub fn with_meta(self, name: &str, column: &str, data_type: DataType) -> Self {
        let property = SqlProperty::native(name, self.table.clone(), column, data_type);
        self.with_property(Mode::Meta, property)
    }

    /// Add a property with an arbitrary codec. Modes other than `Value`
    /// and `Meta` are ignored.
    pub fn with_property(mut self, mode: Mode, property: SqlProperty) -> Self {
        match mode {
            Mode::Value => {
                self.values.insert(property.name.clone(), property);
            }
            Mode::Meta => {
                self.meta.insert(property.name.clone(), property);
            }
            Mode::Constant | Mode::Key | Mode::Column => {}
        }
        self
    }

    /// Every property including the key
    pub fn properties(&self) -> impl Iterator<Item = &SqlProperty> {
        std::iter::once(&self.key)
            .chain(self.values.values())
            .chain(self.meta.values())
    }

    /// Check that every property lives on the collection's table, fits its
    /// codec, and that `backend` can render it when it spans several
    /// columns
    pub fn check_backend(&self, backend: &Backend) -> QueryResult<()> {
        for property in self.properties() {
            if property.table != self.table {
                return Err(QueryError::Codec {
                    codec: property.codec.name().to_string(),
                    reason: format!(
                        "property '{}' is stored on table '{}', not '{}'",
                        property.name, property.table, self.table
                    ),
                });
            }
            property.check_columns()?;
            let codec = property.codec.name();
            if property.column_count() > 1 && !backend.hooks.contains(codec) {
                return Err(QueryError::MissingRewriteHook {
                    property: property.name.clone(),
                    codec: codec.to_string(),
                });
            }
        }
        Ok(())
    }
}

impl PropertyResolver for CollectionSchema {
    fn table(&self) -> &str {
        &self.table
    }

    fn key(&self) -> &SqlProperty {
        &self.key
    }

    fn property(&self, mode: Mode, name: &str) -> Option<&SqlProperty> {
        match mode {
            Mode::Value => self.values.get(name),
            Mode::Meta => self.meta.get(name),
            Mode::Constant | Mode::Key | Mode::Column => None,
        }
    }
}

/// Registered collections for one backend
pub struct Catalog {
    backend: Arc<Backend>,
    collections: DashMap<String, Arc<CollectionSchema>>,
}

impl Catalog {
    pub fn new(backend: Backend) -> Self {
        Self {
            backend: Arc::new(backend),
            collections: DashMap::new(),
        }
    }

    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    /// Register a collection.
    ///
    /// Fails if the name is taken or if a multi-column property has no
    /// rewrite hook on this backend.
    pub fn register(&self, schema: CollectionSchema) -> QueryResult<Arc<CollectionSchema>> {
        schema.check_backend(&self.backend)?;

        let schema = Arc::new(schema);
        match self.collections.entry(schema.name.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                Err(QueryError::DuplicateCollection(schema.name.clone()))
            }
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                debug!(
                    "registered collection '{}' on table '{}' for {}",
                    schema.name, schema.table, self.backend.dialect
                );
                entry.insert(schema.clone());
                Ok(schema)
            }
        }
    }

    pub fn get(&self, name: &str) -> QueryResult<Arc<CollectionSchema>> {
        self.collections
            .get(name)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| QueryError::UnknownCollection(name.to_string()))
    }

    pub fn remove(&self, name: &str) -> Option<Arc<CollectionSchema>> {
        self.collections.remove(name).map(|(_, schema)| schema)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.collections.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.collections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }

    /// Sorted collection names
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .collections
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        names.sort();
        names
    }

    /// Render the `where` clause for `node` against a registered collection
    pub fn translate(&self, collection: &str, node: &Node) -> QueryResult<Translation> {
        let schema = self.get(collection)?;
        SqlTranslator::new(schema.as_ref(), &self.backend).where_clause(node)
    }
}
