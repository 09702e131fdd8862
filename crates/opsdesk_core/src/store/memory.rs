//! In-memory document store.
//!
//! # Responsibility
//! - Hold fixture and test data with the same query semantics as the
//!   managed store.
//! - Optionally reject ordered queries that would need a composite index,
//!   so callers exercise their fallback path.
//!
//! # Invariants
//! - Locks are never held while listeners run.

use crate::model::document::{DocPath, Document};
use crate::store::listeners::{ListenerRegistry, SnapshotListener, SubscriptionId};
use crate::store::query::Query;
use crate::store::{DocumentStore, LiveDocumentStore, StoreError, StoreResult};
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Default)]
pub struct MemoryDocumentStore {
    documents: RwLock<BTreeMap<DocPath, Document>>,
    /// `None` disables index enforcement.
    indexes: RwLock<Option<BTreeSet<(String, String)>>>,
    listeners: ListenerRegistry,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that rejects filtered queries ordered by an unindexed field.
    pub fn with_index_enforcement() -> Self {
        let store = Self::default();
        *store.indexes.write() = Some(BTreeSet::new());
        store
    }

    /// Declares an index on `collection` ordered by `field`.
    pub fn register_index(&self, collection: &str, field: &str) {
        if let Some(indexes) = self.indexes.write().as_mut() {
            indexes.insert((collection.to_string(), field.to_string()));
        }
    }

    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }

    fn check_index(&self, query: &Query) -> StoreResult<()> {
        let Some(order) = &query.order else {
            return Ok(());
        };
        let indexes = self.indexes.read();
        let Some(indexes) = indexes.as_ref() else {
            return Ok(());
        };

        let filters_other_field = query
            .filters
            .iter()
            .any(|filter| filter.field != order.field);
        if filters_other_field
            && !indexes.contains(&(query.collection.clone(), order.field.clone()))
        {
            return Err(StoreError::IndexRequired {
                collection: query.collection.clone(),
                field: order.field.clone(),
            });
        }
        Ok(())
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn get(&self, path: &DocPath) -> StoreResult<Option<Document>> {
        Ok(self.documents.read().get(path).cloned())
    }

    fn query(&self, query: &Query) -> StoreResult<Vec<Document>> {
        self.check_index(query)?;
        let candidates = self
            .documents
            .read()
            .values()
            .filter(|doc| doc.path.collection() == query.collection)
            .cloned()
            .collect::<Vec<_>>();
        Ok(query.apply(candidates))
    }

    fn set(&self, document: &Document) -> StoreResult<()> {
        self.documents
            .write()
            .insert(document.path.clone(), document.clone());
        self.listeners
            .notify(document.path.collection(), |query| self.query(query));
        Ok(())
    }

    fn delete(&self, path: &DocPath) -> StoreResult<bool> {
        let removed = self.documents.write().remove(path).is_some();
        if removed {
            self.listeners
                .notify(path.collection(), |query| self.query(query));
        }
        Ok(removed)
    }
}

impl LiveDocumentStore for MemoryDocumentStore {
    fn subscribe(&self, query: Query, listener: SnapshotListener) -> StoreResult<SubscriptionId> {
        let snapshot = self.query(&query)?;
        let id = self.listeners.register(query, listener.clone());
        listener(&snapshot);
        Ok(id)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.listeners.remove(id)
    }
}
