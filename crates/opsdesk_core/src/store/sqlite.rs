//! SQLite-backed document snapshot store.
//!
//! # Responsibility
//! - Persist documents as JSON rows keyed by `(collection, doc_id)`.
//! - Serve queries with the shared in-process evaluator.
//!
//! # Invariants
//! - Stored `data` is always a JSON object.
//! - Reads reject rows whose JSON is not an object instead of masking them.

use crate::model::document::{DocPath, Document};
use crate::store::listeners::{ListenerRegistry, SnapshotListener, SubscriptionId};
use crate::store::query::Query;
use crate::store::{DocumentStore, LiveDocumentStore, StoreError, StoreResult};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;

/// Document store over a migrated connection (see `db::open_db`).
pub struct SqliteDocumentStore<'conn> {
    conn: &'conn Connection,
    listeners: ListenerRegistry,
}

impl<'conn> SqliteDocumentStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self {
            conn,
            listeners: ListenerRegistry::default(),
        }
    }

    /// Counts documents per collection, sorted by collection name.
    pub fn collection_counts(&self) -> StoreResult<Vec<(String, i64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT collection, COUNT(*) FROM documents GROUP BY collection ORDER BY collection;",
        )?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
        let mut counts = Vec::new();
        for row in rows {
            counts.push(row?);
        }
        Ok(counts)
    }
}

impl DocumentStore for SqliteDocumentStore<'_> {
    fn get(&self, path: &DocPath) -> StoreResult<Option<Document>> {
        let data: Option<String> = self
            .conn
            .query_row(
                "SELECT data FROM documents WHERE collection = ?1 AND doc_id = ?2;",
                params![path.collection(), path.id()],
                |row| row.get(0),
            )
            .optional()?;

        data.map(|raw| parse_row(path.clone(), &raw)).transpose()
    }

    fn query(&self, query: &Query) -> StoreResult<Vec<Document>> {
        let mut stmt = self.conn.prepare(
            "SELECT doc_id, data FROM documents WHERE collection = ?1 ORDER BY doc_id ASC;",
        )?;
        let mut rows = stmt.query(params![query.collection])?;
        let mut documents = Vec::new();

        while let Some(row) = rows.next()? {
            let doc_id: String = row.get(0)?;
            let raw: String = row.get(1)?;
            let path = DocPath::new(query.collection.as_str(), doc_id)?;
            documents.push(parse_row(path, &raw)?);
        }

        Ok(query.apply(documents))
    }

    fn set(&self, document: &Document) -> StoreResult<()> {
        let data = serde_json::to_string(&document.fields)?;
        self.conn.execute(
            "INSERT INTO documents (collection, doc_id, data)
             VALUES (?1, ?2, ?3)
             ON CONFLICT (collection, doc_id) DO UPDATE SET
                data = excluded.data,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![document.path.collection(), document.path.id(), data],
        )?;
        self.listeners
            .notify(document.path.collection(), |query| self.query(query));
        Ok(())
    }

    fn delete(&self, path: &DocPath) -> StoreResult<bool> {
        let changed = self.conn.execute(
            "DELETE FROM documents WHERE collection = ?1 AND doc_id = ?2;",
            params![path.collection(), path.id()],
        )?;
        if changed > 0 {
            self.listeners
                .notify(path.collection(), |query| self.query(query));
        }
        Ok(changed > 0)
    }
}

impl LiveDocumentStore for SqliteDocumentStore<'_> {
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

fn parse_row(path: DocPath, raw: &str) -> StoreResult<Document> {
    let value: Value = serde_json::from_str(raw)?;
    Document::from_value(path, value).map_err(|err| StoreError::InvalidDocument {
        path: err.path,
        message: err.expected.to_string(),
    })
}
