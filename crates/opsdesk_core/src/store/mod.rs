//! Document store contracts and implementations.
//!
//! # Responsibility
//! - Define the read/write/subscribe surface the dashboard needs from a
//!   document database.
//! - Provide an in-memory store and an SQLite-backed snapshot store that
//!   share one query evaluator.
//!
//! # Invariants
//! - `get` on a missing document is `Ok(None)`, not an error.
//! - Live listeners receive the current snapshot on subscribe and after every
//!   write to the subscribed collection.

use crate::db::DbError;
use crate::model::document::{DocPath, Document, PathError};
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod fetch;
pub mod fixtures;
mod listeners;
pub mod memory;
pub mod query;
pub mod sqlite;

pub use fetch::{fetch_with_fallback, Fetched};
pub use listeners::{SnapshotListener, SubscriptionId};
pub use memory::MemoryDocumentStore;
pub use query::{Direction, Filter, FilterOp, OrderBy, Query};
pub use sqlite::SqliteDocumentStore;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    InvalidPath(PathError),
    InvalidDocument { path: String, message: String },
    /// The store cannot serve this ordering without an index.
    IndexRequired { collection: String, field: String },
    Serialization(serde_json::Error),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidPath(err) => write!(f, "{err}"),
            Self::InvalidDocument { path, message } => {
                write!(f, "invalid stored document `{path}`: {message}")
            }
            Self::IndexRequired { collection, field } => write!(
                f,
                "query on `{collection}` ordered by `{field}` requires an index"
            ),
            Self::Serialization(err) => write!(f, "document serialization failed: {err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidPath(err) => Some(err),
            Self::Serialization(err) => Some(err),
            Self::InvalidDocument { .. } | Self::IndexRequired { .. } => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<PathError> for StoreError {
    fn from(value: PathError) -> Self {
        Self::InvalidPath(value)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}

/// Read/write access to a document database.
pub trait DocumentStore {
    fn get(&self, path: &DocPath) -> StoreResult<Option<Document>>;
    fn query(&self, query: &Query) -> StoreResult<Vec<Document>>;
    /// Creates or fully replaces one document.
    fn set(&self, document: &Document) -> StoreResult<()>;
    /// Returns whether a document was removed.
    fn delete(&self, path: &DocPath) -> StoreResult<bool>;

    /// Creates a document with a generated id.
    fn add(&self, collection: &str, fields: Map<String, Value>) -> StoreResult<DocPath> {
        let path = DocPath::new(collection, Uuid::new_v4().simple().to_string())?;
        self.set(&Document::new(path.clone(), fields))?;
        Ok(path)
    }

    /// Reads a whole collection in path order.
    fn get_all(&self, collection: &str) -> StoreResult<Vec<Document>> {
        self.query(&Query::collection(collection))
    }
}

/// Stores that can push snapshots to listeners.
pub trait LiveDocumentStore: DocumentStore {
    fn subscribe(&self, query: Query, listener: SnapshotListener) -> StoreResult<SubscriptionId>;
    /// Returns whether the subscription existed.
    fn unsubscribe(&self, id: SubscriptionId) -> bool;
}
