//! Bulk loading of fixture/snapshot JSON into any document store.
//!
//! Fixture shape: `{"<collection>": [{"id": "<doc id>", ...fields}, ...]}`.
//! Entries without `id` get a generated one.

use crate::model::document::{DocPath, Document};
use crate::store::{DocumentStore, StoreError, StoreResult};
use log::info;
use serde_json::Value;

/// Loads every collection in `fixture`; returns the number of documents written.
pub fn load_fixture<S>(store: &S, fixture: &Value) -> StoreResult<usize>
where
    S: DocumentStore + ?Sized,
{
    let Some(collections) = fixture.as_object() else {
        return Err(invalid("<root>", "fixture root must be an object"));
    };

    let mut written = 0;
    for (collection, entries) in collections {
        let Some(entries) = entries.as_array() else {
            return Err(invalid(collection, "collection entries must be an array"));
        };

        for entry in entries {
            let Some(fields) = entry.as_object() else {
                return Err(invalid(collection, "every entry must be an object"));
            };
            let mut fields = fields.clone();
            match fields.remove("id") {
                Some(Value::String(id)) => {
                    let path = DocPath::new(collection.as_str(), id)?;
                    store.set(&Document::new(path, fields))?;
                }
                Some(_) => return Err(invalid(collection, "`id` must be a string")),
                None => {
                    store.add(collection, fields)?;
                }
            }
            written += 1;
        }
    }

    info!(
        "event=fixture_load module=store status=ok collections={} documents={}",
        collections.len(),
        written
    );
    Ok(written)
}

fn invalid(path: &str, message: &str) -> StoreError {
    StoreError::InvalidDocument {
        path: path.to_string(),
        message: message.to_string(),
    }
}
