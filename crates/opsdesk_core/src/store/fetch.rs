//! Ordered fetch with a single unordered fallback.
//!
//! # Invariants
//! - At most two store reads per call, no backoff.
//! - A fallback result is sorted client-side by the requested ordering,
//!   with documents lacking the field placed last.

use crate::model::document::Document;
use crate::store::query::{sort_documents, Query};
use crate::store::{DocumentStore, StoreResult};
use log::warn;

#[derive(Debug, Clone, PartialEq)]
pub struct Fetched {
    pub documents: Vec<Document>,
    /// The ordered query failed and the unordered retry served the result.
    pub used_fallback: bool,
}

/// Runs `query`; when an ordered query fails, retries once without ordering.
///
/// Unordered queries and failures of the retry propagate unchanged.
pub fn fetch_with_fallback<S>(store: &S, query: &Query) -> StoreResult<Fetched>
where
    S: DocumentStore + ?Sized,
{
    let err = match store.query(query) {
        Ok(documents) => {
            return Ok(Fetched {
                documents,
                used_fallback: false,
            })
        }
        Err(err) => err,
    };

    let Some(order) = &query.order else {
        return Err(err);
    };

    warn!(
        "event=query_fallback module=store status=retry collection={} order_field={} error={}",
        query.collection, order.field, err
    );

    let mut documents = store.query(&query.without_order())?;
    sort_documents(&mut documents, order);
    Ok(Fetched {
        documents,
        used_fallback: true,
    })
}
