//! Snapshot listener bookkeeping shared by store implementations.

use crate::model::document::Document;
use crate::store::query::Query;
use crate::store::StoreResult;
use log::warn;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Callback receiving the full result set of a subscribed query.
pub type SnapshotListener = Arc<dyn Fn(&[Document]) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

struct ListenerEntry {
    id: SubscriptionId,
    query: Query,
    listener: SnapshotListener,
}

#[derive(Default)]
pub(crate) struct ListenerRegistry {
    next_id: AtomicU64,
    entries: Mutex<Vec<ListenerEntry>>,
}

impl ListenerRegistry {
    pub(crate) fn register(&self, query: Query, listener: SnapshotListener) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        self.entries.lock().push(ListenerEntry {
            id,
            query,
            listener,
        });
        id
    }

    pub(crate) fn remove(&self, id: SubscriptionId) -> bool {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|entry| entry.id != id);
        entries.len() != before
    }

    /// Re-runs every subscription on `collection` and delivers the results.
    ///
    /// Listeners run after the registry lock is released, so they may
    /// subscribe or unsubscribe.
    pub(crate) fn notify(
        &self,
        collection: &str,
        run_query: impl Fn(&Query) -> StoreResult<Vec<Document>>,
    ) {
        let interested = self
            .entries
            .lock()
            .iter()
            .filter(|entry| entry.query.collection == collection)
            .map(|entry| (entry.id, entry.query.clone(), Arc::clone(&entry.listener)))
            .collect::<Vec<_>>();

        for (id, query, listener) in interested {
            match run_query(&query) {
                Ok(snapshot) => listener(&snapshot),
                Err(err) => warn!(
                    "event=snapshot_notify module=store status=error subscription={} collection={} error={}",
                    id.0, collection, err
                ),
            }
        }
    }
}
