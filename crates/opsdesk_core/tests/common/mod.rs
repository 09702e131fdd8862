#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use opsdesk_core::store::fixtures::load_fixture;
use opsdesk_core::{DocPath, DocumentStore, MemoryDocumentStore};
use serde_json::Value;

pub const FIXTURE: &str = include_str!("../fixtures/dashboard.json");

pub fn fixture() -> Value {
    serde_json::from_str(FIXTURE).unwrap()
}

pub fn seeded_store() -> MemoryDocumentStore {
    let store = MemoryDocumentStore::new();
    seed(&store);
    store
}

pub fn seed<S: DocumentStore + ?Sized>(store: &S) {
    load_fixture(store, &fixture()).unwrap();
}

/// Reference instant used by every dashboard test.
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 15, 12, 0, 0).unwrap()
}

pub fn path(raw: &str) -> DocPath {
    DocPath::parse(raw).unwrap()
}
