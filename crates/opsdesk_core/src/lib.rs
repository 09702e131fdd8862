//! Core data layer for the opsdesk operations dashboard.
//! Pages query the document store, hydrate references to display labels,
//! filter and paginate in process, and aggregate for KPI cards and charts.

pub mod analytics;
pub mod config;
pub mod db;
pub mod hydrate;
pub mod listing;
pub mod logging;
pub mod model;
pub mod payments;
pub mod service;
pub mod store;

pub use config::{load_config, ConfigError, DashboardConfig};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use hydrate::{DisplayInfo, LabelMap, ReferenceResolver};
pub use listing::{Page, PageRequest, SearchTerm};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::document::{DecodeError, DocPath, Document};
pub use payments::{HttpPaymentsSource, PaymentsError, PaymentsSource};
pub use service::{ServiceContext, ServiceError, ServiceResult};
pub use store::{
    DocumentStore, LiveDocumentStore, MemoryDocumentStore, Query, SqliteDocumentStore,
    StoreError, StoreResult,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
