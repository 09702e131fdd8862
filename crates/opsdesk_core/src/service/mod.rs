//! Dashboard page services.
//!
//! # Responsibility
//! - Turn store reads into the hydrated, filtered, paginated rows and the
//!   aggregates each dashboard page renders.
//! - Keep callers independent of the concrete document store.
//!
//! # Invariants
//! - Documents with a malformed reference or identity field are skipped and
//!   logged, never fatal.
//! - Primary collection reads propagate their errors; reference reads do not.

use crate::config::DashboardConfig;
use crate::hydrate::{ReferenceResolver, DEFAULT_UNKNOWN_LABEL};
use crate::model::document::{DecodeError, DocPath, Document};
use crate::payments::PaymentsError;
use crate::store::{fetch_with_fallback, DocumentStore, Query, StoreError};
use log::warn;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod booking_service;
pub mod coupon_service;
pub mod customer_service;
pub mod dashboard_service;
pub mod inventory_service;
pub mod partner_service;
pub mod payment_service;
pub mod review_service;
pub mod subscription_service;
pub mod ticket_service;

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug)]
pub enum ServiceError {
    Store(StoreError),
    Payments(PaymentsError),
    NotFound(DocPath),
    /// A document requested by path exists but cannot be decoded.
    Decode(DecodeError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::Payments(err) => write!(f, "{err}"),
            Self::NotFound(path) => write!(f, "document not found: {path}"),
            Self::Decode(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Payments(err) => Some(err),
            Self::Decode(err) => Some(err),
            Self::NotFound(_) => None,
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<PaymentsError> for ServiceError {
    fn from(value: PaymentsError) -> Self {
        Self::Payments(value)
    }
}

impl From<DecodeError> for ServiceError {
    fn from(value: DecodeError) -> Self {
        Self::Decode(value)
    }
}

/// Store handle plus display settings shared by every service.
pub struct ServiceContext<'s, S: ?Sized> {
    store: &'s S,
    unknown_label: String,
}

impl<S: ?Sized> Clone for ServiceContext<'_, S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store,
            unknown_label: self.unknown_label.clone(),
        }
    }
}

impl<'s, S> ServiceContext<'s, S>
where
    S: DocumentStore + ?Sized,
{
    pub fn new(store: &'s S) -> Self {
        Self {
            store,
            unknown_label: DEFAULT_UNKNOWN_LABEL.to_string(),
        }
    }

    pub fn from_config(store: &'s S, config: &DashboardConfig) -> Self {
        Self::new(store).with_unknown_label(config.unknown_label.as_str())
    }

    pub fn with_unknown_label(mut self, label: impl Into<String>) -> Self {
        self.unknown_label = label.into();
        self
    }

    pub fn store(&self) -> &'s S {
        self.store
    }

    pub fn unknown_label(&self) -> &str {
        &self.unknown_label
    }

    pub fn resolver(&self) -> ReferenceResolver<'s, S> {
        ReferenceResolver::new(self.store, self.unknown_label.as_str())
    }

    /// Runs `query` (with the ordering fallback) and decodes the results.
    pub(crate) fn load<T>(
        &self,
        query: &Query,
        decode: impl Fn(&Document) -> Result<T, DecodeError>,
    ) -> ServiceResult<Vec<T>> {
        let fetched = fetch_with_fallback(self.store, query)?;
        Ok(decode_all(fetched.documents, decode))
    }

    /// Reads a whole collection and decodes it.
    pub(crate) fn load_all<T>(
        &self,
        collection: &str,
        decode: impl Fn(&Document) -> Result<T, DecodeError>,
    ) -> ServiceResult<Vec<T>> {
        let documents = self.store.get_all(collection)?;
        Ok(decode_all(documents, decode))
    }
}

/// Decodes documents, skipping and logging the ones that do not fit.
pub(crate) fn decode_all<T>(
    documents: Vec<Document>,
    decode: impl Fn(&Document) -> Result<T, DecodeError>,
) -> Vec<T> {
    let mut decoded = Vec::with_capacity(documents.len());
    for doc in &documents {
        match decode(doc) {
            Ok(value) => decoded.push(value),
            Err(err) => warn!(
                "event=decode_document module=service status=skipped path={} field={} expected={}",
                err.path, err.field, err.expected
            ),
        }
    }
    decoded
}
