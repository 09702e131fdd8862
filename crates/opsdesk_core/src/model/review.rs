//! Review view model.
//!
//! # Invariants
//! - `rating` is always within `1..=5`.

use crate::model::document::{DecodeError, DocPath, Document};
use chrono::{DateTime, Utc};
use serde::Serialize;

pub const COLLECTION: &str = "reviews";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Review {
    pub path: DocPath,
    pub booking: Option<DocPath>,
    pub customer: Option<DocPath>,
    pub provider: Option<DocPath>,
    pub rating: u8,
    pub comment: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Review {
    pub fn from_document(doc: &Document) -> Result<Self, DecodeError> {
        let raw_rating = doc.require("rating", doc.f64_field("rating")?)?;
        let rounded = raw_rating.round();
        if !(1.0..=5.0).contains(&rounded) {
            return Err(doc.error("rating", "a rating between 1 and 5"));
        }

        Ok(Self {
            path: doc.path.clone(),
            booking: doc.ref_field("booking_id")?,
            customer: doc.ref_field("customer_id")?,
            provider: doc.ref_field("provider_id")?,
            rating: rounded as u8,
            comment: doc.lenient(doc.text_field("comment")),
            created_at: doc.lenient(doc.timestamp_field("created_at")),
        })
    }
}
