//! Customer subscription plan view model.

use crate::model::document::{DecodeError, DocPath, Document};
use chrono::{DateTime, Utc};
use serde::Serialize;

pub const COLLECTION: &str = "Subscription";

wire_status! {
    SubscriptionStatus {
        Active => "active",
        Paused => "paused",
        Expired => "expired",
        Cancelled => "cancelled" | "canceled",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Subscription {
    pub path: DocPath,
    pub customer: Option<DocPath>,
    pub plan_name: Option<String>,
    pub status: SubscriptionStatus,
    pub amount: f64,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

impl Subscription {
    pub fn from_document(doc: &Document) -> Result<Self, DecodeError> {
        let status = doc
            .lenient(doc.str_field("status"))
            .map(SubscriptionStatus::parse)
            .unwrap_or(SubscriptionStatus::Active);
        Ok(Self {
            path: doc.path.clone(),
            customer: doc.ref_field("customer_id")?,
            plan_name: doc.lenient(doc.text_field("plan_name")),
            status,
            amount: doc.lenient(doc.f64_field("amount")).unwrap_or(0.0),
            start_date: doc.lenient(doc.timestamp_field("start_date")),
            end_date: doc.lenient(doc.timestamp_field("end_date")),
        })
    }

    /// Active status and not past its end date at `now`.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.status == SubscriptionStatus::Active && self.end_date.map_or(true, |end| end > now)
    }
}
