//! Booking view model.
//!
//! # Invariants
//! - A booking without a stored status is `Pending`.
//! - A booking without an amount contributes `0` to revenue sums.

use crate::model::document::{DecodeError, DocPath, Document};
use chrono::{DateTime, Utc};
use serde::Serialize;

pub const COLLECTION: &str = "bookings";

wire_status! {
    /// Lifecycle state of a booking.
    BookingStatus {
        Pending => "pending" | "requested",
        Confirmed => "confirmed" | "accepted",
        InProgress => "in_progress" | "ongoing" | "started",
        Completed => "completed" | "done",
        Cancelled => "cancelled" | "canceled" | "rejected",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Booking {
    pub path: DocPath,
    pub customer: Option<DocPath>,
    pub provider: Option<DocPath>,
    pub service_name: Option<String>,
    pub status: BookingStatus,
    pub booking_date: Option<DateTime<Utc>>,
    pub total_amount: Option<f64>,
    pub address: Option<String>,
    pub coupon_code: Option<String>,
}

impl Booking {
    pub fn from_document(doc: &Document) -> Result<Self, DecodeError> {
        let status = doc
            .lenient(doc.str_field("status"))
            .map(BookingStatus::parse)
            .unwrap_or(BookingStatus::Pending);
        Ok(Self {
            path: doc.path.clone(),
            customer: doc.ref_field("customer_id")?,
            provider: doc.ref_field("provider_id")?,
            service_name: doc.lenient(doc.text_field("service_name")),
            status,
            booking_date: doc.lenient(doc.timestamp_field("booking_date")),
            total_amount: doc.lenient(doc.f64_field("total_amount")),
            address: doc.lenient(doc.text_field("address")),
            coupon_code: doc.lenient(doc.text_field("coupon_code")),
        })
    }

    pub fn amount(&self) -> f64 {
        self.total_amount.unwrap_or(0.0)
    }

    pub fn is_completed(&self) -> bool {
        self.status == BookingStatus::Completed
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == BookingStatus::Cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::{Booking, BookingStatus};
    use crate::model::document::{DocPath, Document};
    use serde_json::json;

    #[test]
    fn status_parsing_accepts_aliases_and_keeps_unknown_values() {
        assert_eq!(BookingStatus::parse("In Progress"), BookingStatus::InProgress);
        assert_eq!(BookingStatus::parse("Canceled"), BookingStatus::Cancelled);
        assert_eq!(
            BookingStatus::parse("on-hold"),
            BookingStatus::Other("on-hold".to_string())
        );
    }

    #[test]
    fn decode_defaults_status_and_amount() {
        let doc = Document::from_value(
            DocPath::new("bookings", "b1").unwrap(),
            json!({"customer_id": {"$ref": "customer/c1"}, "service_name": "Deep cleaning"}),
        )
        .unwrap();
        let booking = Booking::from_document(&doc).unwrap();

        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.amount(), 0.0);
        assert_eq!(booking.customer.unwrap().to_string(), "customer/c1");
        assert!(booking.provider.is_none());
    }

    #[test]
    fn malformed_amount_keeps_the_booking() {
        let doc = Document::from_value(
            DocPath::new("bookings", "b7").unwrap(),
            json!({
                "customer_id": {"$ref": "customer/c1"},
                "status": "confirmed",
                "total_amount": "n/a"
            }),
        )
        .unwrap();
        let booking = Booking::from_document(&doc).unwrap();

        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert_eq!(booking.total_amount, None);
        assert_eq!(booking.amount(), 0.0);
    }

    #[test]
    fn malformed_reference_still_rejects_the_booking() {
        let doc = Document::from_value(
            DocPath::new("bookings", "b8").unwrap(),
            json!({"customer_id": 42}),
        )
        .unwrap();
        assert!(Booking::from_document(&doc).is_err());
    }
}
