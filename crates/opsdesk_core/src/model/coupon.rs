//! Coupon view model and lifecycle state.
//!
//! # Invariants
//! - `Coupon::state` checks disabled, scheduled, expired, exhausted, active
//!   in that order, so a disabled coupon never reports as expired.

use crate::analytics::percentage;
use crate::model::document::{DecodeError, DocPath, Document};
use chrono::{DateTime, Utc};
use serde::Serialize;

pub const COLLECTION: &str = "coupons";

wire_status! {
    DiscountType {
        Percentage => "percentage" | "percent",
        Flat => "flat" | "fixed" | "amount",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CouponState {
    Disabled,
    Scheduled,
    Expired,
    Exhausted,
    Active,
}

impl CouponState {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "disabled" => Some(Self::Disabled),
            "scheduled" => Some(Self::Scheduled),
            "expired" => Some(Self::Expired),
            "exhausted" => Some(Self::Exhausted),
            "active" => Some(Self::Active),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Coupon {
    pub path: DocPath,
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_value: f64,
    pub max_uses: Option<i64>,
    pub used_count: i64,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
    pub is_active: bool,
}

impl Coupon {
    pub fn from_document(doc: &Document) -> Result<Self, DecodeError> {
        let code = doc.require("code", doc.text_field("code")?)?;
        Ok(Self {
            path: doc.path.clone(),
            code: code.to_ascii_uppercase(),
            discount_type: doc
                .lenient(doc.str_field("discount_type"))
                .map(DiscountType::parse)
                .unwrap_or(DiscountType::Percentage),
            discount_value: doc.lenient(doc.f64_field("discount_value")).unwrap_or(0.0),
            max_uses: doc.lenient(doc.i64_field("max_uses")),
            used_count: doc.lenient(doc.i64_field("used_count")).unwrap_or(0),
            valid_from: doc.lenient(doc.timestamp_field("valid_from")),
            valid_until: doc.lenient(doc.timestamp_field("valid_until")),
            is_active: doc.lenient(doc.bool_field("is_active")).unwrap_or(true),
        })
    }

    pub fn state(&self, now: DateTime<Utc>) -> CouponState {
        if !self.is_active {
            return CouponState::Disabled;
        }
        if self.valid_from.is_some_and(|from| from > now) {
            return CouponState::Scheduled;
        }
        if self.valid_until.is_some_and(|until| until < now) {
            return CouponState::Expired;
        }
        if self.max_uses.is_some_and(|max| max > 0 && self.used_count >= max) {
            return CouponState::Exhausted;
        }
        CouponState::Active
    }

    /// Share of `max_uses` already redeemed; `None` for unlimited coupons.
    pub fn usage_percent(&self) -> Option<f64> {
        self.max_uses
            .filter(|max| *max > 0)
            .map(|max| percentage(self.used_count as f64, max as f64))
    }

    /// Short discount label such as `15%` or `200 off`.
    pub fn discount_label(&self) -> String {
        match self.discount_type {
            DiscountType::Flat => format!("{} off", trim_number(self.discount_value)),
            _ => format!("{}%", trim_number(self.discount_value)),
        }
    }
}

fn trim_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::{Coupon, CouponState};
    use crate::model::document::{encode_timestamp, DocPath, Document};
    use chrono::{Duration, TimeZone, Utc};
    use serde_json::json;

    fn coupon(value: serde_json::Value) -> Coupon {
        let doc = Document::from_value(DocPath::new("coupons", "k1").unwrap(), value).unwrap();
        Coupon::from_document(&doc).unwrap()
    }

    #[test]
    fn state_follows_precedence() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let past = encode_timestamp(now - Duration::days(1));
        let future = encode_timestamp(now + Duration::days(1));

        assert_eq!(
            coupon(json!({"code": "a", "is_active": false, "valid_until": past})).state(now),
            CouponState::Disabled
        );
        assert_eq!(
            coupon(json!({"code": "a", "valid_from": future})).state(now),
            CouponState::Scheduled
        );
        assert_eq!(
            coupon(json!({"code": "a", "valid_until": past})).state(now),
            CouponState::Expired
        );
        assert_eq!(
            coupon(json!({"code": "a", "max_uses": 10, "used_count": 10})).state(now),
            CouponState::Exhausted
        );
        assert_eq!(coupon(json!({"code": "a"})).state(now), CouponState::Active);
    }

    #[test]
    fn usage_and_labels() {
        let limited = coupon(json!({"code": "save10", "discount_value": 10, "max_uses": 40, "used_count": 10}));
        assert_eq!(limited.code, "SAVE10");
        assert_eq!(limited.usage_percent(), Some(25.0));
        assert_eq!(limited.discount_label(), "10%");

        let flat = coupon(json!({"code": "flat", "discount_type": "fixed", "discount_value": 150}));
        assert_eq!(flat.usage_percent(), None);
        assert_eq!(flat.discount_label(), "150 off");
    }
}
