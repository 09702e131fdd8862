//! Payment records served pre-shaped by the payments endpoint.

use chrono::{DateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

wire_status! {
    PaymentStatus {
        Success => "success" | "captured" | "paid" | "succeeded",
        Pending => "pending" | "created" | "authorized",
        Failed => "failed",
        Refunded => "refunded",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    pub id: String,
    #[serde(default, alias = "booking_id")]
    pub booking_id: Option<String>,
    #[serde(default, alias = "customer_name")]
    pub customer_name: Option<String>,
    #[serde(deserialize_with = "amount_from_number_or_text")]
    pub amount: f64,
    pub status: PaymentStatus,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default, alias = "created_at")]
    pub created_at: Option<DateTime<Utc>>,
}

impl PaymentRecord {
    pub fn is_successful(&self) -> bool {
        self.status == PaymentStatus::Success
    }
}

/// Amounts arrive as numbers, or as numeric text from older backends.
fn amount_from_number_or_text<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Amount {
        Number(f64),
        Text(String),
    }

    match Amount::deserialize(deserializer)? {
        Amount::Number(value) => Ok(value),
        Amount::Text(raw) => raw
            .trim()
            .parse::<f64>()
            .map_err(|_| D::Error::custom(format!("invalid payment amount `{raw}`"))),
    }
}

#[cfg(test)]
mod tests {
    use super::PaymentRecord;

    #[test]
    fn amount_accepts_numeric_text() {
        let record: PaymentRecord =
            serde_json::from_str(r#"{"id": "p1", "amount": " 249.50 ", "status": "paid"}"#)
                .unwrap();
        assert_eq!(record.amount, 249.5);

        let bad = serde_json::from_str::<PaymentRecord>(
            r#"{"id": "p2", "amount": "free", "status": "paid"}"#,
        );
        assert!(bad.is_err());
    }
}
