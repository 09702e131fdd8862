//! Partner (service provider) and partner credit wallet view models.

use crate::model::document::{DecodeError, DocPath, Document};
use chrono::{DateTime, Utc};
use serde::Serialize;

pub const COLLECTION: &str = "partners";
pub const WALLET_COLLECTION: &str = "partner_credit_wallet";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Partner {
    pub path: DocPath,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub category: Option<String>,
    pub is_verified: bool,
    pub created_time: Option<DateTime<Utc>>,
}

impl Partner {
    pub fn from_document(doc: &Document) -> Result<Self, DecodeError> {
        let name = match doc.lenient(doc.text_field("name")) {
            Some(name) => Some(name),
            None => doc.lenient(doc.text_field("business_name")),
        };
        Ok(Self {
            path: doc.path.clone(),
            name,
            email: doc.lenient(doc.text_field("email")),
            phone_number: doc.lenient(doc.text_field("phone_number")),
            category: doc.lenient(doc.text_field("category")),
            is_verified: doc.lenient(doc.bool_field("is_verified")).unwrap_or(false),
            created_time: doc.lenient(doc.timestamp_field("created_time")),
        })
    }

    pub fn display_label(&self) -> Option<String> {
        self.name
            .clone()
            .or_else(|| self.email.clone())
            .or_else(|| self.phone_number.clone())
    }

    pub fn contact(&self) -> Option<String> {
        self.phone_number.clone().or_else(|| self.email.clone())
    }
}

/// Prepaid credit balance a partner spends on leads.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartnerWallet {
    pub path: DocPath,
    pub partner: Option<DocPath>,
    pub balance: f64,
    pub updated_at: Option<DateTime<Utc>>,
}

impl PartnerWallet {
    pub fn from_document(doc: &Document) -> Result<Self, DecodeError> {
        Ok(Self {
            path: doc.path.clone(),
            partner: doc.ref_field("partner_id")?,
            balance: doc.lenient(doc.f64_field("balance")).unwrap_or(0.0),
            updated_at: doc.lenient(doc.timestamp_field("updated_at")),
        })
    }
}
