//! Store/inventory purchase records (chemicals bought by partners).

use crate::model::document::{DecodeError, DocPath, Document};
use chrono::{DateTime, Utc};
use serde::Serialize;

pub const COLLECTION: &str = "chemical_purchase_record";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChemicalPurchase {
    pub path: DocPath,
    pub partner: Option<DocPath>,
    pub chemical_name: String,
    pub quantity: f64,
    pub unit: Option<String>,
    pub unit_price: Option<f64>,
    pub total_cost: Option<f64>,
    pub purchased_at: Option<DateTime<Utc>>,
}

impl ChemicalPurchase {
    pub fn from_document(doc: &Document) -> Result<Self, DecodeError> {
        Ok(Self {
            path: doc.path.clone(),
            partner: doc.ref_field("partner_id")?,
            chemical_name: doc.require("chemical_name", doc.text_field("chemical_name")?)?,
            quantity: doc.lenient(doc.f64_field("quantity")).unwrap_or(0.0),
            unit: doc.lenient(doc.text_field("unit")),
            unit_price: doc.lenient(doc.f64_field("unit_price")),
            total_cost: doc.lenient(doc.f64_field("total_cost")),
            purchased_at: doc.lenient(doc.timestamp_field("purchased_at")),
        })
    }

    /// Stored total, else quantity times unit price, else zero.
    pub fn cost(&self) -> f64 {
        self.total_cost
            .or_else(|| self.unit_price.map(|price| price * self.quantity))
            .unwrap_or(0.0)
    }
}
