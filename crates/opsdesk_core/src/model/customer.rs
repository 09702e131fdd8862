//! Customer view model.

use crate::model::document::{DecodeError, DocPath, Document};
use chrono::{DateTime, Utc};
use serde::Serialize;

pub const COLLECTION: &str = "customer";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Customer {
    pub path: DocPath,
    pub display_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub city: Option<String>,
    pub created_time: Option<DateTime<Utc>>,
}

impl Customer {
    pub fn from_document(doc: &Document) -> Result<Self, DecodeError> {
        Ok(Self {
            path: doc.path.clone(),
            display_name: doc.lenient(doc.text_field("display_name")),
            first_name: doc.lenient(doc.text_field("first_name")),
            last_name: doc.lenient(doc.text_field("last_name")),
            email: doc.lenient(doc.text_field("email")),
            phone_number: doc.lenient(doc.text_field("phone_number")),
            city: doc.lenient(doc.text_field("city")),
            created_time: doc.lenient(doc.timestamp_field("created_time")),
        })
    }

    /// Best available human label: display name, then first/last name, then
    /// email, then phone number.
    pub fn display_label(&self) -> Option<String> {
        if let Some(name) = &self.display_name {
            return Some(name.clone());
        }

        let full_name = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");
        if !full_name.is_empty() {
            return Some(full_name);
        }

        self.email.clone().or_else(|| self.phone_number.clone())
    }

    /// Contact line shown under the label.
    pub fn contact(&self) -> Option<String> {
        self.email.clone().or_else(|| self.phone_number.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::Customer;
    use crate::model::document::{DocPath, Document};
    use serde_json::json;

    fn customer(value: serde_json::Value) -> Customer {
        let doc = Document::from_value(DocPath::new("customer", "c1").unwrap(), value).unwrap();
        Customer::from_document(&doc).unwrap()
    }

    #[test]
    fn label_prefers_display_name_then_names_then_contact() {
        assert_eq!(
            customer(json!({"display_name": "Asha K", "first_name": "A"})).display_label(),
            Some("Asha K".to_string())
        );
        assert_eq!(
            customer(json!({"display_name": "  ", "first_name": "Ravi", "last_name": "Menon"}))
                .display_label(),
            Some("Ravi Menon".to_string())
        );
        assert_eq!(
            customer(json!({"phone_number": "+911234"})).display_label(),
            Some("+911234".to_string())
        );
        assert_eq!(customer(json!({})).display_label(), None);
    }
}
