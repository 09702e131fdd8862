//! Support ticket view model.

use crate::model::document::{DecodeError, DocPath, Document};
use chrono::{DateTime, Utc};
use serde::Serialize;

pub const COLLECTION: &str = "support_tickets";

wire_status! {
    TicketStatus {
        Open => "open" | "new",
        InProgress => "in_progress" | "pending",
        Resolved => "resolved",
        Closed => "closed",
    }
}

wire_status! {
    TicketPriority {
        Low => "low",
        Medium => "medium" | "normal",
        High => "high",
        Urgent => "urgent" | "critical",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SupportTicket {
    pub path: DocPath,
    pub customer: Option<DocPath>,
    pub subject: String,
    pub description: Option<String>,
    pub status: TicketStatus,
    pub priority: TicketPriority,
    pub created_at: Option<DateTime<Utc>>,
}

impl SupportTicket {
    pub fn from_document(doc: &Document) -> Result<Self, DecodeError> {
        Ok(Self {
            path: doc.path.clone(),
            customer: doc.ref_field("customer_id")?,
            subject: doc
                .lenient(doc.text_field("subject"))
                .unwrap_or_else(|| "(no subject)".to_string()),
            description: doc.lenient(doc.text_field("description")),
            status: doc
                .lenient(doc.str_field("status"))
                .map(TicketStatus::parse)
                .unwrap_or(TicketStatus::Open),
            priority: doc
                .lenient(doc.str_field("priority"))
                .map(TicketPriority::parse)
                .unwrap_or(TicketPriority::Medium),
            created_at: doc.lenient(doc.timestamp_field("created_at")),
        })
    }

    /// Open or being worked on.
    pub fn is_open(&self) -> bool {
        matches!(self.status, TicketStatus::Open | TicketStatus::InProgress)
    }
}
