//! Support tickets page.

use crate::analytics::count_by;
use crate::hydrate::DisplayInfo;
use crate::listing::{
    apply_search, filter_rows, paginate, Page, PageRequest, SearchTerm, Searchable,
};
use crate::model::ticket::{self, SupportTicket, TicketStatus};
use crate::service::{ServiceContext, ServiceResult};
use crate::store::{Direction, DocumentStore, Query};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TicketRow {
    #[serde(flatten)]
    pub ticket: SupportTicket,
    pub customer_display: DisplayInfo,
}

impl Searchable for TicketRow {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![
            self.ticket.path.id(),
            self.ticket.subject.as_str(),
            self.ticket.priority.as_str(),
            self.customer_display.label.as_str(),
        ];
        fields.extend(self.ticket.description.as_deref());
        fields
    }
}

pub struct TicketService<'s, S: ?Sized> {
    ctx: ServiceContext<'s, S>,
}

impl<'s, S> TicketService<'s, S>
where
    S: DocumentStore + ?Sized,
{
    pub fn new(ctx: ServiceContext<'s, S>) -> Self {
        Self { ctx }
    }

    /// Tickets, newest first.
    pub fn list(
        &self,
        status: Option<&TicketStatus>,
        search: &SearchTerm,
        page: PageRequest,
    ) -> ServiceResult<Page<TicketRow>> {
        let tickets = self.ctx.load(
            &Query::collection(ticket::COLLECTION).order_by("created_at", Direction::Descending),
            SupportTicket::from_document,
        )?;
        let tickets = filter_rows(tickets, |ticket| {
            status.map_or(true, |status| &ticket.status == status)
        });

        let labels = self
            .ctx
            .resolver()
            .resolve(tickets.iter().filter_map(|ticket| ticket.customer.as_ref()));
        let rows = tickets
            .into_iter()
            .map(|ticket| TicketRow {
                customer_display: labels.display(ticket.customer.as_ref()),
                ticket,
            })
            .collect::<Vec<_>>();

        Ok(paginate(apply_search(rows, search), page))
    }

    pub fn status_counts(&self) -> ServiceResult<BTreeMap<String, usize>> {
        let tickets = self
            .ctx
            .load_all(ticket::COLLECTION, SupportTicket::from_document)?;
        Ok(count_by(&tickets, |ticket| ticket.status.to_string()))
    }
}
