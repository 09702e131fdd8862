//! Bookings page.
//!
//! # Responsibility
//! - Fetch bookings for a provider/customer/date filter, newest first.
//! - Hydrate customer and provider references, then search, filter by
//!   status and paginate.
//!
//! # Invariants
//! - Each referenced customer/provider is read at most once per call.
//! - Bookings without `booking_date` are excluded from ordered reads.

use crate::analytics::count_by;
use crate::hydrate::{DisplayInfo, LabelMap};
use crate::listing::{
    apply_search, filter_rows, paginate, Page, PageRequest, SearchTerm, Searchable,
};
use crate::model::booking::{self, Booking, BookingStatus};
use crate::model::document::DocPath;
use crate::service::{ServiceContext, ServiceResult};
use crate::store::{Direction, DocumentStore, FilterOp, Query};
use chrono::{DateTime, Utc};
use log::info;
use serde::Serialize;
use std::collections::BTreeMap;

/// Server-side narrowing applied before hydration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookingFilter {
    pub provider: Option<DocPath>,
    pub customer: Option<DocPath>,
    /// Inclusive lower bound on `booking_date`.
    pub from: Option<DateTime<Utc>>,
    /// Exclusive upper bound on `booking_date`.
    pub until: Option<DateTime<Utc>>,
}

impl BookingFilter {
    pub fn for_provider(provider: DocPath) -> Self {
        Self {
            provider: Some(provider),
            ..Self::default()
        }
    }

    pub fn for_customer(customer: DocPath) -> Self {
        Self {
            customer: Some(customer),
            ..Self::default()
        }
    }

    pub fn query(&self) -> Query {
        let mut query = Query::collection(booking::COLLECTION);
        if let Some(provider) = &self.provider {
            query = query.where_ref("provider_id", provider);
        }
        if let Some(customer) = &self.customer {
            query = query.where_ref("customer_id", customer);
        }
        if let Some(from) = self.from {
            query = query.where_timestamp("booking_date", FilterOp::Gte, from);
        }
        if let Some(until) = self.until {
            query = query.where_timestamp("booking_date", FilterOp::Lt, until);
        }
        query.order_by("booking_date", Direction::Descending)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookingRow {
    #[serde(flatten)]
    pub booking: Booking,
    pub customer_display: DisplayInfo,
    pub provider_display: DisplayInfo,
}

impl Searchable for BookingRow {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![
            self.booking.path.id(),
            self.booking.status.as_str(),
            self.customer_display.label.as_str(),
            self.provider_display.label.as_str(),
        ];
        fields.extend(self.booking.service_name.as_deref());
        fields.extend(self.booking.address.as_deref());
        fields
    }
}

pub struct BookingService<'s, S: ?Sized> {
    ctx: ServiceContext<'s, S>,
}

impl<'s, S> BookingService<'s, S>
where
    S: DocumentStore + ?Sized,
{
    pub fn new(ctx: ServiceContext<'s, S>) -> Self {
        Self { ctx }
    }

    /// Decoded bookings for `filter`, newest first.
    pub fn bookings(&self, filter: &BookingFilter) -> ServiceResult<Vec<Booking>> {
        self.ctx.load(&filter.query(), Booking::from_document)
    }

    /// Every hydrated row for `filter`, newest first.
    pub fn rows(&self, filter: &BookingFilter) -> ServiceResult<Vec<BookingRow>> {
        let bookings = self.bookings(filter)?;
        Ok(hydrate_bookings(&self.ctx, bookings))
    }

    pub fn list(
        &self,
        filter: &BookingFilter,
        search: &SearchTerm,
        status: Option<&BookingStatus>,
        page: PageRequest,
    ) -> ServiceResult<Page<BookingRow>> {
        let rows = self.rows(filter)?;
        let fetched = rows.len();
        let rows = filter_rows(rows, |row| {
            status.map_or(true, |status| &row.booking.status == status)
        });
        let rows = apply_search(rows, search);
        let page = paginate(rows, page);
        info!(
            "event=list_bookings module=service status=ok fetched={} matched={} page={}",
            fetched, page.total_items, page.page
        );
        Ok(page)
    }

    /// Booking count per status for `filter`.
    pub fn status_counts(
        &self,
        filter: &BookingFilter,
    ) -> ServiceResult<BTreeMap<String, usize>> {
        let bookings = self.bookings(filter)?;
        Ok(count_by(&bookings, |booking| booking.status.to_string()))
    }
}

/// Resolves customer and provider labels for `bookings` in one pass.
pub(crate) fn hydrate_bookings<S>(
    ctx: &ServiceContext<'_, S>,
    bookings: Vec<Booking>,
) -> Vec<BookingRow>
where
    S: DocumentStore + ?Sized,
{
    let labels: LabelMap = ctx.resolver().resolve(
        bookings
            .iter()
            .flat_map(|booking| [booking.customer.as_ref(), booking.provider.as_ref()])
            .flatten(),
    );

    bookings
        .into_iter()
        .map(|booking| BookingRow {
            customer_display: labels.display(booking.customer.as_ref()),
            provider_display: labels.display(booking.provider.as_ref()),
            booking,
        })
        .collect()
}
