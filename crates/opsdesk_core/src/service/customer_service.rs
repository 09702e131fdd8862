//! Customers page and customer detail view.
//!
//! # Responsibility
//! - List customers with booking counts and their active plan.
//! - Assemble one customer's bookings, subscriptions, reviews and spend.
//!
//! # Invariants
//! - The list issues one bulk read per collection, never one per customer.
//! - `total_spent` only counts completed bookings.
//! - Detail bookings are newest first with undated ones last, so they agree
//!   with the list's booking count.

use crate::listing::{apply_search, paginate, Page, PageRequest, SearchTerm, Searchable};
use crate::model::booking::{self, Booking};
use crate::model::customer::{self, Customer};
use crate::model::document::DocPath;
use crate::model::review::{self, Review};
use crate::model::subscription::{self, Subscription};
use crate::service::booking_service::{hydrate_bookings, BookingFilter, BookingRow};
use crate::service::{ServiceContext, ServiceError, ServiceResult};
use crate::store::{DocumentStore, Query};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerRow {
    #[serde(flatten)]
    pub customer: Customer,
    pub label: String,
    pub booking_count: usize,
    pub active_plan: Option<String>,
}

impl Searchable for CustomerRow {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.customer.path.id(), self.label.as_str()];
        fields.extend(self.customer.email.as_deref());
        fields.extend(self.customer.phone_number.as_deref());
        fields.extend(self.customer.city.as_deref());
        fields
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerDetail {
    pub customer: Customer,
    pub label: String,
    pub bookings: Vec<BookingRow>,
    pub subscriptions: Vec<Subscription>,
    pub reviews: Vec<Review>,
    pub total_spent: f64,
}

pub struct CustomerService<'s, S: ?Sized> {
    ctx: ServiceContext<'s, S>,
}

impl<'s, S> CustomerService<'s, S>
where
    S: DocumentStore + ?Sized,
{
    pub fn new(ctx: ServiceContext<'s, S>) -> Self {
        Self { ctx }
    }

    /// Customers, newest first; customers without `created_time` go last.
    pub fn list(
        &self,
        search: &SearchTerm,
        page: PageRequest,
        now: DateTime<Utc>,
    ) -> ServiceResult<Page<CustomerRow>> {
        let mut customers = self
            .ctx
            .load_all(customer::COLLECTION, Customer::from_document)?;
        customers.sort_by(|left, right| {
            right
                .created_time
                .cmp(&left.created_time)
                .then_with(|| left.path.cmp(&right.path))
        });

        let bookings = self
            .ctx
            .load_all(booking::COLLECTION, Booking::from_document)?;
        let mut booking_counts: HashMap<&DocPath, usize> = HashMap::new();
        for booking in &bookings {
            if let Some(customer) = &booking.customer {
                *booking_counts.entry(customer).or_insert(0) += 1;
            }
        }

        let subscriptions = self
            .ctx
            .load_all(subscription::COLLECTION, Subscription::from_document)?;
        let mut active_plans: HashMap<&DocPath, &Subscription> = HashMap::new();
        for sub in subscriptions.iter().filter(|sub| sub.is_active_at(now)) {
            if let Some(customer) = &sub.customer {
                let newer = active_plans
                    .get(customer)
                    .map_or(true, |current| sub.start_date > current.start_date);
                if newer {
                    active_plans.insert(customer, sub);
                }
            }
        }

        let rows = customers
            .into_iter()
            .map(|customer| {
                let label = customer
                    .display_label()
                    .unwrap_or_else(|| self.ctx.unknown_label().to_string());
                CustomerRow {
                    booking_count: booking_counts.get(&customer.path).copied().unwrap_or(0),
                    active_plan: active_plans
                        .get(&customer.path)
                        .and_then(|sub| sub.plan_name.clone()),
                    label,
                    customer,
                }
            })
            .collect::<Vec<_>>();

        Ok(paginate(apply_search(rows, search), page))
    }

    pub fn detail(&self, path: &DocPath) -> ServiceResult<CustomerDetail> {
        let doc = self
            .ctx
            .store()
            .get(path)?
            .ok_or_else(|| ServiceError::NotFound(path.clone()))?;
        let customer = Customer::from_document(&doc)?;

        let mut bookings = self.ctx.load(
            &BookingFilter::for_customer(path.clone()).query().without_order(),
            Booking::from_document,
        )?;
        bookings.sort_by(|left, right| match (left.booking_date, right.booking_date) {
            (Some(a), Some(b)) => b.cmp(&a).then_with(|| left.path.cmp(&right.path)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => left.path.cmp(&right.path),
        });
        let bookings = hydrate_bookings(&self.ctx, bookings);
        let total_spent = bookings
            .iter()
            .filter(|row| row.booking.is_completed())
            .map(|row| row.booking.amount())
            .sum();

        let subscriptions = self.ctx.load(
            &Query::collection(subscription::COLLECTION).where_ref("customer_id", path),
            Subscription::from_document,
        )?;
        let reviews = self.ctx.load(
            &Query::collection(review::COLLECTION).where_ref("customer_id", path),
            Review::from_document,
        )?;

        Ok(CustomerDetail {
            label: customer
                .display_label()
                .unwrap_or_else(|| self.ctx.unknown_label().to_string()),
            customer,
            bookings,
            subscriptions,
            reviews,
            total_spent,
        })
    }
}
