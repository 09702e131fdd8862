//! Home page KPI cards and the bookings chart.
//!
//! # Invariants
//! - Every rate is a percentage of all bookings and is `0.0` when there are
//!   none.
//! - "This month" means the calendar month (UTC) containing `now`.

use crate::analytics::{
    bucket_by_month, percentage, round2, trailing_months, MonthKey, MonthPoint,
};
use crate::model::booking::{self, Booking};
use crate::model::customer::{self, Customer};
use crate::model::review::{self, Review};
use crate::model::subscription::{self, Subscription};
use crate::model::ticket::{self, SupportTicket};
use crate::service::review_service::summarize_ratings;
use crate::service::{ServiceContext, ServiceResult};
use crate::store::DocumentStore;
use chrono::{DateTime, Utc};
use log::info;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiSnapshot {
    pub total_customers: usize,
    pub new_customers_this_month: usize,
    pub total_bookings: usize,
    pub bookings_this_month: usize,
    pub completed_bookings: usize,
    pub completion_rate: f64,
    pub cancellation_rate: f64,
    pub completed_revenue: f64,
    pub active_subscriptions: usize,
    pub open_tickets: usize,
    /// `None` without any reviews.
    pub average_rating: Option<f64>,
}

pub struct DashboardService<'s, S: ?Sized> {
    ctx: ServiceContext<'s, S>,
}

impl<'s, S> DashboardService<'s, S>
where
    S: DocumentStore + ?Sized,
{
    pub fn new(ctx: ServiceContext<'s, S>) -> Self {
        Self { ctx }
    }

    pub fn kpis(&self, now: DateTime<Utc>) -> ServiceResult<KpiSnapshot> {
        let this_month = MonthKey::of(now);
        let in_this_month = |instant: Option<DateTime<Utc>>| {
            instant.is_some_and(|at| MonthKey::of(at) == this_month)
        };

        let customers = self
            .ctx
            .load_all(customer::COLLECTION, Customer::from_document)?;
        let bookings = self
            .ctx
            .load_all(booking::COLLECTION, Booking::from_document)?;
        let subscriptions = self
            .ctx
            .load_all(subscription::COLLECTION, Subscription::from_document)?;
        let tickets = self
            .ctx
            .load_all(ticket::COLLECTION, SupportTicket::from_document)?;
        let reviews = self
            .ctx
            .load_all(review::COLLECTION, Review::from_document)?;

        let completed = bookings.iter().filter(|b| b.is_completed()).collect::<Vec<_>>();
        let cancelled = bookings.iter().filter(|b| b.is_cancelled()).count();
        let ratings = summarize_ratings(&reviews);

        let snapshot = KpiSnapshot {
            total_customers: customers.len(),
            new_customers_this_month: customers
                .iter()
                .filter(|c| in_this_month(c.created_time))
                .count(),
            total_bookings: bookings.len(),
            bookings_this_month: bookings
                .iter()
                .filter(|b| in_this_month(b.booking_date))
                .count(),
            completed_bookings: completed.len(),
            completion_rate: round2(percentage(completed.len() as f64, bookings.len() as f64)),
            cancellation_rate: round2(percentage(cancelled as f64, bookings.len() as f64)),
            completed_revenue: round2(completed.iter().map(|b| b.amount()).sum()),
            active_subscriptions: subscriptions
                .iter()
                .filter(|s| s.is_active_at(now))
                .count(),
            open_tickets: tickets.iter().filter(|t| t.is_open()).count(),
            average_rating: (ratings.count > 0).then_some(ratings.average),
        };

        info!(
            "event=dashboard_kpis module=service status=ok customers={} bookings={}",
            snapshot.total_customers, snapshot.total_bookings
        );
        Ok(snapshot)
    }

    /// Booking counts and booked value per month, oldest first.
    pub fn monthly_bookings(
        &self,
        now: DateTime<Utc>,
        months: usize,
    ) -> ServiceResult<Vec<MonthPoint>> {
        let bookings = self
            .ctx
            .load_all(booking::COLLECTION, Booking::from_document)?;
        let series = bucket_by_month(&bookings, |b| b.booking_date, Booking::amount);
        Ok(series.window(&trailing_months(now, months)))
    }
}
