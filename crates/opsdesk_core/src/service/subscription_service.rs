//! Subscriptions page.
//!
//! # Invariants
//! - A subscription is active when its status is `active` and its end date,
//!   if any, lies after `now`.
//! - Monthly revenue is bucketed by `start_date`.

use crate::analytics::{bucket_by_month, trailing_months, MonthPoint};
use crate::hydrate::DisplayInfo;
use crate::listing::{
    apply_search, filter_rows, paginate, Page, PageRequest, SearchTerm, Searchable,
};
use crate::model::subscription::{self, Subscription, SubscriptionStatus};
use crate::service::{ServiceContext, ServiceResult};
use crate::store::{Direction, DocumentStore, Query};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubscriptionRow {
    #[serde(flatten)]
    pub subscription: Subscription,
    pub customer_display: DisplayInfo,
    pub is_active: bool,
}

impl Searchable for SubscriptionRow {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![
            self.subscription.path.id(),
            self.subscription.status.as_str(),
            self.customer_display.label.as_str(),
        ];
        fields.extend(self.subscription.plan_name.as_deref());
        fields
    }
}

pub struct SubscriptionService<'s, S: ?Sized> {
    ctx: ServiceContext<'s, S>,
}

impl<'s, S> SubscriptionService<'s, S>
where
    S: DocumentStore + ?Sized,
{
    pub fn new(ctx: ServiceContext<'s, S>) -> Self {
        Self { ctx }
    }

    fn subscriptions(&self) -> ServiceResult<Vec<Subscription>> {
        self.ctx
            .load_all(subscription::COLLECTION, Subscription::from_document)
    }

    /// Subscriptions, most recently started first.
    pub fn list(
        &self,
        status: Option<&SubscriptionStatus>,
        search: &SearchTerm,
        page: PageRequest,
        now: DateTime<Utc>,
    ) -> ServiceResult<Page<SubscriptionRow>> {
        let subscriptions = self.ctx.load(
            &Query::collection(subscription::COLLECTION)
                .order_by("start_date", Direction::Descending),
            Subscription::from_document,
        )?;
        let subscriptions = filter_rows(subscriptions, |sub| {
            status.map_or(true, |status| &sub.status == status)
        });

        let labels = self
            .ctx
            .resolver()
            .resolve(subscriptions.iter().filter_map(|sub| sub.customer.as_ref()));
        let rows = subscriptions
            .into_iter()
            .map(|subscription| SubscriptionRow {
                customer_display: labels.display(subscription.customer.as_ref()),
                is_active: subscription.is_active_at(now),
                subscription,
            })
            .collect::<Vec<_>>();

        Ok(paginate(apply_search(rows, search), page))
    }

    pub fn active_count(&self, now: DateTime<Utc>) -> ServiceResult<usize> {
        Ok(self
            .subscriptions()?
            .iter()
            .filter(|sub| sub.is_active_at(now))
            .count())
    }

    /// Plan revenue for the `months` months ending at `now`, oldest first.
    pub fn revenue_by_month(
        &self,
        now: DateTime<Utc>,
        months: usize,
    ) -> ServiceResult<Vec<MonthPoint>> {
        let subscriptions = self.subscriptions()?;
        let series = bucket_by_month(&subscriptions, |sub| sub.start_date, |sub| sub.amount);
        Ok(series.window(&trailing_months(now, months)))
    }
}
