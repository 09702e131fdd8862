//! Coupons page.
//!
//! # Invariants
//! - Coupon state is computed against the caller's `now`, never stored.

use crate::listing::{
    apply_search, filter_rows, paginate, Page, PageRequest, SearchTerm, Searchable,
};
use crate::model::coupon::{self, Coupon, CouponState};
use crate::service::{ServiceContext, ServiceResult};
use crate::store::DocumentStore;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CouponRow {
    #[serde(flatten)]
    pub coupon: Coupon,
    pub state: CouponState,
    pub usage_percent: Option<f64>,
    pub discount_label: String,
}

impl Searchable for CouponRow {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.coupon.code.as_str(), self.discount_label.as_str()]
    }
}

pub struct CouponService<'s, S: ?Sized> {
    ctx: ServiceContext<'s, S>,
}

impl<'s, S> CouponService<'s, S>
where
    S: DocumentStore + ?Sized,
{
    pub fn new(ctx: ServiceContext<'s, S>) -> Self {
        Self { ctx }
    }

    /// Coupons sorted by code.
    pub fn list(
        &self,
        state: Option<CouponState>,
        search: &SearchTerm,
        page: PageRequest,
        now: DateTime<Utc>,
    ) -> ServiceResult<Page<CouponRow>> {
        let mut coupons = self
            .ctx
            .load_all(coupon::COLLECTION, Coupon::from_document)?;
        coupons.sort_by(|left, right| {
            left.code
                .cmp(&right.code)
                .then_with(|| left.path.cmp(&right.path))
        });

        let rows = coupons
            .into_iter()
            .map(|coupon| CouponRow {
                state: coupon.state(now),
                usage_percent: coupon.usage_percent(),
                discount_label: coupon.discount_label(),
                coupon,
            })
            .collect::<Vec<_>>();
        let rows = filter_rows(rows, |row| state.map_or(true, |state| row.state == state));

        Ok(paginate(apply_search(rows, search), page))
    }
}
