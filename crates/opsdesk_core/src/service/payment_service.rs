//! Payments page, fed by the payments endpoint rather than the document store.
//!
//! # Invariants
//! - Only successful payments count toward collected and monthly revenue.
//! - Success rate is successful over all records, `0.0` when there are none.

use crate::analytics::{bucket_by_month, percentage, round2, trailing_months, MonthPoint};
use crate::listing::{
    apply_search, filter_rows, paginate, Page, PageRequest, SearchTerm, Searchable,
};
use crate::model::payment::{PaymentRecord, PaymentStatus};
use crate::payments::PaymentsSource;
use crate::service::ServiceResult;
use chrono::{DateTime, Utc};
use serde::Serialize;

impl Searchable for PaymentRecord {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.id.as_str(), self.status.as_str()];
        fields.extend(self.booking_id.as_deref());
        fields.extend(self.customer_name.as_deref());
        fields.extend(self.method.as_deref());
        fields
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentSummary {
    pub collected: f64,
    pub refunded: f64,
    pub pending: f64,
    pub failed_count: usize,
    pub success_rate: f64,
    pub monthly_revenue: Vec<MonthPoint>,
}

pub fn summarize_payments(
    records: &[PaymentRecord],
    now: DateTime<Utc>,
    months: usize,
) -> PaymentSummary {
    let sum_of = |status: PaymentStatus| {
        round2(
            records
                .iter()
                .filter(|record| record.status == status)
                .map(|record| record.amount)
                .sum(),
        )
    };

    let successful = records
        .iter()
        .filter(|record| record.is_successful())
        .cloned()
        .collect::<Vec<_>>();
    let series = bucket_by_month(&successful, |record| record.created_at, |record| record.amount);

    PaymentSummary {
        collected: sum_of(PaymentStatus::Success),
        refunded: sum_of(PaymentStatus::Refunded),
        pending: sum_of(PaymentStatus::Pending),
        failed_count: records
            .iter()
            .filter(|record| record.status == PaymentStatus::Failed)
            .count(),
        success_rate: round2(percentage(successful.len() as f64, records.len() as f64)),
        monthly_revenue: series.window(&trailing_months(now, months)),
    }
}

pub struct PaymentService<'p, P: ?Sized> {
    source: &'p P,
}

impl<'p, P> PaymentService<'p, P>
where
    P: PaymentsSource + ?Sized,
{
    pub fn new(source: &'p P) -> Self {
        Self { source }
    }

    /// Payments, newest first; records without a timestamp go last.
    pub fn list(
        &self,
        status: Option<&PaymentStatus>,
        search: &SearchTerm,
        page: PageRequest,
    ) -> ServiceResult<Page<PaymentRecord>> {
        let mut records = self.source.fetch_payments()?;
        records.sort_by(|left, right| {
            right
                .created_at
                .cmp(&left.created_at)
                .then_with(|| left.id.cmp(&right.id))
        });
        let records = filter_rows(records, |record| {
            status.map_or(true, |status| &record.status == status)
        });
        Ok(paginate(apply_search(records, search), page))
    }

    pub fn summary(&self, now: DateTime<Utc>, months: usize) -> ServiceResult<PaymentSummary> {
        let records = self.source.fetch_payments()?;
        Ok(summarize_payments(&records, now, months))
    }
}

#[cfg(test)]
mod tests {
    use super::summarize_payments;
    use crate::payments::parse_payments;
    use chrono::{TimeZone, Utc};

    #[test]
    fn summary_splits_amounts_by_status() {
        let records = parse_payments(
            r#"[
                {"id": "p1", "amount": 500, "status": "success", "createdAt": "2024-05-03T10:00:00Z"},
                {"id": "p2", "amount": 250.5, "status": "paid", "createdAt": "2024-04-20T10:00:00Z"},
                {"id": "p3", "amount": 100, "status": "refunded"},
                {"id": "p4", "amount": 80, "status": "failed"}
            ]"#,
        )
        .unwrap();
        let now = Utc.with_ymd_and_hms(2024, 5, 15, 0, 0, 0).unwrap();
        let summary = summarize_payments(&records, now, 2);

        assert_eq!(summary.collected, 750.5);
        assert_eq!(summary.refunded, 100.0);
        assert_eq!(summary.failed_count, 1);
        assert_eq!(summary.success_rate, 50.0);
        assert_eq!(summary.monthly_revenue[0].total, 250.5);
        assert_eq!(summary.monthly_revenue[1].total, 500.0);
    }
}
