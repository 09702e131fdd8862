//! Aggregations behind KPI cards and monthly charts.
//!
//! # Invariants
//! - `percentage` never divides by zero; an empty whole yields `0.0`.
//! - Month windows are contiguous, oldest first, and end at the month of
//!   `now`.

use chrono::{DateTime, Datelike, Utc};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

/// `part / whole * 100`, or `0.0` when `whole <= 0`.
pub fn percentage(part: f64, whole: f64) -> f64 {
    if whole <= 0.0 {
        return 0.0;
    }
    part / whole * 100.0
}

/// Rounds to two decimals for display.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Calendar month bucket key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    pub fn of(instant: DateTime<Utc>) -> Self {
        Self {
            year: instant.year(),
            month: instant.month(),
        }
    }

    pub fn previous(self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }
}

impl Display for MonthKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for MonthKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// The `months` months ending with the month of `now`, oldest first.
pub fn trailing_months(now: DateTime<Utc>, months: usize) -> Vec<MonthKey> {
    let mut keys = Vec::with_capacity(months);
    let mut current = MonthKey::of(now);
    for _ in 0..months {
        keys.push(current);
        current = current.previous();
    }
    keys.reverse();
    keys
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MonthBucket {
    pub count: usize,
    pub total: f64,
}

/// One chart point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MonthPoint {
    pub month: MonthKey,
    pub count: usize,
    pub total: f64,
}

/// Values grouped by calendar month.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonthSeries {
    pub buckets: BTreeMap<MonthKey, MonthBucket>,
    /// Items without a timestamp.
    pub undated: usize,
}

impl MonthSeries {
    pub fn bucket(&self, key: MonthKey) -> MonthBucket {
        self.buckets.get(&key).copied().unwrap_or_default()
    }

    /// Points for each month in `months`, zero-filled where empty.
    pub fn window(&self, months: &[MonthKey]) -> Vec<MonthPoint> {
        months
            .iter()
            .map(|month| {
                let bucket = self.bucket(*month);
                MonthPoint {
                    month: *month,
                    count: bucket.count,
                    total: round2(bucket.total),
                }
            })
            .collect()
    }
}

/// Buckets `items` by the month of `timestamp`, summing `value`.
pub fn bucket_by_month<T>(
    items: &[T],
    timestamp: impl Fn(&T) -> Option<DateTime<Utc>>,
    value: impl Fn(&T) -> f64,
) -> MonthSeries {
    let mut series = MonthSeries::default();
    for item in items {
        match timestamp(item) {
            Some(instant) => {
                let bucket = series.buckets.entry(MonthKey::of(instant)).or_default();
                bucket.count += 1;
                bucket.total += value(item);
            }
            None => series.undated += 1,
        }
    }
    series
}

/// Counts items per key.
pub fn count_by<T>(items: &[T], key: impl Fn(&T) -> String) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for item in items {
        *counts.entry(key(item)).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::{bucket_by_month, percentage, round2, trailing_months, MonthKey};
    use chrono::{TimeZone, Utc};

    #[test]
    fn percentage_handles_empty_whole() {
        assert_eq!(percentage(3.0, 0.0), 0.0);
        assert_eq!(round2(percentage(1.0, 3.0)), 33.33);
    }

    #[test]
    fn trailing_months_cross_year_boundary() {
        let now = Utc.with_ymd_and_hms(2024, 2, 10, 0, 0, 0).unwrap();
        let keys = trailing_months(now, 4)
            .into_iter()
            .map(|key| key.to_string())
            .collect::<Vec<_>>();
        assert_eq!(keys, vec!["2023-11", "2023-12", "2024-01", "2024-02"]);
    }

    #[test]
    fn buckets_count_undated_items_separately() {
        let items = vec![
            (Some(Utc.with_ymd_and_hms(2024, 1, 3, 0, 0, 0).unwrap()), 10.0),
            (Some(Utc.with_ymd_and_hms(2024, 1, 30, 0, 0, 0).unwrap()), 5.5),
            (None, 99.0),
        ];
        let series = bucket_by_month(&items, |item| item.0, |item| item.1);
        let january = series.bucket(MonthKey {
            year: 2024,
            month: 1,
        });
        assert_eq!(january.count, 2);
        assert_eq!(january.total, 15.5);
        assert_eq!(series.undated, 1);
    }
}
