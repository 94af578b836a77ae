use chrono::{Datelike, Duration, NaiveDate};
use serde::{Serialize, Serializer};

use crate::aggregator::Aggregator;
use crate::range::DateRange;
use crate::statistics::FlowTotals;

/// Buckets shown when no range is requested.
pub const DEFAULT_TREND_DAYS: i64 = 7;
/// Upper bound on daily buckets for a requested range.
pub const MAX_TREND_DAYS: i64 = 30;
/// Months covered by the monthly trend, current month included.
pub const MONTHLY_TREND_MONTHS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DailyBucket {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub totals: FlowTotals,
}

/// Calendar month, rendered as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
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

impl core::fmt::Display for YearMonth {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthlyBucket {
    pub month: YearMonth,
    #[serde(flatten)]
    pub totals: FlowTotals,
}

impl Aggregator<'_> {
    /// Per-day inbound/outbound sums for the last N days ending today.
    ///
    /// N is 7 without a range, otherwise the range's day count capped at 30.
    /// The buckets are always anchored to today, not to the range start; a
    /// range additionally filters which movements are counted. Every bucket
    /// is present even when nothing moved that day.
    pub fn daily_trend(&self, range: Option<&DateRange>) -> Vec<DailyBucket> {
        let days = range
            .map(|r| r.days().min(MAX_TREND_DAYS))
            .unwrap_or(DEFAULT_TREND_DAYS)
            .max(1);
        let first = self.today - Duration::days(days - 1);

        let mut buckets: Vec<DailyBucket> = (0..days)
            .map(|offset| DailyBucket {
                date: first + Duration::days(offset),
                totals: FlowTotals::default(),
            })
            .collect();

        for txn in self.dataset.transactions() {
            if let Some(range) = range {
                if !range.contains(txn.timestamp()) {
                    continue;
                }
            }
            let offset = (txn.timestamp().date_naive() - first).num_days();
            if (0..days).contains(&offset) {
                buckets[offset as usize].totals.add(txn);
            }
        }

        buckets
    }

    /// Per-month inbound/outbound sums for the six months ending this month,
    /// oldest first.
    pub fn monthly_trend(&self) -> Vec<MonthlyBucket> {
        let mut months = Vec::with_capacity(MONTHLY_TREND_MONTHS);
        let mut month = YearMonth::of(self.today);
        for _ in 0..MONTHLY_TREND_MONTHS {
            months.push(month);
            month = month.previous();
        }
        months.reverse();

        let mut buckets: Vec<MonthlyBucket> = months
            .into_iter()
            .map(|month| MonthlyBucket {
                month,
                totals: FlowTotals::default(),
            })
            .collect();

        for txn in self.dataset.transactions() {
            let month = YearMonth::of(txn.timestamp().date_naive());
            if let Some(bucket) = buckets.iter_mut().find(|b| b.month == month) {
                bucket.totals.add(txn);
            }
        }

        buckets
    }
}
