use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use pharmstock_inventory::{Direction, Transaction};

use crate::aggregator::Aggregator;
use crate::range::DateRange;

/// Stock at or below this level counts as low in the headline statistics.
pub const LOW_STOCK_THRESHOLD: i64 = 10;

/// Inbound/outbound quantity sums over some window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct FlowTotals {
    pub inbound: i64,
    pub outbound: i64,
}

impl FlowTotals {
    pub(crate) fn add(&mut self, txn: &Transaction) {
        match txn.direction() {
            Direction::Inbound => self.inbound = self.inbound.saturating_add(txn.quantity()),
            Direction::Outbound => self.outbound = self.outbound.saturating_add(txn.quantity()),
        }
    }

    pub fn net(&self) -> i64 {
        self.inbound.saturating_sub(self.outbound)
    }
}

/// Headline figures over active items.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub total_items: usize,
    pub total_stock: i64,
    pub total_value: f64,
    pub low_stock_count: usize,
    /// Movements since the first day of the current month.
    pub month_to_date: FlowTotals,
    /// Movements inside the requested range, when one was given.
    pub range_totals: Option<FlowTotals>,
}

impl Aggregator<'_> {
    pub fn statistics(&self, range: Option<&DateRange>) -> Statistics {
        let mut total_items = 0;
        let mut total_stock: i64 = 0;
        let mut total_value = 0.0;
        let mut low_stock_count = 0;

        for item in self.dataset.active_items() {
            total_items += 1;
            total_stock = total_stock.saturating_add(item.current_stock());
            total_value += self.item_value(item);
            if item.current_stock() <= LOW_STOCK_THRESHOLD {
                low_stock_count += 1;
            }
        }

        let month_start = NaiveDate::from_ymd_opt(self.today.year(), self.today.month(), 1)
            .unwrap_or(self.today);
        let mut month_to_date = FlowTotals::default();
        let mut range_totals = range.map(|_| FlowTotals::default());

        for txn in self.dataset.transactions() {
            let day = txn.timestamp().date_naive();
            if day >= month_start {
                month_to_date.add(txn);
            }
            if let (Some(range), Some(totals)) = (range, range_totals.as_mut()) {
                if range.contains(txn.timestamp()) {
                    totals.add(txn);
                }
            }
        }

        Statistics {
            total_items,
            total_stock,
            total_value,
            low_stock_count,
            month_to_date,
            range_totals,
        }
    }
}
