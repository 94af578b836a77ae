use std::collections::HashMap;

use chrono::NaiveDate;

use pharmstock_core::{Clock, ItemId};
use pharmstock_inventory::{Dataset, Item};

/// Read-only view over a dataset pinned to a calendar date.
///
/// The latest inbound price per item is folded once up front so valuation
/// over the catalog is a single ledger pass rather than one per item.
#[derive(Debug, Clone)]
pub struct Aggregator<'a> {
    pub(crate) dataset: &'a Dataset,
    pub(crate) today: NaiveDate,
    latest_prices: HashMap<&'a ItemId, f64>,
}

impl<'a> Aggregator<'a> {
    pub fn new(dataset: &'a Dataset, today: NaiveDate) -> Self {
        let mut latest: HashMap<&'a ItemId, (chrono::DateTime<chrono::Utc>, f64)> = HashMap::new();
        for txn in dataset.transactions() {
            if !txn.is_inbound() || txn.price() <= 0.0 {
                continue;
            }
            match latest.get(txn.item_id()) {
                Some((ts, _)) if txn.timestamp() < *ts => {}
                _ => {
                    latest.insert(txn.item_id(), (txn.timestamp(), txn.price()));
                }
            }
        }

        Self {
            dataset,
            today,
            latest_prices: latest.into_iter().map(|(id, (_, price))| (id, price)).collect(),
        }
    }

    pub fn with_clock(dataset: &'a Dataset, clock: &impl Clock) -> Self {
        Self::new(dataset, clock.today())
    }

    pub fn dataset(&self) -> &'a Dataset {
        self.dataset
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Latest inbound price, else the item's default price.
    pub fn valuation_price(&self, item: &Item) -> f64 {
        self.latest_prices
            .get(item.id())
            .copied()
            .unwrap_or(item.default_price())
    }

    pub(crate) fn item_value(&self, item: &Item) -> f64 {
        item.current_stock() as f64 * self.valuation_price(item)
    }
}
