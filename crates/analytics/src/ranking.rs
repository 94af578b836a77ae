use std::collections::HashMap;

use serde::Serialize;

use pharmstock_core::ItemId;
use pharmstock_inventory::Direction;

use crate::aggregator::Aggregator;
use crate::statistics::LOW_STOCK_THRESHOLD;

pub const DEFAULT_TOP_CONSUMED_LIMIT: usize = 10;
pub const DEFAULT_VALUATION_LIMIT: usize = 5;
pub const DEFAULT_STOCK_DISTRIBUTION_LIMIT: usize = 10;

/// Reorder suggestions never go below this many units.
const MIN_REORDER_QUANTITY: i64 = 10;
/// Suggested reorders aim to bring stock up to this level.
const REORDER_TARGET: i64 = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumptionEntry {
    pub item_id: ItemId,
    pub name: String,
    pub total_outbound: i64,
    pub outbound_count: usize,
    pub current_stock: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LowStockEntry {
    pub item_id: ItemId,
    pub name: String,
    pub spec: Option<String>,
    pub current_stock: i64,
    pub default_price: f64,
    pub suggested_reorder: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValuationEntry {
    pub item_id: ItemId,
    pub name: String,
    pub current_stock: i64,
    pub unit_price: f64,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockLevelEntry {
    pub item_id: ItemId,
    pub name: String,
    pub current_stock: i64,
}

/// `max(20 - stock, 10)`.
pub fn suggested_reorder(current_stock: i64) -> i64 {
    REORDER_TARGET
        .saturating_sub(current_stock)
        .max(MIN_REORDER_QUANTITY)
}

impl Aggregator<'_> {
    /// Active items with at least one outbound movement, ranked by total
    /// outbound quantity over the whole ledger. Ties keep catalog order.
    pub fn top_consumed(&self, limit: usize) -> Vec<ConsumptionEntry> {
        let mut usage: HashMap<&ItemId, (i64, usize)> = HashMap::new();
        for txn in self.dataset.transactions() {
            if txn.direction() == Direction::Outbound {
                let entry = usage.entry(txn.item_id()).or_insert((0, 0));
                entry.0 = entry.0.saturating_add(txn.quantity());
                entry.1 += 1;
            }
        }

        let mut ranked: Vec<ConsumptionEntry> = self
            .dataset
            .active_items()
            .filter_map(|item| {
                usage.get(item.id()).map(|&(quantity, count)| ConsumptionEntry {
                    item_id: item.id().clone(),
                    name: item.name().to_string(),
                    total_outbound: quantity,
                    outbound_count: count,
                    current_stock: item.current_stock(),
                })
            })
            .collect();

        // sort_by is stable, so equal totals stay in catalog order.
        ranked.sort_by(|a, b| b.total_outbound.cmp(&a.total_outbound));
        ranked.truncate(limit);
        ranked
    }

    /// Active items at or below `threshold`, lowest stock first.
    pub fn low_stock(&self, threshold: i64) -> Vec<LowStockEntry> {
        let mut low: Vec<LowStockEntry> = self
            .dataset
            .active_items()
            .filter(|item| item.current_stock() <= threshold)
            .map(|item| LowStockEntry {
                item_id: item.id().clone(),
                name: item.name().to_string(),
                spec: item.spec().map(str::to_string),
                current_stock: item.current_stock(),
                default_price: item.default_price(),
                suggested_reorder: suggested_reorder(item.current_stock()),
            })
            .collect();
        low.sort_by_key(|entry| entry.current_stock);
        low
    }

    /// [`Aggregator::low_stock`] at the standard threshold.
    pub fn low_stock_default(&self) -> Vec<LowStockEntry> {
        self.low_stock(LOW_STOCK_THRESHOLD)
    }

    /// Active items ranked by `stock × valuation price`, highest first.
    pub fn valuation_ranking(&self, limit: usize) -> Vec<ValuationEntry> {
        let mut ranked: Vec<ValuationEntry> = self
            .dataset
            .active_items()
            .map(|item| {
                let unit_price = self.valuation_price(item);
                ValuationEntry {
                    item_id: item.id().clone(),
                    name: item.name().to_string(),
                    current_stock: item.current_stock(),
                    unit_price,
                    value: self.item_value(item),
                }
            })
            .collect();

        ranked.sort_by(|a, b| b.value.total_cmp(&a.value));
        ranked.truncate(limit);
        ranked
    }

    /// Active items by current stock, highest first. Ties keep catalog order.
    pub fn stock_distribution(&self, limit: usize) -> Vec<StockLevelEntry> {
        let mut levels: Vec<StockLevelEntry> = self
            .dataset
            .active_items()
            .map(|item| StockLevelEntry {
                item_id: item.id().clone(),
                name: item.name().to_string(),
                current_stock: item.current_stock(),
            })
            .collect();
        levels.sort_by(|a, b| b.current_stock.cmp(&a.current_stock));
        levels.truncate(limit);
        levels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use pharmstock_inventory::{Dataset, NewItem, StockMovement};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap()
    }

    fn seeded() -> (Dataset, Vec<ItemId>) {
        let mut ds = Dataset::new();
        let mut ids = Vec::new();
        for (name, price, stock) in [("A", 1.0, 50), ("B", 2.0, 5), ("C", 0.5, 30), ("D", 9.0, 0)] {
            let item = ds.add_item(NewItem::new(name, price), t0()).unwrap();
            if stock > 0 {
                ds.record_transaction(StockMovement::inbound(item.id().clone(), stock, price), t0())
                    .unwrap();
            }
            ids.push(item.id().clone());
        }
        (ds, ids)
    }

    #[test]
    fn reorder_suggestion_has_a_floor() {
        assert_eq!(suggested_reorder(0), 20);
        assert_eq!(suggested_reorder(7), 13);
        assert_eq!(suggested_reorder(10), 10);
        assert_eq!(suggested_reorder(15), 10);
    }

    #[test]
    fn top_consumed_ranks_by_outbound_with_stable_ties() {
        let (mut ds, ids) = seeded();
        for (idx, qty) in [(0, 5), (2, 3), (2, 2), (1, 1)] {
            ds.record_transaction(StockMovement::outbound(ids[idx].clone(), qty), t0())
                .unwrap();
        }

        let top = Aggregator::new(&ds, t0().date_naive()).top_consumed(DEFAULT_TOP_CONSUMED_LIMIT);
        let names: Vec<&str> = top.iter().map(|e| e.name.as_str()).collect();
        // A and C tie on 5; A comes first in the catalog.
        assert_eq!(names, ["A", "C", "B"]);
        assert_eq!(top[1].outbound_count, 2);
        assert_eq!(top[1].current_stock, 25);

        let top1 = Aggregator::new(&ds, t0().date_naive()).top_consumed(1);
        assert_eq!(top1.len(), 1);
    }

    #[test]
    fn top_consumed_skips_inactive_items() {
        let (mut ds, ids) = seeded();
        ds.record_transaction(StockMovement::outbound(ids[0].clone(), 5), t0())
            .unwrap();
        ds.set_item_active(&ids[0], false, t0()).unwrap();
        assert!(Aggregator::new(&ds, t0().date_naive())
            .top_consumed(10)
            .is_empty());
    }

    #[test]
    fn low_stock_is_sorted_ascending_with_suggestions() {
        let (ds, _) = seeded();
        let low = Aggregator::new(&ds, t0().date_naive()).low_stock_default();
        let names: Vec<&str> = low.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["D", "B"]);
        assert_eq!(low[0].suggested_reorder, 20);
        assert_eq!(low[1].suggested_reorder, 15);

        let wider = Aggregator::new(&ds, t0().date_naive()).low_stock(30);
        assert_eq!(wider.len(), 3);
    }

    #[test]
    fn valuation_ranking_orders_by_value() {
        let (ds, _) = seeded();
        let ranking = Aggregator::new(&ds, t0().date_naive()).valuation_ranking(DEFAULT_VALUATION_LIMIT);
        let names: Vec<&str> = ranking.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["A", "C", "B", "D"]);
        assert_eq!(ranking[0].value, 50.0);
        assert_eq!(ranking[3].unit_price, 9.0);

        assert_eq!(
            Aggregator::new(&ds, t0().date_naive()).valuation_ranking(2).len(),
            2
        );
    }

    #[test]
    fn stock_distribution_is_descending_and_truncated() {
        let (mut ds, ids) = seeded();
        let agg = Aggregator::new(&ds, t0().date_naive());
        let levels = agg.stock_distribution(DEFAULT_STOCK_DISTRIBUTION_LIMIT);
        let names: Vec<&str> = levels.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["A", "C", "B", "D"]);
        assert_eq!(agg.stock_distribution(2).len(), 2);

        ds.set_item_active(&ids[0], false, t0()).unwrap();
        let levels = Aggregator::new(&ds, t0().date_naive()).stock_distribution(10);
        assert_eq!(levels[0].name, "C");
        assert_eq!(levels[0].current_stock, 30);
        assert_eq!(levels.len(), 3);
    }

    #[test]
    fn stock_distribution_caps_many_items() {
        let mut ds = Dataset::new();
        for i in 0..15 {
            let item = ds.add_item(NewItem::new(format!("item-{i}"), 1.0), t0()).unwrap();
            ds.record_transaction(StockMovement::inbound(item.id().clone(), i + 1, 1.0), t0())
                .unwrap();
        }
        let levels = Aggregator::new(&ds, t0().date_naive())
            .stock_distribution(DEFAULT_STOCK_DISTRIBUTION_LIMIT);
        assert_eq!(levels.len(), 10);
        assert_eq!(levels[0].current_stock, 15);
        assert_eq!(levels[9].current_stock, 6);
    }
}
