use chrono::NaiveDate;
use serde::Serialize;

use crate::aggregator::Aggregator;
use crate::range::DateRange;
use crate::ranking::{
    ConsumptionEntry, LowStockEntry, StockLevelEntry, ValuationEntry,
    DEFAULT_STOCK_DISTRIBUTION_LIMIT, DEFAULT_TOP_CONSUMED_LIMIT, DEFAULT_VALUATION_LIMIT,
};
use crate::statistics::Statistics;
use crate::trend::{DailyBucket, MonthlyBucket};

/// Every projection the analytics view refreshes, computed in one go.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub as_of: NaiveDate,
    pub range: Option<DateRange>,
    pub statistics: Statistics,
    pub daily_trend: Vec<DailyBucket>,
    pub monthly_trend: Vec<MonthlyBucket>,
    pub top_consumed: Vec<ConsumptionEntry>,
    pub low_stock: Vec<LowStockEntry>,
    pub valuation_ranking: Vec<ValuationEntry>,
    pub stock_distribution: Vec<StockLevelEntry>,
}

impl Aggregator<'_> {
    /// Recomputing is idempotent, so callers may refresh on a timer.
    pub fn dashboard(&self, range: Option<&DateRange>) -> Dashboard {
        Dashboard {
            as_of: self.today,
            range: range.copied(),
            statistics: self.statistics(range),
            daily_trend: self.daily_trend(range),
            monthly_trend: self.monthly_trend(),
            top_consumed: self.top_consumed(DEFAULT_TOP_CONSUMED_LIMIT),
            low_stock: self.low_stock_default(),
            valuation_ranking: self.valuation_ranking(DEFAULT_VALUATION_LIMIT),
            stock_distribution: self.stock_distribution(DEFAULT_STOCK_DISTRIBUTION_LIMIT),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pharmstock_inventory::{Dataset, NewItem, StockMovement};

    #[test]
    fn dashboard_is_repeatable_and_serializable() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap();
        let mut ds = Dataset::new();
        let item = ds.add_item(NewItem::new("Amoxicillin", 2.5), now).unwrap();
        ds.record_transaction(StockMovement::inbound(item.id().clone(), 100, 3.0), now)
            .unwrap();

        let agg = Aggregator::new(&ds, now.date_naive());
        let first = agg.dashboard(None);
        let second = agg.dashboard(None);
        assert_eq!(first, second);
        assert_eq!(first.daily_trend.len(), 7);
        assert_eq!(first.monthly_trend.len(), 6);
        assert_eq!(first.valuation_ranking[0].value, 300.0);
        assert_eq!(first.stock_distribution[0].current_stock, 100);

        let json = serde_json::to_value(&first).unwrap();
        assert_eq!(json["statistics"]["totalStock"], 100);
        assert_eq!(json["asOf"], "2024-06-01");
        assert_eq!(json["stockDistribution"][0]["name"], "Amoxicillin");
    }
}
