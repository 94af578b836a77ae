//! `pharmstock-analytics`: read-only aggregations over the ledger.
//!
//! Nothing in this crate mutates a [`Dataset`](pharmstock_inventory::Dataset):
//! every projection is a fold over the catalog and ledger as they are now.
//! Results are plain serializable values handed to presentation.

pub mod aggregator;
pub mod dashboard;
pub mod range;
pub mod ranking;
pub mod statistics;
pub mod trend;

pub use aggregator::Aggregator;
pub use dashboard::Dashboard;
pub use range::DateRange;
pub use ranking::{
    ConsumptionEntry, LowStockEntry, StockLevelEntry, ValuationEntry,
    DEFAULT_STOCK_DISTRIBUTION_LIMIT, DEFAULT_TOP_CONSUMED_LIMIT, DEFAULT_VALUATION_LIMIT,
};
pub use statistics::{FlowTotals, Statistics, LOW_STOCK_THRESHOLD};
pub use trend::{DailyBucket, MonthlyBucket, YearMonth};
