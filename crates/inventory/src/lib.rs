//! Inventory domain module (ledger-derived stock).
//!
//! This crate contains the catalog/ledger data model and its business rules,
//! implemented purely as deterministic domain logic (no IO, no storage). The
//! only source of truth for stock is the transaction ledger; each item's
//! `current_stock` is a cache that [`Dataset::reconcile_stock`] can always
//! rebuild.

pub mod dataset;
pub mod export;
pub mod item;
pub mod snapshot;
pub mod transaction;

pub use dataset::{Dataset, ImportMode, ImportSummary, SCHEMA_VERSION};
pub use export::{ExportError, DELETED_ITEM_LABEL};
pub use item::{Item, NewItem};
pub use snapshot::{decode_snapshot, encode_snapshot, encode_snapshot_pretty};
pub use transaction::{Direction, StockMovement, Transaction};
