//! Persisted ledger store.
//!
//! Wraps a [`Dataset`] with a blob store and a clock. Every mutation runs
//! validate → mutate → persist against a working copy and only replaces the
//! live dataset once the blob write succeeded, so a rejected or failed
//! operation never leaves partial state behind.

use chrono::{DateTime, Utc};

use pharmstock_core::{Clock, DomainError, DomainResult, ItemId, SystemClock};
use pharmstock_inventory::export::{catalog_csv, ledger_csv};
use pharmstock_inventory::{
    decode_snapshot, encode_snapshot, encode_snapshot_pretty, Dataset, ImportMode, ImportSummary,
    Item, NewItem, StockMovement, Transaction,
};

use crate::blob_store::BlobStore;
use crate::error::{PersistenceError, StoreError};

/// Default page size for [`LedgerStore::recent_transactions`].
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

#[derive(Debug)]
pub struct LedgerStore<B, C = SystemClock> {
    blobs: B,
    key: String,
    clock: C,
    dataset: Dataset,
}

impl<B, C> LedgerStore<B, C>
where
    B: BlobStore,
    C: Clock,
{
    /// Load the dataset stored under `key`.
    ///
    /// Missing data yields an empty dataset without writing anything. Data
    /// from an older schema, or whose cached stock disagrees with its ledger,
    /// is reconciled and written back. A blob that cannot be decoded is left
    /// in place and reported as a format error.
    pub fn open(blobs: B, key: impl Into<String>, clock: C) -> Result<Self, StoreError> {
        let key = key.into();
        let Some(blob) = blobs.load(&key)? else {
            tracing::info!(key = %key, "no stored inventory; starting empty");
            return Ok(Self {
                blobs,
                key,
                clock,
                dataset: Dataset::new(),
            });
        };

        let dataset = decode_snapshot(&blob, clock.now())?;
        let mut store = Self {
            blobs,
            key,
            clock,
            dataset,
        };

        if store.dataset.needs_migration() || !store.dataset.audit_stock().is_empty() {
            let from_version = store.dataset.version().to_string();
            let corrected = store.dataset.migrate();
            store.persist(&store.dataset)?;
            tracing::info!(
                key = %store.key,
                from_version = %from_version,
                to_version = store.dataset.version(),
                corrected,
                "stored inventory migrated"
            );
        }

        tracing::info!(
            key = %store.key,
            items = store.dataset.catalog().len(),
            transactions = store.dataset.transactions().len(),
            "inventory loaded"
        );
        Ok(store)
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    // ---- reads ----------------------------------------------------------

    pub fn items(&self, include_inactive: bool) -> Vec<&Item> {
        self.dataset.items(include_inactive)
    }

    pub fn item(&self, item_id: &ItemId) -> Option<&Item> {
        self.dataset.item(item_id)
    }

    pub fn transactions(&self) -> &[Transaction] {
        self.dataset.transactions()
    }

    pub fn search_items(&self, query: &str) -> Vec<&Item> {
        self.dataset.search_items(query)
    }

    /// Newest first.
    pub fn recent_transactions(&self, limit: usize) -> Vec<&Transaction> {
        self.dataset.recent_transactions(limit)
    }

    pub fn most_recent_inbound_price(&self, item_id: &ItemId) -> Option<f64> {
        self.dataset.most_recent_inbound_price(item_id)
    }

    // ---- mutations ------------------------------------------------------

    pub fn add_item(&mut self, new_item: NewItem) -> Result<Item, StoreError> {
        let item = self.commit(|dataset, now| dataset.add_item(new_item, now))?;
        tracing::info!(item_id = %item.id(), name = item.name(), "item added");
        Ok(item)
    }

    pub fn set_item_active(&mut self, item_id: &ItemId, active: bool) -> Result<Item, StoreError> {
        let item = self.commit(|dataset, now| dataset.set_item_active(item_id, active, now))?;
        tracing::info!(item_id = %item.id(), active, "item status changed");
        Ok(item)
    }

    /// Soft delete: the item disappears from active views, its history stays.
    pub fn delete_item(&mut self, item_id: &ItemId) -> Result<Item, StoreError> {
        self.set_item_active(item_id, false)
    }

    pub fn restore_item(&mut self, item_id: &ItemId) -> Result<Item, StoreError> {
        self.set_item_active(item_id, true)
    }

    pub fn record_transaction(&mut self, movement: StockMovement) -> Result<Transaction, StoreError> {
        let result = self.commit(|dataset, now| dataset.record_transaction(movement, now));
        match &result {
            Ok(txn) => tracing::info!(
                txn_id = %txn.id(),
                item_id = %txn.item_id(),
                direction = %txn.direction(),
                quantity = txn.quantity(),
                price = txn.price(),
                "transaction recorded"
            ),
            Err(StoreError::Domain(DomainError::InsufficientStock {
                item_id,
                available,
                requested,
            })) => tracing::warn!(
                item_id = %item_id,
                available,
                requested,
                "outbound rejected: insufficient stock"
            ),
            Err(_) => {}
        }
        result
    }

    /// Rebuild every cached stock level from the ledger and persist if
    /// anything changed. Returns the number of corrected items.
    pub fn reconcile_stock(&mut self) -> Result<usize, StoreError> {
        let mut next = self.dataset.clone();
        let corrected = next.reconcile_stock();
        if corrected > 0 {
            self.persist(&next)?;
            self.dataset = next;
        }
        Ok(corrected)
    }

    /// Apply a snapshot blob as a whole: either every item and transaction
    /// lands and is persisted, or nothing changes.
    pub fn import_snapshot(
        &mut self,
        blob: &str,
        mode: ImportMode,
    ) -> Result<ImportSummary, StoreError> {
        let summary = self.commit(|dataset, now| {
            let incoming = decode_snapshot(blob, now)?;
            Ok(dataset.apply_import(incoming, mode))
        })?;
        tracing::info!(
            ?mode,
            items_added = summary.items_added,
            items_skipped = summary.items_skipped,
            transactions_added = summary.transactions_added,
            transactions_skipped = summary.transactions_skipped,
            stock_corrections = summary.stock_corrections,
            "import applied"
        );
        Ok(summary)
    }

    /// Replace the active dataset with the blob stored under another key,
    /// e.g. one found by [`scan_blobs`](crate::scan_blobs).
    pub fn restore_from_key(&mut self, source_key: &str) -> Result<ImportSummary, StoreError> {
        let blob = self
            .blobs
            .load(source_key)?
            .ok_or_else(|| DomainError::not_found(format!("no stored blob under key {source_key:?}")))?;
        tracing::info!(source_key, target_key = %self.key, "restoring inventory from backup key");
        self.import_snapshot(&blob, ImportMode::Replace)
    }

    // ---- exports --------------------------------------------------------

    /// Indented JSON of the full dataset, inactive items included.
    pub fn export_snapshot(&self) -> Result<String, StoreError> {
        encode_snapshot_pretty(&self.dataset)
            .map_err(|e| StoreError::Persistence(PersistenceError::from(e)))
    }

    pub fn export_catalog_csv(&self) -> Result<String, StoreError> {
        Ok(catalog_csv(&self.dataset)?)
    }

    pub fn export_ledger_csv(&self) -> Result<String, StoreError> {
        Ok(ledger_csv(&self.dataset)?)
    }

    // ---- internals ------------------------------------------------------

    fn commit<T>(
        &mut self,
        apply: impl FnOnce(&mut Dataset, DateTime<Utc>) -> DomainResult<T>,
    ) -> Result<T, StoreError> {
        let now = self.clock.now();
        let mut next = self.dataset.clone();
        let out = apply(&mut next, now)?;
        self.persist(&next)?;
        self.dataset = next;
        Ok(out)
    }

    fn persist(&self, dataset: &Dataset) -> Result<(), PersistenceError> {
        let blob = encode_snapshot(dataset)?;
        self.blobs.save(&self.key, &blob)?;
        tracing::debug!(key = %self.key, bytes = blob.len(), "inventory persisted");
        Ok(())
    }
}
