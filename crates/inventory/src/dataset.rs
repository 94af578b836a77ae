//! The catalog + ledger pair and the rules that keep them consistent.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;

use pharmstock_core::{DomainError, DomainResult, Entity, ItemId, TransactionId};

use crate::item::{is_valid_price, Item, NewItem};
use crate::transaction::{Direction, StockMovement, Transaction};

/// Schema version written by this crate. Blobs tagged older (or untagged)
/// are reconciled on load.
pub const SCHEMA_VERSION: &str = "3.0.0";

/// How an imported dataset is combined with the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImportMode {
    /// Discard current data in favour of the imported data.
    Replace,
    /// Append only records whose ids are not present yet.
    Merge,
}

/// Outcome of an import, for reporting back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub items_added: usize,
    pub items_skipped: usize,
    pub transactions_added: usize,
    pub transactions_skipped: usize,
    /// Items whose cached stock disagreed with the ledger after the import.
    pub stock_corrections: usize,
}

/// Catalog + ledger + schema version.
///
/// Invariant: for every item, `current_stock` equals the signed sum of the
/// quantities of its ledger entries. Every mutating method either upholds it
/// or fails without touching `self`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset {
    pub(crate) catalog: Vec<Item>,
    pub(crate) ledger: Vec<Transaction>,
    pub(crate) version: String,
}

impl Default for Dataset {
    fn default() -> Self {
        Self::new()
    }
}

impl Dataset {
    /// Empty dataset at the current schema version.
    pub fn new() -> Self {
        Self {
            catalog: Vec::new(),
            ledger: Vec::new(),
            version: SCHEMA_VERSION.to_string(),
        }
    }

    pub(crate) fn from_parts(catalog: Vec<Item>, ledger: Vec<Transaction>, version: String) -> Self {
        Self {
            catalog,
            ledger,
            version,
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// True when the version tag is missing or older than [`SCHEMA_VERSION`].
    pub fn needs_migration(&self) -> bool {
        compare_versions(&self.version, SCHEMA_VERSION).is_lt()
    }

    pub fn is_empty(&self) -> bool {
        self.catalog.is_empty() && self.ledger.is_empty()
    }

    // ---- read accessors -------------------------------------------------

    /// Catalog in insertion order, inactive items included.
    pub fn catalog(&self) -> &[Item] {
        &self.catalog
    }

    /// Ledger in insertion (chronological) order.
    pub fn transactions(&self) -> &[Transaction] {
        &self.ledger
    }

    /// Active items only, unless `include_inactive` is set.
    pub fn items(&self, include_inactive: bool) -> Vec<&Item> {
        self.catalog
            .iter()
            .filter(|item| include_inactive || item.is_active)
            .collect()
    }

    pub fn active_items(&self) -> impl Iterator<Item = &Item> {
        self.catalog.iter().filter(|item| item.is_active)
    }

    pub fn item(&self, id: &ItemId) -> Option<&Item> {
        self.catalog.iter().find(|item| &item.id == id)
    }

    /// Active items whose name or manufacturer contains `query`
    /// (case-insensitive). A blank query matches every active item.
    pub fn search_items(&self, query: &str) -> Vec<&Item> {
        let needle = query.trim().to_lowercase();
        self.active_items()
            .filter(|item| needle.is_empty() || item.matches(&needle))
            .collect()
    }

    /// Newest `limit` ledger entries, newest first.
    pub fn recent_transactions(&self, limit: usize) -> Vec<&Transaction> {
        self.ledger.iter().rev().take(limit).collect()
    }

    /// Unit price of the latest inbound entry with a positive price.
    ///
    /// On equal timestamps the entry that appears later in the ledger wins.
    pub fn most_recent_inbound_price(&self, item_id: &ItemId) -> Option<f64> {
        let mut latest: Option<&Transaction> = None;
        for txn in &self.ledger {
            if &txn.item_id != item_id || !txn.is_inbound() || txn.price <= 0.0 {
                continue;
            }
            match latest {
                Some(best) if txn.timestamp < best.timestamp => {}
                _ => latest = Some(txn),
            }
        }
        latest.map(|txn| txn.price)
    }

    /// Signed ledger sum for one item (0 if it has no entries).
    pub fn ledger_stock(&self, item_id: &ItemId) -> i64 {
        self.ledger
            .iter()
            .filter(|txn| &txn.item_id == item_id)
            .fold(0i64, |total, txn| total.saturating_add(txn.signed_quantity()))
    }

    /// Items whose cached stock disagrees with the ledger, with the ledger value.
    pub fn audit_stock(&self) -> Vec<(&ItemId, i64, i64)> {
        let totals = ledger_totals(&self.ledger);
        self.catalog
            .iter()
            .filter_map(|item| {
                let expected = totals.get(&item.id).copied().unwrap_or(0);
                (expected != item.current_stock).then_some((&item.id, item.current_stock, expected))
            })
            .collect()
    }

    // ---- mutations ------------------------------------------------------

    /// Append a new active item with zero stock.
    pub fn add_item(&mut self, new_item: NewItem, now: DateTime<Utc>) -> DomainResult<Item> {
        let item = new_item.into_item(now)?;
        self.catalog.push(item.clone());
        Ok(item)
    }

    /// Soft-delete (`false`) or restore (`true`) an item. Ledger history is
    /// neither replayed nor validated.
    pub fn set_item_active(
        &mut self,
        item_id: &ItemId,
        active: bool,
        now: DateTime<Utc>,
    ) -> DomainResult<Item> {
        let item = self
            .catalog
            .iter_mut()
            .find(|item| &item.id == item_id)
            .ok_or_else(|| DomainError::not_found(format!("item {item_id}")))?;
        item.is_active = active;
        item.touch(now);
        Ok(item.clone())
    }

    /// Validate and append a stock movement, updating the cached stock.
    ///
    /// The outbound sufficiency check reads the cached stock, not the ledger.
    pub fn record_transaction(
        &mut self,
        movement: StockMovement,
        now: DateTime<Utc>,
    ) -> DomainResult<Transaction> {
        let StockMovement {
            item_id,
            direction,
            quantity,
            unit_price,
        } = movement;

        if item_id.is_empty() {
            return Err(DomainError::validation("item id is required"));
        }
        if quantity <= 0 {
            return Err(DomainError::validation("quantity must be a positive integer"));
        }

        let item = self
            .catalog
            .iter_mut()
            .find(|item| item.id == item_id)
            .ok_or_else(|| DomainError::not_found(format!("item {item_id}")))?;

        let price = match direction {
            Direction::Inbound => match unit_price {
                Some(p) if is_valid_price(p) => p,
                _ => {
                    return Err(DomainError::validation(
                        "inbound movements require a non-negative unit price",
                    ));
                }
            },
            Direction::Outbound => {
                if item.current_stock < quantity {
                    return Err(DomainError::insufficient_stock(
                        item_id,
                        item.current_stock,
                        quantity,
                    ));
                }
                unit_price.filter(|p| is_valid_price(*p)).unwrap_or(0.0)
            }
        };

        let stock = item
            .current_stock
            .checked_add(direction.signed(quantity))
            .ok_or_else(|| DomainError::validation("quantity would overflow stock"))?;

        let txn = Transaction {
            id: TransactionId::generate(),
            item_id,
            direction,
            quantity,
            price,
            timestamp: now,
        };

        item.current_stock = stock;
        item.touch(now);
        self.ledger.push(txn.clone());
        Ok(txn)
    }

    /// Recompute every item's cached stock from the full ledger.
    ///
    /// Returns how many items were corrected.
    pub fn reconcile_stock(&mut self) -> usize {
        let totals = ledger_totals(&self.ledger);
        let mut corrected = 0;
        for item in &mut self.catalog {
            let expected = totals.get(&item.id).copied().unwrap_or(0);
            if item.current_stock != expected {
                tracing::warn!(
                    item_id = %item.id,
                    cached = item.current_stock,
                    ledger = expected,
                    "stock cache drifted from ledger; reconciled"
                );
                item.current_stock = expected;
                corrected += 1;
            }
        }
        corrected
    }

    /// Combine `incoming` into `self` per `mode`, then reconcile and tag the
    /// result with [`SCHEMA_VERSION`].
    pub fn apply_import(&mut self, incoming: Dataset, mode: ImportMode) -> ImportSummary {
        let mut summary = match mode {
            ImportMode::Replace => {
                let summary = ImportSummary {
                    items_added: incoming.catalog.len(),
                    transactions_added: incoming.ledger.len(),
                    ..ImportSummary::default()
                };
                self.catalog = incoming.catalog;
                self.ledger = incoming.ledger;
                summary
            }
            ImportMode::Merge => self.merge(incoming),
        };

        summary.stock_corrections = self.reconcile_stock();
        self.version = SCHEMA_VERSION.to_string();
        summary
    }

    /// Tag the dataset with the current schema version after a reconcile.
    pub fn migrate(&mut self) -> usize {
        let corrected = self.reconcile_stock();
        self.version = SCHEMA_VERSION.to_string();
        corrected
    }

    fn merge(&mut self, incoming: Dataset) -> ImportSummary {
        let (items_added, items_skipped) = append_unseen(&mut self.catalog, incoming.catalog);
        let (transactions_added, transactions_skipped) =
            append_unseen(&mut self.ledger, incoming.ledger);
        ImportSummary {
            items_added,
            items_skipped,
            transactions_added,
            transactions_skipped,
            stock_corrections: 0,
        }
    }

}

/// Signed stock per item, folded over the whole ledger. Sums saturate.
fn ledger_totals(ledger: &[Transaction]) -> HashMap<&ItemId, i64> {
    let mut totals: HashMap<&ItemId, i64> = HashMap::new();
    for txn in ledger {
        let total = totals.entry(&txn.item_id).or_insert(0);
        *total = total.saturating_add(txn.signed_quantity());
    }
    totals
}

/// Append the records of `incoming` whose id is not yet in `existing`;
/// colliding records are dropped. Returns `(added, skipped)`.
fn append_unseen<E: Entity>(existing: &mut Vec<E>, incoming: Vec<E>) -> (usize, usize) {
    let mut seen: HashSet<E::Id> = existing.iter().map(|e| e.id().clone()).collect();
    let (mut added, mut skipped) = (0, 0);
    for record in incoming {
        if seen.insert(record.id().clone()) {
            existing.push(record);
            added += 1;
        } else {
            skipped += 1;
        }
    }
    (added, skipped)
}

/// Compare dotted numeric versions; missing or non-numeric parts count as 0.
fn compare_versions(a: &str, b: &str) -> core::cmp::Ordering {
    let parse = |v: &str| -> Vec<u64> {
        v.trim()
            .split('.')
            .map(|part| part.trim().parse::<u64>().unwrap_or(0))
            .collect()
    };
    let (a, b) = (parse(a), parse(b));
    let len = a.len().max(b.len());
    for i in 0..len {
        let (x, y) = (a.get(i).copied().unwrap_or(0), b.get(i).copied().unwrap_or(0));
        match x.cmp(&y) {
            core::cmp::Ordering::Equal => continue,
            other => return other,
        }
    }
    core::cmp::Ordering::Equal
}
