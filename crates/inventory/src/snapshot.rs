//! JSON blob codec for the whole dataset.
//!
//! Blob shape: `{ "catalog": Item[], "ledger": Transaction[], "version": "3.0.0" }`.
//! The decoder also reads the earlier `drugs` / `stockRecords` layout and
//! ignores unknown fields.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use pharmstock_core::{DomainError, DomainResult};

use crate::dataset::Dataset;
use crate::item::{is_valid_price, ItemRecord};
use crate::transaction::Transaction;

#[derive(Debug, Deserialize)]
struct SnapshotRecord {
    #[serde(default, alias = "drugs")]
    catalog: Option<Vec<ItemRecord>>,
    #[serde(default, alias = "stockRecords")]
    ledger: Option<Vec<Transaction>>,
    #[serde(default)]
    version: Option<String>,
}

/// Decode a blob into a dataset, defaulting missing optional item fields
/// (timestamps default to `now`).
///
/// Ledger entries with a non-positive quantity or a negative price, and
/// timestamps in no known format, reject the whole blob.
///
/// The returned dataset is *not* reconciled; callers decide when to fold the
/// ledger (import always does, plain loads only on version mismatch).
pub fn decode_snapshot(blob: &str, now: DateTime<Utc>) -> DomainResult<Dataset> {
    let record: SnapshotRecord = serde_json::from_str(blob)
        .map_err(|e| DomainError::format(format!("blob is not a valid inventory snapshot: {e}")))?;

    let (Some(catalog), Some(ledger)) = (record.catalog, record.ledger) else {
        return Err(DomainError::format(
            "blob must contain both a catalog and a ledger",
        ));
    };

    if let Some(txn) = ledger
        .iter()
        .find(|txn| txn.quantity <= 0 || !is_valid_price(txn.price))
    {
        return Err(DomainError::format(format!(
            "ledger entry {} needs a positive quantity and a non-negative price (got {} at {})",
            txn.id, txn.quantity, txn.price
        )));
    }

    let catalog = catalog.into_iter().map(|r| r.into_item(now)).collect();
    Ok(Dataset::from_parts(
        catalog,
        ledger,
        record.version.unwrap_or_default(),
    ))
}

/// Compact encoding used for persistence.
pub fn encode_snapshot(dataset: &Dataset) -> Result<String, serde_json::Error> {
    serde_json::to_string(dataset)
}

/// Indented encoding used for user-facing exports.
pub fn encode_snapshot_pretty(dataset: &Dataset) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{ImportMode, SCHEMA_VERSION};
    use crate::item::NewItem;
    use crate::transaction::StockMovement;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn missing_ledger_is_a_format_error() {
        let err = decode_snapshot(r#"{"catalog": []}"#, now()).unwrap_err();
        assert!(matches!(err, DomainError::Format(_)));
        let err = decode_snapshot(r#"{"ledger": []}"#, now()).unwrap_err();
        assert!(matches!(err, DomainError::Format(_)));
        let err = decode_snapshot("not json", now()).unwrap_err();
        assert!(matches!(err, DomainError::Format(_)));
    }

    #[test]
    fn legacy_layout_is_accepted() {
        let blob = r#"{
            "drugs": [
                {"id": "drug_1", "name": "Aspirin", "spec": "100mg", "defaultPrice": 1.5, "currentStock": 3}
            ],
            "stockRecords": [
                {"recordId": "rec_1", "drugId": "drug_1", "type": "IN", "quantity": 10, "price": 1.4,
                 "timestamp": "2024/5/30 10:00:00"},
                {"recordId": "rec_2", "drugId": "drug_1", "type": "OUT", "quantity": 4, "price": 0,
                 "timestamp": "2024/5/31 10:00:00"}
            ]
        }"#;
        let ds = decode_snapshot(blob, now()).unwrap();
        assert_eq!(ds.version(), "");
        assert!(ds.needs_migration());
        assert_eq!(ds.catalog().len(), 1);
        assert_eq!(ds.transactions().len(), 2);
        // Decoding alone does not reconcile.
        assert_eq!(ds.catalog()[0].current_stock(), 3);
        assert_eq!(ds.catalog()[0].created_at(), now());
    }

    #[test]
    fn replace_import_of_export_is_idempotent() {
        let mut ds = Dataset::new();
        let item = ds.add_item(NewItem::new("Aspirin", 1.0), now()).unwrap();
        ds.record_transaction(StockMovement::inbound(item.id().clone(), 10, 1.2), now())
            .unwrap();
        ds.set_item_active(item.id(), false, now()).unwrap();

        let blob = encode_snapshot_pretty(&ds).unwrap();
        let mut copy = ds.clone();
        let incoming = decode_snapshot(&blob, now()).unwrap();
        copy.apply_import(incoming, ImportMode::Replace);

        assert_eq!(copy.catalog(), ds.catalog());
        assert_eq!(copy.transactions(), ds.transactions());
        assert_eq!(copy.version(), SCHEMA_VERSION);
    }

    #[test]
    fn encoded_blob_uses_documented_field_names() {
        let mut ds = Dataset::new();
        let item = ds.add_item(NewItem::new("Aspirin", 1.0), now()).unwrap();
        ds.record_transaction(StockMovement::inbound(item.id().clone(), 1, 1.0), now())
            .unwrap();

        let value: serde_json::Value = serde_json::from_str(&encode_snapshot(&ds).unwrap()).unwrap();
        let item = &value["catalog"][0];
        for field in [
            "id", "name", "spec", "manufacturer", "defaultPrice", "currentStock", "isActive",
            "createdAt", "updatedAt",
        ] {
            assert!(item.get(field).is_some(), "missing item field {field}");
        }
        let txn = &value["ledger"][0];
        for field in ["id", "itemId", "direction", "quantity", "price", "timestamp"] {
            assert!(txn.get(field).is_some(), "missing transaction field {field}");
        }
        assert_eq!(value["version"], SCHEMA_VERSION);
    }

    #[test]
    fn invalid_ledger_entries_reject_the_blob() {
        let entry = |quantity: i64, price: f64| {
            format!(
                r#"{{"catalog": [{{"id": "drug_1", "name": "Aspirin"}}],
                    "ledger": [{{"id": "rec_1", "itemId": "drug_1", "direction": "outbound",
                                 "quantity": {quantity}, "price": {price},
                                 "timestamp": "2024-05-30T10:00:00Z"}}]}}"#
            )
        };
        for (quantity, price) in [(-50, 0.0), (0, 1.0), (5, -3.0)] {
            let err = decode_snapshot(&entry(quantity, price), now()).unwrap_err();
            assert!(matches!(err, DomainError::Format(_)), "{quantity} @ {price}");
        }
        assert!(decode_snapshot(&entry(5, 0.0), now()).is_ok());
    }

    #[test]
    fn unreadable_timestamp_rejects_the_blob() {
        let blob = r#"{"catalog": [], "ledger": [
            {"id": "rec_1", "itemId": "drug_1", "direction": "inbound", "quantity": 1, "price": 1,
             "timestamp": "Invalid Date"}
        ]}"#;
        let err = decode_snapshot(blob, now()).unwrap_err();
        assert!(matches!(err, DomainError::Format(_)));
    }
}
