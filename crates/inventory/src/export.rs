//! Spreadsheet-friendly CSV exports of the catalog and the ledger.
//!
//! Both exports are UTF-8 prefixed with a byte-order mark so spreadsheet
//! applications pick the right encoding.

use serde::Serialize;
use thiserror::Error;

use crate::dataset::Dataset;

/// Name shown for ledger entries whose item no longer exists in the catalog.
pub const DELETED_ITEM_LABEL: &str = "(deleted)";

const BOM: &str = "\u{feff}";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to flush csv buffer: {0}")]
    Flush(String),

    #[error("csv output was not valid utf-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

#[derive(Serialize)]
struct CatalogRow<'a> {
    id: &'a str,
    name: &'a str,
    spec: &'a str,
    manufacturer: &'a str,
    #[serde(rename = "defaultPrice")]
    default_price: f64,
    #[serde(rename = "currentStock")]
    current_stock: i64,
    status: &'static str,
}

#[derive(Serialize)]
struct LedgerRow<'a> {
    id: &'a str,
    #[serde(rename = "itemId")]
    item_id: &'a str,
    #[serde(rename = "itemName")]
    item_name: &'a str,
    direction: &'static str,
    quantity: i64,
    price: f64,
    timestamp: String,
}

/// Every catalog item, inactive ones included.
pub fn catalog_csv(dataset: &Dataset) -> Result<String, ExportError> {
    write_rows(dataset.catalog().iter().map(|item| CatalogRow {
        id: item.id().as_str(),
        name: item.name(),
        spec: item.spec().unwrap_or_default(),
        manufacturer: item.manufacturer().unwrap_or_default(),
        default_price: item.default_price(),
        current_stock: item.current_stock(),
        status: if item.is_active() { "active" } else { "inactive" },
    }))
}

/// The full ledger with each entry's item name resolved.
pub fn ledger_csv(dataset: &Dataset) -> Result<String, ExportError> {
    write_rows(dataset.transactions().iter().map(|txn| LedgerRow {
        id: txn.id().as_str(),
        item_id: txn.item_id().as_str(),
        item_name: dataset
            .item(txn.item_id())
            .map(|item| item.name())
            .unwrap_or(DELETED_ITEM_LABEL),
        direction: txn.direction().as_str(),
        quantity: txn.quantity(),
        price: txn.price(),
        timestamp: txn.timestamp().to_rfc3339(),
    }))
}

fn write_rows<R: Serialize>(rows: impl Iterator<Item = R>) -> Result<String, ExportError> {
    let mut writer = csv::Writer::from_writer(BOM.as_bytes().to_vec());
    for row in rows {
        writer.serialize(row)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Flush(e.to_string()))?;
    Ok(String::from_utf8(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::ImportMode;
    use crate::item::NewItem;
    use crate::snapshot::decode_snapshot;
    use crate::transaction::StockMovement;
    use chrono::{TimeZone, Utc};

    #[test]
    fn catalog_export_includes_inactive_items_and_bom() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let mut ds = Dataset::new();
        let a = ds
            .add_item(NewItem::new("Aspirin, coated", 1.5).with_spec("100mg"), now)
            .unwrap();
        ds.add_item(NewItem::new("Ibuprofen", 2.0), now).unwrap();
        ds.set_item_active(a.id(), false, now).unwrap();

        let csv = catalog_csv(&ds).unwrap();
        assert!(csv.starts_with('\u{feff}'));
        let lines: Vec<&str> = csv.trim_start_matches('\u{feff}').lines().collect();
        assert_eq!(
            lines[0],
            "id,name,spec,manufacturer,defaultPrice,currentStock,status"
        );
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains("\"Aspirin, coated\""));
        assert!(lines[1].ends_with("inactive"));
        assert!(lines[2].ends_with(",active"));
    }

    #[test]
    fn ledger_export_marks_missing_items() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let mut ds = Dataset::new();
        let a = ds.add_item(NewItem::new("Aspirin", 1.5), now).unwrap();
        ds.record_transaction(StockMovement::inbound(a.id().clone(), 5, 1.5), now)
            .unwrap();
        let orphan = decode_snapshot(
            r#"{"catalog": [], "ledger": [{"id":"rec_x","itemId":"drug_gone","direction":"outbound",
                "quantity":2,"price":0,"timestamp":"2024-05-01T00:00:00Z"}]}"#,
            now,
        )
        .unwrap();
        ds.apply_import(orphan, ImportMode::Merge);

        let csv = ledger_csv(&ds).unwrap();
        let lines: Vec<&str> = csv.trim_start_matches('\u{feff}').lines().collect();
        assert_eq!(lines[0], "id,itemId,itemName,direction,quantity,price,timestamp");
        assert!(lines[1].contains(",Aspirin,inbound,5,1.5,"));
        assert!(lines[2].contains(&format!(",{DELETED_ITEM_LABEL},outbound,2,")));
    }
}
