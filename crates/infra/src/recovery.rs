//! Storage recovery scan.
//!
//! Inventory data can end up under unexpected keys (older releases, manual
//! backups). The scan walks every key in a blob store and reports the ones
//! that look like inventory data, so an operator can pick one to restore via
//! [`LedgerStore::restore_from_key`](crate::LedgerStore::restore_from_key).

use serde::Serialize;
use serde_json::Value;

use crate::blob_store::BlobStore;
use crate::error::PersistenceError;

const NAME_HINTS: [&str; 2] = ["drug", "medicine"];
const CATALOG_FIELDS: [&str; 2] = ["catalog", "drugs"];
const LEDGER_FIELDS: [&str; 2] = ["ledger", "stockRecords"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum BlobKind {
    /// Parses as a JSON object with a catalog and/or ledger array.
    Inventory,
    /// Only the key name suggests inventory data.
    Unrecognized,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlobCandidate {
    pub key: String,
    pub kind: BlobKind,
    pub item_count: usize,
    pub transaction_count: usize,
    pub size_bytes: usize,
    pub version: Option<String>,
}

/// Candidates in key order. Keys that vanish between listing and loading are
/// skipped.
pub fn scan_blobs<B>(blobs: &B) -> Result<Vec<BlobCandidate>, PersistenceError>
where
    B: BlobStore + ?Sized,
{
    let mut candidates = Vec::new();
    for key in blobs.keys()? {
        let Some(blob) = blobs.load(&key)? else {
            continue;
        };
        if let Some(candidate) = inspect(&key, &blob) {
            candidates.push(candidate);
        }
    }
    tracing::debug!(found = candidates.len(), "storage scan finished");
    Ok(candidates)
}

fn inspect(key: &str, blob: &str) -> Option<BlobCandidate> {
    let parsed = serde_json::from_str::<Value>(blob).ok();
    let object = parsed.as_ref().and_then(Value::as_object);

    let array_len = |fields: &[&str]| {
        object.and_then(|obj| {
            fields
                .iter()
                .find_map(|field| obj.get(*field).and_then(Value::as_array))
                .map(Vec::len)
        })
    };
    let items = array_len(&CATALOG_FIELDS);
    let transactions = array_len(&LEDGER_FIELDS);

    let kind = if items.is_some() || transactions.is_some() {
        BlobKind::Inventory
    } else {
        let lowered = key.to_lowercase();
        if !NAME_HINTS.iter().any(|hint| lowered.contains(hint)) {
            return None;
        }
        BlobKind::Unrecognized
    };

    Some(BlobCandidate {
        key: key.to_string(),
        kind,
        item_count: items.unwrap_or(0),
        transaction_count: transactions.unwrap_or(0),
        size_bytes: blob.len(),
        version: object
            .and_then(|obj| obj.get("version"))
            .and_then(Value::as_str)
            .map(str::to_string),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob_store::InMemoryBlobStore;

    #[test]
    fn finds_current_and_legacy_layouts() {
        let blobs = InMemoryBlobStore::with_blobs([
            ("myDrugSystemData_v3", r#"{"catalog":[{},{}],"ledger":[{}],"version":"3.0.0"}"#),
            ("oldBackup", r#"{"drugs":[{}],"stockRecords":[]}"#),
            ("medicine_notes", "plain text"),
            ("theme", r#"{"dark":true}"#),
        ]);

        let found = scan_blobs(&blobs).unwrap();
        let keys: Vec<_> = found.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, vec!["medicine_notes", "myDrugSystemData_v3", "oldBackup"]);

        assert_eq!(found[0].kind, BlobKind::Unrecognized);
        assert_eq!(found[0].size_bytes, "plain text".len());

        assert_eq!(found[1].kind, BlobKind::Inventory);
        assert_eq!(found[1].item_count, 2);
        assert_eq!(found[1].transaction_count, 1);
        assert_eq!(found[1].version.as_deref(), Some("3.0.0"));

        assert_eq!(found[2].item_count, 1);
        assert_eq!(found[2].version, None);
    }

    #[test]
    fn empty_store_yields_nothing() {
        assert!(scan_blobs(&InMemoryBlobStore::new()).unwrap().is_empty());
    }
}
