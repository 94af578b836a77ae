use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pharmstock_core::{DomainError, DomainResult, Entity, ItemId};

use crate::transaction::deserialize_optional_timestamp;

/// Catalog entry.
///
/// `current_stock` is a cache of the signed ledger sum for this item. It is
/// only written by the dataset (transaction recording and reconciliation).
/// Items are never removed; `is_active == false` is the soft-deleted state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub(crate) id: ItemId,
    pub(crate) name: String,
    pub(crate) spec: String,
    pub(crate) manufacturer: String,
    pub(crate) default_price: f64,
    pub(crate) current_stock: i64,
    pub(crate) is_active: bool,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

impl Item {
    pub fn id(&self) -> &ItemId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Specification (strength, pack size). `None` when blank.
    pub fn spec(&self) -> Option<&str> {
        non_blank(&self.spec)
    }

    pub fn manufacturer(&self) -> Option<&str> {
        non_blank(&self.manufacturer)
    }

    pub fn default_price(&self) -> f64 {
        self.default_price
    }

    pub fn current_stock(&self) -> i64 {
        self.current_stock
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Case-insensitive match on name or manufacturer. `needle` must already
    /// be lowercased.
    pub(crate) fn matches(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
            || self.manufacturer.to_lowercase().contains(needle)
    }

    pub(crate) fn touch(&mut self, now: DateTime<Utc>) {
        // updated_at never moves backwards, even if the clock does.
        if now > self.updated_at {
            self.updated_at = now;
        }
    }
}

impl Entity for Item {
    type Id = ItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

fn non_blank(s: &str) -> Option<&str> {
    if s.trim().is_empty() { None } else { Some(s) }
}

/// Command: add an item to the catalog.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewItem {
    pub name: String,
    pub spec: Option<String>,
    pub manufacturer: Option<String>,
    pub default_price: f64,
}

impl NewItem {
    pub fn new(name: impl Into<String>, default_price: f64) -> Self {
        Self {
            name: name.into(),
            default_price,
            ..Self::default()
        }
    }

    pub fn with_spec(mut self, spec: impl Into<String>) -> Self {
        self.spec = Some(spec.into());
        self
    }

    pub fn with_manufacturer(mut self, manufacturer: impl Into<String>) -> Self {
        self.manufacturer = Some(manufacturer.into());
        self
    }

    pub(crate) fn into_item(self, now: DateTime<Utc>) -> DomainResult<Item> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("item name cannot be empty"));
        }
        if !is_valid_price(self.default_price) {
            return Err(DomainError::validation(
                "default price must be a non-negative number",
            ));
        }

        Ok(Item {
            id: ItemId::generate(),
            name: name.to_string(),
            spec: self.spec.unwrap_or_default().trim().to_string(),
            manufacturer: self.manufacturer.unwrap_or_default().trim().to_string(),
            default_price: self.default_price,
            current_stock: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }
}

pub(crate) fn is_valid_price(price: f64) -> bool {
    price.is_finite() && price >= 0.0
}

/// Wire form of an item as found in import blobs: everything but the id and
/// name may be missing and is defaulted on conversion.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ItemRecord {
    id: ItemId,
    name: String,
    #[serde(default)]
    spec: Option<String>,
    #[serde(default)]
    manufacturer: Option<String>,
    #[serde(default)]
    default_price: Option<f64>,
    #[serde(default)]
    current_stock: Option<i64>,
    #[serde(default)]
    is_active: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_optional_timestamp")]
    created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_optional_timestamp")]
    updated_at: Option<DateTime<Utc>>,
}

impl ItemRecord {
    pub(crate) fn into_item(self, now: DateTime<Utc>) -> Item {
        let created_at = self.created_at.unwrap_or(now);
        let updated_at = self.updated_at.unwrap_or(now).max(created_at);
        Item {
            id: self.id,
            name: self.name,
            spec: self.spec.unwrap_or_default(),
            manufacturer: self.manufacturer.unwrap_or_default(),
            default_price: self
                .default_price
                .filter(|p| is_valid_price(*p))
                .unwrap_or(0.0),
            current_stock: self.current_stock.unwrap_or(0),
            is_active: self.is_active.unwrap_or(true),
            created_at,
            updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn test_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap()
    }

    #[test]
    fn new_item_starts_active_with_zero_stock() {
        let item = NewItem::new("Amoxicillin", 2.5)
            .with_spec("500mg x 24")
            .with_manufacturer("Acme")
            .into_item(test_time())
            .unwrap();
        assert_eq!(item.name(), "Amoxicillin");
        assert_eq!(item.spec(), Some("500mg x 24"));
        assert_eq!(item.manufacturer(), Some("Acme"));
        assert_eq!(item.current_stock(), 0);
        assert!(item.is_active());
        assert_eq!(item.created_at(), item.updated_at());
    }

    #[test]
    fn blank_name_is_rejected() {
        let err = NewItem::new("   ", 1.0).into_item(test_time()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn negative_or_nan_price_is_rejected() {
        for price in [-0.01, f64::NAN, f64::INFINITY] {
            let err = NewItem::new("Ibuprofen", price)
                .into_item(test_time())
                .unwrap_err();
            assert!(matches!(err, DomainError::Validation(_)));
        }
        assert!(NewItem::new("Saline", 0.0).into_item(test_time()).is_ok());
    }

    #[test]
    fn record_defaults_missing_fields() {
        let record: ItemRecord =
            serde_json::from_str(r#"{"id":"drug_1","name":"Aspirin","defaultPrice":1.2}"#).unwrap();
        let item = record.into_item(test_time());
        assert_eq!(item.spec(), None);
        assert_eq!(item.current_stock(), 0);
        assert!(item.is_active());
        assert_eq!(item.created_at(), test_time());
        assert_eq!(item.updated_at(), test_time());
    }

    #[test]
    fn record_keeps_explicit_inactive_flag() {
        let record: ItemRecord = serde_json::from_str(
            r#"{"id":"drug_1","name":"Aspirin","defaultPrice":1.2,"isActive":false,
                "createdAt":"2024-01-01T00:00:00.000Z","updatedAt":"2024-02-01T00:00:00.000Z"}"#,
        )
        .unwrap();
        let item = record.into_item(test_time());
        assert!(!item.is_active());
        assert_eq!(item.created_at(), Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn touch_never_moves_backwards() {
        let mut item = NewItem::new("Aspirin", 1.0).into_item(test_time()).unwrap();
        item.touch(Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(item.updated_at(), test_time());
    }

    #[test]
    fn search_matches_name_or_manufacturer() {
        let item = NewItem::new("Amoxicillin", 1.0)
            .with_manufacturer("Northwind Pharma")
            .into_item(test_time())
            .unwrap();
        assert!(item.matches("amox"));
        assert!(item.matches("northwind"));
        assert!(!item.matches("ibu"));
    }
}
