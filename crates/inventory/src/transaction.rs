use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use pharmstock_core::{Entity, ItemId, TransactionId};

/// Direction of a stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[serde(alias = "IN", alias = "in")]
    Inbound,
    #[serde(alias = "OUT", alias = "out")]
    Outbound,
}

impl Direction {
    /// Sign applied to the quantity when folding the ledger into stock.
    pub fn signed(self, quantity: i64) -> i64 {
        match self {
            Direction::Inbound => quantity,
            Direction::Outbound => -quantity,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Inbound => "inbound",
            Direction::Outbound => "outbound",
        }
    }
}

impl core::fmt::Display for Direction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ledger entry. Immutable once created: there are no setters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    #[serde(alias = "recordId")]
    pub(crate) id: TransactionId,
    #[serde(alias = "drugId")]
    pub(crate) item_id: ItemId,
    #[serde(alias = "type")]
    pub(crate) direction: Direction,
    pub(crate) quantity: i64,
    #[serde(default)]
    pub(crate) price: f64,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub(crate) timestamp: DateTime<Utc>,
}

impl Transaction {
    pub fn id(&self) -> &TransactionId {
        &self.id
    }

    pub fn item_id(&self) -> &ItemId {
        &self.item_id
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    /// Unit price. Always present for inbound movements, 0 when an outbound
    /// movement was recorded without one.
    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn is_inbound(&self) -> bool {
        self.direction == Direction::Inbound
    }

    /// Quantity with the direction's sign applied.
    pub fn signed_quantity(&self) -> i64 {
        self.direction.signed(self.quantity)
    }
}

impl Entity for Transaction {
    type Id = TransactionId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Command: record a stock movement against an item.
#[derive(Debug, Clone, PartialEq)]
pub struct StockMovement {
    pub item_id: ItemId,
    pub direction: Direction,
    pub quantity: i64,
    pub unit_price: Option<f64>,
}

impl StockMovement {
    pub fn inbound(item_id: impl Into<ItemId>, quantity: i64, unit_price: f64) -> Self {
        Self {
            item_id: item_id.into(),
            direction: Direction::Inbound,
            quantity,
            unit_price: Some(unit_price),
        }
    }

    pub fn outbound(item_id: impl Into<ItemId>, quantity: i64) -> Self {
        Self {
            item_id: item_id.into(),
            direction: Direction::Outbound,
            quantity,
            unit_price: None,
        }
    }

    pub fn with_price(mut self, unit_price: f64) -> Self {
        self.unit_price = Some(unit_price);
        self
    }
}

const LEGACY_FORMATS: [&str; 4] = [
    "%Y/%m/%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d",
];

/// Parse a stored timestamp.
///
/// Accepts RFC 3339 and the zone-less `2024/1/5 14:03:22` form written by
/// older exports; zone-less values are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    for fmt in LEGACY_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
        if let Ok(date) = chrono::NaiveDate::parse_from_str(raw, fmt) {
            return date.and_hms_opt(0, 0, 0).map(|n| n.and_utc());
        }
    }
    None
}

pub(crate) fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("unrecognized timestamp: {raw}")))
}

pub(crate) fn deserialize_optional_timestamp<'de, D>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => parse_timestamp(&s)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("unrecognized timestamp: {s}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn direction_accepts_legacy_spellings() {
        let d: Direction = serde_json::from_str("\"IN\"").unwrap();
        assert_eq!(d, Direction::Inbound);
        let d: Direction = serde_json::from_str("\"outbound\"").unwrap();
        assert_eq!(d, Direction::Outbound);
        assert_eq!(serde_json::to_string(&Direction::Outbound).unwrap(), "\"outbound\"");
    }

    #[test]
    fn signed_quantity_follows_direction() {
        assert_eq!(Direction::Inbound.signed(5), 5);
        assert_eq!(Direction::Outbound.signed(5), -5);
    }

    #[test]
    fn parses_rfc3339_and_legacy_timestamps() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 5, 14, 3, 22).unwrap();
        assert_eq!(parse_timestamp("2024-01-05T14:03:22Z"), Some(expected));
        assert_eq!(parse_timestamp("2024/1/5 14:03:22"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-05 14:03:22"), Some(expected));
        assert_eq!(
            parse_timestamp("2024/1/5"),
            Some(Utc.with_ymd_and_hms(2024, 1, 5, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn transaction_reads_legacy_field_names() {
        let raw = r#"{
            "recordId": "rec_1",
            "drugId": "drug_1",
            "type": "IN",
            "quantity": 100,
            "price": 3.0,
            "timestamp": "2024/1/5 14:03:22",
            "operator": "ignored"
        }"#;
        let txn: Transaction = serde_json::from_str(raw).unwrap();
        assert_eq!(txn.id().as_str(), "rec_1");
        assert_eq!(txn.item_id().as_str(), "drug_1");
        assert!(txn.is_inbound());
        assert_eq!(txn.signed_quantity(), 100);
        assert_eq!(txn.price(), 3.0);
    }

    #[test]
    fn transaction_serializes_camel_case() {
        let txn = Transaction {
            id: TransactionId::from("rec_1"),
            item_id: ItemId::from("drug_1"),
            direction: Direction::Outbound,
            quantity: 4,
            price: 0.0,
            timestamp: Utc.with_ymd_and_hms(2024, 1, 5, 0, 0, 0).unwrap(),
        };
        let value = serde_json::to_value(&txn).unwrap();
        assert_eq!(value["itemId"], "drug_1");
        assert_eq!(value["direction"], "outbound");
        assert_eq!(value["timestamp"], "2024-01-05T00:00:00Z");
    }
}
