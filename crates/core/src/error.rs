//! Domain error model.

use thiserror::Error;

use crate::id::ItemId;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Every variant is a recoverable outcome carrying a human-readable message.
/// A mutation that returns one of these must leave the dataset untouched.
/// Storage failures are modelled in the infrastructure layer.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// Bad or missing input (empty name, non-positive quantity, bad price).
    #[error("validation failed: {0}")]
    Validation(String),

    /// Reference to an unknown item id.
    #[error("not found: {0}")]
    NotFound(String),

    /// An outbound movement asked for more than the cached stock.
    #[error("insufficient stock for {item_id}: available {available}, requested {requested}")]
    InsufficientStock {
        item_id: ItemId,
        available: i64,
        requested: i64,
    },

    /// An import blob did not have the expected shape.
    #[error("invalid data format: {0}")]
    Format(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn format(msg: impl Into<String>) -> Self {
        Self::Format(msg.into())
    }

    pub fn insufficient_stock(item_id: ItemId, available: i64, requested: i64) -> Self {
        Self::InsufficientStock {
            item_id,
            available,
            requested,
        }
    }

    /// Stable machine-readable kind, used by front ends that map errors to codes.
    pub fn kind(&self) -> &'static str {
        match self {
            DomainError::Validation(_) => "validation",
            DomainError::NotFound(_) => "not_found",
            DomainError::InsufficientStock { .. } => "insufficient_stock",
            DomainError::Format(_) => "format",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_stock_message_names_both_quantities() {
        let err = DomainError::insufficient_stock(ItemId::from("drug_1"), 70, 100);
        let msg = err.to_string();
        assert!(msg.contains("drug_1"));
        assert!(msg.contains("available 70"));
        assert!(msg.contains("requested 100"));
        assert_eq!(err.kind(), "insufficient_stock");
    }

    #[test]
    fn constructors_wrap_messages() {
        assert_eq!(
            DomainError::validation("name cannot be empty"),
            DomainError::Validation("name cannot be empty".to_string())
        );
        assert_eq!(DomainError::format("x").kind(), "format");
        assert_eq!(DomainError::not_found("x").kind(), "not_found");
    }
}
