//! Infrastructure error model.

use thiserror::Error;

use pharmstock_core::DomainError;
use pharmstock_inventory::ExportError;

/// Failure of the underlying blob storage.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize dataset: {0}")]
    Serialize(String),

    #[error("invalid storage key {0:?}")]
    InvalidKey(String),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl From<serde_json::Error> for PersistenceError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialize(err.to_string())
    }
}

/// Error returned by [`LedgerStore`](crate::LedgerStore) operations.
///
/// Whatever the variant, the store's in-memory dataset is unchanged.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error(transparent)]
    Export(#[from] ExportError),
}

impl StoreError {
    /// Stable machine-readable kind, covering the whole error taxonomy.
    pub fn kind(&self) -> &'static str {
        match self {
            StoreError::Domain(err) => err.kind(),
            StoreError::Persistence(_) => "persistence",
            StoreError::Export(_) => "export",
        }
    }
}
