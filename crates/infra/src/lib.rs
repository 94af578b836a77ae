//! Infrastructure layer: blob persistence, the persisted ledger store,
//! storage recovery and configuration.

pub mod blob_store;
pub mod config;
pub mod error;
pub mod ledger_store;
pub mod recovery;


pub use blob_store::{BlobStore, FileBlobStore, InMemoryBlobStore};
pub use config::Config;
pub use error::{PersistenceError, StoreError};
pub use ledger_store::LedgerStore;
pub use recovery::{scan_blobs, BlobCandidate, BlobKind};
