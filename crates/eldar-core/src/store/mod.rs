//! Local persistence for config and credentials.
//!
//! This module provides:
//! - `KeyValueStore`: single-file transactional store with named buckets (redb)
//! - `ConfigRepository` / `CredentialRepository`: typed access to the two buckets
//! - `Storage`: the open store plus the cached `AppState`
//!
//! Every save is one write transaction, so a failure never leaves a record
//! half-written.

pub mod error;
pub mod kv;
pub mod repository;
pub mod storage;

pub use error::{RepositoryError, StoreError};
pub use kv::{KeyValueStore, ReadTx, WriteTx};
pub use repository::{
    ClearOutcome, ConfigRepository, CredentialRepository, CONFIG_BUCKET, CREDENTIALS_BUCKET,
};
pub use storage::Storage;
