use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage directory unavailable: {path}")]
    DirectoryUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not resolve a storage directory for this platform")]
    NoStorageRoot,

    #[error("Failed to open store at {path}: {source}")]
    OpenFailure {
        path: PathBuf,
        #[source]
        source: redb::DatabaseError,
    },

    #[error("Failed to create bucket '{bucket}': {source}")]
    BucketFailure {
        bucket: String,
        #[source]
        source: redb::Error,
    },

    #[error("Bucket '{0}' does not exist")]
    BucketMissing(String),

    #[error("Failed to read {target}: {source}")]
    ReadFailure {
        target: String,
        #[source]
        source: redb::Error,
    },

    #[error("Failed to write {target}: {source}")]
    WriteFailure {
        target: String,
        #[source]
        source: redb::Error,
    },

    #[error("Store is closed")]
    Closed,
}

impl StoreError {
    pub(crate) fn read(target: impl Into<String>, source: impl Into<redb::Error>) -> Self {
        StoreError::ReadFailure {
            target: target.into(),
            source: source.into(),
        }
    }

    pub(crate) fn write(target: impl Into<String>, source: impl Into<redb::Error>) -> Self {
        StoreError::WriteFailure {
            target: target.into(),
            source: source.into(),
        }
    }

    pub(crate) fn bucket(bucket: &str, source: impl Into<redb::Error>) -> Self {
        StoreError::BucketFailure {
            bucket: bucket.to_string(),
            source: source.into(),
        }
    }
}

/// A store failure annotated with the repository operation that hit it.
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Failed to load config: {0}")]
    LoadConfig(#[source] StoreError),

    #[error("Failed to save config: {0}")]
    SaveConfig(#[source] StoreError),

    #[error("Failed to load credentials: {0}")]
    LoadCredentials(#[source] StoreError),

    #[error("Failed to save credentials: {0}")]
    SaveCredentials(#[source] StoreError),

    #[error("Failed to clear credentials: {0}")]
    ClearCredentials(#[source] StoreError),
}

impl RepositoryError {
    /// The underlying store failure.
    pub fn store_error(&self) -> &StoreError {
        match self {
            RepositoryError::LoadConfig(e)
            | RepositoryError::SaveConfig(e)
            | RepositoryError::LoadCredentials(e)
            | RepositoryError::SaveCredentials(e)
            | RepositoryError::ClearCredentials(e) => e,
        }
    }
}
