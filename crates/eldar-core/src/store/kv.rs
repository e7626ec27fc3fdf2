use std::path::{Path, PathBuf};

use redb::{
    Database, ReadTransaction, ReadableDatabase, TableDefinition, TableError,
    TableHandle, WriteTransaction,
};
use tracing::{debug, warn};

use super::StoreError;

/// Every bucket maps string keys to raw bytes.
fn bucket_table<'a>(name: &'a str) -> TableDefinition<'a, &'static str, &'static [u8]> {
    TableDefinition::new(name)
}

fn target(bucket: &str, key: &str) -> String {
    format!("{}/{}", bucket, key)
}

/// Single-file transactional key-value store with named buckets.
///
/// Every public operation runs in its own transaction. Use [`KeyValueStore::view`]
/// and [`KeyValueStore::update`] to group several reads or writes so they observe
/// or commit together.
pub struct KeyValueStore {
    path: PathBuf,
    db: Option<Database>,
}

impl KeyValueStore {
    /// Open the store at `path`, creating the file and its parent directories if needed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::DirectoryUnavailable {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let db = Database::create(&path).map_err(|source| StoreError::OpenFailure {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), "Store opened");

        Ok(Self { path, db: Some(db) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        self.db.is_some()
    }

    fn db(&self) -> Result<&Database, StoreError> {
        self.db.as_ref().ok_or(StoreError::Closed)
    }

    /// Create the bucket if it does not exist yet.
    pub fn ensure_bucket(&self, name: &str) -> Result<(), StoreError> {
        let txn = self
            .db()?
            .begin_write()
            .map_err(|e| StoreError::bucket(name, e))?;
        txn.open_table(bucket_table(name))
            .map_err(|e| StoreError::bucket(name, e))?;
        txn.commit().map_err(|e| StoreError::bucket(name, e))?;
        debug!(bucket = name, "Bucket ensured");
        Ok(())
    }

    pub fn has_bucket(&self, name: &str) -> Result<bool, StoreError> {
        self.view(|tx| tx.has_bucket(name))
    }

    /// Drop a bucket and everything in it. Returns whether it existed.
    pub fn delete_bucket(&self, name: &str) -> Result<bool, StoreError> {
        self.update(|tx| tx.delete_bucket(name))
    }

    pub fn get(&self, bucket: &str, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.view(|tx| tx.get(bucket, key))
    }

    pub fn put(&self, bucket: &str, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.update(|tx| tx.put(bucket, key, value))
    }

    pub fn delete(&self, bucket: &str, key: &str) -> Result<(), StoreError> {
        self.update(|tx| tx.delete(bucket, key).map(|_| ()))
    }

    /// Run `f` inside one read transaction.
    pub fn view<T>(&self, f: impl FnOnce(&ReadTx) -> Result<T, StoreError>) -> Result<T, StoreError> {
        let txn = self
            .db()?
            .begin_read()
            .map_err(|e| StoreError::read("read transaction", e))?;
        f(&ReadTx { txn })
    }

    /// Run `f` inside one read-write transaction.
    ///
    /// The transaction commits only if `f` returns `Ok`; otherwise it is aborted
    /// and none of its writes become visible.
    pub fn update<T>(
        &self,
        f: impl FnOnce(&mut WriteTx<'_>) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let txn = self
            .db()?
            .begin_write()
            .map_err(|e| StoreError::write("write transaction", e))?;

        let result = f(&mut WriteTx { txn: &txn });
        match result {
            Ok(value) => {
                txn.commit()
                    .map_err(|e| StoreError::write("commit", e))?;
                Ok(value)
            }
            Err(e) => {
                if let Err(abort_err) = txn.abort() {
                    warn!(error = %abort_err, "Failed to abort transaction");
                }
                debug!(error = %e, "Transaction aborted");
                Err(e)
            }
        }
    }

    /// Release the underlying file. Safe to call more than once.
    pub fn close(&mut self) {
        if self.db.take().is_some() {
            debug!(path = %self.path.display(), "Store closed");
        }
    }
}

/// Read access scoped to one transaction.
pub struct ReadTx {
    txn: ReadTransaction,
}

impl ReadTx {
    pub fn has_bucket(&self, name: &str) -> Result<bool, StoreError> {
        match self.txn.open_table(bucket_table(name)) {
            Ok(_) => Ok(true),
            Err(TableError::TableDoesNotExist(_)) => Ok(false),
            Err(e) => Err(StoreError::read(name, e)),
        }
    }

    /// Missing keys are `None`; a missing bucket is an error.
    pub fn get(&self, bucket: &str, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let table = match self.txn.open_table(bucket_table(bucket)) {
            Ok(table) => table,
            Err(TableError::TableDoesNotExist(_)) => {
                return Err(StoreError::BucketMissing(bucket.to_string()))
            }
            Err(e) => return Err(StoreError::read(target(bucket, key), e)),
        };

        let value = table
            .get(key)
            .map_err(|e| StoreError::read(target(bucket, key), e))?;
        Ok(value.map(|guard| guard.value().to_vec()))
    }
}

/// Write access scoped to one transaction.
pub struct WriteTx<'a> {
    txn: &'a WriteTransaction,
}

impl WriteTx<'_> {
    pub fn has_bucket(&self, name: &str) -> Result<bool, StoreError> {
        let mut tables = self
            .txn
            .list_tables()
            .map_err(|e| StoreError::read(name, e))?;
        Ok(tables.any(|handle| handle.name() == name))
    }

    fn require_bucket(&self, name: &str) -> Result<(), StoreError> {
        if self.has_bucket(name)? {
            Ok(())
        } else {
            Err(StoreError::BucketMissing(name.to_string()))
        }
    }

    pub fn put(&mut self, bucket: &str, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.require_bucket(bucket)?;
        let mut table = self
            .txn
            .open_table(bucket_table(bucket))
            .map_err(|e| StoreError::write(target(bucket, key), e))?;
        table
            .insert(key, value)
            .map_err(|e| StoreError::write(target(bucket, key), e))?;
        Ok(())
    }

    /// Remove a key. Returns whether it was present; removing an absent key is not an error.
    pub fn delete(&mut self, bucket: &str, key: &str) -> Result<bool, StoreError> {
        self.require_bucket(bucket)?;
        let mut table = self
            .txn
            .open_table(bucket_table(bucket))
            .map_err(|e| StoreError::write(target(bucket, key), e))?;
        let removed = table
            .remove(key)
            .map_err(|e| StoreError::write(target(bucket, key), e))?
            .is_some();
        Ok(removed)
    }

    pub fn delete_bucket(&mut self, name: &str) -> Result<bool, StoreError> {
        self.txn
            .delete_table(bucket_table(name))
            .map_err(|e| StoreError::write(name, e))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_temp() -> (TempDir, KeyValueStore) {
        let dir = TempDir::new().unwrap();
        let store = KeyValueStore::open(dir.path().join("test.db")).unwrap();
        (dir, store)
    }

    #[test]
    fn test_open_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("deeper").join("test.db");
        let store = KeyValueStore::open(&path).unwrap();
        assert!(path.exists());
        assert!(store.is_open());
        assert_eq!(store.path(), path.as_path());
    }

    #[test]
    fn test_open_fails_when_parent_is_a_file() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let result = KeyValueStore::open(blocker.join("test.db"));
        assert!(matches!(result, Err(StoreError::DirectoryUnavailable { .. })));
    }

    #[test]
    fn test_second_open_of_same_file_fails() {
        let (dir, _store) = open_temp();
        let result = KeyValueStore::open(dir.path().join("test.db"));
        assert!(matches!(result, Err(StoreError::OpenFailure { .. })));
    }

    #[test]
    fn test_ensure_bucket_is_idempotent() {
        let (_dir, store) = open_temp();
        assert!(!store.has_bucket("config").unwrap());
        store.ensure_bucket("config").unwrap();
        store.put("config", "endpoint", b"https://x").unwrap();
        store.ensure_bucket("config").unwrap();
        assert!(store.has_bucket("config").unwrap());
        assert_eq!(store.get("config", "endpoint").unwrap(), Some(b"https://x".to_vec()));
    }

    #[test]
    fn test_get_missing_key_is_none() {
        let (_dir, store) = open_temp();
        store.ensure_bucket("config").unwrap();
        assert_eq!(store.get("config", "endpoint").unwrap(), None);
    }

    #[test]
    fn test_get_missing_bucket_is_error() {
        let (_dir, store) = open_temp();
        let result = store.get("config", "endpoint");
        assert!(matches!(result, Err(StoreError::BucketMissing(ref b)) if b == "config"));
    }

    #[test]
    fn test_empty_value_is_distinct_from_missing() {
        let (_dir, store) = open_temp();
        store.ensure_bucket("config").unwrap();
        store.put("config", "endpoint", b"").unwrap();
        assert_eq!(store.get("config", "endpoint").unwrap(), Some(Vec::new()));
    }

    #[test]
    fn test_put_into_missing_bucket_fails() {
        let (_dir, store) = open_temp();
        let result = store.put("config", "endpoint", b"x");
        assert!(matches!(result, Err(StoreError::BucketMissing(_))));
        assert!(!store.has_bucket("config").unwrap());
    }

    #[test]
    fn test_delete_absent_key_succeeds() {
        let (_dir, store) = open_temp();
        store.ensure_bucket("credentials").unwrap();
        store.delete("credentials", "username").unwrap();

        store.put("credentials", "username", b"bob").unwrap();
        store.delete("credentials", "username").unwrap();
        assert_eq!(store.get("credentials", "username").unwrap(), None);
    }

    #[test]
    fn test_failed_update_commits_nothing() {
        let (_dir, store) = open_temp();
        store.ensure_bucket("credentials").unwrap();
        store.put("credentials", "username", b"alice").unwrap();

        let result = store.update(|tx| {
            tx.put("credentials", "username", b"bob")?;
            tx.put("missing", "access_token", b"tok")?;
            Ok(())
        });

        assert!(matches!(result, Err(StoreError::BucketMissing(_))));
        assert_eq!(
            store.get("credentials", "username").unwrap(),
            Some(b"alice".to_vec())
        );
    }

    #[test]
    fn test_update_commits_all_writes() {
        let (_dir, store) = open_temp();
        store.ensure_bucket("config").unwrap();

        store
            .update(|tx| {
                tx.put("config", "endpoint", b"https://x")?;
                tx.put("config", "anonKey", b"key1")
            })
            .unwrap();

        let (endpoint, key) = store
            .view(|tx| Ok((tx.get("config", "endpoint")?, tx.get("config", "anonKey")?)))
            .unwrap();
        assert_eq!(endpoint, Some(b"https://x".to_vec()));
        assert_eq!(key, Some(b"key1".to_vec()));
    }

    #[test]
    fn test_delete_bucket() {
        let (_dir, store) = open_temp();
        store.ensure_bucket("credentials").unwrap();
        assert!(store.delete_bucket("credentials").unwrap());
        assert!(!store.delete_bucket("credentials").unwrap());
        assert!(!store.has_bucket("credentials").unwrap());
    }

    #[test]
    fn test_close_is_idempotent_and_blocks_further_use() {
        let (_dir, mut store) = open_temp();
        store.ensure_bucket("config").unwrap();
        store.close();
        store.close();
        assert!(!store.is_open());
        assert!(matches!(store.get("config", "endpoint"), Err(StoreError::Closed)));
        assert!(matches!(store.put("config", "endpoint", b"x"), Err(StoreError::Closed)));
    }

    #[test]
    fn test_committed_data_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.db");
        {
            let mut store = KeyValueStore::open(&path).unwrap();
            store.ensure_bucket("config").unwrap();
            store.put("config", "anonKey", b"key1").unwrap();
            store.close();
        }

        let store = KeyValueStore::open(&path).unwrap();
        assert_eq!(store.get("config", "anonKey").unwrap(), Some(b"key1".to_vec()));
    }
}
