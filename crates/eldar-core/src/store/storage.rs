use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::repository::{
    ClearOutcome, ConfigRepository, CredentialRepository, CONFIG_BUCKET, CREDENTIALS_BUCKET,
};
use super::{KeyValueStore, RepositoryError, StoreError};
use crate::models::{Config, Credentials};
use crate::paths;
use crate::state::AppState;

/// Fixture credentials for exercising the signed-in pages without a backend.
pub const TEST_USERNAME: &str = "testuser";
pub const TEST_ACCESS_TOKEN: &str = "test-access-token-123";
pub const TEST_REFRESH_TOKEN: &str = "test-refresh-token-456";

/// The open store plus the cached values navigation reads from.
///
/// Saves and clears update the cache only after their transaction commits, so
/// [`Storage::state`] never shows a value that is not on disk.
pub struct Storage {
    store: KeyValueStore,
    state: AppState,
}

impl Storage {
    /// Open the store at `path` and make sure both buckets exist.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let store = KeyValueStore::open(path)?;
        store.ensure_bucket(CONFIG_BUCKET)?;
        store.ensure_bucket(CREDENTIALS_BUCKET)?;
        info!(path = %store.path().display(), "Storage initialized");

        Ok(Self {
            store,
            state: AppState::default(),
        })
    }

    /// Open the store at the platform default location.
    pub fn open_default() -> Result<Self, StoreError> {
        Self::open(paths::database_path()?)
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn store(&self) -> &KeyValueStore {
        &self.store
    }

    pub fn path(&self) -> &Path {
        self.store.path()
    }

    // ===== Config =====

    pub fn load_config(&mut self) -> Result<Config, RepositoryError> {
        let config = ConfigRepository::new(&self.store).load()?;
        self.state.config = config.clone();
        Ok(config)
    }

    pub fn save_config(&mut self, endpoint: &str, anon_key: &str) -> Result<(), RepositoryError> {
        let config = Config::new(endpoint, anon_key);
        ConfigRepository::new(&self.store).save(&config)?;
        self.state.config = config;
        info!("Config saved");
        Ok(())
    }

    // ===== Credentials =====

    pub fn load_credentials(&mut self) -> Result<Credentials, RepositoryError> {
        let credentials = CredentialRepository::new(&self.store).load()?;
        self.state.credentials = credentials.clone();
        Ok(credentials)
    }

    pub fn save_credentials(
        &mut self,
        username: &str,
        access_token: &str,
        refresh_token: &str,
    ) -> Result<(), RepositoryError> {
        let credentials = Credentials::new(username, access_token, refresh_token);
        CredentialRepository::new(&self.store).save(&credentials)?;
        self.state.credentials = credentials;
        info!(username, "Credentials saved");
        Ok(())
    }

    pub fn clear_credentials(&mut self) -> Result<ClearOutcome, RepositoryError> {
        let outcome = CredentialRepository::new(&self.store).clear()?;
        self.state.credentials = Credentials::default();
        Ok(outcome)
    }

    pub fn seed_test_credentials(&mut self) -> Result<(), RepositoryError> {
        self.save_credentials(TEST_USERNAME, TEST_ACCESS_TOKEN, TEST_REFRESH_TOKEN)
    }

    // ===== Refresh =====

    /// Reload both entities for navigation.
    ///
    /// A failed load leaves that entity empty, which navigation treats as
    /// missing and routes to the page that asks for it again.
    pub fn reload(&mut self) -> &AppState {
        if let Err(e) = self.load_config() {
            warn!(error = %e, "Falling back to empty config");
            self.state.config = Config::default();
        }
        if let Err(e) = self.load_credentials() {
            warn!(error = %e, "Falling back to empty credentials");
            self.state.credentials = Credentials::default();
        }
        debug!(
            config_complete = self.state.config.is_complete(),
            signed_in = self.state.credentials.is_present(),
            "State reloaded"
        );
        &self.state
    }

    pub fn close(&mut self) {
        self.store.close();
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_temp() -> (TempDir, Storage) {
        let dir = TempDir::new().unwrap();
        let storage = Storage::open(dir.path().join("eldar").join("eldar.db")).unwrap();
        (dir, storage)
    }

    #[test]
    fn test_open_creates_both_buckets() {
        let (_dir, storage) = open_temp();
        assert!(storage.store().has_bucket("config").unwrap());
        assert!(storage.store().has_bucket("credentials").unwrap());
        assert!(storage.path().exists());
    }

    #[test]
    fn test_reopen_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("eldar.db");
        {
            let mut storage = Storage::open(&path).unwrap();
            storage.save_config("https://x", "key1").unwrap();
            storage.close();
        }

        let mut storage = Storage::open(&path).unwrap();
        assert_eq!(storage.load_config().unwrap(), Config::new("https://x", "key1"));
    }

    #[test]
    fn test_config_scenario() {
        let (_dir, mut storage) = open_temp();
        assert_eq!(storage.load_config().unwrap(), Config::new("", ""));

        storage.save_config("https://x", "key1").unwrap();
        assert_eq!(storage.load_config().unwrap(), Config::new("https://x", "key1"));
    }

    #[test]
    fn test_credentials_round_trip() {
        let (_dir, mut storage) = open_temp();
        storage.save_credentials("bob", "tok1", "ref1").unwrap();
        assert_eq!(
            storage.load_credentials().unwrap(),
            Credentials::new("bob", "tok1", "ref1")
        );
    }

    #[test]
    fn test_save_updates_state_immediately() {
        let (_dir, mut storage) = open_temp();
        storage.save_config("https://x", "key1").unwrap();
        storage.save_credentials("bob", "tok1", "ref1").unwrap();

        assert_eq!(storage.state().config, Config::new("https://x", "key1"));
        assert_eq!(
            storage.state().credentials,
            Credentials::new("bob", "tok1", "ref1")
        );
    }

    #[test]
    fn test_save_clear_load_scenario() {
        let (_dir, mut storage) = open_temp();
        storage.save_credentials("bob", "tok1", "ref1").unwrap();
        storage.clear_credentials().unwrap();

        assert_eq!(storage.load_credentials().unwrap(), Credentials::new("", "", ""));
        assert_eq!(storage.state().credentials, Credentials::default());
    }

    #[test]
    fn test_clear_twice_succeeds() {
        let (_dir, mut storage) = open_temp();
        storage.save_credentials("bob", "tok1", "ref1").unwrap();
        assert_eq!(storage.clear_credentials().unwrap(), ClearOutcome::Cleared);
        assert_eq!(storage.clear_credentials().unwrap(), ClearOutcome::Cleared);
    }

    #[test]
    fn test_failed_save_keeps_previous_state() {
        let (_dir, mut storage) = open_temp();
        storage.save_credentials("bob", "tok1", "ref1").unwrap();

        // Without its bucket the next save fails inside the transaction.
        storage.store().delete_bucket(CREDENTIALS_BUCKET).unwrap();
        let err = storage.save_credentials("eve", "tok2", "ref2").unwrap_err();
        assert!(matches!(err.store_error(), StoreError::BucketMissing(_)));
        assert_eq!(
            storage.state().credentials,
            Credentials::new("bob", "tok1", "ref1")
        );
    }

    #[test]
    fn test_failed_save_on_closed_store_keeps_state() {
        let (_dir, mut storage) = open_temp();
        storage.save_config("https://x", "key1").unwrap();
        storage.close();

        let err = storage.save_config("https://y", "key2").unwrap_err();
        assert!(matches!(err, RepositoryError::SaveConfig(StoreError::Closed)));
        assert_eq!(storage.state().config, Config::new("https://x", "key1"));
    }

    #[test]
    fn test_failed_save_persists_nothing() {
        let (dir, mut storage) = open_temp();
        storage.save_config("https://x", "key1").unwrap();
        storage.save_credentials("bob", "tok1", "ref1").unwrap();
        storage.close();

        assert!(storage.save_config("https://y", "key2").is_err());
        assert!(storage.save_credentials("eve", "tok2", "ref2").is_err());

        let mut reopened = Storage::open(dir.path().join("eldar").join("eldar.db")).unwrap();
        assert_eq!(reopened.load_config().unwrap(), Config::new("https://x", "key1"));
        assert_eq!(
            reopened.load_credentials().unwrap(),
            Credentials::new("bob", "tok1", "ref1")
        );
    }

    #[test]
    fn test_failed_save_leaves_other_buckets_on_disk() {
        let (_dir, mut storage) = open_temp();
        storage.save_config("https://x", "key1").unwrap();
        storage.store().delete_bucket(CREDENTIALS_BUCKET).unwrap();

        assert!(storage.save_credentials("eve", "tok2", "ref2").is_err());

        // The aborted transaction must not have recreated the bucket.
        assert!(!storage.store().has_bucket(CREDENTIALS_BUCKET).unwrap());
        storage.store().ensure_bucket(CREDENTIALS_BUCKET).unwrap();
        assert!(storage.load_credentials().unwrap().is_empty());
        assert_eq!(storage.load_config().unwrap(), Config::new("https://x", "key1"));
    }

    #[test]
    fn test_reload_falls_back_to_empty_on_error() {
        let (_dir, mut storage) = open_temp();
        storage.save_config("https://x", "key1").unwrap();
        storage.save_credentials("bob", "tok1", "ref1").unwrap();

        storage.store().delete_bucket(CREDENTIALS_BUCKET).unwrap();
        let state = storage.reload();
        assert_eq!(state.config, Config::new("https://x", "key1"));
        assert_eq!(state.credentials, Credentials::default());
    }

    #[test]
    fn test_seed_test_credentials() {
        let (_dir, mut storage) = open_temp();
        storage.seed_test_credentials().unwrap();
        let creds = storage.load_credentials().unwrap();
        assert_eq!(creds.username, "testuser");
        assert_eq!(creds.access_token, "test-access-token-123");
        assert_eq!(creds.refresh_token, "test-refresh-token-456");
    }
}
